//! Per-cycle combat snapshots of the target and of the agent itself.

use crate::attributes::Attribute;
use crate::entity::{EntityId, EntityKind, EntitySnapshot};
use crate::geometry::{Aabb, Vec3};

/// Armor slot order used by [`TargetProfile::equipment`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ArmorSlot {
    Head,
    Torso,
    Legs,
    Feet,
}

impl ArmorSlot {
    pub const COUNT: usize = 4;

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Damage-relevant enchantments on one equipped armor piece.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArmorPiece {
    pub protection: u8,
    pub blast_protection: u8,
}

impl ArmorPiece {
    pub const fn new(protection: u8, blast_protection: u8) -> Self {
        Self {
            protection,
            blast_protection,
        }
    }

    /// Explosion protection factor: blast protection counts double.
    pub const fn protection_points(self) -> u32 {
        self.protection as u32 + 2 * self.blast_protection as u32
    }
}

/// Snapshot of a combatant taken once per decision cycle.
///
/// `armor == None` means the session exposes no armor attribute for the
/// entity; mitigated damage against it is unknown rather than zero.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetProfile {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,
    pub position: Vec3,
    pub width: f64,
    pub height: f64,
    pub health: Option<f64>,
    pub armor: Option<Attribute>,
    pub armor_toughness: Option<Attribute>,
    pub equipment: [Option<ArmorPiece>; ArmorSlot::COUNT],
    /// Resistance effect level; `0` when the effect is absent.
    pub resistance: u8,
}

impl TargetProfile {
    /// Bare profile with entity geometry only: no health or attributes known.
    pub fn from_entity(entity: &EntitySnapshot) -> Self {
        Self {
            id: entity.id,
            name: entity.name.clone(),
            kind: entity.kind,
            position: entity.position,
            width: entity.width,
            height: entity.height,
            health: None,
            armor: None,
            armor_toughness: None,
            equipment: [None; ArmorSlot::COUNT],
            resistance: 0,
        }
    }

    pub fn with_health(mut self, health: f64) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_armor(mut self, armor: Attribute, toughness: Attribute) -> Self {
        self.armor = Some(armor);
        self.armor_toughness = Some(toughness);
        self
    }

    pub fn with_piece(mut self, slot: ArmorSlot, piece: ArmorPiece) -> Self {
        self.equipment[slot.index()] = Some(piece);
        self
    }

    pub fn with_resistance(mut self, level: u8) -> Self {
        self.resistance = level;
        self
    }

    pub fn hitbox(&self) -> Aabb {
        Aabb::anchored(self.position, self.width / 2.0, self.height)
    }

    pub fn is_player(&self) -> bool {
        self.kind == EntityKind::Player
    }

    /// Summed enchantment protection across all worn pieces.
    pub fn protection_points(&self) -> u32 {
        self.equipment
            .iter()
            .flatten()
            .map(|piece| piece.protection_points())
            .sum()
    }
}
