//! Entity snapshots as reported by the game-session collaborator.

use std::fmt;

use crate::geometry::{Aabb, Vec3};

/// Session-assigned entity identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Coarse entity classification used by target acquisition and clearance checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityKind {
    Player,
    Mob,
    /// Placeable entity that explodes when attacked.
    Detonatable,
    /// Items, projectiles and anything else without a hitbox that matters.
    Object,
}

impl EntityKind {
    pub const fn is_living(self) -> bool {
        matches!(self, Self::Player | Self::Mob)
    }
}

/// Read-only view of one world entity at the time of the query.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    pub position: Vec3,
    pub width: f64,
    pub height: f64,
    pub team: Option<String>,
}

impl EntitySnapshot {
    pub const PLAYER_WIDTH: f64 = 0.6;
    pub const PLAYER_HEIGHT: f64 = 1.8;
    pub const CRYSTAL_SIZE: f64 = 2.0;

    pub fn player(id: EntityId, name: impl Into<String>, position: Vec3) -> Self {
        Self {
            id,
            kind: EntityKind::Player,
            name: name.into(),
            position,
            width: Self::PLAYER_WIDTH,
            height: Self::PLAYER_HEIGHT,
            team: None,
        }
    }

    pub fn end_crystal(id: EntityId, position: Vec3) -> Self {
        Self {
            id,
            kind: EntityKind::Detonatable,
            name: "end_crystal".to_owned(),
            position,
            width: Self::CRYSTAL_SIZE,
            height: Self::CRYSTAL_SIZE,
            team: None,
        }
    }

    pub fn mob(id: EntityId, name: impl Into<String>, position: Vec3, width: f64, height: f64) -> Self {
        Self {
            id,
            kind: EntityKind::Mob,
            name: name.into(),
            position,
            width,
            height,
            team: None,
        }
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    pub fn hitbox(&self) -> Aabb {
        Aabb::anchored(self.position, self.width / 2.0, self.height)
    }

    pub fn is_living(&self) -> bool {
        self.kind.is_living()
    }

    pub fn is_detonatable(&self) -> bool {
        self.kind == EntityKind::Detonatable
    }

    /// Same non-empty team label as `other`.
    pub fn is_teammate_of(&self, other: &EntitySnapshot) -> bool {
        matches!((&self.team, &other.team), (Some(a), Some(b)) if a == b)
    }
}
