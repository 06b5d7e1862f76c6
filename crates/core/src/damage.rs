//! Explosion damage estimation.
//!
//! # Formula
//!
//! ```text
//! radius   = 2 × power
//! impact   = (1 - distance / radius) × exposure
//! raw      = floor((impact² + impact) × multiplier × power + 1)
//! absorbed = raw × (1 - clamp(armor - raw / (2 + toughness / 4), armor / 5, 20) / 25)
//! enchant  = absorbed × (1 - min(Σ protection + 2 × Σ blast_protection, 20) / 25)
//! resisted = enchant × (1 - resistance / 5)
//! final    = floor(resisted × difficulty_scale)        (players only)
//! ```
//!
//! Self-damage uses the same model with the agent's own profile.

use crate::attributes::Attribute;
use crate::game::Difficulty;
use crate::geometry::Vec3;
use crate::profile::TargetProfile;
use crate::world::WorldView;

/// Damage multiplier for current game versions.
pub const MODERN_DAMAGE_MULTIPLIER: f64 = 8.0;

/// Explosion power of an end crystal.
pub const END_CRYSTAL_POWER: f64 = 6.0;

/// Reference hitbox the exposure grid is derived from.
const SAMPLE_WIDTH: f64 = 0.6;
const SAMPLE_HEIGHT: f64 = 1.8;

/// Enchantment protection stops counting past this many points.
const MAX_PROTECTION_POINTS: u32 = 20;

/// Fraction of sample points on the subject's hitbox with a clear line to `origin`.
pub fn exposure<W>(world: &W, subject: Vec3, origin: Vec3) -> f64
where
    W: WorldView + ?Sized,
{
    let dx = 1.0 / (SAMPLE_WIDTH * 2.0 + 1.0);
    let dy = 1.0 / (SAMPLE_HEIGHT * 2.0 + 1.0);
    let inset = (1.0 - (1.0 / dx).floor() * dx) / 2.0;

    let half = SAMPLE_WIDTH / 2.0;
    let step_xz = SAMPLE_WIDTH * dx;
    let step_y = SAMPLE_HEIGHT * dy;

    let mut sampled = 0u32;
    let mut exposed = 0u32;

    let mut iy = 0u32;
    while iy as f64 * step_y <= SAMPLE_HEIGHT {
        let y = subject.y + iy as f64 * step_y;
        let mut ix = 0u32;
        while inset + ix as f64 * step_xz <= SAMPLE_WIDTH {
            let x = subject.x - half + inset + ix as f64 * step_xz;
            let mut iz = 0u32;
            while inset + iz as f64 * step_xz <= SAMPLE_WIDTH {
                let z = subject.z - half + inset + iz as f64 * step_xz;
                if world.raycast(origin, Vec3::new(x, y, z)).is_none() {
                    exposed += 1;
                }
                sampled += 1;
                iz += 1;
            }
            ix += 1;
        }
        iy += 1;
    }

    if sampled == 0 {
        0.0
    } else {
        exposed as f64 / sampled as f64
    }
}

/// Unmitigated damage for a given distance and exposure. Zero outside the radius.
pub fn impact_damage(distance: f64, exposure: f64, power: f64, multiplier: f64) -> f64 {
    let radius = 2.0 * power;
    if distance >= radius {
        return 0.0;
    }
    let impact = (1.0 - distance / radius) * exposure;
    ((impact * impact + impact) * multiplier * power + 1.0).floor()
}

/// Armor and toughness absorption.
pub fn absorb_armor(damage: f64, armor: f64, toughness: f64) -> f64 {
    let var3 = 2.0 + toughness / 4.0;
    // max-then-min rather than clamp: the lower bound can exceed 20.
    let var4 = (armor - damage / var3).max(armor * 0.2).min(20.0);
    damage * (1.0 - var4 / 25.0)
}

pub fn apply_enchantments(damage: f64, protection_points: u32) -> f64 {
    damage * (1.0 - protection_points.min(MAX_PROTECTION_POINTS) as f64 / 25.0)
}

pub fn apply_resistance(damage: f64, level: u8) -> f64 {
    damage * (1.0 - level as f64 / 5.0).max(0.0)
}

/// Explosion parameters plus the session difficulty.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageModel {
    pub power: f64,
    pub damage_multiplier: f64,
    pub difficulty: Difficulty,
}

impl Default for DamageModel {
    fn default() -> Self {
        Self::new(Difficulty::default())
    }
}

impl DamageModel {
    pub const fn new(difficulty: Difficulty) -> Self {
        Self {
            power: END_CRYSTAL_POWER,
            damage_multiplier: MODERN_DAMAGE_MULTIPLIER,
            difficulty,
        }
    }

    pub const fn with_power(mut self, power: f64) -> Self {
        self.power = power;
        self
    }

    pub fn radius(&self) -> f64 {
        2.0 * self.power
    }

    /// Raw damage to a subject standing at `subject`.
    pub fn raw<W>(&self, world: &W, subject: Vec3, origin: Vec3) -> f64
    where
        W: WorldView + ?Sized,
    {
        let distance = subject.distance_to(origin);
        if distance >= self.radius() {
            return 0.0;
        }
        let exposure = exposure(world, subject, origin);
        impact_damage(distance, exposure, self.power, self.damage_multiplier)
    }

    /// Expected damage to `subject` from an explosion at `origin`.
    ///
    /// Returns `None` when mitigation was requested but the subject exposes no
    /// armor attribute. Callers must not read that as zero damage.
    pub fn estimate<W>(
        &self,
        world: &W,
        subject: &TargetProfile,
        origin: Vec3,
        raw_only: bool,
    ) -> Option<f64>
    where
        W: WorldView + ?Sized,
    {
        if subject.position.distance_to(origin) >= self.radius() {
            return Some(0.0);
        }
        let raw = self.raw(world, subject.position, origin);
        if raw_only {
            Some(raw)
        } else {
            self.mitigate(subject, raw)
        }
    }

    /// Applies armor, enchantments, resistance and difficulty to a raw value.
    pub fn mitigate(&self, subject: &TargetProfile, raw: f64) -> Option<f64> {
        let armor = subject.armor.as_ref()?.value();
        let toughness = subject
            .armor_toughness
            .as_ref()
            .map_or(0.0, Attribute::value);

        let mut damage = absorb_armor(raw, armor, toughness);
        damage = apply_enchantments(damage, subject.protection_points());
        damage = apply_resistance(damage, subject.resistance);
        if subject.is_player() {
            damage *= self.difficulty.damage_scale();
        }
        Some(damage.floor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityId, EntitySnapshot};
    use crate::geometry::BlockPos;
    use crate::profile::{ArmorPiece, ArmorSlot};
    use crate::world::{BlockGrid, BlockKind};

    fn player_at(position: Vec3) -> TargetProfile {
        TargetProfile::from_entity(&EntitySnapshot::player(EntityId(1), "target", position))
            .with_health(20.0)
    }

    #[test]
    fn nothing_at_or_beyond_radius() {
        let world = BlockGrid::new();
        let model = DamageModel::new(Difficulty::Normal);
        let origin = Vec3::new(0.5, 65.0, 0.5);
        for distance in [12.0, 12.5, 20.0, 100.0] {
            let target = player_at(origin.offset(distance, 0.0, 0.0));
            assert_eq!(model.estimate(&world, &target, origin, true), Some(0.0));
            assert_eq!(
                model.estimate(&world, &TargetProfile { armor: None, ..target }, origin, false),
                Some(0.0)
            );
        }
    }

    #[test]
    fn damage_never_decreases_with_exposure() {
        for distance in [0.0, 1.5, 4.0, 9.0, 11.9] {
            let mut previous = 0.0;
            for step in 0..=20 {
                let exposure = step as f64 / 20.0;
                let damage = impact_damage(distance, exposure, 6.0, MODERN_DAMAGE_MULTIPLIER);
                assert!(damage >= previous, "distance {distance} exposure {exposure}");
                previous = damage;
            }
        }
    }

    #[test]
    fn open_air_raw_damage_at_three_blocks() {
        let world = BlockGrid::new();
        let model = DamageModel::new(Difficulty::Normal);
        let origin = Vec3::new(0.5, 65.0, 0.5);
        let target = player_at(origin.offset(3.0, 0.0, 0.0));

        assert_eq!(exposure(&world, target.position, origin), 1.0);
        // impact = 0.75 → (0.5625 + 0.75) × 48 + 1 = 64
        assert_eq!(model.estimate(&world, &target, origin, true), Some(64.0));
    }

    #[test]
    fn fully_covered_target_takes_minimum_raw() {
        let mut world = BlockGrid::new();
        world
            .fill(BlockPos::new(2, 60, -3), BlockPos::new(2, 70, 3), BlockKind::Obsidian)
            .unwrap();
        let model = DamageModel::new(Difficulty::Normal);
        let origin = Vec3::new(0.5, 65.0, 0.5);
        let target = player_at(origin.offset(3.0, 0.0, 0.0));

        assert_eq!(exposure(&world, target.position, origin), 0.0);
        assert_eq!(model.raw(&world, target.position, origin), 1.0);
    }

    #[test]
    fn missing_armor_attribute_is_unknown_not_zero() {
        let world = BlockGrid::new();
        let model = DamageModel::new(Difficulty::Normal).with_power(6.0);
        let origin = Vec3::new(0.5, 65.0, 0.5);
        let target = player_at(origin.offset(0.0, 0.0, 3.0));

        assert_eq!(model.estimate(&world, &target, origin, false), None);
        assert!(model.estimate(&world, &target, origin, true).is_some());
    }

    #[test]
    fn full_mitigation_chain() {
        let world = BlockGrid::new();
        let model = DamageModel::new(Difficulty::Normal);
        let origin = Vec3::new(0.5, 65.0, 0.5);
        let mut target = player_at(origin.offset(3.0, 0.0, 0.0))
            .with_armor(Attribute::new(20.0), Attribute::new(8.0));
        for slot in [ArmorSlot::Head, ArmorSlot::Torso, ArmorSlot::Legs, ArmorSlot::Feet] {
            target = target.with_piece(slot, ArmorPiece::new(4, 0));
        }

        // 64 → absorb: var4 = clamp(20 - 16, 4, 20) = 4 → 53.76
        //    → enchant: 16 points → 19.3536 → floor 19
        assert_eq!(model.estimate(&world, &target, origin, false), Some(19.0));
    }

    #[test]
    fn blast_protection_counts_double_and_caps() {
        let heavy = TargetProfile::from_entity(&EntitySnapshot::player(EntityId(2), "p", Vec3::ZERO))
            .with_piece(ArmorSlot::Head, ArmorPiece::new(0, 4))
            .with_piece(ArmorSlot::Torso, ArmorPiece::new(0, 4))
            .with_piece(ArmorSlot::Legs, ArmorPiece::new(4, 4));
        assert_eq!(heavy.protection_points(), 28);
        assert_eq!(apply_enchantments(100.0, heavy.protection_points()), 20.0);
    }

    #[test]
    fn difficulty_scales_players_only() {
        let origin = Vec3::new(0.5, 65.0, 0.5);
        let player = player_at(origin.offset(3.0, 0.0, 0.0))
            .with_armor(Attribute::new(0.0), Attribute::new(0.0));
        let mob = TargetProfile {
            kind: crate::entity::EntityKind::Mob,
            ..player.clone()
        };

        let easy = DamageModel::new(Difficulty::Easy);
        assert_eq!(easy.mitigate(&player, 64.0), Some(32.0));
        assert_eq!(easy.mitigate(&mob, 64.0), Some(64.0));
        assert_eq!(DamageModel::new(Difficulty::Peaceful).mitigate(&player, 64.0), Some(0.0));
    }

    #[test]
    fn resistance_reduces_and_bottoms_out() {
        assert_eq!(apply_resistance(50.0, 1), 40.0);
        assert_eq!(apply_resistance(50.0, 5), 0.0);
        assert_eq!(apply_resistance(50.0, 9), 0.0);
    }

    #[test]
    fn mitigated_never_exceeds_raw_up_to_normal_difficulty() {
        let model = DamageModel::new(Difficulty::Normal);
        let base = player_at(Vec3::ZERO);
        for raw in [1.0, 7.0, 40.0, 97.0] {
            for armor in [0.0, 5.0, 20.0, 30.0, 150.0] {
                for toughness in [0.0, 2.0, 12.0] {
                    for (prot, res) in [(0u8, 0u8), (4, 1), (10, 2)] {
                        let subject = base
                            .clone()
                            .with_armor(Attribute::new(armor), Attribute::new(toughness))
                            .with_piece(ArmorSlot::Feet, ArmorPiece::new(prot, 0))
                            .with_resistance(res);
                        let mitigated = model.mitigate(&subject, raw).unwrap();
                        assert!(mitigated <= raw, "{mitigated} > {raw}");
                        assert!(mitigated >= 0.0);
                    }
                }
            }
        }
    }
}
