//! Placement candidate search.
//!
//! One search runs per decision cycle: a geometric scan, an optional safety
//! filter, then ordering by the configured priority. With damage priority a
//! single lethal candidate wins outright and multi-placement groups are
//! chosen so that no two spawn volumes overlap.

mod candidate;
mod combine;
mod scan;
mod settings;

pub use candidate::{PlacementCandidate, PlacementPlan};
pub use combine::{SEED_COUNT, best_group, take_non_colliding};
pub use scan::{BACKUP_MIN_TARGET_XZ, BACKUP_SCAN_RADIUS, ScanAlgorithm, scan};
pub use settings::{PlacementPriority, SafetyMode, SearchSettings};

use crate::damage::DamageModel;
use crate::game::GameRules;
use crate::geometry::BlockPos;
use crate::profile::TargetProfile;
use crate::world::WorldView;

/// Everything a search reads. Borrowed for the duration of one cycle.
pub struct SearchContext<'a, W: WorldView + ?Sized> {
    pub world: &'a W,
    pub agent: &'a TargetProfile,
    pub target: &'a TargetProfile,
    pub rules: GameRules,
    pub model: DamageModel,
}

impl<'a, W: WorldView + ?Sized> SearchContext<'a, W> {
    pub fn new(world: &'a W, agent: &'a TargetProfile, target: &'a TargetProfile, rules: GameRules) -> Self {
        Self {
            world,
            agent,
            target,
            rules,
            model: DamageModel::new(rules.difficulty),
        }
    }

    pub fn with_model(mut self, model: DamageModel) -> Self {
        self.model = model;
        self
    }

    /// Whether the self-damage gates apply under `mode` and the current rules.
    fn safety_gated(&self, mode: SafetyMode) -> bool {
        mode == SafetyMode::Safe && !self.rules.ignores_self_damage()
    }
}

/// Chooses the placements for this cycle, or `None` when nothing qualifies.
pub fn find_candidates<W>(ctx: &SearchContext<'_, W>, settings: &SearchSettings) -> Option<PlacementPlan>
where
    W: WorldView + ?Sized,
{
    let algorithm = if settings.use_backup_algorithm {
        ScanAlgorithm::Backup
    } else {
        ScanAlgorithm::Primary
    };
    search_with(ctx, settings, algorithm)
}

/// Scan results before any ranking.
///
/// With `raw` the safety filter is skipped as well.
pub fn possible_positions<W>(ctx: &SearchContext<'_, W>, settings: &SearchSettings, raw: bool) -> Vec<BlockPos>
where
    W: WorldView + ?Sized,
{
    let algorithm = if settings.use_backup_algorithm {
        ScanAlgorithm::Backup
    } else {
        ScanAlgorithm::Primary
    };
    let mut candidates = scan(ctx, settings, algorithm);
    if !raw {
        candidates = safety_filter(ctx, settings, candidates);
    }
    candidates.iter().map(PlacementCandidate::block).collect()
}

fn search_with<W>(ctx: &SearchContext<'_, W>, settings: &SearchSettings, algorithm: ScanAlgorithm) -> Option<PlacementPlan>
where
    W: WorldView + ?Sized,
{
    let wanted = settings.placements_per_tick.max(1);
    let used_backup = algorithm == ScanAlgorithm::Backup;
    let mut candidates = safety_filter(ctx, settings, scan(ctx, settings, algorithm));

    let chosen = match settings.priority {
        PlacementPriority::None => take_non_colliding(candidates, wanted),
        PlacementPriority::Distance => {
            let target = ctx.target.position;
            candidates.sort_by(|a, b| {
                a.spawn_point()
                    .distance_to(target)
                    .total_cmp(&b.spawn_point().distance_to(target))
            });
            take_non_colliding(candidates, wanted)
        }
        PlacementPriority::Damage => {
            if let Some(health) = ctx.target.health
                && let Some(lethal) = candidates
                    .iter()
                    .position(|c| c.target_damage(ctx).is_some_and(|damage| damage >= health))
            {
                let kill = candidates.swap_remove(lethal);
                return Some(PlacementPlan::new(vec![kill], used_backup));
            }

            let gated = ctx.safety_gated(settings.place_mode);
            let mut ranked: Vec<PlacementCandidate> = candidates
                .into_iter()
                .filter(|c| {
                    let damage = c.ranking_damage(ctx);
                    damage > settings.min_target_damage && (!gated || c.self_damage_bound(ctx) < damage)
                })
                .collect();

            if ranked.is_empty() {
                return match algorithm {
                    ScanAlgorithm::Primary => search_with(ctx, settings, ScanAlgorithm::Backup),
                    ScanAlgorithm::Backup => None,
                };
            }

            ranked.sort_by(|a, b| b.ranking_damage(ctx).total_cmp(&a.ranking_damage(ctx)));
            if wanted > 1 {
                best_group(ctx, ranked, wanted)
            } else {
                ranked.truncate(1);
                ranked
            }
        }
    };

    (!chosen.is_empty()).then(|| PlacementPlan::new(chosen, used_backup))
}

fn safety_filter<W>(
    ctx: &SearchContext<'_, W>,
    settings: &SearchSettings,
    candidates: Vec<PlacementCandidate>,
) -> Vec<PlacementCandidate>
where
    W: WorldView + ?Sized,
{
    if !ctx.safety_gated(settings.place_mode) {
        return candidates;
    }
    let health = ctx.agent.health;
    candidates
        .into_iter()
        .filter(|c| {
            let damage = c.self_damage_bound(ctx);
            damage < settings.max_self_damage
                && damage < settings.min_self_health
                && health.is_none_or(|h| damage < h)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Attribute;
    use crate::entity::{EntityId, EntitySnapshot};
    use crate::game::{Difficulty, GameMode};
    use crate::geometry::Vec3;
    use crate::profile::{ArmorPiece, ArmorSlot};
    use crate::world::{BlockGrid, BlockKind};

    const A: BlockPos = BlockPos::new(3, 64, 3);
    const B: BlockPos = BlockPos::new(7, 64, 3);
    const C: BlockPos = BlockPos::new(7, 64, -3);
    const D: BlockPos = BlockPos::new(3, 64, -3);
    const E: BlockPos = BlockPos::new(4, 64, 2);

    fn floor() -> BlockGrid {
        let mut world = BlockGrid::new();
        world
            .fill(BlockPos::new(-10, 64, -10), BlockPos::new(10, 64, 10), BlockKind::Solid)
            .unwrap();
        world
    }

    fn arena(obsidian: &[BlockPos]) -> BlockGrid {
        let mut world = floor();
        for pos in obsidian {
            world.set(*pos, BlockKind::Obsidian);
        }
        world
    }

    fn agent() -> TargetProfile {
        let body = EntitySnapshot::player(EntityId(1), "agent", Vec3::new(0.5, 65.0, 0.5));
        let mut profile = TargetProfile::from_entity(&body)
            .with_health(20.0)
            .with_armor(Attribute::new(20.0), Attribute::new(12.0))
            .with_resistance(3);
        for slot in [ArmorSlot::Head, ArmorSlot::Torso, ArmorSlot::Legs, ArmorSlot::Feet] {
            profile = profile.with_piece(slot, ArmorPiece::new(4, 0));
        }
        profile
    }

    fn target(health: Option<f64>) -> TargetProfile {
        let body = EntitySnapshot::player(EntityId(2), "target", Vec3::new(5.5, 65.0, 0.5));
        let mut profile = TargetProfile::from_entity(&body).with_armor(Attribute::new(0.0), Attribute::new(0.0));
        profile.health = health;
        profile
    }

    fn with_bodies(mut world: BlockGrid, agent: &TargetProfile, target: &TargetProfile) -> BlockGrid {
        world
            .spawn(EntitySnapshot::player(agent.id, agent.name.clone(), agent.position))
            .unwrap();
        world
            .spawn(EntitySnapshot::player(target.id, target.name.clone(), target.position))
            .unwrap();
        world
    }

    fn settings() -> SearchSettings {
        SearchSettings {
            place_distance: 8.0,
            max_self_damage: 10.0,
            ..SearchSettings::default()
        }
    }

    #[test]
    fn lethal_candidate_short_circuits_multi_placement() {
        let (agent, target) = (agent(), target(Some(10.0)));
        let world = with_bodies(arena(&[A, B, C, D, E]), &agent, &target);
        let ctx = SearchContext::new(&world, &agent, &target, GameRules::default());
        let settings = SearchSettings {
            placements_per_tick: 3,
            ..settings()
        };

        let plan = find_candidates(&ctx, &settings).expect("plan");
        assert_eq!(plan.len(), 1);
        let damage = plan.candidates()[0].target_damage(&ctx).unwrap();
        assert!(damage >= 10.0);
    }

    #[test]
    fn unknown_health_is_never_lethal() {
        let (agent, target) = (agent(), target(None));
        let world = with_bodies(arena(&[A, B, C, D, E]), &agent, &target);
        let ctx = SearchContext::new(&world, &agent, &target, GameRules::default());
        let settings = SearchSettings {
            placements_per_tick: 3,
            ..settings()
        };

        let plan = find_candidates(&ctx, &settings).expect("plan");
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn multi_placement_volumes_do_not_overlap() {
        let (agent, target) = (agent(), target(Some(1000.0)));
        let world = with_bodies(arena(&[A, B, C, D, E]), &agent, &target);
        let ctx = SearchContext::new(&world, &agent, &target, GameRules::default());
        let settings = SearchSettings {
            placements_per_tick: 3,
            place_mode: SafetyMode::Suicide,
            ..settings()
        };

        let plan = find_candidates(&ctx, &settings).expect("plan");
        assert_eq!(plan.len(), 3);
        assert!(plan.is_collision_free());
        assert!(!(plan.positions().contains(&A) && plan.positions().contains(&E)));
    }

    #[test]
    fn safe_mode_only_returns_survivable_placements() {
        let (agent, target) = (agent(), target(Some(1000.0)));
        let world = with_bodies(arena(&[A, B, C, D, E]), &agent, &target);
        let ctx = SearchContext::new(&world, &agent, &target, GameRules::default());
        let settings = SearchSettings {
            max_self_damage: 3.0,
            placements_per_tick: 2,
            ..settings()
        };

        let plan = find_candidates(&ctx, &settings).expect("plan");
        assert!(!plan.is_empty());
        for candidate in plan.candidates() {
            let damage = candidate.self_damage_bound(&ctx);
            assert!(damage < 3.0);
            assert!(damage < agent.health.unwrap());
        }
    }

    #[test]
    fn self_health_floor_is_a_strict_gate() {
        let (agent, target) = (agent(), target(Some(1000.0)));
        let world = with_bodies(arena(&[E]), &agent, &target);
        let ctx = SearchContext::new(&world, &agent, &target, GameRules::default());
        let damage = PlacementCandidate::new(E).self_damage_bound(&ctx);
        assert!(damage > 0.0);

        let at_floor = SearchSettings {
            min_self_health: damage,
            ..settings()
        };
        assert!(possible_positions(&ctx, &at_floor, false).is_empty());
        assert_eq!(possible_positions(&ctx, &at_floor, true), vec![E]);

        let above_floor = SearchSettings {
            min_self_health: damage + 1.0,
            ..settings()
        };
        assert_eq!(possible_positions(&ctx, &above_floor, false), vec![E]);

        let suicide = SearchSettings {
            place_mode: SafetyMode::Suicide,
            ..at_floor
        };
        assert_eq!(possible_positions(&ctx, &suicide, false), vec![E]);
    }

    #[test]
    fn creative_ignores_self_damage_gate() {
        let (agent, target) = (agent(), target(Some(1000.0)));
        let world = with_bodies(arena(&[A, B, C, D, E]), &agent, &target);
        let rules = GameRules::new(Difficulty::Normal, GameMode::Creative);
        let ctx = SearchContext::new(&world, &agent, &target, rules);
        let settings = SearchSettings {
            max_self_damage: 0.0,
            ..settings()
        };

        assert!(find_candidates(&ctx, &settings).is_some());
    }

    #[test]
    fn backup_scan_recovers_blocked_placement() {
        let (agent, target) = (agent(), target(Some(100.0)));
        let spot = BlockPos::new(6, 64, -2);
        let mut world = with_bodies(arena(&[spot]), &agent, &target);
        world
            .spawn(EntitySnapshot::mob(
                EntityId(3),
                "zombie",
                Vec3::new(6.5, 65.0, -1.5),
                0.6,
                1.95,
            ))
            .unwrap();
        let ctx = SearchContext::new(&world, &agent, &target, GameRules::default());
        let settings = SearchSettings {
            place_distance: 6.5,
            ..settings()
        };

        assert!(possible_positions(&ctx, &settings, true).is_empty());
        let plan = find_candidates(&ctx, &settings).expect("backup plan");
        assert!(plan.used_backup());
        assert_eq!(plan.positions(), vec![spot]);
    }

    #[test]
    fn detonatable_in_cell_blocks_both_scans() {
        let (agent, target) = (agent(), target(Some(100.0)));
        let spot = BlockPos::new(6, 64, -2);
        let mut world = with_bodies(arena(&[spot]), &agent, &target);
        world
            .spawn(EntitySnapshot::end_crystal(EntityId(3), spot.spawn_point()))
            .unwrap();
        let ctx = SearchContext::new(&world, &agent, &target, GameRules::default());

        assert!(find_candidates(&ctx, &settings()).is_none());
    }

    #[test]
    fn distance_priority_prefers_closest_to_target() {
        let (agent, target) = (agent(), target(Some(1000.0)));
        let world = with_bodies(arena(&[A, B, C, D, E]), &agent, &target);
        let ctx = SearchContext::new(&world, &agent, &target, GameRules::default());
        let settings = SearchSettings {
            priority: PlacementPriority::Distance,
            place_mode: SafetyMode::Suicide,
            ..settings()
        };

        let plan = find_candidates(&ctx, &settings).expect("plan");
        assert_eq!(plan.positions(), vec![E]);
    }

    #[test]
    fn no_priority_keeps_scan_order() {
        let (agent, target) = (agent(), target(Some(1000.0)));
        let world = with_bodies(arena(&[A, B, C, D, E]), &agent, &target);
        let ctx = SearchContext::new(&world, &agent, &target, GameRules::default());
        let settings = SearchSettings {
            priority: PlacementPriority::None,
            place_mode: SafetyMode::Suicide,
            ..settings()
        };

        let plan = find_candidates(&ctx, &settings).expect("plan");
        assert_eq!(plan.positions(), vec![A]);
    }

    #[test]
    fn supporting_block_and_unsupported_blocks_are_skipped() {
        let (agent, target) = (agent(), target(Some(1000.0)));
        let mut world = with_bodies(floor(), &agent, &target);
        world.set(BlockPos::new(0, 64, 0), BlockKind::Obsidian);
        let ctx = SearchContext::new(&world, &agent, &target, GameRules::default());

        assert!(possible_positions(&ctx, &settings(), true).is_empty());
        assert!(find_candidates(&ctx, &settings()).is_none());
    }

    #[test]
    fn candidate_damage_is_memoized() {
        let (agent, target) = (agent(), target(Some(1000.0)));
        let world = with_bodies(arena(&[E]), &agent, &target);
        let ctx = SearchContext::new(&world, &agent, &target, GameRules::default());
        let candidate = PlacementCandidate::new(E);

        let first = candidate.raw_target_damage(&ctx);
        let mut changed = world.clone();
        changed.set(BlockPos::new(5, 65, 1), BlockKind::Bedrock);
        let later = SearchContext::new(&changed, &agent, &target, GameRules::default());
        assert_eq!(candidate.raw_target_damage(&later), first);
    }
}
