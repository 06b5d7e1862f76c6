//! Geometric candidate scans.

use super::{PlacementCandidate, SearchContext, SearchSettings};
use crate::entity::EntitySnapshot;
use crate::geometry::{Aabb, BlockPos};
use crate::world::{BlockKind, WorldView};

/// Radius of the backup scan around the target.
pub const BACKUP_SCAN_RADIUS: f64 = 5.0;

/// Minimum horizontal distance between a backup candidate and the target.
pub const BACKUP_MIN_TARGET_XZ: f64 = 1.3;

/// Which geometric heuristic produced a candidate list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ScanAlgorithm {
    /// Around the agent, with the placement cell clear of every living or
    /// detonatable entity.
    Primary,
    /// Around the target, with two air blocks above and only detonatable
    /// entities considered obstacles.
    Backup,
}

/// Blocks that could host a placement this cycle, nearest to the scan center first.
pub fn scan<W>(
    ctx: &SearchContext<'_, W>,
    settings: &SearchSettings,
    algorithm: ScanAlgorithm,
) -> Vec<PlacementCandidate>
where
    W: WorldView + ?Sized,
{
    let entities = ctx.world.entities();
    let agent = ctx.agent.position;
    let supporting = agent.offset(0.0, -0.01, 0.0).floored();

    let blocks = match algorithm {
        ScanAlgorithm::Primary => {
            let obstacles: Vec<Aabb> = obstacles(&entities, |e| e.is_living() || e.is_detonatable());
            ctx.world.find_blocks(
                agent,
                settings.place_distance,
                settings.scan_limit,
                &mut |pos: BlockPos, kind: BlockKind| {
                    kind.supports_placement()
                        && pos != supporting
                        && ctx.world.is_air(pos.above())
                        && is_clear(pos, &obstacles)
                },
            )
        }
        ScanAlgorithm::Backup => {
            let target = ctx.target.position;
            let obstacles: Vec<Aabb> = obstacles(&entities, EntitySnapshot::is_detonatable);
            ctx.world.find_blocks(
                target,
                BACKUP_SCAN_RADIUS,
                settings.scan_limit,
                &mut |pos: BlockPos, kind: BlockKind| {
                    kind.supports_placement()
                        && pos != supporting
                        && pos.distance_to(agent) <= settings.place_distance
                        && pos.xz_distance_to(target) >= BACKUP_MIN_TARGET_XZ
                        && ctx.world.is_air(pos.above())
                        && ctx.world.is_air(pos.offset(0, 2, 0))
                        && is_clear(pos, &obstacles)
                },
            )
        }
    };

    blocks.into_iter().map(PlacementCandidate::new).collect()
}

fn obstacles(entities: &[EntitySnapshot], keep: impl Fn(&EntitySnapshot) -> bool) -> Vec<Aabb> {
    entities
        .iter()
        .filter(|&e| keep(e))
        .map(EntitySnapshot::hitbox)
        .collect()
}

fn is_clear(pos: BlockPos, obstacles: &[Aabb]) -> bool {
    let cell = Aabb::placement_cell(pos);
    obstacles.iter().all(|hitbox| !hitbox.intersects(&cell))
}
