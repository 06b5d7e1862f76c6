//! Safe-hole detection.
//!
//! A hole is a blast-resistant floor block with three air blocks above it and
//! blast-resistant walls on all four horizontal sides of the first air block.

use crate::geometry::{BlockPos, Vec3};
use crate::world::{BlockKind, WorldView};

pub const HOLE_SCAN_RADIUS: f64 = 10.0;
pub const HOLE_SCAN_LIMIT: usize = 2000;

/// Holes closer than this to the agent are not reported.
pub const MIN_HOLE_DISTANCE: f64 = 2.0;

const WALLS: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// Ordering applied to reported holes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HoleMode {
    /// Scan order.
    #[default]
    Passive,
    /// Closest to the focus point first.
    Aggressive,
    /// Farthest from the focus point first.
    Defensive,
    /// Farthest from the focus point first, for backing away from a threat.
    Retreat,
}

fn resists_blast(kind: Option<BlockKind>) -> bool {
    kind.is_some_and(BlockKind::supports_placement)
}

/// Whether `floor` is the bottom block of a hole.
pub fn is_hole<W>(world: &W, floor: BlockPos) -> bool
where
    W: WorldView + ?Sized,
{
    (1..=3).all(|dy| world.is_air(floor.offset(0, dy, 0)))
        && WALLS
            .iter()
            .all(|&(dx, dz)| resists_blast(world.block_at(floor.offset(dx, 1, dz))))
}

/// Whether the block under `position` is a hole floor.
pub fn is_in_hole<W>(world: &W, position: Vec3) -> bool
where
    W: WorldView + ?Sized,
{
    is_hole(world, position.floored().offset(0, -1, 0))
}

/// Hole floors within [`HOLE_SCAN_RADIUS`] of `focus` (or the agent), ordered by `mode`.
pub fn find_holes<W>(world: &W, agent: Vec3, focus: Option<Vec3>, mode: HoleMode) -> Vec<BlockPos>
where
    W: WorldView + ?Sized,
{
    let center = focus.unwrap_or(agent);

    let mut holes: Vec<BlockPos> = world
        .find_blocks(center, HOLE_SCAN_RADIUS, HOLE_SCAN_LIMIT, &mut |_, kind| {
            kind.supports_placement()
        })
        .into_iter()
        .filter(|floor| is_hole(world, *floor))
        .filter(|floor| floor.distance_to(agent) >= MIN_HOLE_DISTANCE)
        .collect();

    match mode {
        HoleMode::Passive => {}
        HoleMode::Aggressive => {
            holes.sort_by(|a, b| a.distance_to(center).total_cmp(&b.distance_to(center)));
        }
        HoleMode::Defensive | HoleMode::Retreat => {
            holes.sort_by(|a, b| b.distance_to(center).total_cmp(&a.distance_to(center)));
        }
    }
    holes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::BlockGrid;

    fn dig_hole(world: &mut BlockGrid, floor: BlockPos, wall: BlockKind) {
        world.set(floor, BlockKind::Bedrock);
        for (dx, dz) in WALLS {
            world.set(floor.offset(dx, 1, dz), wall);
        }
    }

    #[test]
    fn walls_of_obsidian_or_bedrock_make_a_hole() {
        let mut world = BlockGrid::new();
        dig_hole(&mut world, BlockPos::new(0, 64, 0), BlockKind::Obsidian);
        assert!(is_hole(&world, BlockPos::new(0, 64, 0)));
        assert!(is_in_hole(&world, Vec3::new(0.5, 65.0, 0.5)));

        world.set(BlockPos::new(1, 65, 0), BlockKind::Solid);
        assert!(!is_hole(&world, BlockPos::new(0, 64, 0)));
    }

    #[test]
    fn blocked_headroom_is_not_a_hole() {
        let mut world = BlockGrid::new();
        dig_hole(&mut world, BlockPos::new(0, 64, 0), BlockKind::Bedrock);
        world.set(BlockPos::new(0, 67, 0), BlockKind::Solid);
        assert!(!is_hole(&world, BlockPos::new(0, 64, 0)));
    }

    #[test]
    fn modes_order_holes_and_skip_the_one_underfoot() {
        let mut world = BlockGrid::new();
        let near = BlockPos::new(4, 64, 0);
        let far = BlockPos::new(-2, 64, 0);
        let underfoot = BlockPos::new(0, 64, 0);
        for floor in [near, far, underfoot] {
            dig_hole(&mut world, floor, BlockKind::Bedrock);
        }
        let agent = Vec3::new(0.5, 65.0, 0.5);
        let threat = Some(Vec3::new(6.5, 65.0, 0.5));

        let aggressive = find_holes(&world, agent, threat, HoleMode::Aggressive);
        assert_eq!(aggressive, vec![near, far]);

        let defensive = find_holes(&world, agent, threat, HoleMode::Defensive);
        assert_eq!(defensive.first(), Some(&far));

        let retreat = find_holes(&world, agent, threat, HoleMode::Retreat);
        assert_eq!(retreat.first(), Some(&far));
    }
}
