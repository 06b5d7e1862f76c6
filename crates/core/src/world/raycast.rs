//! Voxel traversal (Amanatides & Woo) over full-cube collision blocks.

use super::WorldView;
use crate::geometry::{BlockPos, Vec3};

/// Walks every block cell the segment `from → to` passes through and returns
/// the first solid one. The starting cell is included.
pub fn first_solid<W>(world: &W, from: Vec3, to: Vec3) -> Option<BlockPos>
where
    W: WorldView + ?Sized,
{
    let delta = to - from;
    let range = delta.length();
    if range == 0.0 {
        return None;
    }
    let dir = delta * (1.0 / range);

    let mut cell = from.floored();
    let (step_x, mut t_max_x, t_delta_x) = axis(from.x, cell.x, dir.x);
    let (step_y, mut t_max_y, t_delta_y) = axis(from.y, cell.y, dir.y);
    let (step_z, mut t_max_z, t_delta_z) = axis(from.z, cell.z, dir.z);

    loop {
        if world.is_solid(cell) {
            return Some(cell);
        }

        if t_max_x <= t_max_y && t_max_x <= t_max_z {
            if t_max_x > range {
                return None;
            }
            cell.x += step_x;
            t_max_x += t_delta_x;
        } else if t_max_y <= t_max_z {
            if t_max_y > range {
                return None;
            }
            cell.y += step_y;
            t_max_y += t_delta_y;
        } else {
            if t_max_z > range {
                return None;
            }
            cell.z += step_z;
            t_max_z += t_delta_z;
        }
    }
}

/// Step direction, distance to the first boundary, and distance between boundaries.
fn axis(origin: f64, cell: i32, dir: f64) -> (i32, f64, f64) {
    if dir > 0.0 {
        (1, (cell as f64 + 1.0 - origin) / dir, 1.0 / dir)
    } else if dir < 0.0 {
        (-1, (cell as f64 - origin) / dir, -1.0 / dir)
    } else {
        (0, f64::INFINITY, f64::INFINITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{BlockGrid, BlockKind};

    #[test]
    fn open_air_is_unobstructed() {
        let world = BlockGrid::new();
        assert_eq!(
            first_solid(&world, Vec3::new(0.5, 1.5, 0.5), Vec3::new(5.5, 3.0, -2.0)),
            None
        );
    }

    #[test]
    fn wall_between_points_is_hit() {
        let mut world = BlockGrid::new();
        world.set(BlockPos::new(3, 1, 0), BlockKind::Obsidian);

        let hit = first_solid(&world, Vec3::new(0.5, 1.5, 0.5), Vec3::new(6.5, 1.5, 0.5));
        assert_eq!(hit, Some(BlockPos::new(3, 1, 0)));
    }

    #[test]
    fn wall_beyond_target_is_ignored() {
        let mut world = BlockGrid::new();
        world.set(BlockPos::new(8, 1, 0), BlockKind::Obsidian);

        let hit = first_solid(&world, Vec3::new(0.5, 1.5, 0.5), Vec3::new(6.5, 1.5, 0.5));
        assert_eq!(hit, None);
    }

    #[test]
    fn passable_blocks_do_not_obstruct() {
        let mut world = BlockGrid::new();
        world.set(BlockPos::new(3, 1, 0), BlockKind::Passable);

        let hit = first_solid(&world, Vec3::new(0.5, 1.5, 0.5), Vec3::new(6.5, 1.5, 0.5));
        assert_eq!(hit, None);
    }
}
