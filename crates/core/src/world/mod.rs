//! Read-only world access consumed by the decision core.
//!
//! The game-session collaborator implements [`WorldView`] over its live block
//! and entity tables. [`BlockGrid`] is a self-contained implementation for
//! offline planning and tests.
mod error;
mod grid;
mod raycast;

pub use error::WorldError;
pub use grid::BlockGrid;
pub use raycast::first_solid;

use crate::entity::EntitySnapshot;
use crate::geometry::{BlockPos, Vec3};

/// Block materials the core distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BlockKind {
    Air,
    Bedrock,
    Obsidian,
    /// Any other full collision block.
    Solid,
    /// Blocks without collision (grass, flowers, fluids).
    Passable,
}

impl BlockKind {
    pub const fn is_solid(self) -> bool {
        matches!(self, Self::Bedrock | Self::Obsidian | Self::Solid)
    }

    /// Materials a detonatable entity may be placed on.
    pub const fn supports_placement(self) -> bool {
        matches!(self, Self::Bedrock | Self::Obsidian)
    }
}

/// Block and entity queries provided by the game session.
pub trait WorldView: Send + Sync {
    /// Block at `pos`, or `None` when the chunk is not loaded.
    fn block_at(&self, pos: BlockPos) -> Option<BlockKind>;

    /// Every entity currently tracked by the session.
    fn entities(&self) -> Vec<EntitySnapshot>;

    fn is_solid(&self, pos: BlockPos) -> bool {
        self.block_at(pos).is_some_and(BlockKind::is_solid)
    }

    /// Unloaded blocks are never reported as air.
    fn is_air(&self, pos: BlockPos) -> bool {
        matches!(self.block_at(pos), Some(BlockKind::Air))
    }

    /// First solid block on the segment `from → to`, if any.
    fn raycast(&self, from: Vec3, to: Vec3) -> Option<BlockPos> {
        first_solid(self, from, to)
    }

    /// Blocks within `radius` of `center` accepted by `matching`, nearest first.
    ///
    /// Ties keep scan order (x, then y, then z ascending).
    fn find_blocks(
        &self,
        center: Vec3,
        radius: f64,
        max_count: usize,
        matching: &mut dyn FnMut(BlockPos, BlockKind) -> bool,
    ) -> Vec<BlockPos> {
        let min = center.offset(-radius, -radius, -radius).floored();
        let max = center.offset(radius, radius, radius).floored();

        let mut found: Vec<(f64, BlockPos)> = Vec::new();
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    let pos = BlockPos::new(x, y, z);
                    let distance = pos.distance_to(center);
                    if distance > radius {
                        continue;
                    }
                    if let Some(kind) = self.block_at(pos)
                        && matching(pos, kind)
                    {
                        found.push((distance, pos));
                    }
                }
            }
        }

        found.sort_by(|a, b| a.0.total_cmp(&b.0));
        found.truncate(max_count);
        found.into_iter().map(|(_, pos)| pos).collect()
    }
}
