use std::collections::HashMap;

use super::{BlockKind, WorldError, WorldView};
use crate::entity::{EntityId, EntitySnapshot};
use crate::geometry::{BlockPos, Vec3};

/// Sparse in-memory world. Unset positions read as air.
#[derive(Clone, Debug, Default)]
pub struct BlockGrid {
    blocks: HashMap<BlockPos, BlockKind>,
    entities: Vec<EntitySnapshot>,
}

impl BlockGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, pos: BlockPos, kind: BlockKind) {
        if kind == BlockKind::Air {
            self.blocks.remove(&pos);
        } else {
            self.blocks.insert(pos, kind);
        }
    }

    /// Fills the inclusive box `min..=max`.
    pub fn fill(&mut self, min: BlockPos, max: BlockPos, kind: BlockKind) -> Result<(), WorldError> {
        if min.x > max.x || min.y > max.y || min.z > max.z {
            return Err(WorldError::InvalidRegion { min, max });
        }
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    self.set(BlockPos::new(x, y, z), kind);
                }
            }
        }
        Ok(())
    }

    pub fn spawn(&mut self, entity: EntitySnapshot) -> Result<(), WorldError> {
        if self.entity(entity.id).is_some() {
            return Err(WorldError::DuplicateEntity(entity.id));
        }
        self.entities.push(entity);
        Ok(())
    }

    pub fn despawn(&mut self, id: EntityId) -> Result<EntitySnapshot, WorldError> {
        let index = self
            .entities
            .iter()
            .position(|e| e.id == id)
            .ok_or(WorldError::UnknownEntity(id))?;
        Ok(self.entities.remove(index))
    }

    pub fn move_entity(&mut self, id: EntityId, position: Vec3) -> Result<(), WorldError> {
        let entity = self
            .entities
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(WorldError::UnknownEntity(id))?;
        entity.position = position;
        Ok(())
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|e| e.id == id)
    }
}

impl WorldView for BlockGrid {
    fn block_at(&self, pos: BlockPos) -> Option<BlockKind> {
        Some(self.blocks.get(&pos).copied().unwrap_or(BlockKind::Air))
    }

    fn entities(&self) -> Vec<EntitySnapshot> {
        self.entities.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_rejects_inverted_region() {
        let mut grid = BlockGrid::new();
        let err = grid
            .fill(BlockPos::new(2, 0, 0), BlockPos::new(0, 0, 0), BlockKind::Solid)
            .unwrap_err();
        assert!(matches!(err, WorldError::InvalidRegion { .. }));
    }

    #[test]
    fn find_blocks_returns_nearest_first() {
        let mut grid = BlockGrid::new();
        grid.set(BlockPos::new(3, 0, 0), BlockKind::Obsidian);
        grid.set(BlockPos::new(1, 0, 0), BlockKind::Obsidian);
        grid.set(BlockPos::new(2, 0, 0), BlockKind::Solid);

        let found = grid.find_blocks(Vec3::new(0.0, 0.0, 0.0), 5.0, 10, &mut |_, kind| {
            kind == BlockKind::Obsidian
        });
        assert_eq!(found, vec![BlockPos::new(1, 0, 0), BlockPos::new(3, 0, 0)]);
    }

    #[test]
    fn duplicate_entities_are_rejected() {
        let mut grid = BlockGrid::new();
        let crystal = EntitySnapshot::end_crystal(EntityId(4), Vec3::ZERO);
        grid.spawn(crystal.clone()).unwrap();
        assert_eq!(grid.spawn(crystal), Err(WorldError::DuplicateEntity(EntityId(4))));
        assert!(grid.despawn(EntityId(4)).is_ok());
        assert!(grid.entities().is_empty());
    }
}
