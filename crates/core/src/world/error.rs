use thiserror::Error;

use crate::entity::EntityId;
use crate::geometry::BlockPos;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    #[error("region corner {min} exceeds {max} on at least one axis")]
    InvalidRegion { min: BlockPos, max: BlockPos },

    #[error("entity {0} already exists")]
    DuplicateEntity(EntityId),

    #[error("entity {0} not found")]
    UnknownEntity(EntityId),
}
