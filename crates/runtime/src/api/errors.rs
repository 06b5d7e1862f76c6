//! Error types surfaced by the runtime API.
//!
//! [`SessionError`] covers failures reported by the game-session collaborator;
//! [`RuntimeError`] wraps them together with scheduler-level refusals.
use thiserror::Error;

use crystal_core::EntityId;

use super::session::Item;
use crate::config::ConfigError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// The world refused the action, e.g. the block changed underfoot.
    #[error("action rejected: {0}")]
    Rejected(String),

    #[error("no {0} available")]
    ItemMissing(Item),

    #[error("entity {0} is not present")]
    EntityMissing(EntityId),

    #[error("session disconnected")]
    Disconnected,

    #[error("session failure: {0}")]
    Internal(String),
}

impl SessionError {
    /// Transient failures only invalidate the current candidate.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Rejected(_) | Self::EntityMissing(_))
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("automation is disabled")]
    Disabled,

    #[error("automation is already running")]
    AlreadyRunning,

    #[error("no eligible target in range")]
    NoTarget,

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}
