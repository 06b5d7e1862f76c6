use thiserror::Error;

use crystal_core::WorldError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("world setup failed: {0}")]
    World(#[from] WorldError),

    #[error("agent must be a player, got {0}")]
    AgentNotPlayer(String),
}
