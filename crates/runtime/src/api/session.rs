//! The game-session collaborator.
//!
//! Protocol decoding, inventory transactions and entity bookkeeping live
//! outside this crate. A host adapts its client to [`GameSession`] and the
//! scheduler drives it through this interface only.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crystal_core::{BlockPos, EntityId, EntitySnapshot, GameRules, TargetProfile, Vec3, WorldView};

use super::errors::SessionError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Hand {
    #[default]
    Main,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Item {
    EndCrystal,
    Obsidian,
    Other,
}

impl Item {
    pub const fn is_detonatable(self) -> bool {
        matches!(self, Self::EndCrystal)
    }
}

/// Face of the reference block an entity is placed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockFace {
    Up,
    Down,
    North,
    South,
    East,
    West,
}

impl BlockFace {
    pub const fn normal(self) -> (i32, i32, i32) {
        match self {
            Self::Up => (0, 1, 0),
            Self::Down => (0, -1, 0),
            Self::North => (0, 0, -1),
            Self::South => (0, 0, 1),
            Self::East => (1, 0, 0),
            Self::West => (-1, 0, 0),
        }
    }
}

/// The agent's own state as of the current cycle.
#[derive(Debug, Clone)]
pub struct AgentStatus {
    pub profile: TargetProfile,
    pub team: Option<String>,
    pub rules: GameRules,
}

impl AgentStatus {
    pub fn id(&self) -> EntityId {
        self.profile.id
    }

    pub fn position(&self) -> Vec3 {
        self.profile.position
    }

    /// Whether `entity` fights on the agent's side.
    pub fn is_ally(&self, entity: &EntitySnapshot) -> bool {
        entity.id == self.id() || (self.team.is_some() && entity.team == self.team)
    }
}

/// Entity lifecycle notification from the world.
#[derive(Debug, Clone)]
pub enum EntityEvent {
    Spawned(EntitySnapshot),
    Gone(EntitySnapshot),
}

impl EntityEvent {
    pub fn entity(&self) -> &EntitySnapshot {
        match self {
            Self::Spawned(entity) | Self::Gone(entity) => entity,
        }
    }
}

/// Capabilities the scheduler needs from a live game session.
///
/// Queries are synchronous reads of the client's current view; actions are
/// async and resolve once the client has sent them.
#[async_trait]
pub trait GameSession: Send + Sync + 'static {
    /// Runs `read` against the current world view.
    fn with_world<R>(&self, read: impl FnOnce(&dyn WorldView) -> R) -> R;

    fn agent(&self) -> AgentStatus;

    /// Full combat profile for `id`, or `None` when the entity is unknown.
    fn target_profile(&self, id: EntityId) -> Option<TargetProfile>;

    fn held_item(&self, hand: Hand) -> Option<Item>;

    fn has_item(&self, item: Item) -> bool;

    fn subscribe_entities(&self) -> broadcast::Receiver<EntityEvent>;

    async fn equip(&self, item: Item, hand: Hand) -> Result<(), SessionError>;

    async fn look_at(&self, point: Vec3) -> Result<(), SessionError>;

    async fn place_entity(&self, against: BlockPos, face: BlockFace, hand: Hand) -> Result<(), SessionError>;

    async fn attack(&self, entity: EntityId) -> Result<(), SessionError>;

    /// Resolves after `ticks` game ticks have been processed.
    async fn wait_ticks(&self, ticks: u32);
}
