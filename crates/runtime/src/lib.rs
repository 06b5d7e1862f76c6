//! Async scheduler that drives the end-crystal placement cycle.
//!
//! The crate wraps the pure search in [`crystal_core`] with everything needed
//! to act on it against a live game session: a state machine, background
//! workers, a topic event bus and environment-driven configuration. Hosts
//! implement [`GameSession`] and interact through [`AutoCrystal`].
//!
//! Modules are organized by responsibility:
//! - [`api`] exposes the handle, the session trait and error types
//! - [`config`] loads and validates [`AutoCrystalConfig`]
//! - [`events`] provides the topic-based event bus
//! - [`state`] holds the enable/run state machine
//! - [`runtime`] hosts the builder
pub mod api;
pub mod config;
pub mod events;
pub mod runtime;
pub mod state;

mod scheduler;
mod workers;

pub use api::{
    AgentStatus, AutoCrystal, BlockFace, EntityEvent, GameSession, Hand, Item, Result,
    RuntimeError, SessionError,
};
pub use config::{AutoCrystalConfig, ConfigError, ENV_PREFIX};
pub use events::{
    ActionEvent, ErrorEvent, Event, EventBus, LifecycleEvent, StopReason, TelemetryEvent, Topic,
};
pub use runtime::AutoCrystalBuilder;
pub use scheduler::PlanSnapshot;
pub use state::{Phase, SchedulerState};
pub use workers::{CounterSnapshot, CycleCounters, CycleMode, SPAWN_MATCH_DISTANCE};
