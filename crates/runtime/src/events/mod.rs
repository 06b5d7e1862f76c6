//! Typed event channel between the scheduler and its host.
//!
//! Events are grouped into topics so consumers only receive what they
//! subscribe to. Publishing is best-effort and never blocks the cycle.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{ActionEvent, ErrorEvent, LifecycleEvent, StopReason, TelemetryEvent};
