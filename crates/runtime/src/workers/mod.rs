//! Worker tasks that back the scheduler.
//!
//! The cycle worker issues game actions; the refresh worker keeps the shared
//! plan current; the reporter turns counters into telemetry; the watcher
//! starts the cycle on its own when configured to. In fast mode a listener
//! detonates fresh spawns ahead of the cycle.

mod cycle;
mod detonate;
mod fast_break;
mod metrics;
mod refresh;
mod reporter;
mod watcher;

pub use cycle::{CycleMode, SPAWN_MATCH_DISTANCE};
pub use metrics::{CounterSnapshot, CycleCounters};

pub(crate) use cycle::CycleWorker;
pub(crate) use fast_break::FastBreakWorker;
pub(crate) use refresh::RefreshWorker;
pub(crate) use reporter::ReporterWorker;
pub(crate) use watcher::AutoStartWatcher;
