//! Auto-start watcher for the always-on variant.

use std::sync::Arc;

use tracing::{debug, info};

use crate::api::{GameSession, RuntimeError};
use crate::scheduler::Scheduler;

/// Once per game tick, starts the cycle when enabled, idle and a target is in range.
pub(crate) struct AutoStartWatcher<S> {
    scheduler: Arc<Scheduler<S>>,
}

impl<S: GameSession> AutoStartWatcher<S> {
    pub(crate) fn new(scheduler: Arc<Scheduler<S>>) -> Self {
        Self { scheduler }
    }

    pub(crate) async fn run(self) {
        let mut shutdown = self.scheduler.shutdown_signal();
        loop {
            tokio::select! {
                _ = self.scheduler.session().wait_ticks(1) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }

            let state = self.scheduler.state();
            if !state.enabled || state.running || self.scheduler.find_target().is_none() {
                continue;
            }
            match self.scheduler.start(None) {
                Ok(target) => info!(target: "crystal::cycle", target_id = %target, "auto-started"),
                Err(RuntimeError::AlreadyRunning | RuntimeError::Disabled | RuntimeError::NoTarget) => {}
                Err(err) => debug!(target: "crystal::cycle", error = %err, "auto-start failed"),
            }
        }
        debug!(target: "crystal::cycle", "auto-start watcher finished");
    }
}
