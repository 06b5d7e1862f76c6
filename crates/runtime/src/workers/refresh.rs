//! Background plan refresh.
//!
//! Recomputes the plan for the current target on a short fixed interval so
//! the cycle never waits on the search.

use std::sync::Arc;

use tokio::time;
use tracing::{debug, trace};

use crate::api::GameSession;
use crate::scheduler::Scheduler;

pub(crate) struct RefreshWorker<S> {
    scheduler: Arc<Scheduler<S>>,
    generation: u64,
}

impl<S: GameSession> RefreshWorker<S> {
    pub(crate) fn new(scheduler: Arc<Scheduler<S>>, generation: u64) -> Self {
        Self {
            scheduler,
            generation,
        }
    }

    pub(crate) async fn run(self) {
        let interval = self.scheduler.config().plan_refresh_interval();
        debug!(target: "crystal::refresh", generation = self.generation, ?interval, "plan refresh started");

        let mut state = self.scheduler.watch_state();
        while self.scheduler.is_current(self.generation) {
            self.refresh();
            tokio::select! {
                _ = time::sleep(interval) => {}
                changed = state.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        debug!(target: "crystal::refresh", generation = self.generation, "plan refresh finished");
    }

    fn refresh(&self) {
        let Some(target) = self.scheduler.current_target() else {
            trace!(target: "crystal::refresh", "no current target");
            return;
        };

        let plan = self.scheduler.plan_for(&target);
        if self.scheduler.publish_plan(plan) {
            trace!(target: "crystal::refresh", target_id = %target.id, "plan changed");
        }
    }
}
