//! Throughput reporter.
//!
//! Wakes once per report interval, diffs the counters against the previous
//! snapshot and reports rates while the cycle runs. Despawn notifications of
//! detonatable entities are counted here as detonations.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::{EntityEvent, GameSession};
use crate::events::TelemetryEvent;
use crate::scheduler::Scheduler;
use crate::workers::CounterSnapshot;

pub(crate) struct ReporterWorker<S> {
    scheduler: Arc<Scheduler<S>>,
}

impl<S: GameSession> ReporterWorker<S> {
    pub(crate) fn new(scheduler: Arc<Scheduler<S>>) -> Self {
        Self { scheduler }
    }

    pub(crate) async fn run(self) {
        let interval = self.scheduler.config().report_interval();
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        let mut feed = self.scheduler.session().subscribe_entities();
        let mut feed_open = true;
        let mut shutdown = self.scheduler.shutdown_signal();
        let mut previous = self.scheduler.counters().snapshot();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let current = self.scheduler.counters().snapshot();
                    let delta = current.since(&previous);
                    previous = current;
                    if self.scheduler.is_running() {
                        self.report(delta, interval.as_millis() as u64);
                    }
                }
                event = feed.recv(), if feed_open => match event {
                    Ok(EntityEvent::Gone(entity)) if entity.is_detonatable() => {
                        self.scheduler.counters().record_broke();
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(missed)) => {
                        warn!(target: "crystal::report", missed, "entity feed lagged");
                    }
                    Err(RecvError::Closed) => {
                        debug!(target: "crystal::report", "entity feed closed");
                        feed_open = false;
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }

    fn report(&self, delta: CounterSnapshot, interval_ms: u64) {
        let seconds = interval_ms as f64 / 1000.0;
        info!(
            target: "crystal::report",
            wanted_per_sec = delta.wanted_placed as f64 / seconds,
            placed_per_sec = delta.num_placed as f64 / seconds,
            broke_per_sec = delta.num_broke as f64 / seconds,
            "wanted {} placed {} broke {}",
            delta.wanted_placed,
            delta.num_placed,
            delta.num_broke
        );
        self.scheduler.bus().publish(TelemetryEvent::Throughput {
            wanted: delta.wanted_placed,
            placed: delta.num_placed,
            broke: delta.num_broke,
            interval_ms,
        });

        if delta.num_placed == 0 {
            let target = self.scheduler.current_target().map(|e| e.name);
            let plan_size = self
                .scheduler
                .current_plan()
                .map_or(0, |plan| plan.positions.len());
            let crystals = self.scheduler.detonatables_in_range();
            info!(
                target: "crystal::report",
                target_name = target.as_deref().unwrap_or("none"),
                plan_size,
                crystals,
                "nothing placed this interval"
            );
            self.scheduler.bus().publish(TelemetryEvent::Idle {
                target,
                plan_size,
                crystals,
            });
        }
    }
}
