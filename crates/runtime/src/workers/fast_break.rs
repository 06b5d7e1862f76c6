//! Fast mode: detonates fresh spawns without waiting for the cycle.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, trace, warn};

use crystal_core::EntitySnapshot;

use crate::api::{EntityEvent, GameSession, Result};
use crate::scheduler::Scheduler;
use crate::workers::detonate::detonate;

pub(crate) struct FastBreakWorker<S> {
    scheduler: Arc<Scheduler<S>>,
    generation: u64,
    feed: broadcast::Receiver<EntityEvent>,
}

impl<S: GameSession> FastBreakWorker<S> {
    /// Subscribes right away so spawns caused by the first placement are seen.
    pub(crate) fn new(scheduler: Arc<Scheduler<S>>, generation: u64) -> Self {
        let feed = scheduler.session().subscribe_entities();
        Self {
            scheduler,
            generation,
            feed,
        }
    }

    pub(crate) async fn run(mut self) {
        debug!(target: "crystal::cycle", generation = self.generation, "fast break started");
        let mut state = self.scheduler.watch_state();

        while self.scheduler.is_current(self.generation) {
            tokio::select! {
                event = self.feed.recv() => match event {
                    Ok(EntityEvent::Spawned(entity)) if entity.is_detonatable() => {
                        if let Err(err) = self.on_spawn(&entity).await {
                            self.scheduler.fault(self.generation, &err);
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(missed)) => {
                        warn!(target: "crystal::cycle", missed, "fast break lagged behind the entity feed");
                    }
                    Err(RecvError::Closed) => break,
                },
                changed = state.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        debug!(target: "crystal::cycle", generation = self.generation, "fast break finished");
    }

    async fn on_spawn(&self, entity: &EntitySnapshot) -> Result<()> {
        let origin = self.scheduler.session().agent().position();
        if entity.position.distance_to(origin) > self.scheduler.config().break_distance {
            return Ok(());
        }
        let outcome = detonate(&*self.scheduler, entity).await?;
        trace!(target: "crystal::cycle", entity = %entity.id, ?outcome, "fast break");
        Ok(())
    }
}
