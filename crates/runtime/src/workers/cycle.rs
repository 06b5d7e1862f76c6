//! The main action cycle: place, wait, detonate.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{self, Duration};
use tracing::{debug, info, trace};

use crystal_core::{BlockPos, EntityId, EntitySnapshot, Vec3};

use crate::api::{BlockFace, EntityEvent, GameSession, Item, Result, SessionError};
use crate::events::{ActionEvent, StopReason};
use crate::scheduler::{PlanSnapshot, Scheduler};
use crate::workers::detonate::{Detonation, detonate};

/// Spawn notifications farther than this from the expected point are ignored.
pub const SPAWN_MATCH_DISTANCE: f64 = 2.0;

/// Pause before retrying when the plan is empty.
const IDLE_BACKOFF: Duration = Duration::from_millis(10);

/// How waits between actions are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum CycleMode {
    /// Wall-clock sleeps of `ticks × tick_duration`.
    Unlocked,
    /// Waits resolve on the session's own tick boundaries.
    TickSynchronized,
}

enum Flow {
    Continue,
    Stop(StopReason),
}

pub(crate) struct CycleWorker<S> {
    scheduler: Arc<Scheduler<S>>,
    generation: u64,
    last_attacked: Option<EntityId>,
}

impl<S: GameSession> CycleWorker<S> {
    pub(crate) fn new(scheduler: Arc<Scheduler<S>>, generation: u64) -> Self {
        Self {
            scheduler,
            generation,
            last_attacked: None,
        }
    }

    pub(crate) async fn run(mut self) {
        let mode = self.scheduler.config().cycle_mode();
        debug!(target: "crystal::cycle", generation = self.generation, %mode, "cycle worker started");

        while self.scheduler.is_current(self.generation) {
            match self.iteration().await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop(reason)) => {
                    self.scheduler.stop_run(self.generation, reason);
                    break;
                }
                Err(err) => {
                    self.scheduler.fault(self.generation, &err);
                    break;
                }
            }
        }

        debug!(target: "crystal::cycle", generation = self.generation, "cycle worker finished");
    }

    async fn iteration(&mut self) -> Result<Flow> {
        let Some(target) = self.scheduler.acquire_target() else {
            info!(target: "crystal::cycle", "no target in range");
            return Ok(Flow::Stop(StopReason::NoTarget));
        };
        if !self.ensure_detonatable().await? {
            info!(target: "crystal::cycle", "no detonatable item to hold");
            return Ok(Flow::Stop(StopReason::NoDetonatable));
        }

        let plan = self.plan(&target);
        if plan.is_empty() {
            trace!(target: "crystal::cycle", target_id = %target.id, "empty plan");
            time::sleep(IDLE_BACKOFF).await;
            return Ok(Flow::Continue);
        }

        let config = self.scheduler.config();
        let (place_delay, break_delay) = (config.place_delay_ticks, config.break_delay_ticks);
        for block in plan.positions {
            if !self.scheduler.is_current(self.generation) {
                break;
            }
            let placed = self.place(block).await?;
            self.pause(place_delay).await;
            self.detonate(placed).await?;
            self.pause(break_delay).await;
            self.pace(place_delay + break_delay).await;
        }
        Ok(Flow::Continue)
    }

    fn plan(&self, target: &EntitySnapshot) -> PlanSnapshot {
        if self.scheduler.config().async_plan_refresh
            && let Some(plan) = self.scheduler.cached_plan(target.id)
        {
            return plan;
        }
        let plan = self.scheduler.plan_for(target);
        self.scheduler.publish_plan(plan.clone());
        plan
    }

    /// Makes sure the configured hand holds a detonatable item.
    async fn ensure_detonatable(&self) -> Result<bool> {
        let session = self.scheduler.session();
        let hand = self.scheduler.config().hand();
        if session.held_item(hand).is_some_and(Item::is_detonatable) {
            return Ok(true);
        }
        if !self.scheduler.config().auto_equip || !session.has_item(Item::EndCrystal) {
            return Ok(false);
        }

        match session.equip(Item::EndCrystal, hand).await {
            Ok(()) => {
                debug!(target: "crystal::cycle", %hand, "equipped detonatable");
                Ok(true)
            }
            Err(SessionError::ItemMissing(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Places on `block` and waits for the spawn to be confirmed.
    ///
    /// Transient failures are published and swallowed; the candidate is simply
    /// dropped for this cycle.
    async fn place(&self, block: BlockPos) -> Result<Option<EntityId>> {
        let session = self.scheduler.session();
        let bus = self.scheduler.bus();
        let spawn = block.spawn_point();

        self.scheduler.counters().record_wanted();
        if let Some(existing) = self.detonatable_at(spawn) {
            trace!(target: "crystal::cycle", %block, entity = %existing, "spawn point already occupied");
            return Ok(Some(existing));
        }

        let mut feed = session.subscribe_entities();
        let hand = self.scheduler.config().hand();
        let placed = match session.look_at(spawn).await {
            Ok(()) => session.place_entity(block, BlockFace::Up, hand).await,
            Err(err) => Err(err),
        };
        match placed {
            Ok(()) => {}
            Err(err) if err.is_transient() => {
                debug!(target: "crystal::cycle", %block, error = %err, "placement rejected");
                bus.publish(ActionEvent::PlaceFailed {
                    block,
                    reason: err.to_string(),
                });
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        }

        let timeout = self.scheduler.config().spawn_confirm_timeout();
        match wait_for_spawn(&mut feed, spawn, timeout).await {
            Some(entity) => {
                self.scheduler.counters().record_placed();
                bus.publish(ActionEvent::Placed {
                    block,
                    entity: entity.id,
                });
                Ok(Some(entity.id))
            }
            None => {
                debug!(target: "crystal::cycle", %block, ?timeout, "spawn not confirmed");
                bus.publish(ActionEvent::PlaceFailed {
                    block,
                    reason: "spawn not confirmed".to_owned(),
                });
                Ok(None)
            }
        }
    }

    /// Detonates `preferred` when it is still in range, else the nearest
    /// eligible entity within break range.
    async fn detonate(&mut self, preferred: Option<EntityId>) -> Result<()> {
        let session = self.scheduler.session();
        let range = self.scheduler.config().break_distance;
        let origin = session.agent().position();
        let last_attacked = self.last_attacked;

        let chosen = session.with_world(|world| {
            let mut in_range: Vec<(f64, EntitySnapshot)> = world
                .entities()
                .into_iter()
                .filter(|e| e.is_detonatable() && Some(e.id) != last_attacked)
                .map(|e| (e.position.distance_to(origin), e))
                .filter(|(distance, _)| *distance <= range)
                .collect();
            in_range.sort_by(|a, b| a.0.total_cmp(&b.0));
            let index = preferred
                .and_then(|id| in_range.iter().position(|(_, e)| e.id == id))
                .unwrap_or(0);
            (index < in_range.len()).then(|| in_range.swap_remove(index).1)
        });
        self.last_attacked = match chosen {
            Some(entity) => match detonate(&*self.scheduler, &entity).await? {
                Detonation::Detonated => Some(entity.id),
                Detonation::Skipped | Detonation::Rejected => None,
            },
            None => None,
        };
        Ok(())
    }

    fn detonatable_at(&self, point: Vec3) -> Option<EntityId> {
        self.scheduler.session().with_world(|world| {
            world
                .entities()
                .iter()
                .find(|e| e.is_detonatable() && e.position.distance_to(point) < 0.5)
                .map(|e| e.id)
        })
    }

    /// Waits `ticks` game ticks in the configured mode.
    async fn pause(&self, ticks: u32) {
        if ticks == 0 {
            return;
        }
        match self.scheduler.config().cycle_mode() {
            CycleMode::Unlocked => time::sleep(self.scheduler.config().tick_duration() * ticks).await,
            CycleMode::TickSynchronized => self.scheduler.session().wait_ticks(ticks).await,
        }
    }

    /// Spacing between consecutive placements.
    async fn pace(&self, waited_ticks: u32) {
        match self.scheduler.config().cycle_mode() {
            CycleMode::Unlocked => time::sleep(self.scheduler.config().tick_duration()).await,
            CycleMode::TickSynchronized if waited_ticks == 0 => self.scheduler.session().wait_ticks(1).await,
            CycleMode::TickSynchronized => {}
        }
    }
}

/// First detonatable spawn near `point`, or `None` once `timeout` elapses.
pub(crate) async fn wait_for_spawn(
    feed: &mut broadcast::Receiver<EntityEvent>,
    point: Vec3,
    timeout: Duration,
) -> Option<EntitySnapshot> {
    let spawned = async {
        loop {
            match feed.recv().await {
                Ok(EntityEvent::Spawned(entity))
                    if entity.is_detonatable() && entity.position.distance_to(point) < SPAWN_MATCH_DISTANCE =>
                {
                    return Some(entity);
                }
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    };
    time::timeout(timeout, spawned).await.ok().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawn_wait_matches_nearby_detonatable() {
        let (tx, mut rx) = broadcast::channel(8);
        let point = Vec3::new(3.5, 65.0, 3.5);
        tx.send(EntityEvent::Spawned(EntitySnapshot::end_crystal(
            EntityId(7),
            Vec3::new(9.5, 65.0, 9.5),
        )))
        .unwrap();
        tx.send(EntityEvent::Spawned(EntitySnapshot::end_crystal(EntityId(8), point)))
            .unwrap();

        let entity = wait_for_spawn(&mut rx, point, Duration::from_millis(50)).await;
        assert_eq!(entity.map(|e| e.id), Some(EntityId(8)));
    }

    #[tokio::test]
    async fn spawn_wait_times_out() {
        let (_tx, mut rx) = broadcast::channel::<EntityEvent>(8);
        let entity = wait_for_spawn(&mut rx, Vec3::ZERO, Duration::from_millis(5)).await;
        assert!(entity.is_none());
    }
}
