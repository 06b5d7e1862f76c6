//! Shared scheduler core.
//!
//! Owns the state machine, the selected target, the latest plan and the
//! worker handles. The public [`AutoCrystal`](crate::AutoCrystal) handle and
//! every worker hold it behind an `Arc`.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crystal_core::{
    BlockPos, EntityId, EntityKind, EntitySnapshot, SearchContext, TargetProfile, find_candidates,
    possible_positions,
};

use crate::api::{AgentStatus, GameSession, Result, RuntimeError};
use crate::config::AutoCrystalConfig;
use crate::events::{ActionEvent, ErrorEvent, EventBus, LifecycleEvent, StopReason};
use crate::state::SchedulerState;
use crate::workers::{CycleCounters, CycleWorker, FastBreakWorker, RefreshWorker};

/// Placement positions computed for one target.
///
/// Published as a whole; readers never observe a partially updated plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSnapshot {
    pub target: EntityId,
    pub positions: Vec<BlockPos>,
    pub used_backup: bool,
}

impl PlanSnapshot {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

pub(crate) struct Scheduler<S> {
    session: Arc<S>,
    config: AutoCrystalConfig,
    bus: EventBus,
    counters: Arc<CycleCounters>,
    state: watch::Sender<SchedulerState>,
    /// Bumped on every start so workers of an earlier run retire.
    generation: AtomicU64,
    plan: watch::Sender<Option<PlanSnapshot>>,
    /// Target requested through `attack`, kept while it stays in the world.
    pinned: Mutex<Option<EntityId>>,
    target: Mutex<Option<EntityId>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    shutdown: watch::Sender<bool>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Nearest hostile player within `range` of the agent.
pub(crate) fn select_target(agent: &AgentStatus, entities: &[EntitySnapshot], range: f64) -> Option<EntitySnapshot> {
    let origin = agent.position();
    entities
        .iter()
        .filter(|e| e.kind == EntityKind::Player && !agent.is_ally(e))
        .map(|e| (e.position.distance_to(origin), e))
        .filter(|(distance, _)| *distance <= range)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, e)| e.clone())
}

impl<S: GameSession> Scheduler<S> {
    pub(crate) fn new(session: Arc<S>, config: AutoCrystalConfig) -> Self {
        Self {
            session,
            bus: EventBus::with_capacity(config.event_buffer_size),
            counters: Arc::new(CycleCounters::new()),
            state: watch::channel(SchedulerState::default()).0,
            generation: AtomicU64::new(0),
            plan: watch::channel(None).0,
            pinned: Mutex::new(None),
            target: Mutex::new(None),
            workers: Mutex::new(Vec::new()),
            shutdown: watch::channel(false).0,
            config,
        }
    }

    pub(crate) fn session(&self) -> &Arc<S> {
        &self.session
    }

    pub(crate) fn config(&self) -> &AutoCrystalConfig {
        &self.config
    }

    pub(crate) fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub(crate) fn counters(&self) -> &CycleCounters {
        &self.counters
    }

    pub(crate) fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    pub(crate) fn watch_state(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    pub(crate) fn is_running(&self) -> bool {
        self.state.borrow().running
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Whether a worker spawned for `generation` should keep going.
    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.is_running() && self.generation() == generation
    }

    pub(crate) fn enable(&self) {
        if self.state.send_if_modified(SchedulerState::enable) {
            info!(target: "crystal::cycle", "automation enabled");
            self.bus.publish(LifecycleEvent::Enabled);
        }
    }

    pub(crate) fn disable(&self) {
        let mut was_running = false;
        let changed = self.state.send_if_modified(|state| {
            was_running = state.running;
            state.disable()
        });
        if !changed {
            return;
        }

        *lock(&self.pinned) = None;
        if was_running {
            self.bus.publish(LifecycleEvent::Stopped {
                reason: StopReason::Disabled,
            });
        }
        info!(target: "crystal::cycle", was_running, "automation disabled");
        self.bus.publish(LifecycleEvent::Disabled);
    }

    /// Starts the cycle against `pinned` or, when absent, the nearest target.
    pub(crate) fn start(self: &Arc<Self>, pinned: Option<EntityId>) -> Result<EntityId> {
        let state = self.state();
        if !state.enabled {
            return Err(RuntimeError::Disabled);
        }
        if state.running {
            return Err(RuntimeError::AlreadyRunning);
        }

        if let Some(id) = pinned {
            let present = self
                .session
                .with_world(|world| world.entities().iter().any(|e| e.id == id));
            if !present {
                return Err(RuntimeError::NoTarget);
            }
            *lock(&self.pinned) = Some(id);
        }
        let target = self.acquire_target().ok_or(RuntimeError::NoTarget)?;

        let mut outcome = Ok(());
        self.state.send_if_modified(|state| match state.start() {
            Ok(()) => true,
            Err(err) => {
                outcome = Err(err);
                false
            }
        });
        outcome?;

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.plan.send_replace(None);
        if self.config.fast_mode {
            self.spawn(FastBreakWorker::new(Arc::clone(self), generation).run());
        }
        self.spawn(CycleWorker::new(Arc::clone(self), generation).run());
        if self.config.async_plan_refresh {
            self.spawn(RefreshWorker::new(Arc::clone(self), generation).run());
        }

        info!(
            target: "crystal::cycle",
            target_id = %target.id,
            target_name = %target.name,
            mode = %self.config.cycle_mode(),
            "automation started"
        );
        self.bus.publish(LifecycleEvent::Started { target: target.id });
        Ok(target.id)
    }

    pub(crate) fn stop(&self, reason: StopReason) -> bool {
        if !self.state.send_if_modified(SchedulerState::stop) {
            return false;
        }
        info!(target: "crystal::cycle", %reason, "automation stopped");
        self.bus.publish(LifecycleEvent::Stopped { reason });
        true
    }

    /// Stops the run identified by `generation`; later runs are unaffected.
    pub(crate) fn stop_run(&self, generation: u64, reason: StopReason) -> bool {
        self.generation() == generation && self.stop(reason)
    }

    pub(crate) fn fault(&self, generation: u64, err: &RuntimeError) {
        error!(target: "crystal::cycle", error = %err, "cycle fault");
        if self.config.log_errors {
            self.bus.publish(ErrorEvent {
                message: err.to_string(),
            });
        }
        self.stop_run(generation, StopReason::Fault);
    }

    /// Target the cycle would pick right now, without selecting it.
    pub(crate) fn find_target(&self) -> Option<EntitySnapshot> {
        let agent = self.session.agent();
        let entities = self.session.with_world(|world| world.entities());

        let mut pinned = lock(&self.pinned);
        if let Some(id) = *pinned {
            match entities.iter().find(|e| e.id == id) {
                Some(entity) => return Some(entity.clone()),
                None => *pinned = None,
            }
        }
        drop(pinned);

        select_target(&agent, &entities, self.config.target_range)
    }

    /// Picks and records the current target.
    pub(crate) fn acquire_target(&self) -> Option<EntitySnapshot> {
        let target = self.find_target();
        *lock(&self.target) = target.as_ref().map(|e| e.id);
        target
    }

    /// The recorded target, if it is still in the world.
    pub(crate) fn current_target(&self) -> Option<EntitySnapshot> {
        let id = (*lock(&self.target))?;
        self.session
            .with_world(|world| world.entities().into_iter().find(|e| e.id == id))
    }

    fn target_profile(&self, target: &EntitySnapshot) -> TargetProfile {
        self.session
            .target_profile(target.id)
            .unwrap_or_else(|| TargetProfile::from_entity(target))
    }

    /// Runs the placement search against `target`.
    pub(crate) fn plan_for(&self, target: &EntitySnapshot) -> PlanSnapshot {
        let agent = self.session.agent();
        let profile = self.target_profile(target);
        let settings = self.config.search_settings();
        let model = self.config.damage_model(agent.rules.difficulty);

        let snapshot = self.session.with_world(|world| {
            let ctx = SearchContext::new(world, &agent.profile, &profile, agent.rules).with_model(model);
            match find_candidates(&ctx, &settings) {
                Some(plan) => PlanSnapshot {
                    target: target.id,
                    positions: plan.positions(),
                    used_backup: plan.used_backup(),
                },
                None => PlanSnapshot {
                    target: target.id,
                    positions: Vec::new(),
                    used_backup: false,
                },
            }
        });

        debug!(
            target: "crystal::search",
            target_id = %target.id,
            positions = snapshot.positions.len(),
            used_backup = snapshot.used_backup,
            "search finished"
        );
        snapshot
    }

    /// Scan results for `target` (or the would-be target) without acting on them.
    pub(crate) fn possible_positions(&self, target: Option<EntityId>, raw: bool) -> Vec<BlockPos> {
        let entity = match target {
            Some(id) => self
                .session
                .with_world(|world| world.entities().into_iter().find(|e| e.id == id)),
            None => self.current_target().or_else(|| self.find_target()),
        };
        let Some(entity) = entity else {
            return Vec::new();
        };

        let agent = self.session.agent();
        let profile = self.target_profile(&entity);
        let settings = self.config.search_settings();
        let model = self.config.damage_model(agent.rules.difficulty);
        self.session.with_world(|world| {
            let ctx = SearchContext::new(world, &agent.profile, &profile, agent.rules).with_model(model);
            possible_positions(&ctx, &settings, raw)
        })
    }

    /// Latest published plan for `target`, if any.
    pub(crate) fn cached_plan(&self, target: EntityId) -> Option<PlanSnapshot> {
        self.plan
            .borrow()
            .as_ref()
            .filter(|plan| plan.target == target)
            .cloned()
    }

    pub(crate) fn current_plan(&self) -> Option<PlanSnapshot> {
        self.plan.borrow().clone()
    }

    /// Replaces the shared plan; returns whether it differed from the previous one.
    ///
    /// A changed plan is announced on the action topic whichever worker computed it.
    pub(crate) fn publish_plan(&self, snapshot: PlanSnapshot) -> bool {
        let event = ActionEvent::PlanRefreshed {
            target: snapshot.target,
            positions: snapshot.positions.clone(),
            used_backup: snapshot.used_backup,
        };
        let changed = self.plan.send_if_modified(|slot| {
            if slot.as_ref() == Some(&snapshot) {
                false
            } else {
                *slot = Some(snapshot);
                true
            }
        });
        if changed {
            self.bus.publish(event);
        }
        changed
    }

    /// Detonatable entities within break range of the agent.
    pub(crate) fn detonatables_in_range(&self) -> usize {
        let origin = self.session.agent().position();
        let range = self.config.break_distance;
        self.session.with_world(|world| {
            world
                .entities()
                .iter()
                .filter(|e| e.is_detonatable() && e.position.distance_to(origin) <= range)
                .count()
        })
    }

    pub(crate) fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        let mut workers = lock(&self.workers);
        workers.retain(|worker| !worker.is_finished());
        workers.push(handle);
    }

    pub(crate) fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Disables the automation and waits for every worker to finish.
    pub(crate) async fn shutdown(&self) -> Result<()> {
        self.disable();
        self.shutdown.send_replace(true);

        let workers = std::mem::take(&mut *lock(&self.workers));
        for worker in workers {
            worker.await.map_err(RuntimeError::WorkerJoin)?;
        }
        debug!(target: "crystal::cycle", "scheduler shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crystal_core::{GameRules, Vec3};

    fn agent(team: Option<&str>) -> AgentStatus {
        let body = EntitySnapshot::player(EntityId(1), "agent", Vec3::new(0.5, 65.0, 0.5));
        AgentStatus {
            profile: TargetProfile::from_entity(&body),
            team: team.map(str::to_owned),
            rules: GameRules::default(),
        }
    }

    #[test]
    fn nearest_hostile_player_is_selected() {
        let entities = vec![
            EntitySnapshot::player(EntityId(1), "agent", Vec3::new(0.5, 65.0, 0.5)),
            EntitySnapshot::player(EntityId(2), "far", Vec3::new(9.5, 65.0, 0.5)),
            EntitySnapshot::player(EntityId(3), "near", Vec3::new(4.5, 65.0, 0.5)),
            EntitySnapshot::mob(EntityId(4), "zombie", Vec3::new(1.5, 65.0, 0.5), 0.6, 1.95),
        ];
        let target = select_target(&agent(None), &entities, 12.0).unwrap();
        assert_eq!(target.id, EntityId(3));
    }

    #[test]
    fn teammates_and_out_of_range_players_are_ignored() {
        let entities = vec![
            EntitySnapshot::player(EntityId(2), "mate", Vec3::new(2.5, 65.0, 0.5)).with_team("red"),
            EntitySnapshot::player(EntityId(3), "far", Vec3::new(20.5, 65.0, 0.5)),
        ];
        assert!(select_target(&agent(Some("red")), &entities, 12.0).is_none());

        let target = select_target(&agent(Some("blue")), &entities, 12.0).unwrap();
        assert_eq!(target.id, EntityId(2));
    }
}
