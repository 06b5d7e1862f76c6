//! Cloneable façade over the scheduler.
//!
//! [`AutoCrystal`] is what a host keeps: it toggles the automation, starts or
//! stops the cycle, queries the search and streams events by topic.
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use crystal_core::{BlockPos, EntityId, EntitySnapshot, HoleMode, Vec3, find_holes, is_in_hole};

use super::errors::Result;
use super::session::GameSession;
use crate::config::AutoCrystalConfig;
use crate::events::{Event, EventBus, StopReason, Topic};
use crate::runtime::AutoCrystalBuilder;
use crate::scheduler::{PlanSnapshot, Scheduler};
use crate::state::SchedulerState;
use crate::workers::CounterSnapshot;

/// Client-facing handle to the automation
pub struct AutoCrystal<S> {
    scheduler: Arc<Scheduler<S>>,
}

impl<S> Clone for AutoCrystal<S> {
    fn clone(&self) -> Self {
        Self {
            scheduler: Arc::clone(&self.scheduler),
        }
    }
}

impl<S: GameSession> AutoCrystal<S> {
    pub fn builder(session: Arc<S>) -> AutoCrystalBuilder<S> {
        AutoCrystalBuilder::new(session)
    }

    pub(crate) fn new(scheduler: Arc<Scheduler<S>>) -> Self {
        Self { scheduler }
    }

    /// Turns the automation on. Idempotent.
    pub fn enable(&self) {
        self.scheduler.enable();
    }

    /// Turns the automation off, stopping any running cycle. Idempotent.
    pub fn disable(&self) {
        self.scheduler.disable();
    }

    /// Starts the cycle against the nearest hostile player in range.
    pub fn start(&self) -> Result<EntityId> {
        self.scheduler.start(None)
    }

    /// Starts the cycle against a specific entity.
    ///
    /// The entity stays selected for as long as it remains in the world.
    pub fn attack(&self, target: EntityId) -> Result<EntityId> {
        self.scheduler.start(Some(target))
    }

    /// Stops the running cycle; returns `false` when nothing was running.
    pub fn stop(&self) -> bool {
        self.scheduler.stop(StopReason::Requested)
    }

    /// Disables the automation and waits for every background task to exit.
    pub async fn shutdown(&self) -> Result<()> {
        self.scheduler.shutdown().await
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn is_enabled(&self) -> bool {
        self.scheduler.state().enabled
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Receiver that wakes on every state transition.
    pub fn watch_state(&self) -> watch::Receiver<SchedulerState> {
        self.scheduler.watch_state()
    }

    /// Scan results for `target`, or the would-be target when `None`.
    ///
    /// Candidates come back unranked, in scan order. With `raw` set the
    /// self-damage safety filter is skipped and every geometrically valid
    /// block is returned. Nothing is placed and no state changes.
    pub fn possible_positions(&self, target: Option<EntityId>, raw: bool) -> Vec<BlockPos> {
        self.scheduler.possible_positions(target, raw)
    }

    pub fn current_plan(&self) -> Option<PlanSnapshot> {
        self.scheduler.current_plan()
    }

    pub fn current_target(&self) -> Option<EntitySnapshot> {
        self.scheduler.current_target()
    }

    /// Safe holes around `focus` (the agent when `None`), ordered for `mode`.
    pub fn holes(&self, focus: Option<Vec3>, mode: HoleMode) -> Vec<BlockPos> {
        let agent = self.scheduler.session().agent().position();
        self.scheduler
            .session()
            .with_world(|world| find_holes(world, agent, focus, mode))
    }

    /// Whether the agent currently stands in a hole.
    pub fn is_in_hole(&self) -> bool {
        let agent = self.scheduler.session().agent().position();
        self.scheduler
            .session()
            .with_world(|world| is_in_hole(world, agent))
    }

    pub fn counters(&self) -> CounterSnapshot {
        self.scheduler.counters().snapshot()
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use crystal_runtime::Topic;
    ///
    /// let mut actions = handle.subscribe(Topic::Action);
    /// while let Ok(event) = actions.recv().await {
    ///     // placements, detonations, plan refreshes
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.scheduler.bus().subscribe(topic)
    }

    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.scheduler.bus().subscribe_multiple(topics)
    }

    pub fn event_bus(&self) -> &EventBus {
        self.scheduler.bus()
    }

    pub fn config(&self) -> &AutoCrystalConfig {
        self.scheduler.config()
    }

    pub fn session(&self) -> &Arc<S> {
        self.scheduler.session()
    }
}
