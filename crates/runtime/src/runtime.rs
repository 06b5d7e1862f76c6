//! Builder that assembles the scheduler and its background tasks.

use std::sync::Arc;

use tracing::info;

use crate::api::{AutoCrystal, GameSession, Result};
use crate::config::AutoCrystalConfig;
use crate::scheduler::Scheduler;
use crate::workers::{AutoStartWatcher, ReporterWorker};

/// Builder for [`AutoCrystal`]
pub struct AutoCrystalBuilder<S> {
    session: Arc<S>,
    config: AutoCrystalConfig,
}

impl<S: GameSession> AutoCrystalBuilder<S> {
    pub(crate) fn new(session: Arc<S>) -> Self {
        Self {
            session,
            config: AutoCrystalConfig::default(),
        }
    }

    /// Override the configuration
    pub fn config(mut self, config: AutoCrystalConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates the configuration and spawns the background tasks.
    ///
    /// Must be called from within a tokio runtime. The automation starts
    /// disabled.
    pub fn build(self) -> Result<AutoCrystal<S>> {
        self.config.validate()?;

        let auto_start = self.config.auto_start;
        let scheduler = Arc::new(Scheduler::new(self.session, self.config));
        scheduler.spawn(ReporterWorker::new(Arc::clone(&scheduler)).run());
        if auto_start {
            scheduler.spawn(AutoStartWatcher::new(Arc::clone(&scheduler)).run());
        }

        info!(
            target: "crystal::runtime",
            mode = %scheduler.config().cycle_mode(),
            priority = %scheduler.config().placement_priority,
            auto_start,
            "automation ready"
        );
        Ok(AutoCrystal::new(scheduler))
    }
}
