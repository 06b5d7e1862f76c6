//! Enabled/running state machine.

use serde::{Deserialize, Serialize};

use crate::api::RuntimeError;

/// Coarse phase derived from [`SchedulerState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Disabled,
    Idle,
    Running,
}

/// `running` implies `enabled`; every transition below preserves that.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerState {
    pub enabled: bool,
    pub running: bool,
}

impl SchedulerState {
    pub const fn phase(&self) -> Phase {
        match (self.enabled, self.running) {
            (false, _) => Phase::Disabled,
            (true, false) => Phase::Idle,
            (true, true) => Phase::Running,
        }
    }

    /// Returns whether anything changed. Enabling never starts the cycle.
    pub(crate) fn enable(&mut self) -> bool {
        !std::mem::replace(&mut self.enabled, true)
    }

    pub(crate) fn disable(&mut self) -> bool {
        let changed = self.enabled || self.running;
        *self = Self::default();
        changed
    }

    pub(crate) fn start(&mut self) -> Result<(), RuntimeError> {
        if !self.enabled {
            return Err(RuntimeError::Disabled);
        }
        if self.running {
            return Err(RuntimeError::AlreadyRunning);
        }
        self.running = true;
        Ok(())
    }

    pub(crate) fn stop(&mut self) -> bool {
        std::mem::replace(&mut self.running, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enable_does_not_start() {
        let mut state = SchedulerState::default();
        assert!(state.enable());
        assert_eq!(state.phase(), Phase::Idle);
        assert!(!state.enable());
    }

    #[test]
    fn disable_is_idempotent() {
        let mut state = SchedulerState::default();
        state.enable();
        state.start().unwrap();

        assert!(state.disable());
        let once = state;
        assert!(!state.disable());
        assert_eq!(state, once);
        assert_eq!(
            state,
            SchedulerState {
                enabled: false,
                running: false
            }
        );
    }

    #[test]
    fn start_requires_enabled_idle() {
        let mut state = SchedulerState::default();
        assert!(matches!(state.start(), Err(RuntimeError::Disabled)));

        state.enable();
        state.start().unwrap();
        assert!(matches!(state.start(), Err(RuntimeError::AlreadyRunning)));

        assert!(state.stop());
        assert!(!state.stop());
        assert_eq!(state.phase(), Phase::Idle);
    }
}
