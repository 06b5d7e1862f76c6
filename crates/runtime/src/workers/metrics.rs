//! Placement and detonation counters.
//!
//! Counters only ever grow; the reporter diffs snapshots to derive rates.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Counters shared by the cycle and the reporter.
///
/// Uses atomics for lock-free access across tasks.
#[derive(Debug, Default)]
pub struct CycleCounters {
    /// Place attempts, including ones satisfied by an existing entity
    wanted_placed: AtomicU64,

    /// Placements confirmed by a spawn notification
    num_placed: AtomicU64,

    /// Detonatable entities observed leaving the world
    num_broke: AtomicU64,
}

impl CycleCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_wanted(&self) {
        self.wanted_placed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_placed(&self) {
        self.num_placed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_broke(&self) {
        self.num_broke.fetch_add(1, Ordering::Relaxed);
    }

    pub fn wanted_placed(&self) -> u64 {
        self.wanted_placed.load(Ordering::Relaxed)
    }

    pub fn num_placed(&self) -> u64 {
        self.num_placed.load(Ordering::Relaxed)
    }

    pub fn num_broke(&self) -> u64 {
        self.num_broke.load(Ordering::Relaxed)
    }

    /// Note: not atomic across fields; good enough for reporting.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            wanted_placed: self.wanted_placed(),
            num_placed: self.num_placed(),
            num_broke: self.num_broke(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub wanted_placed: u64,
    pub num_placed: u64,
    pub num_broke: u64,
}

impl CounterSnapshot {
    /// Growth since `earlier`.
    pub fn since(&self, earlier: &Self) -> Self {
        Self {
            wanted_placed: self.wanted_placed.saturating_sub(earlier.wanted_placed),
            num_placed: self.num_placed.saturating_sub(earlier.num_placed),
            num_broke: self.num_broke.saturating_sub(earlier.num_broke),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_diff_reports_growth() {
        let counters = CycleCounters::new();
        counters.record_wanted();
        let before = counters.snapshot();

        counters.record_wanted();
        counters.record_placed();
        counters.record_broke();
        counters.record_broke();

        let delta = counters.snapshot().since(&before);
        assert_eq!(
            delta,
            CounterSnapshot {
                wanted_placed: 1,
                num_placed: 1,
                num_broke: 2
            }
        );
    }
}
