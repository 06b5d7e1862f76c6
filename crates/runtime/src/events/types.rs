//! Event types for different topics.

use serde::{Deserialize, Serialize};

use crystal_core::{BlockPos, EntityId};

/// Why the cycle stopped running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum StopReason {
    Requested,
    Disabled,
    NoTarget,
    NoDetonatable,
    Fault,
}

/// Scheduler state transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LifecycleEvent {
    Enabled,
    Disabled,
    Started { target: EntityId },
    Stopped { reason: StopReason },
}

/// Actions issued against the world and plan updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionEvent {
    /// A placement was confirmed by a spawn notification.
    Placed { block: BlockPos, entity: EntityId },

    /// The place call was rejected or the spawn was never confirmed.
    PlaceFailed { block: BlockPos, reason: String },

    Detonated { entity: EntityId },

    /// Break-mode safety kept the agent from detonating this entity.
    DetonationSkipped { entity: EntityId, self_damage: f64 },

    PlanRefreshed {
        target: EntityId,
        positions: Vec<BlockPos>,
        used_backup: bool,
    },
}

/// Periodic throughput reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    /// Counter deltas over one report interval.
    Throughput {
        wanted: u64,
        placed: u64,
        broke: u64,
        interval_ms: u64,
    },

    /// Nothing was placed during the interval.
    Idle {
        target: Option<String>,
        plan_size: usize,
        crystals: usize,
    },
}

impl TelemetryEvent {
    /// Confirmed placements per second, for throughput reports.
    pub fn placements_per_second(&self) -> Option<f64> {
        match self {
            Self::Throughput {
                placed,
                interval_ms,
                ..
            } if *interval_ms > 0 => Some(*placed as f64 * 1000.0 / *interval_ms as f64),
            _ => None,
        }
    }
}

/// A cycle fault, published only when error logging is configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub message: String,
}
