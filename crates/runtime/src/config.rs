//! Scheduler configuration and environment loading.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crystal_core::{DamageModel, Difficulty, PlacementPriority, SafetyMode, SearchSettings};

use crate::api::Hand;
use crate::workers::CycleMode;

/// Prefix shared by every recognised environment variable.
pub const ENV_PREFIX: &str = "AUTOCRYSTAL_";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidEnv { key: String, value: String },

    #[error("{field} {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Every tunable of the automation.
///
/// Delays are counted in game ticks; intervals and timeouts in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoCrystalConfig {
    pub placements_per_tick: usize,
    pub tick_synchronized: bool,
    pub use_offhand: bool,
    pub placement_priority: PlacementPriority,
    pub use_backup_algorithm: bool,
    pub place_mode: SafetyMode,
    pub break_mode: SafetyMode,
    pub max_self_damage: f64,
    /// Placements must leave self-damage below this even at full health.
    pub min_self_health: f64,
    pub min_target_damage: f64,
    pub place_delay_ticks: u32,
    pub break_delay_ticks: u32,
    pub place_distance: f64,
    pub break_distance: f64,
    pub async_plan_refresh: bool,
    /// Detonate detonatable spawns in break range as soon as they appear.
    pub fast_mode: bool,

    /// Players farther than this are never acquired as targets.
    pub target_range: f64,
    pub auto_equip: bool,
    /// Start the cycle on its own once a target comes into range.
    pub auto_start: bool,
    /// Publish cycle faults on the error topic.
    pub log_errors: bool,
    pub explosion_power: f64,
    pub spawn_confirm_timeout_ms: u64,
    pub plan_refresh_interval_ms: u64,
    pub report_interval_ms: u64,
    pub tick_duration_ms: u64,
    pub event_buffer_size: usize,
}

impl Default for AutoCrystalConfig {
    fn default() -> Self {
        Self {
            placements_per_tick: 1,
            tick_synchronized: false,
            use_offhand: false,
            placement_priority: PlacementPriority::Damage,
            use_backup_algorithm: false,
            place_mode: SafetyMode::Safe,
            break_mode: SafetyMode::Safe,
            max_self_damage: 3.0,
            min_self_health: SearchSettings::DEFAULT_MIN_SELF_HEALTH,
            min_target_damage: 2.0,
            place_delay_ticks: 1,
            break_delay_ticks: 0,
            place_distance: 5.0,
            break_distance: 5.0,
            async_plan_refresh: true,
            fast_mode: false,
            target_range: 12.0,
            auto_equip: true,
            auto_start: false,
            log_errors: false,
            explosion_power: crystal_core::END_CRYSTAL_POWER,
            spawn_confirm_timeout_ms: 50,
            plan_refresh_interval_ms: 20,
            report_interval_ms: 1000,
            tick_duration_ms: 50,
            event_buffer_size: 100,
        }
    }
}

impl AutoCrystalConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Every field can be overridden by `AUTOCRYSTAL_<FIELD>` in upper snake
    /// case, e.g. `AUTOCRYSTAL_PLACEMENTS_PER_TICK=2` or
    /// `AUTOCRYSTAL_PLACE_MODE=suicide`. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };
        let mut config = Self::default();

        if let Some(v) = env.parse("PLACEMENTS_PER_TICK")? {
            config.placements_per_tick = v;
        }
        if let Some(v) = env.flag("TICK_SYNCHRONIZED")? {
            config.tick_synchronized = v;
        }
        if let Some(v) = env.flag("USE_OFFHAND")? {
            config.use_offhand = v;
        }
        if let Some(v) = env.parse("PLACEMENT_PRIORITY")? {
            config.placement_priority = v;
        }
        if let Some(v) = env.flag("USE_BACKUP_ALGORITHM")? {
            config.use_backup_algorithm = v;
        }
        if let Some(v) = env.parse("PLACE_MODE")? {
            config.place_mode = v;
        }
        if let Some(v) = env.parse("BREAK_MODE")? {
            config.break_mode = v;
        }
        if let Some(v) = env.parse("MAX_SELF_DAMAGE")? {
            config.max_self_damage = v;
        }
        if let Some(v) = env.parse("MIN_SELF_HEALTH")? {
            config.min_self_health = v;
        }
        if let Some(v) = env.parse("MIN_TARGET_DAMAGE")? {
            config.min_target_damage = v;
        }
        if let Some(v) = env.parse("PLACE_DELAY_TICKS")? {
            config.place_delay_ticks = v;
        }
        if let Some(v) = env.parse("BREAK_DELAY_TICKS")? {
            config.break_delay_ticks = v;
        }
        if let Some(v) = env.parse("PLACE_DISTANCE")? {
            config.place_distance = v;
        }
        if let Some(v) = env.parse("BREAK_DISTANCE")? {
            config.break_distance = v;
        }
        if let Some(v) = env.flag("ASYNC_PLAN_REFRESH")? {
            config.async_plan_refresh = v;
        }
        if let Some(v) = env.flag("FAST_MODE")? {
            config.fast_mode = v;
        }
        if let Some(v) = env.parse("TARGET_RANGE")? {
            config.target_range = v;
        }
        if let Some(v) = env.flag("AUTO_EQUIP")? {
            config.auto_equip = v;
        }
        if let Some(v) = env.flag("AUTO_START")? {
            config.auto_start = v;
        }
        if let Some(v) = env.flag("LOG_ERRORS")? {
            config.log_errors = v;
        }
        if let Some(v) = env.parse("EXPLOSION_POWER")? {
            config.explosion_power = v;
        }
        if let Some(v) = env.parse("SPAWN_CONFIRM_TIMEOUT_MS")? {
            config.spawn_confirm_timeout_ms = v;
        }
        if let Some(v) = env.parse("PLAN_REFRESH_INTERVAL_MS")? {
            config.plan_refresh_interval_ms = v;
        }
        if let Some(v) = env.parse("REPORT_INTERVAL_MS")? {
            config.report_interval_ms = v;
        }
        if let Some(v) = env.parse("TICK_DURATION_MS")? {
            config.tick_duration_ms = v;
        }
        if let Some(v) = env.parse::<usize>("EVENT_BUFFER_SIZE")? {
            config.event_buffer_size = v.max(1);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: "must be a positive number",
                })
            }
        }
        fn nonzero(field: &'static str, value: u64) -> Result<(), ConfigError> {
            if value == 0 {
                Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero",
                })
            } else {
                Ok(())
            }
        }

        nonzero("placements_per_tick", self.placements_per_tick as u64)?;
        positive("place_distance", self.place_distance)?;
        positive("break_distance", self.break_distance)?;
        positive("min_self_health", self.min_self_health)?;
        positive("target_range", self.target_range)?;
        positive("explosion_power", self.explosion_power)?;
        nonzero("spawn_confirm_timeout_ms", self.spawn_confirm_timeout_ms)?;
        nonzero("plan_refresh_interval_ms", self.plan_refresh_interval_ms)?;
        nonzero("report_interval_ms", self.report_interval_ms)?;
        nonzero("tick_duration_ms", self.tick_duration_ms)?;
        nonzero("event_buffer_size", self.event_buffer_size as u64)?;
        Ok(())
    }

    /// The subset of options the placement search reads.
    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            placements_per_tick: self.placements_per_tick,
            priority: self.placement_priority,
            use_backup_algorithm: self.use_backup_algorithm,
            place_mode: self.place_mode,
            max_self_damage: self.max_self_damage,
            min_self_health: self.min_self_health,
            min_target_damage: self.min_target_damage,
            place_distance: self.place_distance,
            scan_limit: SearchSettings::DEFAULT_SCAN_LIMIT,
        }
    }

    pub fn damage_model(&self, difficulty: Difficulty) -> DamageModel {
        DamageModel::new(difficulty).with_power(self.explosion_power)
    }

    pub fn cycle_mode(&self) -> CycleMode {
        if self.tick_synchronized {
            CycleMode::TickSynchronized
        } else {
            CycleMode::Unlocked
        }
    }

    pub fn hand(&self) -> Hand {
        if self.use_offhand { Hand::Off } else { Hand::Main }
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_millis(self.tick_duration_ms)
    }

    pub fn spawn_confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.spawn_confirm_timeout_ms)
    }

    pub fn plan_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.plan_refresh_interval_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn raw(&self, name: &str) -> Option<(String, String)> {
        let key = format!("{ENV_PREFIX}{name}");
        let value = (self.lookup)(&key)?;
        Some((key, value))
    }

    fn parse<T>(&self, name: &str) -> Result<Option<T>, ConfigError>
    where
        T: std::str::FromStr,
    {
        let Some((key, value)) = self.raw(name) else {
            return Ok(None);
        };
        value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { key, value })
    }

    fn flag(&self, name: &str) -> Result<Option<bool>, ConfigError> {
        let Some((key, value)) = self.raw(name) else {
            return Ok(None);
        };
        match value.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidEnv { key, value }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = AutoCrystalConfig::default();
        assert_eq!(config.placements_per_tick, 1);
        assert_eq!(config.placement_priority, PlacementPriority::Damage);
        assert_eq!(config.place_mode, SafetyMode::Safe);
        assert_eq!(config.max_self_damage, 3.0);
        assert_eq!(config.place_delay_ticks, 1);
        assert_eq!(config.break_delay_ticks, 0);
        assert!(config.async_plan_refresh);
        assert_eq!(config.min_self_health, 12.0);
        assert!(!config.fast_mode);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = AutoCrystalConfig::from_lookup(lookup(&[
            ("AUTOCRYSTAL_PLACEMENTS_PER_TICK", "3"),
            ("AUTOCRYSTAL_TICK_SYNCHRONIZED", "yes"),
            ("AUTOCRYSTAL_PLACE_MODE", "Suicide"),
            ("AUTOCRYSTAL_PLACEMENT_PRIORITY", "distance"),
            ("AUTOCRYSTAL_USE_OFFHAND", "on"),
        ]))
        .unwrap();

        assert_eq!(config.placements_per_tick, 3);
        assert_eq!(config.cycle_mode(), CycleMode::TickSynchronized);
        assert_eq!(config.place_mode, SafetyMode::Suicide);
        assert_eq!(config.placement_priority, PlacementPriority::Distance);
        assert_eq!(config.hand(), Hand::Off);
        assert_eq!(config.search_settings().placements_per_tick, 3);
    }

    #[test]
    fn self_health_floor_reaches_search_settings() {
        let config = AutoCrystalConfig::from_lookup(lookup(&[
            ("AUTOCRYSTAL_MIN_SELF_HEALTH", "6.5"),
            ("AUTOCRYSTAL_FAST_MODE", "true"),
        ]))
        .unwrap();

        assert_eq!(config.min_self_health, 6.5);
        assert_eq!(config.search_settings().min_self_health, 6.5);
        assert!(config.fast_mode);

        let err = AutoCrystalConfig::from_lookup(lookup(&[("AUTOCRYSTAL_MIN_SELF_HEALTH", "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    }

    #[test]
    fn malformed_values_are_reported_with_their_key() {
        let err = AutoCrystalConfig::from_lookup(lookup(&[("AUTOCRYSTAL_AUTO_START", "maybe")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidEnv {
                key: "AUTOCRYSTAL_AUTO_START".into(),
                value: "maybe".into()
            }
        );
    }

    #[test]
    fn validation_rejects_degenerate_settings() {
        let config = AutoCrystalConfig {
            placements_per_tick: 0,
            ..AutoCrystalConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "placements_per_tick",
                ..
            })
        ));

        let config = AutoCrystalConfig {
            place_distance: -1.0,
            ..AutoCrystalConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: AutoCrystalConfig =
            serde_json::from_str(r#"{ "placements_per_tick": 2, "break_mode": "suicide" }"#).unwrap();
        assert_eq!(config.placements_per_tick, 2);
        assert_eq!(config.break_mode, SafetyMode::Suicide);
        assert_eq!(config.place_distance, 5.0);
    }
}
