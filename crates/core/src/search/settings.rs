/// What the search prefers when ordering candidates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PlacementPriority {
    /// Scan order.
    None,
    /// Closest to the target first.
    Distance,
    /// Highest estimated target damage first, kill shots short-circuit.
    #[default]
    Damage,
}

/// Whether self-damage gates are enforced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SafetyMode {
    #[default]
    Safe,
    Suicide,
}

/// Search tunables for one decision cycle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchSettings {
    pub placements_per_tick: usize,
    pub priority: PlacementPriority,
    pub use_backup_algorithm: bool,
    pub place_mode: SafetyMode,
    pub max_self_damage: f64,
    /// Placements must leave self-damage below this regardless of current health.
    pub min_self_health: f64,
    pub min_target_damage: f64,
    pub place_distance: f64,
    /// Upper bound on blocks returned by one geometric scan.
    pub scan_limit: usize,
}

impl SearchSettings {
    pub const DEFAULT_SCAN_LIMIT: usize = 50;
    pub const DEFAULT_MIN_SELF_HEALTH: f64 = 12.0;
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            placements_per_tick: 1,
            priority: PlacementPriority::Damage,
            use_backup_algorithm: false,
            place_mode: SafetyMode::Safe,
            max_self_damage: 3.0,
            min_self_health: Self::DEFAULT_MIN_SELF_HEALTH,
            min_target_damage: 2.0,
            place_distance: 5.0,
            scan_limit: Self::DEFAULT_SCAN_LIMIT,
        }
    }
}
