//! Session-wide game settings that influence damage and safety rules.

/// World difficulty. Scales explosion damage dealt to players.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Difficulty {
    Peaceful,
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    /// Multiplier applied to mitigated player damage.
    pub const fn damage_scale(self) -> f64 {
        match self {
            Self::Peaceful => 0.0,
            Self::Easy => 0.5,
            Self::Normal => 1.0,
            Self::Hard => 1.5,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GameMode {
    #[default]
    Survival,
    Creative,
    Adventure,
    Spectator,
}

/// Difficulty and game mode of the session the agent plays in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameRules {
    pub difficulty: Difficulty,
    pub game_mode: GameMode,
}

impl GameRules {
    pub const fn new(difficulty: Difficulty, game_mode: GameMode) -> Self {
        Self {
            difficulty,
            game_mode,
        }
    }

    /// Self-damage cannot hurt the agent, so safety gates are skipped.
    pub const fn ignores_self_damage(&self) -> bool {
        matches!(self.difficulty, Difficulty::Peaceful)
            || matches!(self.game_mode, GameMode::Creative)
    }
}
