use std::io::{self, Read};
use std::path::Path;

use serde::Deserialize;

use crate::engine::TileOdds;

/// When a session is considered finished.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndRule {
    /// Game over as soon as a tick finds no empty cell.
    #[default]
    FullBoard,
    /// Game over only once the board is full and no direction changes it.
    NoMoves,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GameConfig {
    /// RNG seed; entropy-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Chance in [0, 1] that a spawned tile is a 4.
    #[serde(default = "defaults::four_probability")]
    pub four_probability: f64,

    #[serde(default)]
    pub end_rule: EndRule,

    /// Spawn after every directional input, even one that moved nothing.
    #[serde(default = "defaults::spawn_on_unchanged_move")]
    pub spawn_on_unchanged_move: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: None,
            four_probability: defaults::four_probability(),
            end_rule: EndRule::default(),
            spawn_on_unchanged_move: defaults::spawn_on_unchanged_move(),
        }
    }
}

impl GameConfig {
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = std::fs::File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(contents)?;
        cfg.tile_odds()?;
        Ok(cfg)
    }

    /// Validated spawn odds.
    pub fn tile_odds(&self) -> Result<TileOdds, ConfigError> {
        TileOdds::new(self.four_probability).map_err(|e| ConfigError::Invalid(format!("four_probability: {e}")))
    }
}

mod defaults {
    pub fn four_probability() -> f64 { 0.5 }
    pub fn spawn_on_unchanged_move() -> bool { true }
}
