//! Engine configuration, loadable from TOML.
//!
//! ```toml
//! disciplines = ["MENS_DOUBLES", "WOMENS_DOUBLES", "MIXED_1", "MIXED_2"]
//! early_decision = true
//! grand_final_reset = false
//!
//! [points]
//! win = 3
//! loss = 1
//! forfeit_loss = 0
//!
//! [[overrides]]
//! stage = "Stop 3"
//! entrant = "four-fathers"
//! rule = "forfeits_as_byes"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{EngineError, Result};
use crate::types::{EntrantId, GameSlot};

/// Standings points awarded per decided match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointsScheme {
    pub win: u32,
    pub loss: u32,
    /// Points for the side that conceded by forfeit
    pub forfeit_loss: u32,
}

impl Default for PointsScheme {
    fn default() -> Self {
        Self {
            win: 1,
            loss: 0,
            forfeit_loss: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideRule {
    /// The entrant earns no points in the stage; its record still counts
    ZeroPoints,
    /// Matches the entrant forfeited in the stage count for neither side
    ForfeitsAsByes,
}

/// A data-driven exception to the points scheme for one entrant in one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsOverride {
    /// Stage id or stage name
    pub stage: String,
    pub entrant: EntrantId,
    pub rule: OverrideRule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Discipline games created for every playable match, in order
    pub disciplines: Vec<GameSlot>,
    /// Decide as soon as one side has won more than half the disciplines
    pub early_decision: bool,
    /// On an even split, decide by total points when they differ
    pub decide_split_by_points: bool,
    /// Add a second grand final when the loser-bracket champion wins the first
    pub grand_final_reset: bool,
    pub points: PointsScheme,
    pub overrides: Vec<StandingsOverride>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            disciplines: GameSlot::DISCIPLINES.to_vec(),
            early_decision: true,
            decide_split_by_points: false,
            grand_final_reset: false,
            points: PointsScheme::default(),
            overrides: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("failed to parse: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.disciplines.is_empty() {
            return Err(EngineError::Config("at least one discipline is required".into()));
        }
        if self.disciplines.iter().any(|slot| slot.is_decider()) {
            return Err(EngineError::Config(
                "the decider slot cannot be listed as a discipline".into(),
            ));
        }
        for (i, slot) in self.disciplines.iter().enumerate() {
            if self.disciplines[..i].contains(slot) {
                return Err(EngineError::Config(format!("discipline {} listed twice", slot)));
            }
        }
        Ok(())
    }

    /// Every game slot a playable match carries, decider last
    pub fn game_slots(&self) -> Vec<GameSlot> {
        let mut slots = self.disciplines.clone();
        slots.push(GameSlot::Tiebreaker);
        slots
    }

    /// Overrides that apply to a stage, matched by id or name
    pub fn overrides_for<'a>(
        &'a self,
        stage_id: &'a str,
        stage_name: &'a str,
    ) -> impl Iterator<Item = &'a StandingsOverride> + 'a {
        self.overrides
            .iter()
            .filter(move |o| o.stage == stage_id || o.stage == stage_name)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
