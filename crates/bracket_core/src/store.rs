//! Persistence seam and the in-memory reference store.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::{EngineError, Result};
use crate::model::{Game, Match, Round, Stage};
use crate::types::{GameId, MatchId, RoundId, StageId};

/// Keyed read/write access to stored stages.
///
/// Implementations must apply a [`WriteBatch`] all-or-nothing: after a failed
/// `commit` the store holds exactly what it held before.
pub trait Store {
    fn stage(&self, id: &StageId) -> Result<Option<Stage>>;

    fn stages(&self) -> Result<Vec<Stage>>;

    fn rounds(&self, stage: &StageId) -> Result<Vec<Round>>;

    fn matches(&self, stage: &StageId) -> Result<Vec<Match>>;

    fn games(&self, stage: &StageId) -> Result<Vec<Game>>;

    /// Resolve the stage that owns a match
    fn match_stage(&self, id: &MatchId) -> Result<Option<StageId>>;

    fn commit(&mut self, batch: WriteBatch) -> Result<()>;
}

/// A set of writes applied as one unit of work.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub stages: Vec<Stage>,
    pub rounds: Vec<Round>,
    pub matches: Vec<Match>,
    pub games: Vec<Game>,
    pub delete_rounds: Vec<RoundId>,
    pub delete_matches: Vec<MatchId>,
    pub delete_games: Vec<GameId>,
}

impl WriteBatch {
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
            && self.rounds.is_empty()
            && self.matches.is_empty()
            && self.games.is_empty()
            && self.delete_rounds.is_empty()
            && self.delete_matches.is_empty()
            && self.delete_games.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
            + self.rounds.len()
            + self.matches.len()
            + self.games.len()
            + self.delete_rounds.len()
            + self.delete_matches.len()
            + self.delete_games.len()
    }
}

/// Flat tables keyed by id; linkage between rows is by id only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    stages: BTreeMap<StageId, Stage>,
    rounds: BTreeMap<RoundId, Round>,
    matches: BTreeMap<MatchId, Match>,
    games: BTreeMap<GameId, Game>,
    /// Creation stamp handed to the next new round
    next_seq: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store snapshot from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Storage(format!("failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&contents)
            .map_err(|e| EngineError::Storage(format!("failed to parse snapshot: {}", e)))
    }

    /// Save a store snapshot to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| EngineError::Storage(format!("failed to serialize: {}", e)))?;
        std::fs::write(path, json)
            .map_err(|e| EngineError::Storage(format!("failed to write {}: {}", path.display(), e)))
    }

    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    fn check_batch(&self, batch: &WriteBatch) -> Result<()> {
        let new_stages: BTreeSet<StageId> = batch.stages.iter().map(|s| s.id).collect();
        let known_stage = |id: &StageId| self.stages.contains_key(id) || new_stages.contains(id);

        for round in &batch.rounds {
            if !known_stage(&round.stage_id) {
                return Err(EngineError::Storage(format!(
                    "round {} references unknown stage {}",
                    round.id, round.stage_id
                )));
            }
        }
        let new_rounds: BTreeSet<RoundId> = batch.rounds.iter().map(|r| r.id).collect();
        for m in &batch.matches {
            if !self.rounds.contains_key(&m.round_id) && !new_rounds.contains(&m.round_id) {
                return Err(EngineError::Storage(format!(
                    "match {} references unknown round {}",
                    m.id, m.round_id
                )));
            }
        }
        let new_matches: BTreeSet<MatchId> = batch.matches.iter().map(|m| m.id).collect();
        for game in &batch.games {
            if !self.matches.contains_key(&game.match_id) && !new_matches.contains(&game.match_id) {
                return Err(EngineError::Storage(format!(
                    "game {} references unknown match {}",
                    game.id, game.match_id
                )));
            }
        }
        Ok(())
    }
}

impl Store for MemoryStore {
    fn stage(&self, id: &StageId) -> Result<Option<Stage>> {
        Ok(self.stages.get(id).cloned())
    }

    fn stages(&self) -> Result<Vec<Stage>> {
        Ok(self.stages.values().cloned().collect())
    }

    fn rounds(&self, stage: &StageId) -> Result<Vec<Round>> {
        let mut rounds: Vec<Round> = self
            .rounds
            .values()
            .filter(|r| &r.stage_id == stage)
            .cloned()
            .collect();
        rounds.sort_by_key(|r| (r.idx, r.created_seq));
        Ok(rounds)
    }

    fn matches(&self, stage: &StageId) -> Result<Vec<Match>> {
        Ok(self
            .matches
            .values()
            .filter(|m| &m.stage_id == stage)
            .cloned()
            .collect())
    }

    fn games(&self, stage: &StageId) -> Result<Vec<Game>> {
        Ok(self
            .games
            .values()
            .filter(|g| {
                self.matches
                    .get(&g.match_id)
                    .is_some_and(|m| &m.stage_id == stage)
            })
            .cloned()
            .collect())
    }

    fn match_stage(&self, id: &MatchId) -> Result<Option<StageId>> {
        Ok(self.matches.get(id).map(|m| m.stage_id))
    }

    fn commit(&mut self, batch: WriteBatch) -> Result<()> {
        self.check_batch(&batch)?;

        for id in &batch.delete_games {
            self.games.remove(id);
        }
        for id in &batch.delete_matches {
            self.matches.remove(id);
        }
        for id in &batch.delete_rounds {
            self.rounds.remove(id);
        }
        for stage in batch.stages {
            self.stages.insert(stage.id, stage);
        }
        for mut round in batch.rounds {
            if !self.rounds.contains_key(&round.id) {
                round.created_seq = self.next_seq;
                self.next_seq += 1;
            }
            self.rounds.insert(round.id, round);
        }
        for m in batch.matches {
            self.matches.insert(m.id, m);
        }
        for game in batch.games {
            self.games.insert(game.id, game);
        }
        Ok(())
    }
}
