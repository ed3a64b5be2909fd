//! In-memory arena of one stage.
//!
//! Every engine operation loads a single stage into a [`StageGraph`], applies
//! all of its effects here, and turns the touched rows into one
//! [`WriteBatch`]. Nothing reaches the store until the whole operation has
//! succeeded.

use std::collections::{BTreeSet, HashMap};

use crate::error::{EngineError, EntityKind, Result};
use crate::model::{Game, Match, Round, RoundKey, Stage};
use crate::store::{Store, WriteBatch};
use crate::types::{BracketSide, GameId, GameSlot, MatchId, RoundId, Side, SlotRole, StageId};

/// A downstream slot fed by some match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feed {
    pub target: MatchId,
    pub side: Side,
    pub role: SlotRole,
}

#[derive(Debug, Clone)]
pub struct StageGraph {
    stage: Stage,
    rounds: Vec<Round>,
    matches: Vec<Match>,
    games: Vec<Game>,
    match_index: HashMap<MatchId, usize>,
    dirty_stage: bool,
    dirty_rounds: BTreeSet<RoundId>,
    dirty_matches: BTreeSet<MatchId>,
    dirty_games: BTreeSet<GameId>,
    deleted_rounds: Vec<RoundId>,
    deleted_matches: Vec<MatchId>,
    deleted_games: Vec<GameId>,
}

impl StageGraph {
    /// Start a graph for a stage that does not exist in the store yet
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            rounds: Vec::new(),
            matches: Vec::new(),
            games: Vec::new(),
            match_index: HashMap::new(),
            dirty_stage: true,
            dirty_rounds: BTreeSet::new(),
            dirty_matches: BTreeSet::new(),
            dirty_games: BTreeSet::new(),
            deleted_rounds: Vec::new(),
            deleted_matches: Vec::new(),
            deleted_games: Vec::new(),
        }
    }

    pub fn load(store: &dyn Store, id: &StageId) -> Result<Self> {
        let stage = store
            .stage(id)?
            .ok_or_else(|| EngineError::not_found(EntityKind::Stage, id))?;
        let mut graph = Self::new(stage);
        graph.dirty_stage = false;
        graph.rounds = store.rounds(id)?;
        graph.matches = store.matches(id)?;
        graph.games = store.games(id)?;
        graph.reindex();
        Ok(graph)
    }

    fn reindex(&mut self) {
        self.match_index = self
            .matches
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id, i))
            .collect();
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    pub fn round(&self, id: &RoundId) -> Option<&Round> {
        self.rounds.iter().find(|r| &r.id == id)
    }

    pub fn round_of(&self, m: &Match) -> Option<&Round> {
        self.round(&m.round_id)
    }

    pub fn side_of(&self, m: &Match) -> Option<BracketSide> {
        self.round_of(m).and_then(|r| r.side)
    }

    /// Oldest round holding the given key
    pub fn find_round(&self, key: RoundKey) -> Option<&Round> {
        self.rounds
            .iter()
            .filter(|r| r.key() == key)
            .min_by_key(|r| r.created_seq)
    }

    pub fn find_match(&self, id: &MatchId) -> Option<&Match> {
        self.match_index.get(id).map(|&i| &self.matches[i])
    }

    pub fn get_match(&self, id: &MatchId) -> Result<&Match> {
        self.find_match(id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Match, id))
    }

    /// Matches of a round ordered by position
    pub fn round_matches(&self, round: &RoundId) -> Vec<&Match> {
        let mut matches: Vec<&Match> = self.matches.iter().filter(|m| &m.round_id == round).collect();
        matches.sort_by_key(|m| m.position);
        matches
    }

    /// Match at a position of the oldest round with the given key
    pub fn match_at(&self, key: RoundKey, position: u32) -> Option<&Match> {
        let round = self.find_round(key)?;
        self.matches
            .iter()
            .find(|m| m.round_id == round.id && m.position == position)
    }

    pub fn games_of(&self, match_id: &MatchId) -> Vec<&Game> {
        self.games.iter().filter(|g| &g.match_id == match_id).collect()
    }

    /// Every downstream slot whose source link names `source`
    pub fn feeds_from(&self, source: &MatchId) -> Vec<Feed> {
        let mut feeds = Vec::new();
        for m in &self.matches {
            for side in [Side::A, Side::B] {
                if let Some(link) = m.source(side) {
                    if &link.match_id == source {
                        feeds.push(Feed {
                            target: m.id,
                            side,
                            role: link.role,
                        });
                    }
                }
            }
        }
        feeds
    }

    // =========================================================================
    // Writes
    // =========================================================================

    pub fn stage_mut(&mut self) -> &mut Stage {
        self.dirty_stage = true;
        &mut self.stage
    }

    pub fn push_round(&mut self, round: Round) {
        self.dirty_rounds.insert(round.id);
        self.stage.rounds.push(round.id);
        self.dirty_stage = true;
        self.rounds.push(round);
    }

    pub fn push_match(&mut self, m: Match) {
        self.dirty_matches.insert(m.id);
        self.match_index.insert(m.id, self.matches.len());
        self.matches.push(m);
    }

    /// Add a match and create one empty game per slot. Byes get no games.
    pub fn push_match_with_games(&mut self, m: Match, slots: &[GameSlot]) -> MatchId {
        let id = m.id;
        if !m.is_bye {
            for &slot in slots {
                self.push_game(Game::new(id, slot));
            }
        }
        self.push_match(m);
        id
    }

    pub fn push_game(&mut self, game: Game) {
        self.dirty_games.insert(game.id);
        self.games.push(game);
    }

    pub fn match_mut(&mut self, id: &MatchId) -> Result<&mut Match> {
        let &i = self
            .match_index
            .get(id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Match, id))?;
        self.dirty_matches.insert(*id);
        Ok(&mut self.matches[i])
    }

    pub fn game_mut(&mut self, match_id: &MatchId, slot: GameSlot) -> Result<&mut Game> {
        let game = self
            .games
            .iter_mut()
            .find(|g| &g.match_id == match_id && g.slot == slot)
            .ok_or_else(|| EngineError::not_found(EntityKind::Game, format!("{} {}", match_id, slot)))?;
        self.dirty_games.insert(game.id);
        Ok(game)
    }

    pub fn remove_round(&mut self, id: &RoundId) {
        self.rounds.retain(|r| &r.id != id);
        self.stage.rounds.retain(|r| r != id);
        self.dirty_stage = true;
        self.dirty_rounds.remove(id);
        self.deleted_rounds.push(*id);
    }

    /// Remove a match together with its games
    pub fn remove_match(&mut self, id: &MatchId) {
        let game_ids: Vec<GameId> = self
            .games
            .iter()
            .filter(|g| &g.match_id == id)
            .map(|g| g.id)
            .collect();
        for game_id in game_ids {
            self.games.retain(|g| g.id != game_id);
            self.dirty_games.remove(&game_id);
            self.deleted_games.push(game_id);
        }
        self.matches.retain(|m| &m.id != id);
        self.dirty_matches.remove(id);
        self.deleted_matches.push(*id);
        self.reindex();
    }

    pub fn has_changes(&self) -> bool {
        self.dirty_stage
            || !self.dirty_rounds.is_empty()
            || !self.dirty_matches.is_empty()
            || !self.dirty_games.is_empty()
            || !self.deleted_rounds.is_empty()
            || !self.deleted_matches.is_empty()
            || !self.deleted_games.is_empty()
    }

    /// Collect every touched row into one batch and reset change tracking
    pub fn take_batch(&mut self) -> WriteBatch {
        let mut batch = WriteBatch::default();
        if self.dirty_stage {
            batch.stages.push(self.stage.clone());
        }
        batch.rounds = self
            .rounds
            .iter()
            .filter(|r| self.dirty_rounds.contains(&r.id))
            .cloned()
            .collect();
        batch.matches = self
            .matches
            .iter()
            .filter(|m| self.dirty_matches.contains(&m.id))
            .cloned()
            .collect();
        batch.games = self
            .games
            .iter()
            .filter(|g| self.dirty_games.contains(&g.id))
            .cloned()
            .collect();
        batch.delete_rounds = std::mem::take(&mut self.deleted_rounds);
        batch.delete_matches = std::mem::take(&mut self.deleted_matches);
        batch.delete_games = std::mem::take(&mut self.deleted_games);

        self.dirty_stage = false;
        self.dirty_rounds.clear();
        self.dirty_matches.clear();
        self.dirty_games.clear();
        batch
    }
}
