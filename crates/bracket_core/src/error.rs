//! Error taxonomy for stage operations.

use std::fmt;

use thiserror::Error;

use crate::types::{EntrantId, GameSlot, MatchId, RoundId, Side};

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Advancement would overwrite a populated slot with a different entrant.
    #[error("structural conflict in match {match_id} slot {side}: holds {existing}, refusing to write {incoming}")]
    StructuralConflict {
        match_id: MatchId,
        side: Side,
        existing: EntrantId,
        incoming: EntrantId,
    },

    #[error("invariant violation: {0}")]
    InvariantViolation(Violation),

    #[error("invalid input: {0}")]
    Input(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl EngineError {
    pub fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        EngineError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<Violation> for EngineError {
    fn from(v: Violation) -> Self {
        EngineError::InvariantViolation(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Stage,
    Round,
    Match,
    Game,
    Entrant,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Stage => "stage",
            EntityKind::Round => "round",
            EntityKind::Match => "match",
            EntityKind::Game => "game",
            EntityKind::Entrant => "entrant",
        };
        f.write_str(s)
    }
}

/// A broken structural rule found in stored stage data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("{} rounds share key {key}: {}", rounds.len(), join_ids(rounds))]
    DuplicateRounds { key: String, rounds: Vec<RoundId> },

    #[error("loser-bracket final {match_id} is missing source link {missing}")]
    OrphanedLoserFinal { match_id: MatchId, missing: Side },

    #[error("bye match {match_id} has both slots filled")]
    ByeWithTwoEntrants { match_id: MatchId },

    #[error("completed game {slot} in match {match_id} has tied scores")]
    TiedGame { match_id: MatchId, slot: GameSlot },

    #[error("completed game {slot} in match {match_id} is missing a score")]
    UnscoredGame { match_id: MatchId, slot: GameSlot },

    #[error("match {match_id} is missing game {slot}")]
    MissingGame { match_id: MatchId, slot: GameSlot },

    #[error("match {match_id} slot {side} links to unknown match {source_id}")]
    DanglingSource {
        match_id: MatchId,
        side: Side,
        source_id: MatchId,
    },

    #[error("duplicate matches at {key} position {position} both carry results")]
    ConflictingResults { key: String, position: u32 },
}

fn join_ids(ids: &[RoundId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
