//! Stage data model: entrants, rounds, matches and games.
//!
//! Bracket linkage is expressed purely through ids. A match names the
//! upstream matches that fill its slots; it never owns or borrows them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{
    BracketSide, CompetitionMode, DecisionMethod, EntrantId, GameId, GameSlot, MatchId, RoundId,
    Side, SlotRole, StageId,
};

/// A competing team, supplied by the caller in seeding order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entrant {
    pub id: EntrantId,
    pub name: String,
    /// Optional division/tier the team was registered in
    #[serde(default)]
    pub division: Option<String>,
}

impl Entrant {
    pub fn new(id: impl Into<EntrantId>, name: &str) -> Self {
        Self {
            id: id.into(),
            name: name.to_string(),
            division: None,
        }
    }

    /// Entrant whose id and display name are the same string
    pub fn named(name: &str) -> Self {
        Self::new(name, name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    pub name: String,
    pub mode: CompetitionMode,
    pub entrants: Vec<Entrant>,
    /// Rounds in schedule order
    pub rounds: Vec<RoundId>,
}

impl Stage {
    pub fn entrant(&self, id: &EntrantId) -> Option<&Entrant> {
        self.entrants.iter().find(|e| &e.id == id)
    }
}

/// Identity of a round inside its stage. At most one round may hold a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoundKey {
    /// Round-robin rounds have no side and are keyed by schedule index
    Schedule(u32),
    Bracket(BracketSide, u32),
}

impl fmt::Display for RoundKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundKey::Schedule(idx) => write!(f, "round {}", idx),
            RoundKey::Bracket(side, depth) => write!(f, "{} depth {}", side, depth),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub stage_id: StageId,
    /// Position in the stage's schedule
    pub idx: u32,
    pub side: Option<BracketSide>,
    /// Distance from the final match of this side (0 = final)
    pub depth: Option<u32>,
    /// Creation order within the store; lower is older
    pub created_seq: u64,
}

impl Round {
    pub fn key(&self) -> RoundKey {
        match (self.side, self.depth) {
            (Some(side), Some(depth)) => RoundKey::Bracket(side, depth),
            _ => RoundKey::Schedule(self.idx),
        }
    }
}

/// Upstream match feeding one slot, and which of its results is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLink {
    pub match_id: MatchId,
    pub role: SlotRole,
}

impl SourceLink {
    pub fn winner_of(match_id: MatchId) -> Self {
        Self {
            match_id,
            role: SlotRole::Winner,
        }
    }

    pub fn loser_of(match_id: MatchId) -> Self {
        Self {
            match_id,
            role: SlotRole::Loser,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub stage_id: StageId,
    pub round_id: RoundId,
    /// Position of the match inside its round
    pub position: u32,
    pub slot_a: Option<EntrantId>,
    pub slot_b: Option<EntrantId>,
    pub seed_a: Option<u32>,
    pub seed_b: Option<u32>,
    pub is_bye: bool,
    pub winner: Option<EntrantId>,
    pub forfeit: Option<Side>,
    pub source_a: Option<SourceLink>,
    pub source_b: Option<SourceLink>,
    pub decided_by: Option<DecisionMethod>,
    pub decided_at: Option<DateTime<Utc>>,
    /// Set once the disciplines split evenly and the decider must be played
    pub decider_active: bool,
}

impl Match {
    pub fn new(stage_id: StageId, round_id: RoundId, position: u32) -> Self {
        Self {
            id: MatchId::new(),
            stage_id,
            round_id,
            position,
            slot_a: None,
            slot_b: None,
            seed_a: None,
            seed_b: None,
            is_bye: false,
            winner: None,
            forfeit: None,
            source_a: None,
            source_b: None,
            decided_by: None,
            decided_at: None,
            decider_active: false,
        }
    }

    pub fn slot(&self, side: Side) -> Option<&EntrantId> {
        match side {
            Side::A => self.slot_a.as_ref(),
            Side::B => self.slot_b.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, side: Side) -> &mut Option<EntrantId> {
        match side {
            Side::A => &mut self.slot_a,
            Side::B => &mut self.slot_b,
        }
    }

    pub fn source(&self, side: Side) -> Option<&SourceLink> {
        match side {
            Side::A => self.source_a.as_ref(),
            Side::B => self.source_b.as_ref(),
        }
    }

    pub fn source_mut(&mut self, side: Side) -> &mut Option<SourceLink> {
        match side {
            Side::A => &mut self.source_a,
            Side::B => &mut self.source_b,
        }
    }

    pub fn is_decided(&self) -> bool {
        self.winner.is_some()
    }

    pub fn filled_slots(&self) -> usize {
        self.slot_a.is_some() as usize + self.slot_b.is_some() as usize
    }

    /// Which side the given entrant occupies
    pub fn side_of(&self, entrant: &EntrantId) -> Option<Side> {
        if self.slot_a.as_ref() == Some(entrant) {
            Some(Side::A)
        } else if self.slot_b.as_ref() == Some(entrant) {
            Some(Side::B)
        } else {
            None
        }
    }

    pub fn winner_side(&self) -> Option<Side> {
        self.winner.as_ref().and_then(|w| self.side_of(w))
    }

    /// The losing entrant of a decided, two-sided match
    pub fn loser(&self) -> Option<&EntrantId> {
        if self.is_bye {
            return None;
        }
        self.winner_side().and_then(|side| self.slot(side.other()))
    }

    /// Whether both entrants are known and the match can be played
    pub fn is_ready(&self) -> bool {
        !self.is_bye && self.slot_a.is_some() && self.slot_b.is_some() && self.winner.is_none()
    }

    pub fn clear_decision(&mut self) {
        self.winner = None;
        self.decided_by = None;
        self.decided_at = None;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub match_id: MatchId,
    pub slot: GameSlot,
    pub score_a: Option<u32>,
    pub score_b: Option<u32>,
    pub complete: bool,
    /// Score written by a forfeit rather than played
    #[serde(default)]
    pub filler: bool,
}

impl Game {
    pub fn new(match_id: MatchId, slot: GameSlot) -> Self {
        Self {
            id: GameId::new(),
            match_id,
            slot,
            score_a: None,
            score_b: None,
            complete: false,
            filler: false,
        }
    }

    pub fn clear(&mut self) {
        self.score_a = None;
        self.score_b = None;
        self.complete = false;
        self.filler = false;
    }

    /// Whether the game carries any recorded result
    pub fn has_result(&self) -> bool {
        self.complete || self.score_a.is_some() || self.score_b.is_some()
    }
}
