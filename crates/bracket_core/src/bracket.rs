//! Elimination bracket construction.
//!
//! A field of `n` entrants is padded to `P = 2^D` lines. The winner bracket
//! has `D` rounds; the round at depth `d` holds `2^d` matches and every match
//! past the first round takes the winners of two adjacent matches.
//!
//! Double elimination adds a loser bracket of `2(D - 1)` rounds:
//!
//! - loser round 0 pairs the losers of adjacent first-round matches
//! - for each later winner round `j`, a "major" loser round sets the winners
//!   of the previous loser round against the losers dropping out of winner
//!   round `j`, in reversed order when `j` is odd so early rematches are
//!   pushed back
//! - between two major rounds a "minor" round pairs loser-bracket winners
//!
//! The last loser round is the loser final (depth 0). A FINALS round then
//! takes the winner-bracket champion (slot A) and the loser-bracket champion
//! (slot B). With `grand_final_reset` that first final sits at depth 1 and a
//! depth-0 reset final takes its loser (A) and winner (B); it is only filled
//! when the loser-bracket champion wins the first final.
//!
//! Feed counts are known statically: a first-round bye yields a winner but
//! no loser. Loser-bracket matches that can only ever receive one entrant are
//! built as byes so they auto-advance when that entrant arrives.

use std::collections::HashMap;

use tracing::info;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::graph::StageGraph;
use crate::model::{Match, Round, SourceLink};
use crate::seeding::{bracket_size, first_round_pairs};
use crate::types::{
    BracketSide, CompetitionMode, EntrantId, GameSlot, MatchId, RoundId, SlotRole, StageId,
};

/// Smallest field each mode accepts
pub fn minimum_entrants(mode: CompetitionMode) -> usize {
    match mode {
        CompetitionMode::RoundRobin => 0,
        CompetitionMode::SingleElimination => 2,
        CompetitionMode::DoubleElimination => 3,
    }
}

/// Shape of a built elimination bracket, by round and position.
#[derive(Debug, Clone, Default)]
pub struct BracketLayout {
    pub winner_rounds: Vec<Vec<MatchId>>,
    pub loser_rounds: Vec<Vec<MatchId>>,
    pub finals: Vec<MatchId>,
}

impl BracketLayout {
    /// Final of the whole bracket: the reset final, the grand final, or the
    /// winner-bracket final for single elimination
    pub fn deciding_match(&self) -> Option<MatchId> {
        self.finals
            .last()
            .or_else(|| self.winner_rounds.last().and_then(|r| r.first()))
            .copied()
    }
}

/// Build the rounds, matches and games of an elimination stage.
///
/// The stage's entrants are taken in seeding order. First-round byes are
/// placed in slot A and marked, but not decided here.
pub(crate) fn build_elimination(
    graph: &mut StageGraph,
    config: &EngineConfig,
) -> Result<BracketLayout> {
    let mode = graph.stage().mode;
    let entrants: Vec<EntrantId> = graph.stage().entrants.iter().map(|e| e.id.clone()).collect();

    if !mode.is_elimination() {
        return Err(EngineError::Input(format!(
            "{} is not an elimination format",
            mode
        )));
    }
    let minimum = minimum_entrants(mode);
    if entrants.len() < minimum {
        return Err(EngineError::Input(format!(
            "{} needs at least {} entrants, got {}",
            mode,
            minimum,
            entrants.len()
        )));
    }

    let mut builder = Builder {
        stage_id: graph.stage().id,
        graph,
        slots: config.game_slots(),
        feeds: HashMap::new(),
        next_idx: 0,
    };

    let mut layout = BracketLayout {
        winner_rounds: builder.winner_bracket(&entrants),
        ..Default::default()
    };

    if mode == CompetitionMode::DoubleElimination {
        layout.loser_rounds = builder.loser_bracket(&layout.winner_rounds);
        let winner_final = layout.winner_rounds.last().and_then(|r| r.first()).copied();
        let loser_final = layout.loser_rounds.last().and_then(|r| r.first()).copied();
        if let (Some(wf), Some(lf)) = (winner_final, loser_final) {
            layout.finals = builder.finals(wf, lf, config.grand_final_reset);
        }
    }

    info!(
        stage = %builder.graph.stage().name,
        %mode,
        entrants = entrants.len(),
        rounds = builder.graph.rounds().len(),
        matches = builder.graph.matches().len(),
        "built elimination bracket"
    );
    Ok(layout)
}

struct Builder<'a> {
    graph: &'a mut StageGraph,
    stage_id: StageId,
    slots: Vec<GameSlot>,
    /// How many entrants each match can ever receive
    feeds: HashMap<MatchId, u8>,
    next_idx: u32,
}

impl Builder<'_> {
    fn push_round(&mut self, side: BracketSide, depth: u32) -> RoundId {
        let round = Round {
            id: RoundId::new(),
            stage_id: self.stage_id,
            idx: self.next_idx,
            side: Some(side),
            depth: Some(depth),
            created_seq: 0,
        };
        self.next_idx += 1;
        let id = round.id;
        self.graph.push_round(round);
        id
    }

    /// Whether a link can ever deliver an entrant
    fn yields(&self, link: &SourceLink) -> u8 {
        let count = self.feeds.get(&link.match_id).copied().unwrap_or(0);
        match link.role {
            SlotRole::Winner => u8::from(count >= 1),
            // Only a genuinely contested match produces a loser
            SlotRole::Loser => u8::from(count == 2),
        }
    }

    fn push_linked(&mut self, round: RoundId, position: u32, a: SourceLink, b: SourceLink) -> MatchId {
        let count = self.yields(&a) + self.yields(&b);
        let mut m = Match::new(self.stage_id, round, position);
        m.source_a = Some(a);
        m.source_b = Some(b);
        m.is_bye = count < 2;
        self.feeds.insert(m.id, count);
        self.graph.push_match_with_games(m, &self.slots)
    }

    fn winner_bracket(&mut self, entrants: &[EntrantId]) -> Vec<Vec<MatchId>> {
        let depth_count = bracket_size(entrants.len()).trailing_zeros();
        let mut rounds: Vec<Vec<MatchId>> = Vec::with_capacity(depth_count as usize);

        // Seeded first round
        let round = self.push_round(BracketSide::Winner, depth_count - 1);
        let mut first = Vec::new();
        for (position, (high, low)) in first_round_pairs(entrants.len()).into_iter().enumerate() {
            let mut m = Match::new(self.stage_id, round, position as u32);
            m.slot_a = Some(entrants[high as usize - 1].clone());
            m.seed_a = Some(high);
            match low {
                Some(low) => {
                    m.slot_b = Some(entrants[low as usize - 1].clone());
                    m.seed_b = Some(low);
                }
                None => m.is_bye = true,
            }
            self.feeds.insert(m.id, m.filled_slots() as u8);
            first.push(self.graph.push_match_with_games(m, &self.slots));
        }
        rounds.push(first);

        for depth in (0..depth_count - 1).rev() {
            let round = self.push_round(BracketSide::Winner, depth);
            let previous = rounds[rounds.len() - 1].clone();
            let current = previous
                .chunks(2)
                .enumerate()
                .map(|(j, pair)| {
                    self.push_linked(
                        round,
                        j as u32,
                        SourceLink::winner_of(pair[0]),
                        SourceLink::winner_of(pair[1]),
                    )
                })
                .collect();
            rounds.push(current);
        }
        rounds
    }

    fn loser_bracket(&mut self, winners: &[Vec<MatchId>]) -> Vec<Vec<MatchId>> {
        let d = winners.len();
        let total = 2 * (d - 1);
        let depth_of = |lb_idx: usize| (total - 1 - lb_idx) as u32;
        let mut rounds: Vec<Vec<MatchId>> = Vec::with_capacity(total);

        // First-round losers meet each other
        let round = self.push_round(BracketSide::Loser, depth_of(0));
        let opening = winners[0]
            .chunks(2)
            .enumerate()
            .map(|(k, pair)| {
                self.push_linked(
                    round,
                    k as u32,
                    SourceLink::loser_of(pair[0]),
                    SourceLink::loser_of(pair[1]),
                )
            })
            .collect();
        rounds.push(opening);

        for j in 1..d {
            // Major round: survivors against the losers of winner round j
            let survivors = rounds[rounds.len() - 1].clone();
            let dropping = &winners[j];
            let count = dropping.len();
            let round = self.push_round(BracketSide::Loser, depth_of(rounds.len()));
            let major = (0..count)
                .map(|k| {
                    let from = if j % 2 == 1 { count - 1 - k } else { k };
                    self.push_linked(
                        round,
                        k as u32,
                        SourceLink::winner_of(survivors[k]),
                        SourceLink::loser_of(dropping[from]),
                    )
                })
                .collect();
            rounds.push(major);

            if j < d - 1 {
                // Minor round: loser-bracket winners pair off
                let previous = rounds[rounds.len() - 1].clone();
                let round = self.push_round(BracketSide::Loser, depth_of(rounds.len()));
                let minor = previous
                    .chunks(2)
                    .enumerate()
                    .map(|(k, pair)| {
                        self.push_linked(
                            round,
                            k as u32,
                            SourceLink::winner_of(pair[0]),
                            SourceLink::winner_of(pair[1]),
                        )
                    })
                    .collect();
                rounds.push(minor);
            }
        }
        rounds
    }

    fn finals(&mut self, winner_final: MatchId, loser_final: MatchId, reset: bool) -> Vec<MatchId> {
        let depth = if reset { 1 } else { 0 };
        let round = self.push_round(BracketSide::Finals, depth);
        let grand_final = self.push_linked(
            round,
            0,
            SourceLink::winner_of(winner_final),
            SourceLink::winner_of(loser_final),
        );
        let mut finals = vec![grand_final];

        if reset {
            let round = self.push_round(BracketSide::Finals, 0);
            finals.push(self.push_linked(
                round,
                0,
                SourceLink::loser_of(grand_final),
                SourceLink::winner_of(grand_final),
            ));
        }
        finals
    }
}

/// Whether a match is a reset final: both of its slots come from one match.
pub fn is_reset_final(m: &Match) -> bool {
    match (&m.source_a, &m.source_b) {
        (Some(a), Some(b)) => a.match_id == b.match_id,
        _ => false,
    }
}

#[cfg(test)]
#[path = "bracket_tests.rs"]
mod bracket_tests;
