//! Match result evaluation.
//!
//! Pure function of a match and its games: no storage, no clock. Only the
//! configured disciplines count towards the match; the decider game is
//! consulted once the disciplines have split evenly.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{Result, Violation};
use crate::model::{Game, Match};
use crate::types::{DecisionMethod, GameSlot, Side};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchDecision {
    pub decided: bool,
    pub winner_side: Option<Side>,
    /// The disciplines split evenly and the decider game must be played
    pub needs_decider: bool,
    pub method: Option<DecisionMethod>,
    pub wins_a: u32,
    pub wins_b: u32,
    /// Summed scores of completed discipline games
    pub points_a: u32,
    pub points_b: u32,
}

impl MatchDecision {
    fn decided(side: Side, method: DecisionMethod) -> Self {
        Self {
            decided: true,
            winner_side: Some(side),
            method: Some(method),
            ..Default::default()
        }
    }
}

/// Winner side of a completed game, rejecting ties and missing scores.
pub fn game_winner(m: &Match, game: &Game) -> Result<Option<Side>> {
    if !game.complete {
        return Ok(None);
    }
    let (a, b) = match (game.score_a, game.score_b) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return Err(Violation::UnscoredGame {
                match_id: m.id,
                slot: game.slot,
            }
            .into())
        }
    };
    if a == b {
        return Err(Violation::TiedGame {
            match_id: m.id,
            slot: game.slot,
        }
        .into());
    }
    Ok(Some(if a > b { Side::A } else { Side::B }))
}

/// Decide a match from its recorded state.
///
/// Order of precedence: bye, forfeit, then games. A completed game with tied
/// or missing scores is an error; the evaluator never picks a side for it.
pub fn evaluate(m: &Match, games: &[&Game], config: &EngineConfig) -> Result<MatchDecision> {
    if m.is_bye {
        let side = match (&m.slot_a, &m.slot_b) {
            (Some(_), None) => Some(Side::A),
            (None, Some(_)) => Some(Side::B),
            (Some(_), Some(_)) => return Err(Violation::ByeWithTwoEntrants { match_id: m.id }.into()),
            (None, None) => None,
        };
        return Ok(match side {
            Some(side) => MatchDecision::decided(side, DecisionMethod::Bye),
            None => MatchDecision::default(),
        });
    }

    if let Some(forfeiting) = m.forfeit {
        return Ok(MatchDecision::decided(forfeiting.other(), DecisionMethod::Forfeit));
    }

    let mut decision = MatchDecision::default();
    if m.slot_a.is_none() || m.slot_b.is_none() {
        return Ok(decision);
    }

    let total = config.disciplines.len() as u32;
    let mut completed = 0;
    for game in games.iter().filter(|g| config.disciplines.contains(&g.slot)) {
        let Some(side) = game_winner(m, game)? else {
            continue;
        };
        completed += 1;
        decision.points_a += game.score_a.unwrap_or(0);
        decision.points_b += game.score_b.unwrap_or(0);
        match side {
            Side::A => decision.wins_a += 1,
            Side::B => decision.wins_b += 1,
        }
    }

    let majority = |wins: u32| wins * 2 > total;
    let settle = |mut decision: MatchDecision, side: Side, method: DecisionMethod| {
        decision.decided = true;
        decision.winner_side = Some(side);
        decision.method = Some(method);
        decision
    };

    if config.early_decision && completed < total {
        if majority(decision.wins_a) {
            return Ok(settle(decision, Side::A, DecisionMethod::Games));
        }
        if majority(decision.wins_b) {
            return Ok(settle(decision, Side::B, DecisionMethod::Games));
        }
    }

    if completed < total {
        return Ok(decision);
    }

    if decision.wins_a != decision.wins_b {
        let side = if decision.wins_a > decision.wins_b {
            Side::A
        } else {
            Side::B
        };
        return Ok(settle(decision, side, DecisionMethod::Games));
    }

    // Even split
    let decider = games.iter().find(|g| g.slot == GameSlot::Tiebreaker);
    if let Some(game) = decider {
        if let Some(side) = game_winner(m, game)? {
            return Ok(settle(decision, side, DecisionMethod::Decider));
        }
    }
    if config.decide_split_by_points && decision.points_a != decision.points_b {
        let side = if decision.points_a > decision.points_b {
            Side::A
        } else {
            Side::B
        };
        return Ok(settle(decision, side, DecisionMethod::Points));
    }

    decision.needs_decider = true;
    Ok(decision)
}

/// Score written into each unplayed discipline game of a forfeited match
pub fn forfeit_score(winner: Side) -> (u32, u32) {
    match winner {
        Side::A => (1, 0),
        Side::B => (0, 1),
    }
}

#[cfg(test)]
#[path = "evaluator_tests.rs"]
mod evaluator_tests;
