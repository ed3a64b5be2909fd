//! Round-robin pairing by the circle method.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::graph::StageGraph;
use crate::model::{Entrant, Match, Round};
use crate::types::{EntrantId, RoundId, StageId};

/// One pairing of a round-robin round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pairing {
    Match { a: EntrantId, b: EntrantId },
    /// The entrant sits out against the padding placeholder
    Bye(EntrantId),
}

impl Pairing {
    pub fn involves(&self, id: &EntrantId) -> bool {
        match self {
            Pairing::Match { a, b } => a == id || b == id,
            Pairing::Bye(e) => e == id,
        }
    }
}

/// Generate a full round-robin schedule.
///
/// An odd field is padded with a placeholder, so `n` entrants produce
/// `n - 1` rounds (even `n`) or `n` rounds (odd `n`), each with `padded / 2`
/// pairings. Position 0 stays fixed while every other position rotates one
/// step per round. Fewer than two entrants produce no rounds.
pub fn generate_round_robin(entrants: &[Entrant]) -> Vec<Vec<Pairing>> {
    if entrants.len() < 2 {
        return Vec::new();
    }

    let mut positions: Vec<Option<&EntrantId>> = entrants.iter().map(|e| Some(&e.id)).collect();
    if positions.len() % 2 == 1 {
        positions.push(None);
    }
    let n = positions.len();

    let mut rounds = Vec::with_capacity(n - 1);
    for _ in 0..n - 1 {
        let pairings = (0..n / 2)
            .map(|i| match (positions[i], positions[n - 1 - i]) {
                (Some(a), Some(b)) => Pairing::Match {
                    a: a.clone(),
                    b: b.clone(),
                },
                (Some(e), None) | (None, Some(e)) => Pairing::Bye(e.clone()),
                (None, None) => unreachable!("only one placeholder is ever added"),
            })
            .collect();
        rounds.push(pairings);

        // Last position moves to slot 1, the rest shift down
        positions[1..].rotate_right(1);
    }
    rounds
}

/// Materialize a round-robin schedule into an empty stage graph.
///
/// Bye pairings become bye matches holding the real entrant in slot A; they
/// are decided later by the caller in the same unit of work.
pub(crate) fn build_round_robin(graph: &mut StageGraph, config: &EngineConfig) {
    let stage_id: StageId = graph.stage().id;
    let schedule = generate_round_robin(&graph.stage().entrants);
    let slots = config.game_slots();

    for (idx, pairings) in schedule.into_iter().enumerate() {
        let round = Round {
            id: RoundId::new(),
            stage_id,
            idx: idx as u32,
            side: None,
            depth: None,
            created_seq: 0,
        };
        let round_id = round.id;
        graph.push_round(round);

        for (position, pairing) in pairings.into_iter().enumerate() {
            let mut m = Match::new(stage_id, round_id, position as u32);
            match pairing {
                Pairing::Match { a, b } => {
                    m.slot_a = Some(a);
                    m.slot_b = Some(b);
                }
                Pairing::Bye(e) => {
                    m.slot_a = Some(e);
                    m.is_bye = true;
                }
            }
            graph.push_match_with_games(m, &slots);
        }
    }
}

#[cfg(test)]
#[path = "pairing_tests.rs"]
mod pairing_tests;
