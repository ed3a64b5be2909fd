//! Standings, recomputed from decided matches on every call.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, OverrideRule};
use crate::graph::StageGraph;
use crate::model::Match;
use crate::types::{EntrantId, Side};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingRow {
    pub entrant: EntrantId,
    pub name: String,
    pub matches_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub points: u32,
    pub games_won: u32,
    pub games_lost: u32,
    pub score_for: u32,
    pub score_against: u32,
}

impl StandingRow {
    fn new(entrant: EntrantId, name: String) -> Self {
        Self {
            entrant,
            name,
            matches_played: 0,
            wins: 0,
            losses: 0,
            points: 0,
            games_won: 0,
            games_lost: 0,
            score_for: 0,
            score_against: 0,
        }
    }
}

/// Rank every entrant of a stage.
///
/// Only decided, contested matches count; byes and undecided matches are
/// skipped, so a half-played stage is fine. Sorted by points descending, then
/// display name ascending.
pub fn compute_standings(graph: &StageGraph, config: &EngineConfig) -> Vec<StandingRow> {
    let stage = graph.stage();
    let stage_id = stage.id.to_string();

    let mut zero_points: HashSet<&EntrantId> = HashSet::new();
    let mut forfeits_as_byes: HashSet<&EntrantId> = HashSet::new();
    for rule in config.overrides_for(&stage_id, &stage.name) {
        match rule.rule {
            OverrideRule::ZeroPoints => zero_points.insert(&rule.entrant),
            OverrideRule::ForfeitsAsByes => forfeits_as_byes.insert(&rule.entrant),
        };
    }

    let mut rows: HashMap<EntrantId, StandingRow> = stage
        .entrants
        .iter()
        .map(|e| (e.id.clone(), StandingRow::new(e.id.clone(), e.name.clone())))
        .collect();

    for m in graph.matches().iter().filter(|m| counts(m)) {
        let (Some(winner_side), Some(a), Some(b)) = (m.winner_side(), &m.slot_a, &m.slot_b) else {
            continue;
        };
        if let Some(forfeiting) = m.forfeit {
            let conceded_by = if forfeiting == Side::A { a } else { b };
            if forfeits_as_byes.contains(conceded_by) {
                continue;
            }
        }

        let (winner, loser) = match winner_side {
            Side::A => (a, b),
            Side::B => (b, a),
        };
        let loss_points = if m.forfeit.is_some() {
            config.points.forfeit_loss
        } else {
            config.points.loss
        };

        let row = row_for(&mut rows, winner);
        row.matches_played += 1;
        row.wins += 1;
        row.points += config.points.win;

        let row = row_for(&mut rows, loser);
        row.matches_played += 1;
        row.losses += 1;
        row.points += loss_points;

        for game in graph.games_of(&m.id) {
            let (Some(score_a), Some(score_b)) = (game.score_a, game.score_b) else {
                continue;
            };
            if !game.complete {
                continue;
            }
            tally_game(row_for(&mut rows, a), score_a, score_b);
            tally_game(row_for(&mut rows, b), score_b, score_a);
        }
    }

    let mut table: Vec<StandingRow> = rows.into_values().collect();
    for row in table.iter_mut() {
        if zero_points.contains(&row.entrant) {
            row.points = 0;
        }
    }
    table.sort_by(|x, y| {
        y.points
            .cmp(&x.points)
            .then_with(|| x.name.cmp(&y.name))
            .then_with(|| x.entrant.cmp(&y.entrant))
    });
    table
}

fn counts(m: &Match) -> bool {
    !m.is_bye && m.is_decided() && m.filled_slots() == 2
}

fn row_for<'a>(rows: &'a mut HashMap<EntrantId, StandingRow>, id: &EntrantId) -> &'a mut StandingRow {
    rows.entry(id.clone())
        .or_insert_with(|| StandingRow::new(id.clone(), id.to_string()))
}

fn tally_game(row: &mut StandingRow, own: u32, other: u32) {
    row.score_for += own;
    row.score_against += other;
    if own > other {
        row.games_won += 1;
    } else if own < other {
        row.games_lost += 1;
    }
}

#[cfg(test)]
#[path = "standings_tests.rs"]
mod standings_tests;
