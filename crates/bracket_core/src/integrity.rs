//! Stage integrity diagnostics and the explicit repair pass.
//!
//! Diagnostics never mutate. `repair` is the corrective fallback: it merges
//! duplicate rounds into the oldest one, relinks an orphaned loser-bracket
//! final and recreates missing games, all inside the caller's unit of work.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result, Violation};
use crate::evaluator::game_winner;
use crate::graph::StageGraph;
use crate::model::{Game, Match, RoundKey, SourceLink};
use crate::types::{BracketSide, CompetitionMode, GameId, MatchId, RoundId, Side};

/// Rounds that share one key, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateRoundGroup {
    pub key: RoundKey,
    pub rounds: Vec<RoundId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReport {
    pub rounds_removed: Vec<RoundId>,
    pub matches_removed: Vec<MatchId>,
    /// Matches moved from a duplicate round into the surviving one
    pub matches_moved: Vec<MatchId>,
    /// Matches whose source links were rewritten
    pub links_repaired: Vec<MatchId>,
    pub games_created: Vec<GameId>,
}

impl RepairReport {
    pub fn is_empty(&self) -> bool {
        self.rounds_removed.is_empty()
            && self.matches_removed.is_empty()
            && self.matches_moved.is_empty()
            && self.links_repaired.is_empty()
            && self.games_created.is_empty()
    }
}

pub fn detect_duplicate_rounds(graph: &StageGraph) -> Vec<DuplicateRoundGroup> {
    let mut by_key: BTreeMap<RoundKey, Vec<(u64, u32, RoundId)>> = BTreeMap::new();
    for round in graph.rounds() {
        by_key
            .entry(round.key())
            .or_default()
            .push((round.created_seq, round.idx, round.id));
    }

    by_key
        .into_iter()
        .filter(|(_, rounds)| rounds.len() > 1)
        .map(|(key, mut rounds)| {
            rounds.sort();
            DuplicateRoundGroup {
                key,
                rounds: rounds.into_iter().map(|(_, _, id)| id).collect(),
            }
        })
        .collect()
}

/// Refuse a graph holding two rounds with one key
pub(crate) fn ensure_unique_rounds(graph: &StageGraph) -> Result<()> {
    match detect_duplicate_rounds(graph).into_iter().next() {
        Some(group) => Err(Violation::DuplicateRounds {
            key: group.key.to_string(),
            rounds: group.rounds,
        }
        .into()),
        None => Ok(()),
    }
}

/// Loser-bracket final of a double-elimination stage
fn loser_final(graph: &StageGraph) -> Option<&Match> {
    if graph.stage().mode != CompetitionMode::DoubleElimination {
        return None;
    }
    graph.match_at(RoundKey::Bracket(BracketSide::Loser, 0), 0)
}

pub fn check_integrity(graph: &StageGraph, config: &EngineConfig) -> Vec<Violation> {
    let mut violations: Vec<Violation> = detect_duplicate_rounds(graph)
        .into_iter()
        .map(|group| Violation::DuplicateRounds {
            key: group.key.to_string(),
            rounds: group.rounds,
        })
        .collect();

    if let Some(m) = loser_final(graph) {
        for side in [Side::A, Side::B] {
            if m.source(side).is_none() {
                violations.push(Violation::OrphanedLoserFinal {
                    match_id: m.id,
                    missing: side,
                });
            }
        }
    }

    let slots = config.game_slots();
    for m in graph.matches() {
        if m.is_bye && m.filled_slots() == 2 {
            violations.push(Violation::ByeWithTwoEntrants { match_id: m.id });
        }

        for side in [Side::A, Side::B] {
            if let Some(link) = m.source(side) {
                if graph.find_match(&link.match_id).is_none() {
                    violations.push(Violation::DanglingSource {
                        match_id: m.id,
                        side,
                        source_id: link.match_id,
                    });
                }
            }
        }

        let games = graph.games_of(&m.id);
        for game in &games {
            if let Err(EngineError::InvariantViolation(v)) = game_winner(m, game) {
                violations.push(v);
            }
        }
        if !m.is_bye {
            for &slot in &slots {
                if !games.iter().any(|g| g.slot == slot) {
                    violations.push(Violation::MissingGame {
                        match_id: m.id,
                        slot,
                    });
                }
            }
        }
    }

    for v in &violations {
        warn!(stage = %graph.stage().name, "{}", v);
    }
    violations
}

/// Whether a match carries anything a merge must not throw away
fn has_results(graph: &StageGraph, m: &Match) -> bool {
    (m.is_decided() && !m.is_bye)
        || m.forfeit.is_some()
        || graph.games_of(&m.id).iter().any(|g| g.has_result())
}

fn relink(graph: &mut StageGraph, from: &MatchId, to: &MatchId, report: &mut RepairReport) -> Result<()> {
    for feed in graph.feeds_from(from) {
        let target = graph.match_mut(&feed.target)?;
        *target.source_mut(feed.side) = Some(SourceLink {
            match_id: *to,
            role: feed.role,
        });
        if !report.links_repaired.contains(&feed.target) {
            report.links_repaired.push(feed.target);
        }
    }
    Ok(())
}

fn merge_duplicates(graph: &mut StageGraph, report: &mut RepairReport) -> Result<()> {
    for group in detect_duplicate_rounds(graph) {
        let keeper = group.rounds[0];

        for duplicate in &group.rounds[1..] {
            let extras: Vec<(MatchId, u32)> = graph
                .round_matches(duplicate)
                .iter()
                .map(|m| (m.id, m.position))
                .collect();

            for (extra_id, position) in extras {
                let kept = graph
                    .round_matches(&keeper)
                    .into_iter()
                    .find(|m| m.position == position)
                    .map(|m| m.id);

                let Some(kept_id) = kept else {
                    graph.match_mut(&extra_id)?.round_id = keeper;
                    report.matches_moved.push(extra_id);
                    continue;
                };

                let extra_has = has_results(graph, graph.get_match(&extra_id)?);
                let kept_has = has_results(graph, graph.get_match(&kept_id)?);
                match (kept_has, extra_has) {
                    (true, true) => {
                        return Err(Violation::ConflictingResults {
                            key: group.key.to_string(),
                            position,
                        }
                        .into());
                    }
                    (false, true) => {
                        // The duplicate holds the results; it replaces the kept match
                        relink(graph, &kept_id, &extra_id, report)?;
                        graph.remove_match(&kept_id);
                        graph.match_mut(&extra_id)?.round_id = keeper;
                        report.matches_removed.push(kept_id);
                        report.matches_moved.push(extra_id);
                    }
                    _ => {
                        relink(graph, &extra_id, &kept_id, report)?;
                        graph.remove_match(&extra_id);
                        report.matches_removed.push(extra_id);
                    }
                }
            }

            graph.remove_round(duplicate);
            report.rounds_removed.push(*duplicate);
            info!(key = %group.key, kept = %keeper, removed = %duplicate, "merged duplicate round");
        }
    }
    Ok(())
}

fn relink_loser_final(graph: &mut StageGraph, report: &mut RepairReport) -> Result<()> {
    let Some(m) = loser_final(graph) else {
        return Ok(());
    };
    let id = m.id;
    let missing_a = m.source_a.is_none();
    let missing_b = m.source_b.is_none();

    let survivor = graph
        .match_at(RoundKey::Bracket(BracketSide::Loser, 1), 0)
        .map(|m| SourceLink::winner_of(m.id));
    let dropping = graph
        .match_at(RoundKey::Bracket(BracketSide::Winner, 0), 0)
        .map(|m| SourceLink::loser_of(m.id));

    let mut repaired = false;
    if missing_a {
        if let Some(link) = survivor {
            graph.match_mut(&id)?.source_a = Some(link);
            repaired = true;
        }
    }
    if missing_b {
        if let Some(link) = dropping {
            graph.match_mut(&id)?.source_b = Some(link);
            repaired = true;
        }
    }
    if repaired {
        info!(match_id = %id, "relinked loser-bracket final");
        if !report.links_repaired.contains(&id) {
            report.links_repaired.push(id);
        }
    }
    Ok(())
}

fn recreate_missing_games(graph: &mut StageGraph, config: &EngineConfig, report: &mut RepairReport) {
    let slots = config.game_slots();
    let mut missing = Vec::new();
    for m in graph.matches().iter().filter(|m| !m.is_bye) {
        let present: HashSet<_> = graph.games_of(&m.id).iter().map(|g| g.slot).collect();
        for &slot in &slots {
            if !present.contains(&slot) {
                missing.push(Game::new(m.id, slot));
            }
        }
    }
    if !missing.is_empty() {
        info!(count = missing.len(), "recreating missing games");
    }
    for game in missing {
        report.games_created.push(game.id);
        graph.push_game(game);
    }
}

/// Run every repair. Fails without side effects on the store when duplicate
/// matches both carry results.
pub(crate) fn repair(graph: &mut StageGraph, config: &EngineConfig) -> Result<RepairReport> {
    let mut report = RepairReport::default();
    merge_duplicates(graph, &mut report)?;
    relink_loser_final(graph, &mut report)?;
    recreate_missing_games(graph, config, &mut report);
    Ok(report)
}

#[cfg(test)]
#[path = "integrity_tests.rs"]
mod integrity_tests;
