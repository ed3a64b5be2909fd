//! Advancement through bracket links.
//!
//! A decided match writes its winner (or, for `LOSER` links, its loser) into
//! every downstream slot whose source link names it. Bye matches that receive
//! their only entrant are decided on the spot and advance in turn, so one call
//! may cascade through several rounds.

use std::collections::VecDeque;

use tracing::debug;

use crate::bracket::is_reset_final;
use crate::clock::Clock;
use crate::error::{EngineError, Result, Violation};
use crate::graph::StageGraph;
use crate::model::{Game, Match};
use crate::types::{DecisionMethod, EntrantId, MatchId, Side, SlotRole};

/// Decide a bye match holding exactly one entrant. Returns false when there
/// is nothing to decide.
pub(crate) fn decide_bye(graph: &mut StageGraph, id: &MatchId, clock: &dyn Clock) -> Result<bool> {
    let m = graph.get_match(id)?;
    if m.is_bye && m.filled_slots() == 2 {
        return Err(Violation::ByeWithTwoEntrants { match_id: *id }.into());
    }
    if !m.is_bye || m.is_decided() || m.filled_slots() != 1 {
        return Ok(false);
    }
    let m = graph.match_mut(id)?;
    m.winner = m.slot_a.clone().or_else(|| m.slot_b.clone());
    m.decided_by = Some(DecisionMethod::Bye);
    m.decided_at = Some(clock.now());
    debug!(match_id = %id, winner = ?m.winner, "bye advanced");
    Ok(true)
}

/// Decide and advance every bye that already holds its entrant.
///
/// Used right after a stage is built, inside the same unit of work.
pub(crate) fn resolve_byes(graph: &mut StageGraph, clock: &dyn Clock) -> Result<usize> {
    let mut pending: Vec<(u32, u32, MatchId)> = graph
        .matches()
        .iter()
        .filter(|m| m.is_bye && !m.is_decided() && m.filled_slots() == 1)
        .map(|m| {
            let idx = graph.round_of(m).map(|r| r.idx).unwrap_or(0);
            (idx, m.position, m.id)
        })
        .collect();
    pending.sort();

    let mut resolved = 0;
    for (_, _, id) in pending {
        // An earlier cascade may already have reached this one
        if decide_bye(graph, &id, clock)? {
            resolved += 1;
        }
        if graph.get_match(&id)?.is_decided() {
            propagate(graph, &id, clock)?;
        }
    }
    Ok(resolved)
}

/// Entrant a decided match hands to a link of the given role
fn produced_by(m: &Match, role: SlotRole) -> Option<EntrantId> {
    match role {
        SlotRole::Winner => m.winner.clone(),
        SlotRole::Loser => m.loser().cloned(),
    }
}

/// Push the outcome of a decided match into its downstream slots.
///
/// Writing an entrant a slot already holds is a no-op, so calling this twice
/// leaves the same state. A slot holding a different entrant is a structural
/// conflict and aborts the operation. Returns the downstream matches that
/// were targeted, in visit order.
pub(crate) fn propagate(graph: &mut StageGraph, source: &MatchId, clock: &dyn Clock) -> Result<Vec<MatchId>> {
    decide_bye(graph, source, clock)?;
    if !graph.get_match(source)?.is_decided() {
        return Err(EngineError::Input(format!("match {} is not decided", source)));
    }

    let mut targeted: Vec<MatchId> = Vec::new();
    let mut queue = VecDeque::from([*source]);

    while let Some(id) = queue.pop_front() {
        let decided = graph.get_match(&id)?.clone();

        for feed in graph.feeds_from(&id) {
            let Some(incoming) = produced_by(&decided, feed.role) else {
                // Byes produce no loser; that slot stays empty
                continue;
            };

            let target = graph.get_match(&feed.target)?;
            if is_reset_final(target) && decided.winner_side() != Some(Side::B) {
                continue;
            }

            match target.slot(feed.side).cloned() {
                Some(existing) if existing == incoming => {}
                Some(existing) => {
                    return Err(EngineError::StructuralConflict {
                        match_id: feed.target,
                        side: feed.side,
                        existing,
                        incoming,
                    });
                }
                None => {
                    debug!(from = %id, to = %feed.target, side = %feed.side, entrant = %incoming, "advance");
                    *graph.match_mut(&feed.target)?.slot_mut(feed.side) = Some(incoming);
                }
            }
            if !targeted.contains(&feed.target) {
                targeted.push(feed.target);
            }

            let target = graph.get_match(&feed.target)?;
            if target.is_bye {
                decide_bye(graph, &feed.target, clock)?;
                if graph.get_match(&feed.target)?.is_decided() {
                    queue.push_back(feed.target);
                }
            }
        }
    }
    Ok(targeted)
}

/// Undo a match decision and withdraw what it advanced.
///
/// Scores a forfeit filled in are cleared; games that were actually played
/// stay. Every downstream match that loses an entrant has its games cleared
/// and, if it was decided, is reopened in turn. Returns every match that was
/// reopened or had a slot emptied, the root first.
pub(crate) fn reopen(graph: &mut StageGraph, id: &MatchId) -> Result<Vec<MatchId>> {
    let m = graph.get_match(id)?;
    if m.is_bye {
        return Err(EngineError::Input(format!("bye match {} cannot be reopened", id)));
    }
    if !m.is_decided() && m.forfeit.is_none() {
        return Err(EngineError::Input(format!("match {} is not decided", id)));
    }

    let mut touched = vec![*id];
    withdraw(graph, id, &mut touched)?;
    clear_games(graph, id, |g| g.filler)?;

    let m = graph.match_mut(id)?;
    m.clear_decision();
    m.forfeit = None;
    m.decider_active = false;
    Ok(touched)
}

fn clear_games(graph: &mut StageGraph, id: &MatchId, pick: impl Fn(&Game) -> bool) -> Result<()> {
    let slots: Vec<_> = graph
        .games_of(id)
        .into_iter()
        .filter(|g| pick(*g))
        .map(|g| g.slot)
        .collect();
    for slot in slots {
        graph.game_mut(id, slot)?.clear();
    }
    Ok(())
}

fn withdraw(graph: &mut StageGraph, id: &MatchId, touched: &mut Vec<MatchId>) -> Result<()> {
    let decided = graph.get_match(id)?.clone();

    for feed in graph.feeds_from(id) {
        let Some(produced) = produced_by(&decided, feed.role) else {
            continue;
        };
        let target = graph.get_match(&feed.target)?;
        if target.slot(feed.side) != Some(&produced) {
            continue;
        }

        if target.is_decided() {
            withdraw(graph, &feed.target, touched)?;
        }
        // The replacement entrant must not inherit anything played here
        clear_games(graph, &feed.target, Game::has_result)?;
        let target = graph.match_mut(&feed.target)?;
        target.clear_decision();
        target.forfeit = None;
        target.decider_active = false;
        *target.slot_mut(feed.side) = None;

        debug!(from = %id, to = %feed.target, side = %feed.side, entrant = %produced, "withdrawn");
        if !touched.contains(&feed.target) {
            touched.push(feed.target);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "advancement_tests.rs"]
mod advancement_tests;
