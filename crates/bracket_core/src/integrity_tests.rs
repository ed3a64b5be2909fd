use super::*;
use crate::bracket::{build_elimination, BracketLayout};
use crate::model::{Entrant, Round, Stage};
use crate::types::{EntrantId, GameSlot, StageId};

fn built(n: usize, mode: CompetitionMode) -> (StageGraph, BracketLayout) {
    let entrants = (1..=n).map(|i| Entrant::named(&format!("S{i:02}"))).collect();
    let mut graph = StageGraph::new(Stage {
        id: StageId::new(),
        name: "Test".to_string(),
        mode,
        entrants,
        rounds: Vec::new(),
    });
    let layout = build_elimination(&mut graph, &EngineConfig::default()).unwrap();
    (graph, layout)
}

/// Add a later copy of the round at `key` holding fresh matches at `positions`
fn duplicate_round(graph: &mut StageGraph, key: RoundKey, positions: &[u32]) -> (RoundId, Vec<MatchId>) {
    let original = graph.find_round(key).unwrap().clone();
    let copy = Round {
        id: RoundId::new(),
        created_seq: original.created_seq + 100,
        idx: original.idx + 100,
        ..original
    };
    let round_id = copy.id;
    graph.push_round(copy);

    let slots = EngineConfig::default().game_slots();
    let originals: Vec<Match> = graph
        .round_matches(&original.id)
        .into_iter()
        .cloned()
        .collect();
    let mut ids = Vec::new();
    for &position in positions {
        let template = originals.iter().find(|m| m.position == position).unwrap();
        let mut m = Match::new(template.stage_id, round_id, position);
        m.source_a = template.source_a;
        m.source_b = template.source_b;
        ids.push(graph.push_match_with_games(m, &slots));
    }
    (round_id, ids)
}

fn score(graph: &mut StageGraph, id: &MatchId, slot: GameSlot, a: u32, b: u32) {
    let g = graph.game_mut(id, slot).unwrap();
    g.score_a = Some(a);
    g.score_b = Some(b);
    g.complete = true;
}

// =============================================================================
// Diagnostics
// =============================================================================

#[test]
fn test_fresh_brackets_are_clean() {
    let config = EngineConfig::default();
    for (n, mode) in [
        (8, CompetitionMode::SingleElimination),
        (6, CompetitionMode::SingleElimination),
        (8, CompetitionMode::DoubleElimination),
        (13, CompetitionMode::DoubleElimination),
    ] {
        let (graph, _) = built(n, mode);
        assert!(check_integrity(&graph, &config).is_empty(), "{mode} with {n}");
        assert!(detect_duplicate_rounds(&graph).is_empty());
    }
}

#[test]
fn test_detects_duplicate_rounds_oldest_first() {
    let (mut graph, _) = built(4, CompetitionMode::SingleElimination);
    let key = RoundKey::Bracket(BracketSide::Winner, 0);
    let original = graph.find_round(key).unwrap().id;
    let (copy, _) = duplicate_round(&mut graph, key, &[0]);

    let groups = detect_duplicate_rounds(&graph);
    assert_eq!(
        groups,
        vec![DuplicateRoundGroup {
            key,
            rounds: vec![original, copy],
        }]
    );

    let violations = check_integrity(&graph, &EngineConfig::default());
    assert!(matches!(
        violations.as_slice(),
        [Violation::DuplicateRounds { rounds, .. }] if rounds.len() == 2
    ));
}

#[test]
fn test_unique_rounds_required_after_construction() {
    let (mut graph, _) = built(8, CompetitionMode::DoubleElimination);
    assert!(ensure_unique_rounds(&graph).is_ok());

    let key = RoundKey::Bracket(BracketSide::Loser, 1);
    duplicate_round(&mut graph, key, &[0]);
    let err = ensure_unique_rounds(&graph).unwrap_err();
    assert!(matches!(
        err,
        EngineError::InvariantViolation(Violation::DuplicateRounds { rounds, .. }) if rounds.len() == 2
    ));
}

#[test]
fn test_detects_orphaned_loser_final() {
    let (mut graph, layout) = built(8, CompetitionMode::DoubleElimination);
    let loser_final = layout.loser_rounds[3][0];
    graph.match_mut(&loser_final).unwrap().source_b = None;

    let violations = check_integrity(&graph, &EngineConfig::default());
    assert_eq!(
        violations,
        vec![Violation::OrphanedLoserFinal {
            match_id: loser_final,
            missing: Side::B,
        }]
    );
}

#[test]
fn test_detects_match_level_defects() {
    let (mut graph, layout) = built(5, CompetitionMode::SingleElimination);
    let config = EngineConfig::default();

    let bye = layout.winner_rounds[0][0];
    graph.match_mut(&bye).unwrap().slot_b = Some(EntrantId::from("extra"));

    let played = layout.winner_rounds[0][1];
    score(&mut graph, &played, GameSlot::MensDoubles, 7, 7);

    let next = layout.winner_rounds[1][0];
    graph.match_mut(&next).unwrap().source_b = Some(SourceLink::winner_of(MatchId::new()));

    let violations = check_integrity(&graph, &config);
    assert!(violations.contains(&Violation::ByeWithTwoEntrants { match_id: bye }));
    assert!(violations.contains(&Violation::TiedGame {
        match_id: played,
        slot: GameSlot::MensDoubles,
    }));
    assert!(violations
        .iter()
        .any(|v| matches!(v, Violation::DanglingSource { match_id, side: Side::B, .. } if *match_id == next)));
}

#[test]
fn test_detects_missing_games() {
    let (mut graph, layout) = built(4, CompetitionMode::SingleElimination);
    let target = layout.winner_rounds[0][0];
    let game_id = graph
        .games_of(&target)
        .iter()
        .find(|g| g.slot == GameSlot::Mixed2)
        .unwrap()
        .id;
    // Simulate a half-written skeleton by dropping one game
    let mut stripped = StageGraph::new(graph.stage().clone());
    for round in graph.rounds() {
        stripped.push_round(round.clone());
    }
    for m in graph.matches() {
        stripped.push_match(m.clone());
    }
    for g in graph.games().iter().filter(|g| g.id != game_id) {
        stripped.push_game(g.clone());
    }
    graph = stripped;

    let violations = check_integrity(&graph, &EngineConfig::default());
    assert_eq!(
        violations,
        vec![Violation::MissingGame {
            match_id: target,
            slot: GameSlot::Mixed2,
        }]
    );

    let report = repair(&mut graph, &EngineConfig::default()).unwrap();
    assert_eq!(report.games_created.len(), 1);
    assert!(check_integrity(&graph, &EngineConfig::default()).is_empty());
}

// =============================================================================
// Repair
// =============================================================================

#[test]
fn test_repair_removes_empty_duplicate() {
    let (mut graph, _) = built(4, CompetitionMode::SingleElimination);
    let key = RoundKey::Bracket(BracketSide::Winner, 0);
    let original = graph.find_round(key).unwrap().id;
    let kept_final = graph.match_at(key, 0).unwrap().id;
    let (copy, extra) = duplicate_round(&mut graph, key, &[0]);

    let report = repair(&mut graph, &EngineConfig::default()).unwrap();
    assert_eq!(report.rounds_removed, vec![copy]);
    assert_eq!(report.matches_removed, extra);
    assert!(graph.round(&copy).is_none());
    assert!(graph.find_match(&extra[0]).is_none());
    assert!(graph.find_match(&kept_final).is_some());
    assert!(!graph.stage().rounds.contains(&copy));
    assert_eq!(graph.find_round(key).unwrap().id, original);
    assert!(check_integrity(&graph, &EngineConfig::default()).is_empty());
}

#[test]
fn test_repair_keeps_duplicate_with_results() {
    let (mut graph, layout) = built(8, CompetitionMode::SingleElimination);
    let key = RoundKey::Bracket(BracketSide::Winner, 1);
    let stale = layout.winner_rounds[1][0];
    let final_id = layout.winner_rounds[2][0];
    let original = graph.find_round(key).unwrap().id;
    let (_, extra) = duplicate_round(&mut graph, key, &[0]);
    score(&mut graph, &extra[0], GameSlot::MensDoubles, 11, 6);

    let report = repair(&mut graph, &EngineConfig::default()).unwrap();
    assert_eq!(report.matches_removed, vec![stale]);
    assert_eq!(report.matches_moved, extra);
    assert!(report.links_repaired.contains(&final_id));

    let survivor = graph.get_match(&extra[0]).unwrap();
    assert_eq!(survivor.round_id, original);
    assert_eq!(
        graph.get_match(&final_id).unwrap().source_a,
        Some(SourceLink::winner_of(extra[0]))
    );
    assert!(check_integrity(&graph, &EngineConfig::default()).is_empty());
}

#[test]
fn test_repair_refuses_two_result_carriers() {
    let (mut graph, layout) = built(8, CompetitionMode::SingleElimination);
    let key = RoundKey::Bracket(BracketSide::Winner, 1);
    let kept = layout.winner_rounds[1][1];
    let (_, extra) = duplicate_round(&mut graph, key, &[1]);
    score(&mut graph, &kept, GameSlot::Mixed1, 11, 3);
    score(&mut graph, &extra[0], GameSlot::Mixed1, 3, 11);

    let err = repair(&mut graph, &EngineConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        EngineError::InvariantViolation(Violation::ConflictingResults { position: 1, .. })
    ));
}

#[test]
fn test_repair_relinks_orphaned_loser_final() {
    let (mut graph, layout) = built(8, CompetitionMode::DoubleElimination);
    let loser_final = layout.loser_rounds[3][0];
    let winner_final = layout.winner_rounds[2][0];
    let previous = layout.loser_rounds[2][0];
    {
        let m = graph.match_mut(&loser_final).unwrap();
        m.source_a = None;
        m.source_b = None;
    }

    let report = repair(&mut graph, &EngineConfig::default()).unwrap();
    assert_eq!(report.links_repaired, vec![loser_final]);

    let m = graph.get_match(&loser_final).unwrap();
    assert_eq!(m.source_a, Some(SourceLink::winner_of(previous)));
    assert_eq!(m.source_b, Some(SourceLink::loser_of(winner_final)));
    assert!(check_integrity(&graph, &EngineConfig::default()).is_empty());
}

#[test]
fn test_repair_on_clean_stage_is_empty() {
    let (mut graph, _) = built(6, CompetitionMode::DoubleElimination);
    let report = repair(&mut graph, &EngineConfig::default()).unwrap();
    assert!(report.is_empty());
}
