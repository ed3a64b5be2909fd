use super::*;
use crate::simulate::{SimConfig, Simulator};
use bracket_core::{EngineConfig, Entrant, FixedClock, MemoryStore};

fn played_stage(mode: CompetitionMode, n: usize) -> (BracketEngine<MemoryStore, FixedClock>, StageId) {
    let mut engine =
        BracketEngine::with_clock(MemoryStore::new(), FixedClock::default(), EngineConfig::default())
            .unwrap();
    let entrants = (1..=n).map(|i| Entrant::new(format!("t{i}"), &format!("Team {i}"))).collect();
    let stage = match mode {
        CompetitionMode::RoundRobin => engine.generate_round_robin("Stop 1", entrants).unwrap(),
        _ => engine.build_bracket("Stop 1", entrants, mode).unwrap(),
    };
    Simulator::new(SimConfig::default())
        .run_stage(&mut engine, &stage.id)
        .unwrap();
    (engine, stage.id)
}

#[test]
fn test_report_uses_display_names() {
    let (engine, stage_id) = played_stage(CompetitionMode::RoundRobin, 3);
    let report = StageReport::from_engine(&engine, &stage_id, Utc::now()).unwrap();

    assert_eq!(report.rounds.len(), 3);
    assert_eq!(report.rounds[0].label, "Round 1");
    assert_eq!(report.standings.len(), 3);
    assert!(report.champion.is_none());

    let text = report.generate_report();
    assert!(text.contains("=== Stage: Stop 1 (round-robin) ==="));
    assert!(text.contains("Team 1"));
    assert!(text.contains("- bye"));
}

#[test]
fn test_bracket_report_names_champion() {
    let (engine, stage_id) = played_stage(CompetitionMode::DoubleElimination, 6);
    let report = StageReport::from_engine(&engine, &stage_id, Utc::now()).unwrap();

    let champion = report.champion.clone().unwrap();
    assert!(champion.starts_with("Team "));
    assert!(report.rounds.iter().any(|r| r.label == "Loser final"));
    assert!(report.rounds.iter().any(|r| r.label == "Grand final"));
    assert!(report
        .generate_report()
        .contains(&format!("Champion: {}", champion)));
}

#[test]
fn test_report_json_round_trip() {
    let (engine, stage_id) = played_stage(CompetitionMode::SingleElimination, 5);
    let report = StageReport::from_engine(&engine, &stage_id, Utc::now()).unwrap();

    let path = std::env::temp_dir().join(format!("stage-report-{}.json", stage_id));
    report.save(&path).unwrap();
    let loaded = StageReport::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.name, report.name);
    assert_eq!(loaded.champion, report.champion);
    assert_eq!(loaded.standings, report.standings);
    assert_eq!(loaded.generate_report(), report.generate_report());
}

#[test]
fn test_round_labels() {
    let round = |side, depth| Round {
        id: bracket_core::RoundId::new(),
        stage_id: StageId::new(),
        idx: 4,
        side,
        depth,
        created_seq: 0,
    };
    assert_eq!(round_label(&round(None, None)), "Round 5");
    assert_eq!(round_label(&round(Some(BracketSide::Winner), Some(2))), "Winner bracket, depth 2");
    assert_eq!(round_label(&round(Some(BracketSide::Finals), Some(1))), "Grand final (first)");
}
