use super::*;
use crate::error::EngineError;
use crate::types::{EntrantId, RoundId, StageId};

fn ready_match() -> Match {
    let mut m = Match::new(StageId::new(), RoundId::new(), 0);
    m.slot_a = Some(EntrantId::from("A"));
    m.slot_b = Some(EntrantId::from("B"));
    m
}

fn game(m: &Match, slot: GameSlot, score: Option<(u32, u32)>) -> Game {
    let mut g = Game::new(m.id, slot);
    if let Some((a, b)) = score {
        g.score_a = Some(a);
        g.score_b = Some(b);
        g.complete = true;
    }
    g
}

fn split_games(m: &Match) -> Vec<Game> {
    vec![
        game(m, GameSlot::MensDoubles, Some((1, 0))),
        game(m, GameSlot::WomensDoubles, Some((0, 1))),
        game(m, GameSlot::Mixed1, Some((1, 0))),
        game(m, GameSlot::Mixed2, Some((0, 1))),
        game(m, GameSlot::Tiebreaker, None),
    ]
}

fn eval(m: &Match, games: &[Game], config: &EngineConfig) -> Result<MatchDecision> {
    let refs: Vec<&Game> = games.iter().collect();
    evaluate(m, &refs, config)
}

#[test]
fn test_even_split_needs_decider() {
    let m = ready_match();
    let games = split_games(&m);

    let decision = eval(&m, &games, &EngineConfig::default()).unwrap();
    assert!(decision.needs_decider);
    assert!(!decision.decided);
    assert_eq!(decision.winner_side, None);
    assert_eq!((decision.wins_a, decision.wins_b), (2, 2));
}

#[test]
fn test_completed_decider_settles_split() {
    let m = ready_match();
    let mut games = split_games(&m);
    games[4] = game(&m, GameSlot::Tiebreaker, Some((1, 0)));

    let decision = eval(&m, &games, &EngineConfig::default()).unwrap();
    assert!(decision.decided);
    assert!(!decision.needs_decider);
    assert_eq!(decision.winner_side, Some(Side::A));
    assert_eq!(decision.method, Some(DecisionMethod::Decider));
}

#[test]
fn test_early_majority_decides() {
    let m = ready_match();
    let games = vec![
        game(&m, GameSlot::MensDoubles, Some((11, 4))),
        game(&m, GameSlot::WomensDoubles, Some((11, 9))),
        game(&m, GameSlot::Mixed1, Some((11, 2))),
        game(&m, GameSlot::Mixed2, None),
    ];

    let decision = eval(&m, &games, &EngineConfig::default()).unwrap();
    assert!(decision.decided);
    assert_eq!(decision.winner_side, Some(Side::A));
    assert_eq!(decision.method, Some(DecisionMethod::Games));
}

#[test]
fn test_waits_for_full_completion_without_early_decision() {
    let m = ready_match();
    let config = EngineConfig {
        early_decision: false,
        ..EngineConfig::default()
    };
    let mut games = vec![
        game(&m, GameSlot::MensDoubles, Some((2, 11))),
        game(&m, GameSlot::WomensDoubles, Some((3, 11))),
        game(&m, GameSlot::Mixed1, Some((4, 11))),
        game(&m, GameSlot::Mixed2, None),
    ];

    let decision = eval(&m, &games, &config).unwrap();
    assert!(!decision.decided);
    assert!(!decision.needs_decider);

    games[3] = game(&m, GameSlot::Mixed2, Some((11, 5)));
    let decision = eval(&m, &games, &config).unwrap();
    assert!(decision.decided);
    assert_eq!(decision.winner_side, Some(Side::B));
}

#[test]
fn test_incomplete_match_is_undecided() {
    let m = ready_match();
    let games = vec![
        game(&m, GameSlot::MensDoubles, Some((11, 4))),
        game(&m, GameSlot::WomensDoubles, None),
    ];
    let decision = eval(&m, &games, &EngineConfig::default()).unwrap();
    assert_eq!(decision, MatchDecision {
        wins_a: 1,
        points_a: 11,
        points_b: 4,
        ..Default::default()
    });
}

#[test]
fn test_decision_independent_of_game_order() {
    let m = ready_match();
    let mut games = vec![
        game(&m, GameSlot::MensDoubles, Some((11, 4))),
        game(&m, GameSlot::WomensDoubles, Some((7, 11))),
        game(&m, GameSlot::Mixed1, Some((11, 8))),
        game(&m, GameSlot::Mixed2, Some((11, 9))),
    ];
    let config = EngineConfig {
        early_decision: false,
        ..EngineConfig::default()
    };

    let forward = eval(&m, &games, &config).unwrap();
    games.reverse();
    let backward = eval(&m, &games, &config).unwrap();
    games.swap(0, 2);
    let shuffled = eval(&m, &games, &config).unwrap();

    assert_eq!(forward.winner_side, Some(Side::A));
    assert_eq!(forward, backward);
    assert_eq!(forward, shuffled);
}

#[test]
fn test_tied_game_is_an_error() {
    let m = ready_match();
    let games = vec![game(&m, GameSlot::MensDoubles, Some((9, 9)))];

    let err = eval(&m, &games, &EngineConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        EngineError::InvariantViolation(Violation::TiedGame {
            slot: GameSlot::MensDoubles,
            ..
        })
    ));
}

#[test]
fn test_completed_game_without_score_is_an_error() {
    let m = ready_match();
    let mut g = Game::new(m.id, GameSlot::Mixed1);
    g.complete = true;
    g.score_a = Some(11);

    let err = eval(&m, &[g], &EngineConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        EngineError::InvariantViolation(Violation::UnscoredGame { .. })
    ));
}

#[test]
fn test_forfeit_decides_for_other_side() {
    let mut m = ready_match();
    m.forfeit = Some(Side::A);

    let decision = eval(&m, &[], &EngineConfig::default()).unwrap();
    assert!(decision.decided);
    assert_eq!(decision.winner_side, Some(Side::B));
    assert_eq!(decision.method, Some(DecisionMethod::Forfeit));
}

#[test]
fn test_bye_decides_for_filled_slot() {
    let mut m = Match::new(StageId::new(), RoundId::new(), 0);
    m.is_bye = true;
    m.slot_a = Some(EntrantId::from("A"));

    let decision = eval(&m, &[], &EngineConfig::default()).unwrap();
    assert_eq!(decision.winner_side, Some(Side::A));
    assert_eq!(decision.method, Some(DecisionMethod::Bye));

    m.slot_a = None;
    let decision = eval(&m, &[], &EngineConfig::default()).unwrap();
    assert!(!decision.decided);
}

#[test]
fn test_bye_with_two_entrants_is_rejected() {
    let mut m = ready_match();
    m.is_bye = true;

    let err = eval(&m, &[], &EngineConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        EngineError::InvariantViolation(Violation::ByeWithTwoEntrants { match_id }) if match_id == m.id
    ));
}

#[test]
fn test_split_decided_by_points_when_enabled() {
    let m = ready_match();
    let games = vec![
        game(&m, GameSlot::MensDoubles, Some((11, 2))),
        game(&m, GameSlot::WomensDoubles, Some((9, 11))),
        game(&m, GameSlot::Mixed1, Some((11, 3))),
        game(&m, GameSlot::Mixed2, Some((10, 11))),
    ];
    let config = EngineConfig {
        decide_split_by_points: true,
        ..EngineConfig::default()
    };

    let decision = eval(&m, &games, &config).unwrap();
    assert!(decision.decided);
    assert_eq!(decision.winner_side, Some(Side::A));
    assert_eq!(decision.method, Some(DecisionMethod::Points));
    assert_eq!((decision.points_a, decision.points_b), (41, 27));
}

#[test]
fn test_unconfigured_slots_are_ignored() {
    let m = ready_match();
    let config = EngineConfig {
        disciplines: vec![GameSlot::MensDoubles, GameSlot::WomensDoubles, GameSlot::Mixed1],
        ..EngineConfig::default()
    };
    let games = vec![
        game(&m, GameSlot::MensDoubles, Some((11, 4))),
        game(&m, GameSlot::WomensDoubles, Some((4, 11))),
        game(&m, GameSlot::Mixed2, Some((0, 11))),
    ];

    let decision = eval(&m, &games, &config).unwrap();
    assert!(!decision.decided);
    assert_eq!((decision.wins_a, decision.wins_b), (1, 1));
}
