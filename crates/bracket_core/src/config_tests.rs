use super::*;

#[test]
fn test_default_config_is_valid() {
    let config = EngineConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.disciplines.len(), 4);
    assert_eq!(config.game_slots().last(), Some(&GameSlot::Tiebreaker));
}

#[test]
fn test_parse_full_config() {
    let config = EngineConfig::from_toml_str(
        r#"
        disciplines = ["MENS_DOUBLES", "WOMENS_DOUBLES", "MIXED_1"]
        early_decision = false
        grand_final_reset = true

        [points]
        win = 3
        loss = 1

        [[overrides]]
        stage = "Stop 3"
        entrant = "four-fathers"
        rule = "forfeits_as_byes"
        "#,
    )
    .unwrap();

    assert_eq!(config.disciplines[2], GameSlot::Mixed1);
    assert!(!config.early_decision);
    assert!(config.grand_final_reset);
    assert_eq!(config.points.win, 3);
    assert_eq!(config.points.loss, 1);
    assert_eq!(config.points.forfeit_loss, 0);
    assert_eq!(config.overrides[0].rule, OverrideRule::ForfeitsAsByes);
    assert_eq!(config.overrides_for("some-id", "Stop 3").count(), 1);
    assert_eq!(config.overrides_for("some-id", "Stop 2").count(), 0);
}

#[test]
fn test_missing_fields_use_defaults() {
    let config = EngineConfig::from_toml_str("early_decision = false").unwrap();
    assert_eq!(config.disciplines, GameSlot::DISCIPLINES.to_vec());
    assert_eq!(config.points, PointsScheme::default());
}

#[test]
fn test_decider_as_discipline_rejected() {
    let err = EngineConfig::from_toml_str(r#"disciplines = ["MENS_DOUBLES", "TIEBREAKER"]"#)
        .unwrap_err();
    assert!(matches!(err, EngineError::Config(_)));
}

#[test]
fn test_duplicate_discipline_rejected() {
    let err =
        EngineConfig::from_toml_str(r#"disciplines = ["MIXED_1", "MIXED_1"]"#).unwrap_err();
    assert!(matches!(err, EngineError::Config(_)));
}

#[test]
fn test_empty_disciplines_rejected() {
    assert!(EngineConfig::from_toml_str("disciplines = []").is_err());
}
