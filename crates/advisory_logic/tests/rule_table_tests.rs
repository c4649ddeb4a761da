//! Integration tests for rule tables loaded from JSON
//!
//! Tables are written to temporary files and loaded through
//! `KnowledgeBase::from_path`, the way a deployment supplies its own rules.

use std::io::Write;

use advisory_logic::{
    BuiltinRules, EngineConfig, Error, KnowledgeBase, NetworkMode, ResolutionEngine,
};
use indexmap::IndexMap;

const TABLE: &str = r#"{
  "rules": [
    {
      "id": "R2",
      "description": "If Expo station is undergoing integration work, then Expo station is NOT open",
      "antecedent": ["Integration_Work_Expo"],
      "consequent": "Station_Closed_Expo"
    },
    {
      "id": "R6",
      "description": "If Expo station is closed, then no transfers are available at Expo",
      "antecedent": ["Station_Closed_Expo"],
      "consequent": "Transfer_Unavailable_Expo"
    },
    {
      "id": "R3",
      "description": "In Future Mode, the old EWL airport branch is NOT active",
      "antecedent": ["Network_Mode_Future"],
      "consequent": "Line_Inactive_EWL_Airport",
      "mode": "future"
    }
  ],
  "polarity_pairs": [["Transfer_Unavailable_Expo", "Transfer_Available_Expo"]]
}"#;

fn write_table(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn facts(pairs: &[(&str, bool)]) -> IndexMap<String, bool> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_table_from_file() {
    let file = write_table(TABLE);
    let kb = KnowledgeBase::from_path(file.path()).unwrap();

    assert_eq!(kb.len(), 3);
    assert_eq!(kb.rule_by_id("R3").unwrap().mode(), Some(NetworkMode::Future));
    assert_eq!(kb.rules_for_mode(NetworkMode::Today).len(), 2);
    assert_eq!(kb.opposite_of("Station_Closed_Expo"), Some("Station_Open_Expo"));
    assert_eq!(
        kb.opposite_of("Transfer_Unavailable_Expo"),
        Some("Transfer_Available_Expo")
    );
}

#[test]
fn test_invalid_rule_fails_at_load() {
    let file = write_table(
        r#"{"rules": [{"id": "R1", "description": "no antecedent", "antecedent": [], "consequent": "X"}]}"#,
    );
    assert!(matches!(
        KnowledgeBase::from_path(file.path()),
        Err(Error::InvalidRule(_))
    ));

    let file = write_table(
        r#"{"rules": [
            {"id": "R1", "antecedent": ["A"], "consequent": "B"},
            {"id": "R1", "antecedent": ["C"], "consequent": "D"}
        ]}"#,
    );
    assert_eq!(
        KnowledgeBase::from_path(file.path()).unwrap_err(),
        Error::DuplicateRule("R1".to_string())
    );
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = KnowledgeBase::from_path(dir.path().join("rules.json"));
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_builtin_table_survives_disk_round_trip() {
    let kb = BuiltinRules::transit().unwrap();
    let file = write_table(&kb.to_json().unwrap());

    let restored = KnowledgeBase::from_path(file.path()).unwrap();
    assert_eq!(restored.rules(), kb.rules());
    assert_eq!(restored.summary(), kb.summary());
}

// ============================================================================
// Validation with a custom table
// ============================================================================

#[test]
fn test_explicit_polarity_pair_drives_attribution() {
    let file = write_table(TABLE);
    let kb = KnowledgeBase::from_path(file.path()).unwrap();
    let config = EngineConfig {
        exclusive_polarity_pairs: true,
        ..EngineConfig::default()
    };
    let mut engine = ResolutionEngine::with_config(kb, config).unwrap();

    let record = engine.validate(
        &facts(&[("Station_Closed_Expo", true), ("Transfer_Available_Expo", true)]),
        NetworkMode::Today,
    );

    assert!(!record.is_consistent);
    assert_eq!(record.violated_rule_ids(), vec!["R6"]);
}

#[test]
fn test_mode_tag_filters_custom_rules() {
    let file = write_table(TABLE);
    let mut engine = ResolutionEngine::new(KnowledgeBase::from_path(file.path()).unwrap());
    let scenario = facts(&[
        ("Network_Mode_Future", true),
        ("Line_Inactive_EWL_Airport", false),
    ]);

    let today = engine.validate(&scenario, NetworkMode::Today);
    assert!(today.is_consistent);

    let future = engine.validate(&scenario, NetworkMode::Future);
    assert!(!future.is_consistent);
    assert_eq!(future.violated_rule_ids(), vec!["R3"]);
}
