use std::fs;
use std::path::PathBuf;

use matchup_terminal::error::LoadError;
use matchup_terminal::loader::fetch_dataset;
use matchup_terminal::matchup::{MatchResult, MatchupEncoding, ParseReport, parse_dataset_json};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn read_fixture(name: &str) -> String {
    fs::read_to_string(fixture_path(name)).expect("fixture file should be readable")
}

#[test]
fn parses_matchups_fixture() {
    let raw = read_fixture("matchups.json");
    let dataset = parse_dataset_json(&raw).expect("fixture should parse");

    assert_eq!(
        dataset.characters(),
        vec![
            "Naruto Uzumaki",
            "Sasuke Uchiha",
            "Boruto Uzumaki",
            "Third Hokage Hiruzen Sarutobi",
            "Hiruzen Sarutobi (Professor)",
            "Gaara",
            "Kakashi Hatake",
        ]
    );
    assert_eq!(dataset.records().count(), 14);
    assert_eq!(
        dataset.report,
        ParseReport {
            entries_skipped: 2,
            matchups_skipped: 2,
            unknown_results: 1,
        }
    );
}

#[test]
fn decodes_both_shapes() {
    let dataset = parse_dataset_json(&read_fixture("matchups.json")).expect("fixture should parse");
    let naruto = dataset.matchups_for("Naruto Uzumaki");
    assert_eq!(naruto.len(), 5);

    let first = &naruto[0];
    assert_eq!(first.encoding, MatchupEncoding::Structured);
    assert_eq!(first.opponent, "Sasuke Uchiha");
    assert_eq!(first.context.as_deref(), Some("Final Battle"));
    assert_eq!(first.summary.as_deref(), Some("Valley of the End rematch"));
    assert_eq!(first.manga_ref.as_deref(), Some("Chapter 698"));
    assert_eq!(first.opponent_key(), "Sasuke Uchiha");

    let legacy = &naruto[2];
    assert_eq!(legacy.encoding, MatchupEncoding::Legacy);
    assert_eq!(legacy.opponent, "Gaara");
    assert_eq!(legacy.result, MatchResult::Win);
    assert!(legacy.summary.is_none());

    let pain = &naruto[3];
    assert_eq!(pain.opponent, "Pain");
    assert_eq!(pain.context.as_deref(), Some("Six Paths"));
}

#[test]
fn subject_context_is_kept_until_key_time() {
    let dataset = parse_dataset_json(&read_fixture("matchups.json")).expect("fixture should parse");
    let hiruzen = dataset.matchups_for("Hiruzen Sarutobi (Professor)");
    assert_eq!(hiruzen[0].subject, "Hiruzen Sarutobi (Professor)");
    assert_eq!(hiruzen[0].subject_key(), "Hiruzen Sarutobi");
    assert_eq!(hiruzen[1].result, MatchResult::Unknown("maybe".to_string()));
}

#[test]
fn structured_needs_both_fields() {
    // Without a truthy result the object falls back to the legacy reading.
    let raw = r#"[{"Rock Lee": [{"opponent": "Gaara", "result": ""}]}]"#;
    let dataset = parse_dataset_json(raw).expect("should parse");
    let record = &dataset.matchups_for("Rock Lee")[0];
    assert_eq!(record.encoding, MatchupEncoding::Legacy);
    assert_eq!(record.opponent, "opponent");
    assert_eq!(record.result, MatchResult::Unknown("Gaara".to_string()));
}

#[test]
fn malformed_entry_does_not_affect_others() {
    let raw = r#"[
        {"Foo": "not-an-array"},
        {"Rock Lee": [{"Gaara": "lose"}]}
    ]"#;
    let dataset = parse_dataset_json(raw).expect("malformed entries are skipped");
    assert_eq!(dataset.characters(), vec!["Rock Lee"]);
    assert_eq!(dataset.report.entries_skipped, 1);
    assert_eq!(dataset.matchups_for("Foo").len(), 0);
}

#[test]
fn rejects_bad_top_level() {
    assert!(matches!(parse_dataset_json("[]"), Err(LoadError::Empty)));
    assert!(matches!(parse_dataset_json("  []\n"), Err(LoadError::Empty)));
    assert!(matches!(
        parse_dataset_json(r#"{"Naruto Uzumaki": []}"#),
        Err(LoadError::NotAnArray)
    ));
    assert!(matches!(
        parse_dataset_json("[{"),
        Err(LoadError::InvalidJson(_))
    ));
    assert_eq!(
        LoadError::Empty.to_string(),
        "Invalid data format or empty data"
    );
}

#[test]
fn loads_from_disk() {
    let path = fixture_path("matchups.json");
    let body = fetch_dataset(&path.to_string_lossy()).expect("fixture should load");
    assert!(parse_dataset_json(&body).is_ok());

    let missing = fixture_path("missing.json");
    let err = fetch_dataset(&missing.to_string_lossy()).expect_err("missing file should fail");
    assert!(matches!(err, LoadError::Read { .. }));
}

#[test]
fn title_only_subjects_are_skipped() {
    let raw = r#"[
        {"(Title Only)": [{"Gaara": "win"}]},
        {"Gaara": [{"Rock Lee": "lose"}]}
    ]"#;
    let dataset = parse_dataset_json(raw).expect("should parse");
    assert_eq!(dataset.characters(), vec!["Gaara"]);
    assert_eq!(dataset.report.entries_skipped, 1);

    let graph = matchup_terminal::graph::build_graph_for(&dataset);
    assert!(graph.nodes.iter().all(|node| !node.name.is_empty()));
    assert_eq!(graph.nodes.len(), 2);
}
