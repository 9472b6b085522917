use std::fs;
use std::path::PathBuf;

use matchup_terminal::matchup::parse_dataset_json;
use matchup_terminal::stats::{CharacterStats, aggregate, stats_for};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn stats(wins: u32, losses: u32, draws: u32) -> CharacterStats {
    CharacterStats {
        wins,
        losses,
        draws,
        total: wins + losses + draws,
    }
}

#[test]
fn aggregates_fixture_by_raw_key() {
    let dataset = parse_dataset_json(&read_fixture("matchups.json")).expect("fixture should parse");
    let map = aggregate(dataset.records());

    assert_eq!(stats_for(&map, "Naruto Uzumaki"), stats(4, 0, 1));
    assert_eq!(stats_for(&map, "Sasuke Uchiha"), stats(1, 1, 1));
    assert_eq!(stats_for(&map, "Gaara"), stats(1, 1, 0));
    assert_eq!(stats_for(&map, "Kakashi Hatake"), stats(0, 0, 1));
    assert_eq!(stats_for(&map, "Boruto Uzumaki"), CharacterStats::default());
}

#[test]
fn titled_keys_stay_separate() {
    let dataset = parse_dataset_json(&read_fixture("matchups.json")).expect("fixture should parse");
    let map = aggregate(dataset.records());

    assert_eq!(stats_for(&map, "Third Hokage Hiruzen Sarutobi"), stats(0, 1, 0));
    // The unknown "maybe" result is not counted.
    assert_eq!(stats_for(&map, "Hiruzen Sarutobi (Professor)"), stats(0, 0, 1));
    assert_eq!(stats_for(&map, "Hiruzen Sarutobi"), CharacterStats::default());
}

#[test]
fn total_is_sum_of_parts() {
    let dataset = parse_dataset_json(&read_fixture("matchups.json")).expect("fixture should parse");
    for (name, s) in aggregate(dataset.records()) {
        assert_eq!(s.wins + s.losses + s.draws, s.total, "{name}");
    }
}

#[test]
fn recompute_is_idempotent() {
    let dataset = parse_dataset_json(&read_fixture("matchups.json")).expect("fixture should parse");
    assert_eq!(aggregate(dataset.records()), aggregate(dataset.records()));
}

#[test]
fn mirrored_example_counts_each_side_once() {
    let raw = r#"[
        {"Naruto Uzumaki": [{"opponent": "Sasuke Uchiha", "result": "win"}]},
        {"Sasuke Uchiha": [{"opponent": "Naruto Uzumaki", "result": "lose"}]}
    ]"#;
    let dataset = parse_dataset_json(raw).expect("should parse");
    let map = aggregate(dataset.records());
    assert_eq!(stats_for(&map, "Naruto Uzumaki"), stats(1, 0, 0));
    assert_eq!(stats_for(&map, "Sasuke Uchiha"), stats(0, 1, 0));
}

#[test]
fn duplicate_top_level_keys_accumulate() {
    let raw = r#"[
        {"Rock Lee": [{"Gaara": "lose"}]},
        {"Rock Lee": [{"Neji Hyūga": "win"}, {"Kimimaro": "draw"}]}
    ]"#;
    let dataset = parse_dataset_json(raw).expect("should parse");
    let map = aggregate(dataset.records());
    assert_eq!(stats_for(&map, "Rock Lee"), stats(1, 1, 1));
    assert_eq!(dataset.characters(), vec!["Rock Lee"]);
}

#[test]
fn win_percentage_formatting() {
    assert_eq!(CharacterStats::default().win_percentage(), "0");
    assert_eq!(stats(1, 2, 0).win_percentage(), "33.3");
    assert_eq!(stats(4, 0, 0).win_percentage(), "100.0");
}
