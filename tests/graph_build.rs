use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::PathBuf;

use matchup_terminal::graph::{EdgeKind, Graph, build_graph, build_graph_for};
use matchup_terminal::matchup::parse_dataset_json;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn fixture_graph() -> Graph {
    let dataset = parse_dataset_json(&read_fixture("matchups.json")).expect("fixture should parse");
    build_graph_for(&dataset)
}

fn named_edges(graph: &Graph) -> BTreeSet<(String, String, &'static str)> {
    graph
        .edges
        .iter()
        .map(|edge| {
            (
                graph.nodes[edge.source].name.clone(),
                graph.nodes[edge.target].name.clone(),
                edge.kind.label(),
            )
        })
        .collect()
}

#[test]
fn nodes_follow_first_seen_order() {
    let graph = fixture_graph();
    let names: Vec<&str> = graph.nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Naruto Uzumaki",
            "Sasuke Uchiha",
            "Neji Hyūga",
            "Gaara",
            "Pain",
            "Kakashi Hatake",
            "Itachi Uchiha",
            "Boruto Uzumaki",
            "Third Hokage Hiruzen Sarutobi",
            "Orochimaru",
            "Hiruzen Sarutobi",
            "Danzō Shimura",
            "Rock Lee",
        ]
    );
    assert!(graph.nodes.iter().enumerate().all(|(idx, node)| node.id == idx));
}

#[test]
fn edges_are_deduplicated() {
    let graph = fixture_graph();
    assert_eq!(graph.edges.len(), 10);
    let keys: HashSet<_> = graph.edges.iter().map(|edge| edge.key()).collect();
    assert_eq!(keys.len(), graph.edges.len());

    let wins = graph.edges.iter().filter(|e| e.kind == EdgeKind::Win).count();
    assert_eq!(wins, 7);
    assert!(
        graph
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Draw)
            .all(|e| e.source <= e.target)
    );
}

#[test]
fn tallies_come_from_kept_edges() {
    let graph = fixture_graph();
    let node = |name: &str| graph.node_by_name(name).expect("node should exist");

    let naruto = node("Naruto Uzumaki");
    assert_eq!((naruto.wins, naruto.losses, naruto.draws), (4, 0, 1));
    // Beaten by Naruto in both entries, counted once.
    let gaara = node("Gaara");
    assert_eq!((gaara.wins, gaara.losses, gaara.draws), (1, 1, 0));
    let kakashi = node("Kakashi Hatake");
    assert_eq!((kakashi.wins, kakashi.losses, kakashi.draws), (0, 0, 2));
    let orochimaru = node("Orochimaru");
    assert_eq!((orochimaru.wins, orochimaru.losses, orochimaru.draws), (1, 0, 1));
}

#[test]
fn unknown_results_create_nodes_but_no_edges() {
    let graph = fixture_graph();
    let danzo = graph.node_by_name("Danzō Shimura").expect("node should exist");
    assert_eq!((danzo.wins, danzo.losses, danzo.draws), (0, 0, 0));
    assert!(
        graph
            .edges
            .iter()
            .all(|e| e.source != danzo.id && e.target != danzo.id)
    );
}

#[test]
fn mirrored_win_and_lose_collapse() {
    let raw = r#"[
        {"Naruto Uzumaki": [{"opponent": "Sasuke Uchiha", "result": "win"}]},
        {"Sasuke Uchiha": [{"opponent": "Naruto Uzumaki", "result": "lose"}]}
    ]"#;
    let dataset = parse_dataset_json(raw).expect("should parse");
    let graph = build_graph(dataset.records());

    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.edges.len(), 1);
    let edge = graph.edges[0];
    assert_eq!(edge.kind, EdgeKind::Win);
    assert_eq!(graph.nodes[edge.source].name, "Naruto Uzumaki");
    assert_eq!(graph.nodes[edge.target].name, "Sasuke Uchiha");
    assert_eq!(graph.nodes[edge.source].wins, 1);
    assert_eq!(graph.nodes[edge.target].losses, 1);
}

#[test]
fn draws_normalize_direction() {
    let raw = r#"[
        {"Kakashi Hatake": [{"Might Guy": "draw"}]},
        {"Might Guy": [{"Kakashi Hatake (Rival)": "draw"}]}
    ]"#;
    let dataset = parse_dataset_json(raw).expect("should parse");
    let graph = build_graph(dataset.records());
    assert_eq!(graph.edges.len(), 1);
    assert_eq!(graph.nodes[0].draws, 1);
    assert_eq!(graph.nodes[1].draws, 1);
}

#[test]
fn build_is_idempotent() {
    let dataset = parse_dataset_json(&read_fixture("matchups.json")).expect("fixture should parse");
    let a = build_graph_for(&dataset);
    let b = build_graph_for(&dataset);
    let names = |g: &Graph| g.nodes.iter().map(|n| n.name.clone()).collect::<BTreeSet<_>>();
    assert_eq!(names(&a), names(&b));
    assert_eq!(named_edges(&a), named_edges(&b));
    assert_eq!(a, b);
}

#[test]
fn empty_subjects_still_get_nodes() {
    let dataset = parse_dataset_json(&read_fixture("matchups.json")).expect("fixture should parse");
    assert!(build_graph(dataset.records()).node_by_name("Boruto Uzumaki").is_none());
    assert!(build_graph_for(&dataset).node_by_name("Boruto Uzumaki").is_some());
}

#[test]
fn edge_filters_gate_by_kind() {
    let graph = fixture_graph();
    assert_eq!(graph.filter_edges(true, true).len(), 10);
    assert_eq!(graph.filter_edges(false, true).len(), 3);
    assert_eq!(graph.filter_edges(true, false).len(), 7);
    assert!(graph.filter_edges(false, false).is_empty());
}
