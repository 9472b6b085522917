//! Pure-data view models consumed by the terminal UI and the report tool.

use serde::Serialize;

use crate::graph::{EdgeKind, Graph, NodeId};
use crate::images::{ImageAttempt, initials};
use crate::layout::{GraphLayout, Point};
use crate::matchup::{MatchRecord, MatchResult};
use crate::state::AppState;
use crate::stats::CharacterStats;

pub const NO_MATCHUPS: &str = "No matchups found for this character.";
pub const NO_SEARCH_RESULTS: &str = "No characters found matching your search.";
const HIDDEN_REFERENCE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterRow {
    pub name: String,
    pub stats: CharacterStats,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    pub rows: Vec<CharacterRow>,
    pub cursor: usize,
    pub empty_message: Option<&'static str>,
}

pub fn list_view(state: &AppState) -> ListView {
    let rows: Vec<CharacterRow> = state
        .visible_characters()
        .into_iter()
        .map(|name| CharacterRow {
            name: name.to_string(),
            stats: state.stats_for(name),
            active: state.is_selected(name),
        })
        .collect();
    let empty_message = (rows.is_empty() && !state.search_filter.is_empty()).then_some(NO_SEARCH_RESULTS);
    ListView {
        cursor: state.list_cursor.min(rows.len().saturating_sub(1)),
        rows,
        empty_message,
    }
}

pub fn sort_header(state: &AppState) -> String {
    format!(
        "Sort: {} {}",
        state.sort_key.label(),
        state.sort_direction.arrow()
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageBadge {
    Source(String),
    Initials(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchupLine {
    pub opponent: String,
    pub context: Option<String>,
    pub result: MatchResult,
    pub summary: Option<String>,
    pub manga: Option<String>,
    pub anime: Option<String>,
}

impl MatchupLine {
    fn from_record(record: &MatchRecord) -> Self {
        Self {
            opponent: record.opponent.clone(),
            context: record.context.clone(),
            result: record.result.clone(),
            summary: record.summary.clone(),
            manga: visible_reference(record.manga_ref.as_deref()),
            anime: visible_reference(record.anime_ref.as_deref()),
        }
    }

    pub fn result_label(&self) -> &str {
        self.result.label()
    }
}

fn visible_reference(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| *v != HIDDEN_REFERENCE)
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    pub name: String,
    pub image: ImageBadge,
    pub stats: CharacterStats,
    pub win_percentage: String,
    pub matchups: Vec<MatchupLine>,
    pub empty_message: Option<&'static str>,
}

/// `None` until something is selected. Stats come from the list itself.
pub fn detail_view(state: &AppState) -> Option<DetailView> {
    let name = state.selected_character.as_deref()?;
    let records = state.selected_matchups();
    let stats = CharacterStats::from_records(records);

    let image = match state.session().and_then(|session| session.image(name)) {
        Some(ImageAttempt::Found(source)) => ImageBadge::Source(source.describe()),
        _ => ImageBadge::Initials(initials(name)),
    };

    Some(DetailView {
        name: name.to_string(),
        image,
        win_percentage: stats.win_percentage(),
        stats,
        matchups: records.iter().map(MatchupLine::from_record).collect(),
        empty_message: records.is_empty().then_some(NO_MATCHUPS),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeEmphasis {
    Normal,
    Strong,
    Weak,
}

impl NodeEmphasis {
    /// Heavy losers are marked even when they also win a lot.
    pub fn for_tallies(wins: u32, losses: u32) -> Self {
        if losses > 5 {
            NodeEmphasis::Weak
        } else if wins > 10 {
            NodeEmphasis::Strong
        } else {
            NodeEmphasis::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub id: NodeId,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub emphasis: NodeEmphasis,
    pub focused: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeView {
    pub source: NodeId,
    pub target: NodeId,
    pub kind: EdgeKind,
    pub from: (f64, f64),
    pub to: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphSnapshot {
    pub layout: &'static str,
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
    pub zoom_percent: u32,
}

impl GraphSnapshot {
    pub fn footer(&self) -> String {
        format!(
            "Nodes: {} | Edges: {} | Zoom: {}% | Layout: {}",
            self.nodes.len(),
            self.edges.len(),
            self.zoom_percent,
            self.layout
        )
    }
}

pub fn graph_snapshot(state: &AppState) -> GraphSnapshot {
    let empty = Graph::default();
    let graph = state.session().map(|session| &session.graph).unwrap_or(&empty);
    let selected = state
        .selected_character
        .as_deref()
        .and_then(|name| graph.node_by_name(name))
        .map(|node| node.id);
    build_snapshot(
        graph,
        &state.displayed_edges,
        &state.positions,
        state.current_layout,
        state.viewport.zoom_percent(),
        Some(state.graph_cursor),
        selected,
    )
}

/// Joins a graph with its layout. Nodes without a position sit at the origin.
pub fn build_snapshot(
    graph: &Graph,
    displayed_edges: &[usize],
    positions: &[Point],
    layout: GraphLayout,
    zoom_percent: u32,
    focused: Option<NodeId>,
    selected: Option<NodeId>,
) -> GraphSnapshot {
    let at = |id: NodeId| positions.get(id).map(|p| (p.x, p.y)).unwrap_or((0.0, 0.0));
    let nodes = graph
        .nodes
        .iter()
        .map(|node| {
            let (x, y) = at(node.id);
            NodeView {
                id: node.id,
                name: node.name.clone(),
                x,
                y,
                wins: node.wins,
                losses: node.losses,
                draws: node.draws,
                emphasis: NodeEmphasis::for_tallies(node.wins, node.losses),
                focused: focused == Some(node.id),
                selected: selected == Some(node.id),
            }
        })
        .collect();
    let edges = displayed_edges
        .iter()
        .filter_map(|idx| graph.edges.get(*idx))
        .map(|edge| EdgeView {
            source: edge.source,
            target: edge.target,
            kind: edge.kind,
            from: at(edge.source),
            to: at(edge.target),
        })
        .collect();
    GraphSnapshot {
        layout: layout.label(),
        nodes,
        edges,
        zoom_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Delta, apply_delta};

    fn loaded(body: &str, default: Option<&str>) -> AppState {
        let mut state = AppState::new(default.map(str::to_string));
        apply_delta(
            &mut state,
            Delta::DatasetFetched {
                source: "inline".to_string(),
                body: body.to_string(),
            },
        );
        state
    }

    #[test]
    fn detail_hides_na_references_and_formats_percentage() {
        let state = loaded(
            r#"[{"Rock Lee": [
                {"opponent": "Gaara (Chunin Exams)", "result": "lose", "summary": "Gates", "manga": "Ch. 85", "anime": "N/A"},
                {"Neji Hyūga": "win"},
                {"Kabuto": "win"}
            ]}]"#,
            Some("Rock Lee"),
        );
        let detail = detail_view(&state).unwrap_or_else(|| panic!("selected"));
        assert_eq!(detail.win_percentage, "66.7");
        assert_eq!(detail.stats.total, 3);
        assert_eq!(detail.image, ImageBadge::Initials("RL".to_string()));
        let first = &detail.matchups[0];
        assert_eq!(first.opponent, "Gaara");
        assert_eq!(first.context.as_deref(), Some("Chunin Exams"));
        assert_eq!(first.manga.as_deref(), Some("Ch. 85"));
        assert!(first.anime.is_none());
        assert_eq!(first.result_label(), "lose");
    }

    #[test]
    fn lookup_miss_renders_placeholder() {
        let state = loaded(r#"[{"Gaara": [{"Rock Lee": "win"}]}]"#, Some("Naruto Uzumaki"));
        let detail = detail_view(&state).unwrap_or_else(|| panic!("selected"));
        assert!(detail.matchups.is_empty());
        assert_eq!(detail.empty_message, Some(NO_MATCHUPS));
        assert_eq!(detail.win_percentage, "0");
    }

    #[test]
    fn exactly_one_active_row() {
        let mut state = loaded(
            r#"[{"Gaara": [{"Rock Lee": "win"}]}, {"Rock Lee": [{"Gaara": "lose"}]}]"#,
            None,
        );
        assert!(list_view(&state).rows.iter().all(|row| !row.active));
        state.select_character("Rock Lee");
        let active: Vec<_> = list_view(&state)
            .rows
            .into_iter()
            .filter(|row| row.active)
            .map(|row| row.name)
            .collect();
        assert_eq!(active, vec!["Rock Lee"]);
    }

    #[test]
    fn empty_search_shows_message() {
        let mut state = loaded(r#"[{"Gaara": [{"Rock Lee": "win"}]}]"#, None);
        state.set_filter("zzz");
        let view = list_view(&state);
        assert!(view.rows.is_empty());
        assert_eq!(view.empty_message, Some(NO_SEARCH_RESULTS));
    }

    #[test]
    fn emphasis_thresholds() {
        assert_eq!(NodeEmphasis::for_tallies(11, 0), NodeEmphasis::Strong);
        assert_eq!(NodeEmphasis::for_tallies(10, 5), NodeEmphasis::Normal);
        assert_eq!(NodeEmphasis::for_tallies(12, 6), NodeEmphasis::Weak);
    }

    #[test]
    fn snapshot_footer_counts_displayed_edges() {
        let mut state = loaded(
            r#"[{"Gaara": [{"Rock Lee": "win"}, {"Naruto Uzumaki": "draw"}]}]"#,
            None,
        );
        state.switch_view(crate::state::View::Graph);
        assert_eq!(graph_snapshot(&state).footer(), "Nodes: 3 | Edges: 2 | Zoom: 100% | Layout: force");
        state.toggle_edge_filter(EdgeKind::Draw);
        let snap = graph_snapshot(&state);
        assert_eq!(snap.edges.len(), 1);
        assert_eq!(snap.edges[0].kind, EdgeKind::Win);
    }
}
