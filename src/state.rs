use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Local};

use crate::graph::{EdgeKind, Graph, NodeId, build_graph_for};
use crate::images::{ImageAttempt, PreloadSummary};
use crate::layout::{GraphLayout, Point, Viewport, compute_layout};
use crate::matchup::{Dataset, MatchRecord, parse_dataset_json};
use crate::names::clean_name;
use crate::stats::{CharacterStats, aggregate, stats_for};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    List,
    Graph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Wins,
    Losses,
    Draws,
    Total,
}

impl SortKey {
    pub fn label(self) -> &'static str {
        match self {
            SortKey::Name => "Name",
            SortKey::Wins => "Wins",
            SortKey::Losses => "Losses",
            SortKey::Draws => "Draws",
            SortKey::Total => "Total",
        }
    }

    fn default_direction(self) -> SortDirection {
        match self {
            SortKey::Name => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Asc => "↑",
            SortDirection::Desc => "↓",
        }
    }
}

/// Which surfaces a transition invalidated.
///
/// The TUI repaints every tick and ignores these; they are for adapters that
/// redraw selectively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Redraw {
    pub list: bool,
    pub detail: bool,
    pub graph_edges: bool,
    pub graph_layout: bool,
    pub graph_fit: bool,
}

impl Redraw {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        *self == Self::default()
    }

    pub fn merge(self, other: Redraw) -> Redraw {
        Redraw {
            list: self.list || other.list,
            detail: self.detail || other.detail,
            graph_edges: self.graph_edges || other.graph_edges,
            graph_layout: self.graph_layout || other.graph_layout,
            graph_fit: self.graph_fit || other.graph_fit,
        }
    }
}

/// Everything derived from one successful load.
#[derive(Debug, Clone)]
pub struct Session {
    pub source: String,
    pub loaded_at: DateTime<Local>,
    pub dataset: Dataset,
    pub stats: HashMap<String, CharacterStats>,
    pub graph: Graph,
    /// Keyed by clean name.
    pub images: HashMap<String, ImageAttempt>,
}

impl Session {
    pub fn new(source: impl Into<String>, dataset: Dataset) -> Self {
        let stats = aggregate(dataset.records());
        let graph = build_graph_for(&dataset);
        Self {
            source: source.into(),
            loaded_at: Local::now(),
            dataset,
            stats,
            graph,
            images: HashMap::new(),
        }
    }

    pub fn image(&self, name: &str) -> Option<&ImageAttempt> {
        self.images.get(clean_name(name))
    }
}

#[derive(Debug, Clone)]
pub enum LoadState {
    Loading,
    Ready(Box<Session>),
    Failed(String),
}

#[derive(Debug)]
pub enum LoaderCommand {
    Load,
    PreloadImages { generation: u64, names: Vec<String> },
}

/// Names to preload for the session installed as `generation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadRequest {
    pub generation: u64,
    pub names: Vec<String>,
}

#[derive(Debug)]
pub enum Delta {
    DatasetFetched { source: String, body: String },
    LoadFailed(String),
    ImagesResolved {
        generation: u64,
        batch: Vec<(String, ImageAttempt)>,
    },
    PreloadFinished {
        generation: u64,
        summary: PreloadSummary,
    },
    Log(String),
}

pub struct AppState {
    pub load: LoadState,
    pub selected_character: Option<String>,
    pub current_view: View,
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
    pub search_filter: String,
    pub search_active: bool,
    pub search_input: String,
    pub current_layout: GraphLayout,
    pub show_losses: bool,
    pub show_draws: bool,
    pub list_cursor: usize,
    pub graph_cursor: NodeId,
    /// Indices into the session graph's canonical edge list.
    pub displayed_edges: Vec<usize>,
    pub positions: Vec<Point>,
    pub viewport: Viewport,
    pub detail_scroll: u16,
    pub help_overlay: bool,
    pub logs: VecDeque<String>,
    pub default_character: Option<String>,
    /// Bumped by every installed session; tags preload results.
    pub generation: u64,
    pending_preload: Option<PreloadRequest>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(None)
    }
}

impl AppState {
    pub fn new(default_character: Option<String>) -> Self {
        Self {
            load: LoadState::Loading,
            selected_character: None,
            current_view: View::List,
            sort_key: SortKey::Name,
            sort_direction: SortDirection::Asc,
            search_filter: String::new(),
            search_active: false,
            search_input: String::new(),
            current_layout: GraphLayout::Force,
            show_losses: true,
            show_draws: true,
            list_cursor: 0,
            graph_cursor: 0,
            displayed_edges: Vec::new(),
            positions: Vec::new(),
            viewport: Viewport::default(),
            detail_scroll: 0,
            help_overlay: false,
            logs: VecDeque::new(),
            default_character,
            generation: 0,
            pending_preload: None,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.load {
            LoadState::Ready(session) => Some(session.as_ref()),
            _ => None,
        }
    }

    fn session_mut(&mut self) -> Option<&mut Session> {
        match &mut self.load {
            LoadState::Ready(session) => Some(session.as_mut()),
            _ => None,
        }
    }

    pub fn begin_reload(&mut self) {
        self.load = LoadState::Loading;
    }

    /// Replaces the session and resets every piece of view state.
    pub fn install_session(&mut self, session: Session) -> Redraw {
        let default_character = self.default_character.clone();
        let logs = std::mem::take(&mut self.logs);
        let help_overlay = self.help_overlay;
        let generation = self.generation + 1;
        *self = Self::new(default_character);
        self.logs = logs;
        self.help_overlay = help_overlay;
        self.generation = generation;

        let characters = session.dataset.characters().len();
        let matchups = session.dataset.records().count();
        let report = session.dataset.report;
        self.push_log(format!(
            "[INFO] Loaded {characters} characters, {matchups} matchups from {}",
            session.source
        ));
        if report.entries_skipped > 0 {
            self.push_log(format!(
                "[WARN] Skipped {} malformed entries",
                report.entries_skipped
            ));
        }
        if report.matchups_skipped > 0 {
            self.push_log(format!(
                "[WARN] Skipped {} malformed matchups",
                report.matchups_skipped
            ));
        }
        if report.unknown_results > 0 {
            self.push_log(format!(
                "[WARN] Ignored {} unknown results",
                report.unknown_results
            ));
        }

        let mut names: Vec<String> = Vec::new();
        for name in session.dataset.characters() {
            let clean = clean_name(name);
            if !clean.is_empty() && !names.iter().any(|n| n == clean) {
                names.push(clean.to_string());
            }
        }
        self.pending_preload = Some(PreloadRequest { generation, names });
        self.load = LoadState::Ready(Box::new(session));

        let mut redraw = self.rebuild_graph_view();
        if let Some(name) = self.default_character.clone() {
            redraw = redraw.merge(self.select_character(&name));
        }
        redraw.merge(Redraw {
            list: true,
            detail: true,
            ..Redraw::none()
        })
    }

    /// Names queued for preloading by the last install.
    pub fn take_preload_request(&mut self) -> Option<PreloadRequest> {
        self.pending_preload.take()
    }

    /// Raw top-level names after filtering and sorting.
    pub fn visible_characters(&self) -> Vec<&str> {
        let Some(session) = self.session() else {
            return Vec::new();
        };
        let mut names: Vec<&str> = session
            .dataset
            .characters()
            .into_iter()
            .filter(|name| {
                self.search_filter.is_empty() || name.to_lowercase().contains(&self.search_filter)
            })
            .collect();

        let key = self.sort_key;
        let direction = self.sort_direction;
        names.sort_by(|a, b| {
            let ord = compare_characters(&session.stats, key, a, b);
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
        names
    }

    pub fn stats_for(&self, name: &str) -> CharacterStats {
        self.session()
            .map(|session| stats_for(&session.stats, name))
            .unwrap_or_default()
    }

    pub fn selected_matchups(&self) -> &[MatchRecord] {
        match (self.session(), self.selected_character.as_deref()) {
            (Some(session), Some(name)) => session.dataset.matchups_for(name),
            _ => &[],
        }
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected_character.as_deref() == Some(name)
    }

    pub fn select_character(&mut self, name: &str) -> Redraw {
        if name.is_empty() {
            return Redraw::none();
        }
        self.selected_character = Some(name.to_string());
        self.detail_scroll = 0;
        let idx = self.visible_characters().iter().position(|n| *n == name);
        if let Some(idx) = idx {
            self.list_cursor = idx;
        }
        Redraw {
            list: true,
            detail: true,
            ..Redraw::none()
        }
    }

    pub fn change_sort(&mut self, key: SortKey) -> Redraw {
        let anchor = self.cursor_character();
        if key == self.sort_key {
            self.sort_direction = self.sort_direction.flip();
        } else {
            self.sort_key = key;
            self.sort_direction = key.default_direction();
        }
        self.restore_cursor(anchor.as_deref());
        Redraw {
            list: true,
            ..Redraw::none()
        }
    }

    pub fn set_filter(&mut self, text: &str) -> Redraw {
        let anchor = self.cursor_character();
        self.search_filter = text.trim().to_lowercase();
        self.restore_cursor(anchor.as_deref());
        Redraw {
            list: true,
            ..Redraw::none()
        }
    }

    pub fn switch_view(&mut self, view: View) -> Redraw {
        self.current_view = view;
        match view {
            View::Graph => {
                self.viewport = Viewport::fit(&self.positions);
                Redraw {
                    graph_fit: true,
                    ..Redraw::none()
                }
            }
            View::List => Redraw {
                list: true,
                ..Redraw::none()
            },
        }
    }

    pub fn toggle_view(&mut self) -> Redraw {
        match self.current_view {
            View::List => self.switch_view(View::Graph),
            View::Graph => self.switch_view(View::List),
        }
    }

    /// Win edges follow "show losses", draw edges follow "show draws".
    pub fn toggle_edge_filter(&mut self, kind: EdgeKind) -> Redraw {
        match kind {
            EdgeKind::Win => self.show_losses = !self.show_losses,
            EdgeKind::Draw => self.show_draws = !self.show_draws,
        }
        self.rebuild_graph_view()
    }

    pub fn set_layout(&mut self, layout: GraphLayout) -> Redraw {
        self.current_layout = layout;
        self.run_layout();
        Redraw {
            graph_layout: true,
            graph_fit: true,
            ..Redraw::none()
        }
    }

    pub fn cycle_layout(&mut self) -> Redraw {
        self.set_layout(self.current_layout.next())
    }

    /// Switches to the list first, then selects the node's clean name.
    pub fn activate_graph_node(&mut self, id: NodeId) -> Redraw {
        let Some(name) = self
            .session()
            .and_then(|session| session.graph.node(id))
            .map(|node| node.name.clone())
        else {
            return Redraw::none();
        };
        let redraw = self.switch_view(View::List);
        redraw.merge(self.select_character(&name))
    }

    pub fn activate_focused_node(&mut self) -> Redraw {
        self.activate_graph_node(self.graph_cursor)
    }

    pub fn focus_next_node(&mut self) {
        let count = self.node_count();
        if count > 0 {
            self.graph_cursor = (self.graph_cursor + 1) % count;
        }
    }

    pub fn focus_prev_node(&mut self) {
        let count = self.node_count();
        if count > 0 {
            self.graph_cursor = (self.graph_cursor + count - 1) % count;
        }
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.viewport.pan(dx, dy);
    }

    pub fn reset_viewport(&mut self) -> Redraw {
        self.viewport = Viewport::fit(&self.positions);
        Redraw {
            graph_fit: true,
            ..Redraw::none()
        }
    }

    pub fn cursor_next(&mut self) {
        let len = self.visible_characters().len();
        if len > 0 {
            self.list_cursor = (self.list_cursor + 1).min(len - 1);
        }
    }

    pub fn cursor_prev(&mut self) {
        self.list_cursor = self.list_cursor.saturating_sub(1);
    }

    pub fn select_cursor(&mut self) -> Redraw {
        match self.cursor_character() {
            Some(name) => self.select_character(&name),
            None => Redraw::none(),
        }
    }

    pub fn begin_search(&mut self) {
        self.search_active = true;
        self.search_input = self.search_filter.clone();
    }

    pub fn push_search_char(&mut self, ch: char) -> Redraw {
        self.search_input.push(ch);
        let text = self.search_input.clone();
        self.set_filter(&text)
    }

    pub fn pop_search_char(&mut self) -> Redraw {
        self.search_input.pop();
        let text = self.search_input.clone();
        self.set_filter(&text)
    }

    /// Leaves input mode; `clear` also drops the filter.
    pub fn end_search(&mut self, clear: bool) -> Redraw {
        self.search_active = false;
        if clear {
            self.search_input.clear();
            return self.set_filter("");
        }
        Redraw::none()
    }

    pub fn scroll_detail(&mut self, delta: i32) {
        let next = i32::from(self.detail_scroll) + delta;
        self.detail_scroll = next.clamp(0, i32::from(u16::MAX)) as u16;
    }

    pub fn cursor_character(&self) -> Option<String> {
        self.visible_characters()
            .get(self.list_cursor)
            .map(|name| name.to_string())
    }

    fn restore_cursor(&mut self, anchor: Option<&str>) {
        let (idx, len) = {
            let visible = self.visible_characters();
            let idx = anchor
                .and_then(|name| visible.iter().position(|n| *n == name))
                .unwrap_or(0);
            (idx, visible.len())
        };
        self.list_cursor = if len == 0 { 0 } else { idx.min(len - 1) };
    }

    fn node_count(&self) -> usize {
        self.session()
            .map(|session| session.graph.nodes.len())
            .unwrap_or(0)
    }

    /// Clears the displayed set, re-filters the canonical edges and re-runs layout.
    fn rebuild_graph_view(&mut self) -> Redraw {
        self.displayed_edges.clear();
        if let Some(session) = self.session() {
            self.displayed_edges = session
                .graph
                .filter_edges(self.show_losses, self.show_draws);
        }
        self.run_layout();
        Redraw {
            graph_edges: true,
            graph_layout: true,
            graph_fit: true,
            ..Redraw::none()
        }
    }

    fn run_layout(&mut self) {
        self.positions = match self.session() {
            Some(session) => compute_layout(self.current_layout, &session.graph, &self.displayed_edges),
            None => Vec::new(),
        };
        self.viewport = Viewport::fit(&self.positions);
        if self.graph_cursor >= self.positions.len() {
            self.graph_cursor = 0;
        }
    }
}

fn compare_characters(
    stats: &HashMap<String, CharacterStats>,
    key: SortKey,
    a: &str,
    b: &str,
) -> Ordering {
    if key == SortKey::Name {
        return a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b));
    }
    let sa = stats_for(stats, a);
    let sb = stats_for(stats, b);
    match key {
        SortKey::Wins => sa.wins.cmp(&sb.wins),
        SortKey::Losses => sa.losses.cmp(&sb.losses),
        SortKey::Draws => sa.draws.cmp(&sb.draws),
        SortKey::Total => sa.total.cmp(&sb.total),
        SortKey::Name => Ordering::Equal,
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::DatasetFetched { source, body } => match parse_dataset_json(&body) {
            Ok(dataset) => {
                state.install_session(Session::new(source, dataset));
            }
            Err(err) => {
                state.push_log(format!("[ERROR] {source}: {err}"));
                state.load = LoadState::Failed(err.to_string());
            }
        },
        Delta::LoadFailed(message) => {
            state.push_log(format!("[ERROR] {message}"));
            state.load = LoadState::Failed(message);
        }
        Delta::ImagesResolved { generation, batch } => {
            if generation != state.generation {
                return;
            }
            if let Some(session) = state.session_mut() {
                session.images.extend(batch);
            }
        }
        Delta::PreloadFinished {
            generation,
            summary,
        } => {
            if generation != state.generation {
                return;
            }
            state.push_log(format!(
                "[INFO] Preloaded {}/{} images",
                summary.found, summary.total
            ));
        }
        Delta::Log(line) => state.push_log(line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"Naruto Uzumaki": [{"opponent": "Sasuke Uchiha", "result": "win"}, {"Gaara": "win"}]},
        {"Sasuke Uchiha": [{"opponent": "Naruto Uzumaki", "result": "lose"}]},
        {"Gaara": [{"Rock Lee": "win"}, {"Naruto Uzumaki": "lose"}]}
    ]"#;

    fn ready_state() -> AppState {
        let mut state = AppState::new(Some("Naruto Uzumaki".to_string()));
        apply_delta(
            &mut state,
            Delta::DatasetFetched {
                source: "sample".to_string(),
                body: SAMPLE.to_string(),
            },
        );
        state
    }

    #[test]
    fn install_selects_default_and_queues_preload() {
        let mut state = ready_state();
        assert_eq!(state.selected_character.as_deref(), Some("Naruto Uzumaki"));
        assert_eq!(state.selected_matchups().len(), 2);
        let request = state.take_preload_request().expect("install queues a preload");
        assert_eq!(request.generation, 1);
        assert_eq!(request.names, vec!["Naruto Uzumaki", "Sasuke Uchiha", "Gaara"]);
        assert!(state.take_preload_request().is_none());
    }

    #[test]
    fn stale_preload_results_are_dropped() {
        let mut state = ready_state();
        let first = state.generation;
        apply_delta(
            &mut state,
            Delta::DatasetFetched {
                source: "sample".to_string(),
                body: SAMPLE.to_string(),
            },
        );
        assert_eq!(state.generation, first + 1);
        let logs_before = state.logs.len();

        let batch = vec![("Gaara".to_string(), ImageAttempt::NotFound)];
        apply_delta(
            &mut state,
            Delta::ImagesResolved {
                generation: first,
                batch: batch.clone(),
            },
        );
        apply_delta(
            &mut state,
            Delta::PreloadFinished {
                generation: first,
                summary: PreloadSummary { total: 1, found: 0 },
            },
        );
        assert!(state.session().is_some_and(|s| s.images.is_empty()));
        assert_eq!(state.logs.len(), logs_before);

        let current = state.generation;
        apply_delta(
            &mut state,
            Delta::ImagesResolved {
                generation: current,
                batch,
            },
        );
        assert_eq!(
            state.session().and_then(|s| s.image("Gaara (Kazekage)")),
            Some(&ImageAttempt::NotFound)
        );
    }

    #[test]
    fn parse_failure_is_fatal() {
        let mut state = AppState::default();
        apply_delta(
            &mut state,
            Delta::DatasetFetched {
                source: "bad".to_string(),
                body: "[]".to_string(),
            },
        );
        let LoadState::Failed(message) = &state.load else {
            panic!("expected failure");
        };
        assert_eq!(message, "Invalid data format or empty data");
    }

    #[test]
    fn redraw_flags_follow_transitions() {
        let mut state = ready_state();
        let redraw = state.switch_view(View::Graph);
        assert!(redraw.graph_fit && !redraw.graph_edges && !redraw.list);

        let redraw = state.switch_view(View::List);
        assert!(!redraw.graph_edges && !redraw.graph_layout);

        let redraw = state.toggle_edge_filter(EdgeKind::Draw);
        assert!(redraw.graph_edges && redraw.graph_layout);
        assert!(state.select_character("").is_none());
    }

    #[test]
    fn sort_keeps_cursor_on_character() {
        let mut state = ready_state();
        state.select_character("Gaara");
        assert_eq!(state.cursor_character().as_deref(), Some("Gaara"));
        state.change_sort(SortKey::Wins);
        assert_eq!(state.cursor_character().as_deref(), Some("Gaara"));
    }

    #[test]
    fn logs_are_bounded() {
        let mut state = AppState::default();
        for i in 0..(MAX_LOGS + 25) {
            state.push_log(format!("[INFO] {i}"));
        }
        assert_eq!(state.logs.len(), MAX_LOGS);
        assert_eq!(state.logs.front().map(String::as_str), Some("[INFO] 25"));
    }
}
