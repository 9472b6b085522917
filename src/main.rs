use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine, Points};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use matchup_terminal::config::AppConfig;
use matchup_terminal::graph::EdgeKind;
use matchup_terminal::loader::spawn_loader;
use matchup_terminal::matchup::MatchResult;
use matchup_terminal::state::{AppState, Delta, LoadState, LoaderCommand, SortKey, View, apply_delta};
use matchup_terminal::views::{self, ImageBadge, NodeEmphasis};

const PAN_STEP: f64 = 0.2;

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<LoaderCommand>>,
}

impl App {
    fn new(config: &AppConfig, cmd_tx: Option<mpsc::Sender<LoaderCommand>>) -> Self {
        Self {
            state: AppState::new(config.default_character.clone()),
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.search_active {
            self.on_search_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Char('r') | KeyCode::Char('R') => self.request_load(true),
            KeyCode::Char('v') | KeyCode::Tab => {
                self.state.toggle_view();
            }
            _ => {
                if self.state.session().is_none() {
                    return;
                }
                match self.state.current_view {
                    View::List => self.on_list_key(key),
                    View::Graph => self.on_graph_key(key),
                }
            }
        }
    }

    fn on_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state.end_search(true);
            }
            KeyCode::Enter => {
                self.state.end_search(false);
            }
            KeyCode::Backspace => {
                self.state.pop_search_char();
            }
            KeyCode::Char(ch) => {
                self.state.push_search_char(ch);
            }
            _ => {}
        }
    }

    fn on_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.cursor_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.cursor_prev(),
            KeyCode::Enter => {
                self.state.select_cursor();
            }
            KeyCode::Char('/') => self.state.begin_search(),
            KeyCode::Esc => {
                self.state.end_search(true);
            }
            KeyCode::Char('n') => {
                self.state.change_sort(SortKey::Name);
            }
            KeyCode::Char('w') => {
                self.state.change_sort(SortKey::Wins);
            }
            KeyCode::Char('o') => {
                self.state.change_sort(SortKey::Losses);
            }
            KeyCode::Char('d') => {
                self.state.change_sort(SortKey::Draws);
            }
            KeyCode::Char('t') => {
                self.state.change_sort(SortKey::Total);
            }
            KeyCode::Char(']') | KeyCode::PageDown => self.state.scroll_detail(3),
            KeyCode::Char('[') | KeyCode::PageUp => self.state.scroll_detail(-3),
            _ => {}
        }
    }

    fn on_graph_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') => self.state.focus_next_node(),
            KeyCode::Char('k') => self.state.focus_prev_node(),
            KeyCode::Enter => {
                self.state.activate_focused_node();
            }
            KeyCode::Char('l') | KeyCode::Char('L') => {
                self.state.cycle_layout();
                let layout = self.state.current_layout.label();
                self.state.push_log(format!("[INFO] Layout: {layout}"));
            }
            KeyCode::Char('1') => {
                self.state.toggle_edge_filter(EdgeKind::Win);
            }
            KeyCode::Char('2') => {
                self.state.toggle_edge_filter(EdgeKind::Draw);
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.state.zoom_in(),
            KeyCode::Char('-') => self.state.zoom_out(),
            KeyCode::Char('0') | KeyCode::Char('f') => {
                self.state.reset_viewport();
            }
            KeyCode::Left => self.state.pan(-PAN_STEP, 0.0),
            KeyCode::Right => self.state.pan(PAN_STEP, 0.0),
            KeyCode::Up => self.state.pan(0.0, PAN_STEP),
            KeyCode::Down => self.state.pan(0.0, -PAN_STEP),
            _ => {}
        }
    }

    fn request_load(&mut self, announce: bool) {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[WARN] Loader unavailable");
            return;
        };
        if tx.send(LoaderCommand::Load).is_err() {
            self.state.push_log("[WARN] Load request failed");
            return;
        }
        self.state.begin_reload();
        if announce {
            self.state.push_log("[INFO] Reload requested");
        }
    }

    fn maybe_preload_images(&mut self) {
        let Some(request) = self.state.take_preload_request() else {
            return;
        };
        let Some(tx) = &self.cmd_tx else {
            return;
        };
        let cmd = LoaderCommand::PreloadImages {
            generation: request.generation,
            names: request.names,
        };
        if tx.send(cmd).is_err() {
            self.state.push_log("[WARN] Image preload request failed");
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = AppConfig::from_env().with_source_arg(std::env::args().nth(1));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_loader(config.clone(), tx, cmd_rx);

    let mut app = App::new(&config, Some(cmd_tx));
    app.request_load(false);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }
        app.maybe_preload_images();

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let state = &app.state;
    if let LoadState::Failed(message) = &state.load {
        render_load_error(frame, frame.size(), message);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match &state.load {
        LoadState::Loading => {
            let loading = Paragraph::new("Loading matchups...")
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(loading, chunks[1]);
        }
        LoadState::Ready(_) => match state.current_view {
            View::List => render_list_view(frame, chunks[1], state),
            View::Graph => render_graph_view(frame, chunks[1], state),
        },
        LoadState::Failed(_) => {}
    }

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(state))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);

    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let view = match state.current_view {
        View::List => "LIST",
        View::Graph => "GRAPH",
    };
    let mut title = format!("MATCHUPS | {view} | {}", views::sort_header(state));
    if state.search_active {
        title.push_str(&format!(" | Search: {}_", state.search_input));
    } else if !state.search_filter.is_empty() {
        title.push_str(&format!(" | Filter: {}", state.search_filter));
    }
    let source = state
        .session()
        .map(|session| {
            format!(
                "{} @ {}",
                session.source,
                session.loaded_at.format("%Y-%m-%d %H:%M")
            )
        })
        .unwrap_or_default();
    let line1 = format!("  /\\   {title}");
    let line2 = format!(" /__\\  {source}");
    format!("{line1}\n{line2}")
}

fn footer_text(state: &AppState) -> String {
    if state.search_active {
        return "type to filter | Enter Keep | Esc Clear".to_string();
    }
    match state.current_view {
        View::List => {
            "j/k Move | Enter Select | / Search | n/w/o/d/t Sort | [/] Scroll | v Graph | r Reload | ? Help | q Quit".to_string()
        }
        View::Graph => {
            "j/k Focus | Enter Open | l Layout | 1 Losses | 2 Draws | +/- Zoom | 0 Reset | ←↑↓→ Pan | v List | q Quit".to_string()
        }
    }
}

fn render_load_error(frame: &mut Frame, area: Rect, message: &str) {
    let text = format!("Error loading matchups\n\n{message}\n\nr Retry | q Quit");
    let error = Paragraph::new(text)
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: false })
        .block(Block::default().title("Error").borders(Borders::ALL));
    frame.render_widget(error, centered_rect(60, 40, area));
}

fn render_list_view(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(44), Constraint::Min(30)])
        .split(area);

    render_character_list(frame, columns[0], state);
    render_detail(frame, columns[1], state);
}

fn render_character_list(frame: &mut Frame, area: Rect, state: &AppState) {
    let view = views::list_view(state);
    let block = Block::default()
        .title(format!("Characters ({})", view.rows.len()))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if view.rows.is_empty() {
        let empty = Paragraph::new(view.empty_message.unwrap_or("No characters"))
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    let (start, end) = visible_range(view.cursor, view.rows.len(), inner.height as usize);
    let lines: Vec<Line> = view.rows[start..end]
        .iter()
        .enumerate()
        .map(|(offset, row)| {
            let at_cursor = start + offset == view.cursor;
            let marker = if row.active { "*" } else { " " };
            let prefix = if at_cursor { ">" } else { " " };
            let counts = format!("{}/{}/{}", row.stats.wins, row.stats.losses, row.stats.draws);
            let name_width = (inner.width as usize).saturating_sub(counts.len() + 4);
            let name: String = row.name.chars().take(name_width).collect();
            let text = format!("{prefix}{marker} {name:<name_width$} {counts}");
            let mut style = Style::default();
            if row.active {
                style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
            }
            if at_cursor {
                style = style.bg(Color::DarkGray);
            }
            Line::styled(text, style)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_detail(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Detail").borders(Borders::ALL);
    let Some(detail) = views::detail_view(state) else {
        let empty = Paragraph::new("Select a character")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    };

    let badge = match &detail.image {
        ImageBadge::Source(path) => format!("[img] {path}"),
        ImageBadge::Initials(initials) => format!("[{initials}]"),
    };
    let mut lines = vec![
        Line::styled(
            format!("{badge}  {}", detail.name),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Line::raw(format!(
            "Fights: {}  Wins: {}  Losses: {}  Draws: {}  Win%: {}%",
            detail.stats.total,
            detail.stats.wins,
            detail.stats.losses,
            detail.stats.draws,
            detail.win_percentage
        )),
        Line::raw(""),
    ];

    if let Some(message) = detail.empty_message {
        lines.push(Line::styled(message, Style::default().fg(Color::DarkGray)));
    }
    for matchup in &detail.matchups {
        let mut head = vec![
            Span::styled(
                format!("{:<5} ", matchup.result_label()),
                result_style(&matchup.result),
            ),
            Span::raw(matchup.opponent.clone()),
        ];
        if let Some(context) = &matchup.context {
            head.push(Span::styled(
                format!(" ({context})"),
                Style::default().fg(Color::DarkGray),
            ));
        }
        lines.push(Line::from(head));
        if let Some(summary) = &matchup.summary {
            lines.push(Line::raw(format!("      {summary}")));
        }
        let refs: Vec<String> = [
            matchup.manga.as_ref().map(|m| format!("Manga: {m}")),
            matchup.anime.as_ref().map(|a| format!("Anime: {a}")),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !refs.is_empty() {
            lines.push(Line::styled(
                format!("      {}", refs.join("  ")),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((state.detail_scroll, 0))
        .block(block);
    frame.render_widget(paragraph, area);
}

fn result_style(result: &MatchResult) -> Style {
    match result {
        MatchResult::Win => Style::default().fg(Color::Green),
        MatchResult::Lose => Style::default().fg(Color::Red),
        MatchResult::Draw => Style::default().fg(Color::Yellow),
        MatchResult::Unknown(_) => Style::default().fg(Color::DarkGray),
    }
}

fn render_graph_view(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    let snapshot = views::graph_snapshot(state);
    let filters = format!(
        "Graph [{}losses {}draws]",
        if state.show_losses { "+" } else { "-" },
        if state.show_draws { "+" } else { "-" }
    );

    let canvas = Canvas::default()
        .block(Block::default().title(filters).borders(Borders::ALL))
        .marker(Marker::Braille)
        .x_bounds(state.viewport.x_bounds())
        .y_bounds(state.viewport.y_bounds())
        .paint(|ctx| {
            for edge in &snapshot.edges {
                let color = match edge.kind {
                    EdgeKind::Win => Color::Green,
                    EdgeKind::Draw => Color::Yellow,
                };
                ctx.draw(&CanvasLine {
                    x1: edge.from.0,
                    y1: edge.from.1,
                    x2: edge.to.0,
                    y2: edge.to.1,
                    color,
                });
            }
            ctx.layer();
            for node in &snapshot.nodes {
                let color = match node.emphasis {
                    NodeEmphasis::Strong => Color::Green,
                    NodeEmphasis::Weak => Color::Red,
                    NodeEmphasis::Normal => Color::White,
                };
                ctx.draw(&Points {
                    coords: &[(node.x, node.y)],
                    color,
                });
                let mut style = Style::default().fg(color);
                if node.selected {
                    style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
                }
                if node.focused {
                    style = style.bg(Color::DarkGray);
                }
                ctx.print(node.x, node.y, Span::styled(node.name.clone(), style));
            }
        });
    frame.render_widget(canvas, rows[0]);

    let focused = snapshot
        .nodes
        .iter()
        .find(|node| node.focused)
        .map(|node| format!(" | Focus: {} ({}W/{}L/{}D)", node.name, node.wins, node.losses, node.draws))
        .unwrap_or_default();
    let footer = Paragraph::new(format!("{}{focused}", snapshot.footer()))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, rows[1]);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Matchup Terminal - Help",
        "",
        "Global:",
        "  v / Tab      Toggle list / graph",
        "  r            Reload dataset",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "List:",
        "  j/k or ↑/↓   Move cursor",
        "  Enter        Select character",
        "  /            Search (Esc clears)",
        "  n w o d t    Sort by name/wins/losses/draws/total",
        "  [ / ]        Scroll detail",
        "",
        "Graph:",
        "  j/k          Focus node",
        "  Enter        Open focused node in list",
        "  l            Cycle layout",
        "  1 / 2        Toggle losses / draws",
        "  + / - / 0    Zoom in / out / reset",
        "  arrows       Pan",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
