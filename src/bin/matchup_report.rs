use anyhow::{Context, Result, anyhow};
use serde_json::json;

use matchup_terminal::config::AppConfig;
use matchup_terminal::http_client::set_http_timeout;
use matchup_terminal::loader::fetch_dataset;
use matchup_terminal::matchup::parse_dataset_json;
use matchup_terminal::state::{AppState, Session, SortKey};
use matchup_terminal::views;

struct ReportArgs {
    source: Option<String>,
    json: bool,
    filter: Option<String>,
    sort: Option<SortKey>,
    top: Option<usize>,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let args = parse_args()?;
    let config = AppConfig::from_env().with_source_arg(args.source.clone());
    set_http_timeout(config.http_timeout_secs);

    let body = fetch_dataset(&config.source)
        .with_context(|| format!("failed to load {}", config.source))?;
    let dataset = parse_dataset_json(&body)
        .with_context(|| format!("failed to parse {}", config.source))?;
    let report = dataset.report;

    let mut state = AppState::new(None);
    state.install_session(Session::new(config.source.clone(), dataset));
    if let Some(filter) = &args.filter {
        state.set_filter(filter);
    }
    if let Some(key) = args.sort
        && key != state.sort_key
    {
        state.change_sort(key);
    }

    let mut rows = views::list_view(&state).rows;
    if let Some(top) = args.top {
        rows.truncate(top);
    }

    if args.json {
        let out = json!({
            "source": config.source,
            "report": report,
            "characters": rows,
            "graph": views::graph_snapshot(&state),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).context("failed to encode report")?
        );
        return Ok(());
    }

    if !report.is_clean() {
        eprintln!(
            "warning: skipped {} entries, {} matchups; {} unknown results ignored",
            report.entries_skipped, report.matchups_skipped, report.unknown_results
        );
    }

    let snapshot = views::graph_snapshot(&state);
    println!("Source: {}", config.source);
    println!("{}", views::sort_header(&state));
    println!("{}", snapshot.footer());
    println!();
    println!("{:<40} {:>5} {:>6} {:>5} {:>5}", "Character", "Wins", "Losses", "Draws", "Total");
    for row in &rows {
        println!(
            "{:<40} {:>5} {:>6} {:>5} {:>5}",
            row.name, row.stats.wins, row.stats.losses, row.stats.draws, row.stats.total
        );
    }
    if rows.is_empty() && args.filter.is_some() {
        println!("{}", views::NO_SEARCH_RESULTS);
    }
    Ok(())
}

fn parse_args() -> Result<ReportArgs> {
    let mut args = ReportArgs {
        source: None,
        json: false,
        filter: None,
        sort: None,
        top: None,
    };
    for arg in std::env::args().skip(1) {
        if arg == "--json" {
            args.json = true;
        } else if let Some(filter) = arg.strip_prefix("--filter=") {
            args.filter = Some(filter.to_string());
        } else if let Some(sort) = arg.strip_prefix("--sort=") {
            args.sort = Some(parse_sort_key(sort)?);
        } else if let Some(top) = arg.strip_prefix("--top=") {
            let top = top
                .trim()
                .parse::<usize>()
                .with_context(|| format!("invalid --top value: {top}"))?;
            args.top = Some(top);
        } else if arg.starts_with("--") {
            return Err(anyhow!("unknown flag: {arg}"));
        } else {
            args.source = Some(arg);
        }
    }
    Ok(args)
}

fn parse_sort_key(raw: &str) -> Result<SortKey> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "name" => Ok(SortKey::Name),
        "wins" => Ok(SortKey::Wins),
        "losses" => Ok(SortKey::Losses),
        "draws" => Ok(SortKey::Draws),
        "total" => Ok(SortKey::Total),
        other => Err(anyhow!("unknown sort key: {other}")),
    }
}
