use std::collections::HashSet;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{LoadError, LoadResult};
use crate::names::{clean_name, split_context};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    Win,
    Lose,
    Draw,
    /// Anything outside win/lose/draw. Kept for display, never counted.
    Unknown(String),
}

impl MatchResult {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "win" => MatchResult::Win,
            "lose" => MatchResult::Lose,
            "draw" => MatchResult::Draw,
            other => MatchResult::Unknown(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            MatchResult::Win => "win",
            MatchResult::Lose => "lose",
            MatchResult::Draw => "draw",
            MatchResult::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, MatchResult::Unknown(_))
    }
}

impl Serialize for MatchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Which of the two source shapes a matchup was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchupEncoding {
    /// `{ "Opponent Name": "win" }`
    Legacy,
    /// `{ "opponent": "...", "result": "...", "summary"?, "manga"?, "anime"? }`
    Structured,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    /// Top-level key exactly as it appears in the source.
    pub subject: String,
    /// Opponent display name with the parenthetical context removed.
    pub opponent: String,
    /// Opponent as written in the source; graph identity derives from this.
    pub raw_opponent: String,
    pub result: MatchResult,
    pub context: Option<String>,
    pub summary: Option<String>,
    pub manga_ref: Option<String>,
    pub anime_ref: Option<String>,
    pub encoding: MatchupEncoding,
}

impl MatchRecord {
    pub fn subject_key(&self) -> &str {
        clean_name(&self.subject)
    }

    pub fn opponent_key(&self) -> &str {
        clean_name(&self.raw_opponent)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterEntry {
    pub name: String,
    pub matchups: Vec<MatchRecord>,
}

/// Tally of what the parser dropped or could not classify.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseReport {
    pub entries_skipped: usize,
    pub matchups_skipped: usize,
    pub unknown_results: usize,
}

impl ParseReport {
    pub fn is_clean(&self) -> bool {
        self.entries_skipped == 0 && self.matchups_skipped == 0 && self.unknown_results == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub entries: Vec<CharacterEntry>,
    pub report: ParseReport,
}

impl Dataset {
    pub fn records(&self) -> impl Iterator<Item = &MatchRecord> {
        self.entries.iter().flat_map(|entry| entry.matchups.iter())
    }

    /// Unique top-level names in first-seen order.
    pub fn characters(&self) -> Vec<&str> {
        let mut seen: HashSet<&str> = HashSet::new();
        self.entries
            .iter()
            .map(|entry| entry.name.as_str())
            .filter(|name| seen.insert(name))
            .collect()
    }

    /// Matchups of the first entry whose raw key equals `name`.
    pub fn matchups_for(&self, name: &str) -> &[MatchRecord] {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.matchups.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn parse_dataset_json(raw: &str) -> LoadResult<Dataset> {
    let root: Value = serde_json::from_str(raw.trim())?;
    let Value::Array(items) = root else {
        return Err(LoadError::NotAnArray);
    };
    if items.is_empty() {
        return Err(LoadError::Empty);
    }

    let mut dataset = Dataset::default();
    for item in &items {
        let entries = parse_entry(item, &mut dataset.report);
        dataset.entries.extend(entries);
    }
    Ok(dataset)
}

/// One top-level object: `{ subject name -> [matchup, ...], ... }`.
pub fn parse_entry(entry: &Value, report: &mut ParseReport) -> Vec<CharacterEntry> {
    let Some(obj) = entry.as_object() else {
        report.entries_skipped += 1;
        return Vec::new();
    };

    let mut out = Vec::with_capacity(obj.len());
    for (subject, list) in obj {
        // "(Title Only)" has no identity to build a node from.
        if clean_name(subject).is_empty() {
            report.entries_skipped += 1;
            continue;
        }
        let Some(matchups) = parse_matchups(subject, list, report) else {
            report.entries_skipped += 1;
            continue;
        };
        out.push(CharacterEntry {
            name: subject.clone(),
            matchups,
        });
    }
    out
}

/// `None` when `list` is not an array; individual bad items are dropped.
pub fn parse_matchups(
    subject: &str,
    list: &Value,
    report: &mut ParseReport,
) -> Option<Vec<MatchRecord>> {
    let items = list.as_array()?;
    let mut records = Vec::with_capacity(items.len());
    for item in items {
        match parse_matchup(subject, item) {
            Some(record) => {
                if !record.result.is_known() {
                    report.unknown_results += 1;
                }
                records.push(record);
            }
            None => report.matchups_skipped += 1,
        }
    }
    Some(records)
}

pub fn parse_matchup(subject: &str, item: &Value) -> Option<MatchRecord> {
    let obj = item.as_object()?;

    let structured = obj.get("opponent").is_some_and(truthy) && obj.get("result").is_some_and(truthy);
    let (raw_opponent, result, encoding) = if structured {
        let opponent = obj.get("opponent").and_then(Value::as_str)?;
        let result = obj.get("result").map(value_text).unwrap_or_default();
        (opponent.to_string(), result, MatchupEncoding::Structured)
    } else {
        let (opponent, value) = obj.iter().next()?;
        if opponent.is_empty() {
            return None;
        }
        (opponent.clone(), value_text(value), MatchupEncoding::Legacy)
    };

    let (opponent, context) = split_context(&raw_opponent);
    if opponent.is_empty() || clean_name(&raw_opponent).is_empty() {
        return None;
    }

    let (summary, manga_ref, anime_ref) = match encoding {
        MatchupEncoding::Structured => (
            text_field(obj, "summary"),
            text_field(obj, "manga"),
            text_field(obj, "anime"),
        ),
        MatchupEncoding::Legacy => (None, None, None),
    };

    Some(MatchRecord {
        subject: subject.to_string(),
        opponent,
        raw_opponent,
        result: MatchResult::parse(&result),
        context,
        summary,
        manga_ref,
        anime_ref,
        encoding,
    })
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
