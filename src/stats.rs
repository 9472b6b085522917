use std::collections::HashMap;

use serde::Serialize;

use crate::matchup::{MatchRecord, MatchResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CharacterStats {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub total: u32,
}

impl CharacterStats {
    pub fn record(&mut self, result: &MatchResult) {
        match result {
            MatchResult::Win => self.wins += 1,
            MatchResult::Lose => self.losses += 1,
            MatchResult::Draw => self.draws += 1,
            MatchResult::Unknown(_) => return,
        }
        self.total += 1;
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a MatchRecord>) -> Self {
        let mut stats = Self::default();
        for record in records {
            stats.record(&record.result);
        }
        stats
    }

    /// Percentage of wins with one decimal, `"0"` when there are no fights.
    pub fn win_percentage(&self) -> String {
        if self.total == 0 {
            return "0".to_string();
        }
        format!("{:.1}", f64::from(self.wins) / f64::from(self.total) * 100.0)
    }
}

/// Per-character tallies keyed by the raw subject string.
///
/// Unlike graph nodes, titles are not merged here: "Hiruzen Sarutobi" and
/// "Third Hokage Hiruzen Sarutobi" keep separate rows.
pub fn aggregate<'a>(records: impl IntoIterator<Item = &'a MatchRecord>) -> HashMap<String, CharacterStats> {
    let mut stats: HashMap<String, CharacterStats> = HashMap::new();
    for record in records {
        stats
            .entry(record.subject.clone())
            .or_default()
            .record(&record.result);
    }
    stats
}

pub fn stats_for(stats: &HashMap<String, CharacterStats>, name: &str) -> CharacterStats {
    stats.get(name).copied().unwrap_or_default()
}
