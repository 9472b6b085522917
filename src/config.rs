use std::env;
use std::path::PathBuf;

pub const DEFAULT_SOURCE: &str = "matchups.json";
pub const DEFAULT_CHARACTER: &str = "Naruto Uzumaki";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub source: String,
    pub img_root: PathBuf,
    pub image_remote: bool,
    /// `None` disables the post-load selection.
    pub default_character: Option<String>,
    pub preload_batch_size: usize,
    pub http_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            img_root: PathBuf::from("."),
            image_remote: false,
            default_character: Some(DEFAULT_CHARACTER.to_string()),
            preload_batch_size: 10,
            http_timeout_secs: 10,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] over an arbitrary key source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let source = lookup("MATCHUPS_SOURCE")
            .map(|val| val.trim().to_string())
            .filter(|val| !val.is_empty())
            .unwrap_or(defaults.source);
        let img_root = lookup("MATCHUPS_IMG_ROOT")
            .map(|val| val.trim().to_string())
            .filter(|val| !val.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.img_root);
        let image_remote = lookup("MATCHUPS_IMAGE_REMOTE")
            .map(|val| parse_flag(&val))
            .unwrap_or(defaults.image_remote);
        let default_character = match lookup("MATCHUPS_DEFAULT_CHARACTER") {
            Some(val) if val.trim().is_empty() => None,
            Some(val) => Some(val.trim().to_string()),
            None => defaults.default_character,
        };
        let preload_batch_size = lookup("PRELOAD_BATCH_SIZE")
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(defaults.preload_batch_size)
            .clamp(1, 32);
        let http_timeout_secs = lookup("HTTP_TIMEOUT_SECS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(defaults.http_timeout_secs)
            .clamp(1, 120);

        Self {
            source,
            img_root,
            image_remote,
            default_character,
            preload_batch_size,
            http_timeout_secs,
        }
    }

    /// A positional argument wins over `MATCHUPS_SOURCE`.
    pub fn with_source_arg(mut self, arg: Option<String>) -> Self {
        if let Some(arg) = arg
            && !arg.trim().is_empty()
        {
            self.source = arg.trim().to_string();
        }
        self
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
