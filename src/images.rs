use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use reqwest::StatusCode;
use reqwest::Url;
use serde::Serialize;

use crate::http_client::http_client;
use crate::names::clean_name;

const AVATAR_ENDPOINT: &str = "https://ui-avatars.com/api/";
const WIKI_HOSTS: [&str; 2] = ["vignette.wikia.nocookie.net", "static.wikia.nocookie.net"];
const LOCAL_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

// Asset filenames that do not follow the plain `Clean_Name` rule.
const NAME_MAP: &[(&str, &str)] = &[
    ("Danzō Shimura", "Danzō_Shimura"),
    ("Danzo Shimura", "Danzō_Shimura"),
    ("Yugito Nii", "Yugito_Nii"),
    ("Hiruzen Sarutobi", "Hiruzen_Sarutobi"),
    ("Third Hokage Hiruzen Sarutobi", "Hiruzen_Sarutobi"),
    ("Gengetsu Hōzuki (Second Mizukage)", "Gengetsu_Hōzuki"),
    ("Gengetsu Hozuki (Second Mizukage)", "Gengetsu_Hōzuki"),
    ("Second Mizukage", "Second_Mizukage"),
    ("Rōshi (Four-Tails)", "Rōshi"),
    ("Roshi (Four-Tails)", "Rōshi"),
    ("Rōshi", "Rōshi"),
    ("Roshi", "Rōshi"),
    ("Nagato", "Nagato"),
    ("Pain (Nagato)", "Nagato"),
    ("Pain", "Nagato"),
    ("Rasa (Fourth Kazekage)", "Rasa"),
    ("Rasa", "Rasa"),
    ("Fourth Kazekage", "Rasa"),
    ("Ōnoki", "Ōnoki"),
    ("Onoki", "Ōnoki"),
    ("Neji Hyūga", "Neji_Hyūga"),
    ("Neji Hyuga", "Neji_Hyūga"),
    ("Mū (Second Tsuchikage)", "Mū"),
    ("Mu (Second Tsuchikage)", "Mū"),
    ("Mū", "Mū"),
    ("Mu", "Mū"),
    ("Mei Terumī (Fifth Mizukage)", "Mei_Terumī"),
    ("Mei Terumi (Fifth Mizukage)", "Mei_Terumī"),
    ("Fifth Mizukage", "Mei_Terumī"),
    ("Kurenai Yūhi", "Kurenai_Yūhi"),
    ("Kurenai Yuhi", "Kurenai_Yūhi"),
    ("Kidōmaru", "Kidōmaru"),
    ("Kidomaru", "Kidōmaru"),
    ("Kankurō", "Kankurō"),
    ("Kankuro", "Kankurō"),
    ("Jirōbō", "Jirōbō"),
    ("Jirobo", "Jirōbō"),
    ("Hinata Hyūga", "Hinata_Hyūga"),
    ("Hinata Hyuga", "Hinata_Hyūga"),
    ("Fū (Seven-Tails)", "Fū"),
    ("Fu (Seven-Tails)", "Fū"),
    ("Fū", "Fū"),
    ("Fu", "Fū"),
    ("Yagura Karatachi", "Yagura_Karatachi"),
    ("Fourth Raikage A", "Fourth_Raikage_A"),
    ("A (Fourth Raikage)", "Fourth_Raikage_A"),
    ("A (Third Raikage)", "A"),
    ("Third Raikage", "A"),
    ("Kaguya Ōtsutsuki", "Kaguya_Ōtsutsuki"),
    ("Kaguya Otsutsuki", "Kaguya_Ōtsutsuki"),
    ("Hanzō", "Hanzō"),
    ("Hanzo", "Hanzō"),
];

fn mapped_filename(name: &str) -> Option<&'static str> {
    NAME_MAP
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, file)| *file)
}

/// Asset stem for a character, without directory or extension.
pub fn image_filename(name: &str) -> String {
    let clean = clean_name(name);
    if let Some(file) = mapped_filename(name).or_else(|| mapped_filename(clean)) {
        return file.to_string();
    }
    clean.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Lowercase ASCII slug used by the wiki thumbnail paths.
pub fn wiki_slug(name: &str) -> String {
    let underscored = clean_name(name)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    let mut slug = String::with_capacity(underscored.len());
    for ch in underscored.chars() {
        if !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_') {
            continue;
        }
        if ch == '_' && slug.ends_with('_') {
            continue;
        }
        slug.push(ch);
    }
    slug
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ImageSource {
    Local(PathBuf),
    Remote(String),
}

impl ImageSource {
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Local(path) => path.display().to_string(),
            ImageSource::Remote(url) => url.clone(),
        }
    }
}

/// Candidate sources in preference order: local assets, wiki thumbnails, avatar service.
pub fn image_candidates(name: &str) -> Vec<ImageSource> {
    let file = image_filename(name);
    let mut out: Vec<ImageSource> = LOCAL_EXTENSIONS
        .iter()
        .map(|ext| ImageSource::Local(Path::new("img").join(format!("{file}.{ext}"))))
        .collect();

    let slug = wiki_slug(name);
    if let Some(first) = slug.chars().next() {
        for host in WIKI_HOSTS {
            out.push(ImageSource::Remote(format!(
                "https://{host}/naruto/images/thumb/{first}/{slug}/revision/latest/scale-to-width-down/200"
            )));
        }
    }

    if let Ok(url) = Url::parse_with_params(
        AVATAR_ENDPOINT,
        &[
            ("name", clean_name(name)),
            ("background", "ff6b35"),
            ("color", "fff"),
            ("size", "200"),
            ("bold", "true"),
            ("font-size", "0.4"),
        ],
    ) {
        out.push(ImageSource::Remote(url.to_string()));
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ImageAttempt {
    Found(ImageSource),
    NotFound,
}

impl ImageAttempt {
    pub fn is_found(&self) -> bool {
        matches!(self, ImageAttempt::Found(_))
    }
}

pub trait ImageProbe: Sync {
    fn exists(&self, source: &ImageSource) -> bool;
}

/// Checks local candidates on disk and, when enabled, remote ones with `HEAD`.
#[derive(Debug, Clone)]
pub struct AssetProbe {
    pub root: PathBuf,
    pub remote: bool,
}

impl AssetProbe {
    pub fn new(root: impl Into<PathBuf>, remote: bool) -> Self {
        Self {
            root: root.into(),
            remote,
        }
    }
}

impl ImageProbe for AssetProbe {
    fn exists(&self, source: &ImageSource) -> bool {
        match source {
            ImageSource::Local(path) => self.root.join(path).is_file(),
            ImageSource::Remote(url) => {
                if !self.remote {
                    return false;
                }
                let Ok(client) = http_client() else {
                    return false;
                };
                client
                    .head(url)
                    .send()
                    .map(|resp| resp.status() == StatusCode::OK)
                    .unwrap_or(false)
            }
        }
    }
}

pub fn resolve_image(name: &str, probe: &dyn ImageProbe) -> ImageAttempt {
    image_candidates(name)
        .into_iter()
        .find(|candidate| probe.exists(candidate))
        .map(ImageAttempt::Found)
        .unwrap_or(ImageAttempt::NotFound)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PreloadSummary {
    pub total: usize,
    pub found: usize,
}

/// Resolves every distinct clean name in parallel batches of `batch_size`.
///
/// `on_batch` sees each finished batch before the next one starts; returning
/// `false` stops the preload there.
pub fn preload_images<F>(
    names: &[String],
    probe: &dyn ImageProbe,
    batch_size: usize,
    mut on_batch: F,
) -> PreloadSummary
where
    F: FnMut(Vec<(String, ImageAttempt)>) -> bool,
{
    let mut seen = HashSet::new();
    let unique: Vec<&str> = names
        .iter()
        .map(|name| clean_name(name))
        .filter(|name| !name.is_empty() && seen.insert(*name))
        .collect();

    let batch_size = batch_size.max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(batch_size)
        .build()
        .ok();

    let mut summary = PreloadSummary {
        total: unique.len(),
        found: 0,
    };
    for chunk in unique.chunks(batch_size) {
        let resolve = || {
            chunk
                .par_iter()
                .map(|name| (name.to_string(), resolve_image(name, probe)))
                .collect::<Vec<_>>()
        };
        let results = match pool.as_ref() {
            Some(pool) => pool.install(resolve),
            None => resolve(),
        };
        summary.found += results.iter().filter(|(_, attempt)| attempt.is_found()).count();
        if !on_batch(results) {
            break;
        }
    }
    summary
}

/// Up to two uppercase initials for the placeholder badge.
pub fn initials(name: &str) -> String {
    clean_name(name)
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}
