use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal dataset load failures. Anything else in the pipeline degrades silently.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("request failed: {0}")]
    Http(String),

    #[error("HTTP error! status: {status} ({url})")]
    Status { url: String, status: u16 },

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Invalid data format: top level is not an array")]
    NotAnArray,

    #[error("Invalid data format or empty data")]
    Empty,
}

pub type LoadResult<T> = std::result::Result<T, LoadError>;
