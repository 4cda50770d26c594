//! Error taxonomy.
//!
//! Per-posting problems are recoverable (skip + continue); config and state
//! problems are fatal for the run and propagate to the caller. Nothing is
//! ever swallowed into a default score.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal at startup: the scoring vocabularies/thresholds are unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("missing required scoring vocabulary: {0}")]
    MissingVocabulary(&'static str),
    #[error("invalid tier thresholds: {0}")]
    InvalidThresholds(String),
    #[error("digest_window_mins must be below 60, got {0}")]
    InvalidDigestWindow(u32),
}

/// Fatal for the run: the persisted snapshot could not be trusted.
///
/// A corrupt snapshot must never be silently replaced by an empty one —
/// that would re-alert every posting in history.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("reading state snapshot at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("state snapshot at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("writing state snapshot at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Recoverable, per-posting: recorded as a batch fault, never aborts a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PostingFault {
    #[error("posting has no title (url: {url})")]
    MissingTitle { url: String },
}
