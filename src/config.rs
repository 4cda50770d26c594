//! Monitor configuration: scoring vocabularies, tier thresholds, route
//! map, sources, and persistence paths, loaded from one TOML file.
//!
//! The path can be overridden with `JOB_RADAR_CONFIG`. All content here is
//! policy — the engine receives it as read-only values and hardcodes none
//! of it. Missing mandatory vocabulary is fatal at startup, before any
//! posting is processed.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::scoring::ScoringConfig;
use crate::tier::{RouteMap, TierThresholds};

pub const DEFAULT_CONFIG_PATH: &str = "config/job_radar.toml";
pub const ENV_CONFIG_PATH: &str = "JOB_RADAR_CONFIG";

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Where the dedup snapshot lives.
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
    /// Drop postings that look older than this many days. `None` disables
    /// the freshness filter.
    #[serde(default)]
    pub max_posting_age_days: Option<u32>,
    /// Local hour at which the queued digest is flushed (continuous mode).
    #[serde(default = "default_digest_hour")]
    pub digest_hour: u32,
    /// Minutes past `digest_hour` during which a flush still counts as due.
    #[serde(default = "default_digest_window_mins")]
    pub digest_window_mins: u32,

    pub scoring: ScoringConfig,
    pub thresholds: TierThresholds,
    pub routes: RouteMap,

    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

/// One employer career page to poll.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub kind: SourceKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Generic career page scraped from HTML.
    #[default]
    Html,
    /// Greenhouse-style JSON board API.
    Greenhouse,
}

fn default_state_path() -> PathBuf {
    PathBuf::from("state/job_state.json")
}

fn default_digest_hour() -> u32 {
    9
}

fn default_digest_window_mins() -> u32 {
    30
}

impl MonitorConfig {
    /// Load and validate from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let cfg: MonitorConfig = toml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load using `$JOB_RADAR_CONFIG`, falling back to the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&path)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate()?;
        self.thresholds
            .validate()
            .map_err(ConfigError::InvalidThresholds)?;
        // The send window lives inside a single hour; a wider window would
        // silently truncate at minute 59.
        if self.digest_window_mins >= 60 {
            return Err(ConfigError::InvalidDigestWindow(self.digest_window_mins));
        }
        Ok(())
    }
}
