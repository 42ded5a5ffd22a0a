//! Configuration structures and loading logic.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::context::DEFAULT_USER_AGENT;
use crate::classify::ScopeKind;
use crate::config::modes::UserMode;
use crate::config::validation::parse_date;
use crate::crawl::{ScopeConfig, TimeWindow};
use crate::error::{Error, Result};
use crate::ledger::store::LEDGER_FILE_NAME;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Share links or raw identifiers to process.
    #[serde(default)]
    pub link: Vec<String>,

    #[serde(default)]
    pub account: AccountConfig,

    #[serde(default)]
    pub options: OptionsConfig,

    /// Per-scope item-count limits (0 = unbounded).
    #[serde(default)]
    pub number: NumberConfig,

    /// Per-scope incremental (skip already-recorded items) switches.
    #[serde(default)]
    pub increase: IncreaseConfig,
}

/// Account credentials configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Cookie string ("name1=value1; name2=value2").
    #[serde(default)]
    pub cookie: Option<String>,

    /// Browser user agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Download options configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Base directory for downloads.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Download the item's music track.
    #[serde(default = "default_true")]
    pub music: bool,

    /// Download the video cover image.
    #[serde(default = "default_true")]
    pub cover: bool,

    /// Download the author's avatar.
    #[serde(default = "default_true")]
    pub avatar: bool,

    /// Save the metadata snapshot alongside the media.
    #[serde(default = "default_true")]
    pub json: bool,

    /// One subdirectory per item (false = flat author directory).
    #[serde(default = "default_true")]
    pub folderstyle: bool,

    /// Profile enumeration modes.
    #[serde(default = "default_modes")]
    pub mode: Vec<UserMode>,

    /// Download worker pool width.
    #[serde(default = "default_thread")]
    pub thread: usize,

    /// Keep the acquisition ledger (required for incremental mode).
    #[serde(default = "default_true")]
    pub database: bool,

    /// Inclusive lower bound on item creation date (YYYY-MM-DD).
    #[serde(default)]
    pub start_time: Option<String>,

    /// Inclusive upper bound on item creation date (YYYY-MM-DD).
    #[serde(default)]
    pub end_time: Option<String>,

    /// Metadata request rate cap.
    #[serde(default = "default_rate")]
    pub max_per_second: f64,

    /// Retry budget for metadata fetches and downloads.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Show download progress bars.
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            path: None,
            music: true,
            cover: true,
            avatar: true,
            json: true,
            folderstyle: true,
            mode: default_modes(),
            thread: default_thread(),
            database: true,
            start_time: None,
            end_time: None,
            max_per_second: default_rate(),
            retries: default_retries(),
            show_progress: true,
        }
    }
}

/// Per-scope item-count limits. Zero means unbounded.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NumberConfig {
    #[serde(default)]
    pub post: u64,
    #[serde(default)]
    pub like: u64,
    /// How many of a user's collections to enumerate in mix mode.
    #[serde(default)]
    pub allmix: u64,
    #[serde(default)]
    pub mix: u64,
    #[serde(default)]
    pub music: u64,
}

/// Per-scope incremental switches.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IncreaseConfig {
    #[serde(default)]
    pub post: bool,
    #[serde(default)]
    pub like: bool,
    #[serde(default)]
    pub mix: bool,
    #[serde(default)]
    pub music: bool,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_true() -> bool {
    true
}

fn default_modes() -> Vec<UserMode> {
    vec![UserMode::Post]
}

fn default_thread() -> usize {
    5
}

fn default_rate() -> f64 {
    2.0
}

fn default_retries() -> u32 {
    3
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            cookie: None,
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}. Create one from config.example.toml",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Effective download root.
    pub fn download_root(&self) -> PathBuf {
        self.options
            .path
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    /// Ledger file location under the download root.
    pub fn ledger_path(&self) -> PathBuf {
        self.download_root().join(LEDGER_FILE_NAME)
    }

    /// The creation-date window, already validated.
    pub fn time_window(&self) -> TimeWindow {
        TimeWindow {
            start: self
                .options
                .start_time
                .as_deref()
                .and_then(|s| parse_date(s).ok()),
            end: self
                .options
                .end_time
                .as_deref()
                .and_then(|s| parse_date(s).ok()),
        }
    }

    /// Enumeration settings for one scope.
    pub fn scope_config(&self, scope: ScopeKind, mode: Option<UserMode>) -> ScopeConfig {
        let (max_items, incremental) = match (scope, mode) {
            (ScopeKind::User, Some(UserMode::Like)) => (self.number.like, self.increase.like),
            (ScopeKind::User, _) => (self.number.post, self.increase.post),
            (ScopeKind::Collection, _) => (self.number.mix, self.increase.mix),
            (ScopeKind::MusicTrack, _) => (self.number.music, self.increase.music),
            _ => (0, false),
        };
        ScopeConfig {
            max_items,
            incremental: incremental && self.options.database,
            time_window: self.time_window(),
        }
    }
}
