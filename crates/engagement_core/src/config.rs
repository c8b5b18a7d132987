//! Engagement configuration.
//!
//! # Responsibility
//! - Load per-kind active limits, inbox paging bounds, logging and storage
//!   settings from TOML.
//! - Apply environment overrides on top of file values.
//!
//! # Invariants
//! - Every joinable kind has a limit greater than zero.
//! - `inbox.default_limit <= inbox.max_limit`.
//! - Log rotation keeps at least one file of at least one megabyte.

use crate::model::kind::ShareableKind;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_ACTIVE_LIMIT: u32 = 3;
const DEFAULT_INBOX_LIMIT: u32 = 20;
const MAX_INBOX_LIMIT: u32 = 100;
const DEFAULT_LOG_FILE_MB: u64 = 10;
const DEFAULT_LOG_KEEP_FILES: usize = 5;

/// Configuration load and validation failures.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config syntax: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    pub limits: ActiveLimits,
    pub inbox: InboxConfig,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
}

/// Maximum simultaneously active join edges per joinable kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActiveLimits {
    pub goal: u32,
    pub challenge: u32,
    pub habit: u32,
}

impl Default for ActiveLimits {
    fn default() -> Self {
        Self {
            goal: DEFAULT_ACTIVE_LIMIT,
            challenge: DEFAULT_ACTIVE_LIMIT,
            habit: DEFAULT_ACTIVE_LIMIT,
        }
    }
}

impl ActiveLimits {
    /// Same limit for every joinable kind.
    pub fn uniform(limit: u32) -> Self {
        Self {
            goal: limit,
            challenge: limit,
            habit: limit,
        }
    }

    /// Returns the limit for a joinable kind, `None` otherwise.
    pub fn limit_for(&self, kind: ShareableKind) -> Option<u32> {
        match kind {
            ShareableKind::Goal => Some(self.goal),
            ShareableKind::Challenge => Some(self.challenge),
            ShareableKind::Habit => Some(self.habit),
            ShareableKind::Plan | ShareableKind::Survey | ShareableKind::Content => None,
        }
    }
}

/// Paging bounds for the pending inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboxConfig {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_INBOX_LIMIT,
            max_limit: MAX_INBOX_LIMIT,
        }
    }
}

impl InboxConfig {
    /// Maps a requested page size to the effective one.
    pub fn normalize_limit(&self, limit: Option<u32>) -> u32 {
        match limit {
            None | Some(0) => self.default_limit,
            Some(value) => value.min(self.max_limit),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace|debug|info|warn|error`. Defaults per build mode when unset.
    pub level: Option<String>,
    /// Absolute directory for rolling log files. File logging is off when unset.
    pub dir: Option<String>,
    /// Size at which the active log file rotates.
    pub max_file_mb: u64,
    /// Rotated files kept on disk.
    pub keep_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            dir: None,
            max_file_mb: DEFAULT_LOG_FILE_MB,
            keep_files: DEFAULT_LOG_KEEP_FILES,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file. An in-memory database is used when unset.
    pub db_path: Option<PathBuf>,
}

impl EngagementConfig {
    /// Reads and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `ENGAGEMENT_*` environment overrides and re-validates.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        for (name, slot) in [
            ("ENGAGEMENT_LIMIT_GOAL", &mut self.limits.goal),
            ("ENGAGEMENT_LIMIT_CHALLENGE", &mut self.limits.challenge),
            ("ENGAGEMENT_LIMIT_HABIT", &mut self.limits.habit),
        ] {
            if let Some(raw) = lookup(name) {
                *slot = raw.trim().parse().map_err(|_| {
                    ConfigError::Invalid(format!("{name} must be a positive integer, got `{raw}`"))
                })?;
            }
        }
        if let Some(path) = lookup("ENGAGEMENT_DB_PATH") {
            self.storage.db_path = Some(PathBuf::from(path));
        }
        if let Some(level) = lookup("ENGAGEMENT_LOG_LEVEL") {
            self.logging.level = Some(level);
        }
        if let Some(dir) = lookup("ENGAGEMENT_LOG_DIR") {
            self.logging.dir = Some(dir);
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for kind in ShareableKind::JOINABLE {
            if self.limits.limit_for(kind) == Some(0) {
                return Err(ConfigError::Invalid(format!(
                    "limits.{kind} must be greater than zero"
                )));
            }
        }
        if self.inbox.default_limit == 0 || self.inbox.default_limit > self.inbox.max_limit {
            return Err(ConfigError::Invalid(format!(
                "inbox.default_limit ({}) must be within 1..={}",
                self.inbox.default_limit, self.inbox.max_limit
            )));
        }
        if self.logging.max_file_mb == 0 || self.logging.keep_files == 0 {
            return Err(ConfigError::Invalid(
                "logging.max_file_mb and logging.keep_files must be greater than zero"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
