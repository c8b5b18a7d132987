//! File logging driven by the `[logging]` config section.
//!
//! # Responsibility
//! - Resolve [`LoggingConfig`] into concrete file-logging settings.
//! - Install one size-rotated `flexi_logger` file sink per process.
//!
//! # Invariants
//! - File logging stays off while `logging.dir` is unset.
//! - The sink is installed at most once; a later init must resolve to the
//!   same settings or it fails with [`LoggingError::Conflict`].
//! - Events are `key=value` lines carrying identifiers only.

use crate::config::LoggingConfig;
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::info;
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const LOG_FILE_BASENAME: &str = "engagement";
const BYTES_PER_MB: u64 = 1024 * 1024;

static ACTIVE_SINK: OnceCell<(LogSettings, LoggerHandle)> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// `debug` for debug builds, `info` for release builds.
    pub fn build_default() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Info
        }
    }
}

impl FromStr for LogLevel {
    type Err = LoggingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(LoggingError::InvalidLevel(value.to_string())),
        }
    }
}

/// Resolved file-sink settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LogLevel,
    pub dir: PathBuf,
    pub max_file_bytes: u64,
    pub keep_files: usize,
}

impl LogSettings {
    /// Resolves the config section. `Ok(None)` means file logging is off.
    pub fn from_config(config: &LoggingConfig) -> Result<Option<Self>, LoggingError> {
        let Some(raw_dir) = config.dir.as_deref() else {
            return Ok(None);
        };
        let dir = absolute_dir(raw_dir)?;
        let level = match config.level.as_deref() {
            Some(raw) => raw.parse::<LogLevel>()?,
            None => LogLevel::build_default(),
        };
        Ok(Some(Self {
            level,
            dir,
            max_file_bytes: config.max_file_mb.saturating_mul(BYTES_PER_MB),
            keep_files: config.keep_files,
        }))
    }
}

impl Display for LogSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "level={} dir={} max_file_bytes={} keep_files={}",
            self.level.as_str(),
            self.dir.display(),
            self.max_file_bytes,
            self.keep_files
        )
    }
}

#[derive(Debug)]
pub enum LoggingError {
    InvalidLevel(String),
    InvalidDir(String),
    Conflict {
        active: LogSettings,
        requested: LogSettings,
    },
    Backend(String),
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLevel(value) => write!(
                f,
                "unsupported log level `{value}`; expected trace|debug|info|warn|error"
            ),
            Self::InvalidDir(message) => write!(f, "invalid log directory: {message}"),
            Self::Conflict { active, requested } => write!(
                f,
                "logging already active with {active}; refusing to switch to {requested}"
            ),
            Self::Backend(message) => write!(f, "failed to start logger: {message}"),
        }
    }
}

impl Error for LoggingError {}

/// Installs the file sink described by `config`.
///
/// Returns the active settings, or `Ok(None)` when `config.dir` is unset.
/// Repeating the call with equivalent config is a no-op.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<LogSettings>, LoggingError> {
    let Some(requested) = LogSettings::from_config(config)? else {
        return Ok(None);
    };

    let (active, _) = ACTIVE_SINK.get_or_try_init(|| {
        start_file_sink(&requested).map(|handle| (requested.clone(), handle))
    })?;
    if *active != requested {
        return Err(LoggingError::Conflict {
            active: active.clone(),
            requested,
        });
    }
    Ok(Some(requested))
}

/// Settings of the installed sink, if any.
pub fn logging_status() -> Option<LogSettings> {
    ACTIVE_SINK.get().map(|(settings, _)| settings.clone())
}

fn start_file_sink(settings: &LogSettings) -> Result<LoggerHandle, LoggingError> {
    std::fs::create_dir_all(&settings.dir).map_err(|err| {
        LoggingError::InvalidDir(format!("cannot create `{}`: {err}", settings.dir.display()))
    })?;

    let handle = Logger::try_with_str(settings.level.as_str())
        .map_err(|err| LoggingError::Backend(err.to_string()))?
        .log_to_file(
            FileSpec::default()
                .directory(settings.dir.as_path())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(settings.max_file_bytes),
            Naming::Numbers,
            Cleanup::KeepLogFiles(settings.keep_files),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| LoggingError::Backend(err.to_string()))?;

    info!(
        "event=logging_init module=logging status=ok {settings} version={}",
        env!("CARGO_PKG_VERSION")
    );
    Ok(handle)
}

fn absolute_dir(raw: &str) -> Result<PathBuf, LoggingError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LoggingError::InvalidDir("path is blank".to_string()));
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(LoggingError::InvalidDir(format!("`{trimmed}` is not absolute")));
    }
    Ok(path.to_path_buf())
}
