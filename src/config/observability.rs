//! `[logging]` section: stderr filter level plus the optional JSON log file
//! that `viki-ui serve` and `viki-ui render` append to

use serde::Deserialize;
use std::path::PathBuf;

/// How often a new JSON log file is started under `file_dir`
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LogRotation {
    /// `<prefix>.YYYY-MM-DD-HH`
    Hourly,
    /// `<prefix>.YYYY-MM-DD`
    #[default]
    Daily,
    /// A single `<prefix>` file
    Never,
}

impl LogRotation {
    /// Unknown values fall back to daily
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "hourly" => Self::Hourly,
            "never" => Self::Never,
            _ => Self::Daily,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Never => "never",
        }
    }
}

/// Resolved `[logging]` settings
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level for the `viki_ui` target when RUST_LOG is unset
    pub level: String,
    /// Also write JSON lines to a file under `file_dir`
    pub file_enabled: bool,
    /// Created on startup if missing
    pub file_dir: PathBuf,
    pub file_rotation: LogRotation,
    /// File name stem; with daily rotation `viki-ui` gives `viki-ui.2026-10-19`
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_enabled: false,
            file_dir: PathBuf::from("./logs"),
            file_rotation: LogRotation::Daily,
            file_prefix: "viki-ui".to_string(),
        }
    }
}

/// `[logging]` as written in config.toml; every key optional
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FileLogging {
    pub level: Option<String>,
    pub file_enabled: Option<bool>,
    pub file_dir: Option<String>,
    pub file_rotation: Option<String>,
    pub file_prefix: Option<String>,
}

impl LoggingConfig {
    pub fn from_file(file: Option<FileLogging>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            level: file.level.unwrap_or(defaults.level),
            file_enabled: file.file_enabled.unwrap_or(defaults.file_enabled),
            file_dir: file
                .file_dir
                .map(PathBuf::from)
                .unwrap_or(defaults.file_dir),
            file_rotation: file
                .file_rotation
                .map(|s| LogRotation::from_str(&s))
                .unwrap_or(defaults.file_rotation),
            file_prefix: file.file_prefix.unwrap_or(defaults.file_prefix),
        }
    }
}
