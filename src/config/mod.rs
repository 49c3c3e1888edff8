//! Application configuration
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/viki-ui/config.toml)
//! 3. Built-in defaults (lowest priority)

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod components;
mod network;
mod observability;
mod serialization;

#[cfg(test)]
mod tests;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports
// ─────────────────────────────────────────────────────────────────────────────

pub use components::{FileLifecycle, LifecycleConfig};
pub use network::{FileHttp, FileServe, HttpConfig, ServeConfig};
pub use observability::{FileLogging, LogRotation, LoggingConfig};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_API_URL: &str = "http://localhost:8000";

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// A value that was read but cannot be used
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: {message}")]
    Invalid { key: &'static str, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: &'static str, message: impl ToString) -> Self {
        Self::Invalid {
            key,
            message: message.to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding `components/`; also the root served by `serve`
    pub app_root: PathBuf,

    /// Base URL templates are fetched from. When unset, templates are read
    /// from `app_root` on disk.
    pub asset_url: Option<String>,

    /// Base URL of the REST API
    pub api_url: String,

    /// Component build settings
    pub lifecycle: LifecycleConfig,

    /// REST client settings
    pub http: HttpConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Static asset server settings
    pub serve: ServeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_root: PathBuf::from("."),
            asset_url: None,
            api_url: DEFAULT_API_URL.to_string(),
            lifecycle: LifecycleConfig::default(),
            http: HttpConfig::default(),
            logging: LoggingConfig::default(),
            serve: ServeConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub app_root: Option<String>,
    pub asset_url: Option<String>,
    pub api_url: Option<String>,

    /// Optional [lifecycle] section
    pub lifecycle: Option<FileLifecycle>,

    /// Optional [http] section
    pub http: Option<FileHttp>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,

    /// Optional [serve] section
    pub serve: Option<FileServe>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

fn non_empty(value: String) -> Option<String> {
    let value = value.trim().to_string();
    (!value.is_empty()).then_some(value)
}

/// Absolute http(s) URL with a host
fn is_http_url(url: &str) -> bool {
    reqwest::Url::parse(url)
        .is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
}

impl Config {
    /// Get the config file path: ~/.config/viki-ui/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("viki-ui").join("config.toml"))
    }

    /// Create config file with defaults if it doesn't exist
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };
        if path.exists() {
            return;
        }
        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // config is optional
            }
        }
        let _ = std::fs::write(&path, Self::default().to_toml());
    }

    /// Load file config if it exists
    ///
    /// # Panics
    /// Never; an unreadable or invalid file ends the process with a
    /// message naming the file.
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("\n╔══════════════════════════════════════════════════════════════╗");
                    eprintln!("║  CONFIG ERROR - Failed to parse configuration file          ║");
                    eprintln!("╚══════════════════════════════════════════════════════════════╝\n");
                    eprintln!("  File: {}\n", path.display());
                    eprintln!("  Error: {}\n", e);
                    eprintln!("  Tip: Check for:\n");
                    eprintln!("    - Missing quotes around string values");
                    eprintln!("    - Invalid boolean values (use true/false)");
                    eprintln!("    - Typos in section or key names\n");
                    eprintln!("  To reset, run `viki-ui config --reset`.\n");
                    std::process::exit(1);
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FileConfig::default(),
            Err(e) => {
                eprintln!("\n╔══════════════════════════════════════════════════════════════╗");
                eprintln!("║  CONFIG ERROR - Cannot read configuration file              ║");
                eprintln!("╚══════════════════════════════════════════════════════════════╝\n");
                eprintln!("  File: {}\n", path.display());
                eprintln!("  Error: {}\n", e);
                std::process::exit(1);
            }
        }
    }

    /// Load configuration: env vars > file > defaults
    pub fn from_env() -> Self {
        let file = Self::load_file_config();
        match Self::resolve(file, |key| std::env::var(key).ok()) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("\n╔══════════════════════════════════════════════════════════════╗");
                eprintln!("║  CONFIG ERROR - Invalid configuration value                 ║");
                eprintln!("╚══════════════════════════════════════════════════════════════╝\n");
                eprintln!("  Error: {}\n", e);
                std::process::exit(1);
            }
        }
    }

    /// Merge a parsed file with environment lookups
    pub(crate) fn resolve(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        // App root: env > file > default
        let app_root = env("VIKI_APP_ROOT")
            .and_then(non_empty)
            .or(file.app_root)
            .map(PathBuf::from)
            .unwrap_or(defaults.app_root);

        // Asset URL: env > file > unset (read from app_root)
        let asset_url = env("VIKI_ASSET_URL")
            .and_then(non_empty)
            .or(file.asset_url.and_then(non_empty));

        // API URL: env > file > default
        let api_url = env("VIKI_API_URL")
            .and_then(non_empty)
            .or(file.api_url)
            .unwrap_or(defaults.api_url);

        for (key, url) in [("api_url", Some(&api_url)), ("asset_url", asset_url.as_ref())] {
            if let Some(url) = url {
                if !is_http_url(url) {
                    return Err(ConfigError::invalid(key, format!("not an http(s) URL: {}", url)));
                }
            }
        }

        let lifecycle = LifecycleConfig::from_file(file.lifecycle)?;
        let http = HttpConfig::from_file(file.http);
        let logging = LoggingConfig::from_file(file.logging);
        let serve = ServeConfig::from_file(file.serve, env("VIKI_BIND").and_then(non_empty))?;

        Ok(Self {
            app_root,
            asset_url,
            api_url,
            lifecycle,
            http,
            logging,
            serve,
        })
    }
}
