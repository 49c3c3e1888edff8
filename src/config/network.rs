//! REST client (`[http]`) and asset server (`[serve]`) settings

use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

use super::ConfigError;
use crate::api::DEFAULT_TIMEOUT;

// ─────────────────────────────────────────────────────────────────────────────
// HTTP client
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct HttpConfig {
    /// Per-request timeout of the REST client
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FileHttp {
    pub timeout_secs: Option<u64>,
}

impl HttpConfig {
    pub fn from_file(file: Option<FileHttp>) -> Self {
        let file = file.unwrap_or_default();
        Self {
            timeout_secs: file
                .timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(Self::default().timeout_secs),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Asset server
// ─────────────────────────────────────────────────────────────────────────────

const DEFAULT_BIND: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq)]
pub struct ServeConfig {
    pub bind_addr: SocketAddr,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FileServe {
    pub bind_addr: Option<String>,
}

impl ServeConfig {
    /// Bind address: env > file > default
    pub fn from_file(file: Option<FileServe>, env_bind: Option<String>) -> Result<Self, ConfigError> {
        let raw = env_bind
            .or(file.unwrap_or_default().bind_addr)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = raw
            .parse()
            .map_err(|e| ConfigError::invalid("serve.bind_addr", format!("{} ({})", raw, e)))?;
        Ok(Self { bind_addr })
    }
}
