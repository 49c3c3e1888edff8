//! Component build settings (`[lifecycle]`)

use serde::Deserialize;
use std::time::Duration;

use super::ConfigError;
use crate::dom::IsolationMode;
use crate::lifecycle::InitOptions;

#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleConfig {
    /// Fail a component build after this many seconds; 0 waits forever
    pub build_timeout_secs: u64,
    /// Isolation of every render root
    pub isolation: IsolationMode,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            build_timeout_secs: 30,
            isolation: IsolationMode::Closed,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FileLifecycle {
    pub build_timeout_secs: Option<u64>,
    pub isolation: Option<String>,
}

impl LifecycleConfig {
    pub fn from_file(file: Option<FileLifecycle>) -> Result<Self, ConfigError> {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        let isolation = match file.isolation {
            Some(raw) => raw
                .parse()
                .map_err(|e: String| ConfigError::invalid("lifecycle.isolation", e))?,
            None => defaults.isolation,
        };

        Ok(Self {
            build_timeout_secs: file.build_timeout_secs.unwrap_or(defaults.build_timeout_secs),
            isolation,
        })
    }

    pub fn build_timeout(&self) -> Option<Duration> {
        (self.build_timeout_secs > 0).then(|| Duration::from_secs(self.build_timeout_secs))
    }

    /// Options every view initializes its component with
    pub fn init_options(&self) -> InitOptions {
        let options = InitOptions::new(self.isolation);
        match self.build_timeout() {
            Some(timeout) => options.with_timeout(timeout),
            None => options,
        }
    }
}
