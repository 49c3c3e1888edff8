//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;

/// Escape a value for a basic TOML string
fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

impl Config {
    /// Serialize the config as a commented TOML template
    pub fn to_toml(&self) -> String {
        let asset_url = match &self.asset_url {
            Some(url) => format!("asset_url = {}", quoted(url)),
            None => "# asset_url = \"http://localhost:8080\"".to_string(),
        };

        format!(
            r#"# viki-ui configuration
#
# Environment variables override these values:
#   VIKI_APP_ROOT, VIKI_ASSET_URL, VIKI_API_URL, VIKI_BIND

# Directory holding components/ (templates and stylesheets)
app_root = {app_root}

# Fetch templates over HTTP from this base URL instead of app_root
{asset_url}

# REST API base URL
api_url = {api_url}

# Component builds
[lifecycle]
build_timeout_secs = {build_timeout}  # 0 = no timeout
isolation = "{isolation}"  # open, closed

# REST client
[http]
timeout_secs = {http_timeout}

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = "{log_level}"
# JSON file logging (in addition to stderr)
file_enabled = {log_file_enabled}
file_dir = {log_file_dir}
file_rotation = "{log_file_rotation}"  # hourly, daily, never
file_prefix = {log_file_prefix}

# Static asset server (`viki-ui serve`)
[serve]
bind_addr = "{bind}"
"#,
            app_root = quoted(&self.app_root.to_string_lossy()),
            asset_url = asset_url,
            api_url = quoted(&self.api_url),
            build_timeout = self.lifecycle.build_timeout_secs,
            isolation = self.lifecycle.isolation,
            http_timeout = self.http.timeout_secs,
            log_level = self.logging.level,
            log_file_enabled = self.logging.file_enabled,
            log_file_dir = quoted(&self.logging.file_dir.to_string_lossy()),
            log_file_rotation = self.logging.file_rotation.as_str(),
            log_file_prefix = quoted(&self.logging.file_prefix),
            bind = self.serve.bind_addr,
        )
    }
}
