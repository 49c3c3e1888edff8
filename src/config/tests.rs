//! Configuration tests
//!
//! `to_toml()` output must parse back into the same values, and every key
//! of [`FileConfig`] must appear in the template.

use super::*;
use crate::dom::IsolationMode;
use std::collections::HashMap;
use std::time::Duration;

fn no_env(_: &str) -> Option<String> {
    None
}

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

fn parse(toml_str: &str) -> FileConfig {
    toml::from_str(toml_str).unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Round-trip tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_roundtrip_default() {
    let config = Config::default();
    let toml_str = config.to_toml();

    let parsed: Result<FileConfig, _> = toml::from_str(&toml_str);
    assert!(
        parsed.is_ok(),
        "Default config should round-trip.\nTOML:\n{}\nError: {:?}",
        toml_str,
        parsed.err()
    );

    let resolved = Config::resolve(parsed.unwrap(), no_env).unwrap();
    assert_eq!(resolved.app_root, config.app_root);
    assert_eq!(resolved.asset_url, None);
    assert_eq!(resolved.api_url, config.api_url);
    assert_eq!(resolved.lifecycle, config.lifecycle);
    assert_eq!(resolved.http, config.http);
    assert_eq!(resolved.serve, config.serve);
    assert_eq!(resolved.logging.file_prefix, "viki-ui");
}

#[test]
fn test_config_roundtrip_custom_values() {
    let mut config = Config::default();
    config.app_root = PathBuf::from(r"C:\apps\viki");
    config.asset_url = Some("https://cdn.example.com/ui".to_string());
    config.lifecycle.build_timeout_secs = 0;
    config.lifecycle.isolation = IsolationMode::Open;
    config.http.timeout_secs = 5;
    config.logging.file_enabled = true;
    config.logging.file_rotation = LogRotation::Hourly;
    config.serve.bind_addr = "0.0.0.0:9000".parse().unwrap();

    let resolved = Config::resolve(parse(&config.to_toml()), no_env).unwrap();
    assert_eq!(resolved.app_root, PathBuf::from(r"C:\apps\viki"));
    assert_eq!(resolved.asset_url.as_deref(), Some("https://cdn.example.com/ui"));
    assert_eq!(resolved.lifecycle.build_timeout(), None);
    assert_eq!(resolved.lifecycle.isolation, IsolationMode::Open);
    assert_eq!(resolved.http.timeout(), Duration::from_secs(5));
    assert!(resolved.logging.file_enabled);
    assert_eq!(resolved.logging.file_rotation, LogRotation::Hourly);
    assert_eq!(resolved.serve.bind_addr.port(), 9000);
}

/// Every file key must be documented in the template
#[test]
fn test_template_documents_all_keys() {
    let FileConfig {
        app_root: _,
        asset_url: _,
        api_url: _,
        lifecycle: _,
        http: _,
        logging: _,
        serve: _,
    } = FileConfig::default();

    let template = Config::default().to_toml();
    for key in [
        "app_root =",
        "asset_url =",
        "api_url =",
        "[lifecycle]",
        "build_timeout_secs =",
        "isolation =",
        "[http]",
        "timeout_secs =",
        "[logging]",
        "level =",
        "file_enabled =",
        "file_dir =",
        "file_rotation =",
        "file_prefix =",
        "[serve]",
        "bind_addr =",
    ] {
        assert!(template.contains(key), "template is missing {}", key);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Precedence
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_env_overrides_file() {
    let file = parse(
        r#"
        api_url = "http://file:8000"
        app_root = "/srv/file"
        [serve]
        bind_addr = "127.0.0.1:7000"
        "#,
    );
    let env = env_of(&[
        ("VIKI_API_URL", "http://env:8000"),
        ("VIKI_BIND", "0.0.0.0:7100"),
        ("VIKI_ASSET_URL", "http://assets:8080"),
    ]);
    let config = Config::resolve(file, env).unwrap();
    assert_eq!(config.api_url, "http://env:8000");
    assert_eq!(config.app_root, PathBuf::from("/srv/file"));
    assert_eq!(config.serve.bind_addr.port(), 7100);
    assert_eq!(config.asset_url.as_deref(), Some("http://assets:8080"));
}

#[test]
fn test_blank_env_is_ignored() {
    let file = parse(r#"api_url = "http://file:8000""#);
    let config = Config::resolve(file, env_of(&[("VIKI_API_URL", "  ")])).unwrap();
    assert_eq!(config.api_url, "http://file:8000");
}

#[test]
fn test_defaults_without_file() {
    let config = Config::resolve(FileConfig::default(), no_env).unwrap();
    assert_eq!(config.api_url, "http://localhost:8000");
    assert_eq!(config.lifecycle.build_timeout(), Some(Duration::from_secs(30)));
    assert_eq!(config.http.timeout(), crate::api::DEFAULT_TIMEOUT);
    assert_eq!(config.logging.level, "info");

    let options = config.lifecycle.init_options();
    assert_eq!(options.isolation, IsolationMode::Closed);
    assert_eq!(options.timeout, Some(Duration::from_secs(30)));
}

// ─────────────────────────────────────────────────────────────────────────────
// Validation
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_invalid_values_are_errors() {
    let err = Config::resolve(parse("[lifecycle]\nisolation = \"sealed\""), no_env).unwrap_err();
    assert!(err.to_string().starts_with("lifecycle.isolation"));

    let err = Config::resolve(FileConfig::default(), env_of(&[("VIKI_BIND", "nowhere")])).unwrap_err();
    assert!(err.to_string().contains("nowhere"));

    let err = Config::resolve(parse(r#"api_url = "localhost:8000""#), no_env).unwrap_err();
    assert_eq!(
        err,
        ConfigError::Invalid {
            key: "api_url",
            message: "not an http(s) URL: localhost:8000".to_string()
        }
    );
}

#[test]
fn test_urls_need_scheme_and_host() {
    for bad in ["http://", "http://bad host", "ftp://files.local", "localhost:8000"] {
        let err = Config::resolve(FileConfig::default(), env_of(&[("VIKI_API_URL", bad)])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "api_url",
                message: format!("not an http(s) URL: {}", bad)
            },
            "{}",
            bad
        );
        let err = Config::resolve(FileConfig::default(), env_of(&[("VIKI_ASSET_URL", bad)])).unwrap_err();
        assert!(err.to_string().starts_with("asset_url"), "{}", err);
    }

    let config = Config::resolve(
        FileConfig::default(),
        env_of(&[("VIKI_API_URL", "https://api.example.com:9000/v1"), ("VIKI_ASSET_URL", "http://127.0.0.1:8080")]),
    )
    .unwrap();
    assert_eq!(config.api_url, "https://api.example.com:9000/v1");
}

#[test]
fn test_unknown_keys_rejected() {
    assert!(toml::from_str::<FileConfig>("theme = \"dark\"").is_err());
    assert!(toml::from_str::<FileConfig>("[logging]\nlevle = \"debug\"").is_err());
}

#[test]
fn test_log_rotation_parsing() {
    assert_eq!(LogRotation::from_str("HOURLY"), LogRotation::Hourly);
    assert_eq!(LogRotation::from_str("never"), LogRotation::Never);
    assert_eq!(LogRotation::from_str("weekly"), LogRotation::Daily);
}
