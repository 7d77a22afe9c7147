//! Unit tests for settings resolution and graceful degradation
//!
//! Tests cover:
//! - Missing TOML files do not abort resolution
//! - Priority order CLI → ENV → TOML → defaults
//! - Malformed values fall back to the next tier
//! - Config file warnings reach the installed subscriber
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate FAIR_* variables are marked with #[serial].

use fair_common::config::{Settings, SettingsResolver, TomlConfig, CONFIG_ENV_VAR};
use serial_test::serial;
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing_subscriber::fmt::MakeWriter;

const VARS: &[&str] = &[
    CONFIG_ENV_VAR,
    "FAIR_BIND",
    "FAIR_HOST_URL",
    "FAIR_HARVESTER_URL",
    "FAIR_HTTP_TIMEOUT_SECS",
    "FAIR_CORS_ENABLED",
    "FAIR_LOG_LEVEL",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
#[serial]
fn test_missing_config_file_uses_defaults() {
    clear_env();

    let settings = SettingsResolver::new()
        .with_config_path(Some(PathBuf::from("/nonexistent/fair/config.toml")))
        .resolve();

    assert_eq!(settings, Settings::default());
}

#[test]
#[serial]
fn test_toml_overrides_defaults() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
        host_url = "https://fair.example.org"
        harvester_timeout_secs = 5
        cors_enabled = false
        "#,
    );

    let settings = SettingsResolver::new().with_config_path(Some(path)).resolve();

    assert_eq!(settings.host_url, "https://fair.example.org");
    assert_eq!(settings.harvester_timeout_secs, 5);
    assert!(!settings.cors_enabled);
    // Untouched keys keep their compiled defaults
    assert_eq!(settings.http_timeout_secs, Settings::default().http_timeout_secs);
}

#[test]
#[serial]
fn test_env_overrides_toml() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "harvester_url = \"http://toml.example/harvester\"\n");

    env::set_var("FAIR_HARVESTER_URL", "http://env.example/harvester");
    let settings = SettingsResolver::new().with_config_path(Some(path)).resolve();
    clear_env();

    assert_eq!(settings.harvester_url, "http://env.example/harvester");
}

#[test]
#[serial]
fn test_cli_bind_overrides_env() {
    clear_env();
    env::set_var("FAIR_BIND", "0.0.0.0:9999");

    let settings = SettingsResolver::new()
        .with_bind(Some("127.0.0.1:8080".to_string()))
        .resolve();
    clear_env();

    assert_eq!(settings.bind, "127.0.0.1:8080");
}

#[test]
#[serial]
fn test_config_path_from_env() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[logging]\nlevel = \"debug\"\n");

    env::set_var(CONFIG_ENV_VAR, &path);
    let settings = SettingsResolver::new().resolve();
    clear_env();

    assert_eq!(settings.logging.level, "debug");
}

#[test]
#[serial]
fn test_invalid_env_number_falls_back() {
    clear_env();
    env::set_var("FAIR_HTTP_TIMEOUT_SECS", "soon");

    let settings = SettingsResolver::new()
        .with_config_path(Some(PathBuf::from("/nonexistent/config.toml")))
        .resolve();
    clear_env();

    assert_eq!(settings.http_timeout_secs, 30);
}

#[test]
#[serial]
fn test_malformed_toml_is_not_fatal() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "host_url = [this is not toml");

    assert!(TomlConfig::load(&path).is_err());

    let settings = SettingsResolver::new().with_config_path(Some(path)).resolve();
    assert_eq!(settings.host_url, Settings::default().host_url);
}

/// In-memory log sink for a scoped subscriber
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn resolve_with_captured_logs(resolver: SettingsResolver) -> (Settings, String) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let settings = tracing::subscriber::with_default(subscriber, || resolver.resolve());
    (settings, logs.contents())
}

#[test]
#[serial]
fn test_missing_config_file_warning_is_logged() {
    clear_env();

    let (settings, logs) = resolve_with_captured_logs(
        SettingsResolver::new()
            .with_config_path(Some(PathBuf::from("/nonexistent/fair/config.toml"))),
    );

    assert_eq!(settings, Settings::default());
    assert!(logs.contains("WARN"));
    assert!(logs.contains("Could not load config file /nonexistent/fair/config.toml"));
}

#[test]
#[serial]
fn test_malformed_config_file_warning_is_logged() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "host_url = [this is not toml");

    let (_, logs) =
        resolve_with_captured_logs(SettingsResolver::new().with_config_path(Some(path.clone())));

    assert!(logs.contains(&format!("Could not load config file {}", path.display())));
    assert!(logs.contains("using defaults"));
}
