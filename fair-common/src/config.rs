//! Configuration loading and settings resolution
//!
//! Settings are resolved once at startup and never mutated afterwards.
//! Priority order for every field:
//! 1. Command-line argument (highest priority, only `bind` and config path)
//! 2. Environment variable (`FAIR_*`)
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit TOML config file
pub const CONFIG_ENV_VAR: &str = "FAIR_CONFIG";

/// Service settings shared (read-only) by the API layer and the harvester
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Public host name, used in the YAML descriptors
    pub host: String,
    /// Public base URL, used to build result identifiers
    pub host_url: String,
    /// Socket address the HTTP server binds to
    pub bind: String,
    pub contact_url: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_orcid: String,
    pub org_name: String,
    /// Subject used in the descriptors as example input
    pub default_subject: String,
    /// External metadata harvester service
    pub harvester_url: String,
    /// Timeout for every outbound call except the harvester
    pub http_timeout_secs: u64,
    /// Timeout for calls to the harvester service
    pub harvester_timeout_secs: u64,
    /// Enable permissive CORS on the router
    pub cors_enabled: bool,
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter (trace, debug, info, warn, error), `RUST_LOG` wins
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "metrics.api.fair-enough.semanticscience.org".to_string(),
            host_url: "https://metrics.api.fair-enough.semanticscience.org".to_string(),
            bind: "127.0.0.1:8000".to_string(),
            contact_url: "https://github.com/MaastrichtU-IDS/fair-enough-metrics".to_string(),
            contact_name: "Vincent Emonet".to_string(),
            contact_email: "vincent.emonet@gmail.com".to_string(),
            contact_orcid: "0000-0002-1501-1082".to_string(),
            org_name: "Institute of Data Science at Maastricht University".to_string(),
            default_subject: "https://doi.org/10.1594/PANGAEA.908011".to_string(),
            harvester_url: "https://w3id.org/FAIR_Tests/tests/harvester".to_string(),
            http_timeout_secs: 30,
            harvester_timeout_secs: 60,
            cors_enabled: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl Settings {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn harvester_timeout(&self) -> Duration {
        Duration::from_secs(self.harvester_timeout_secs)
    }

    /// Reject settings that would make the pipeline unusable
    pub fn validate(&self) -> Result<()> {
        if self.host_url.trim().is_empty() {
            return Err(Error::Config("host_url must not be empty".to_string()));
        }
        if self.harvester_url.trim().is_empty() {
            return Err(Error::Config("harvester_url must not be empty".to_string()));
        }
        if self.http_timeout_secs == 0 || self.harvester_timeout_secs == 0 {
            return Err(Error::Config("timeouts must be at least one second".to_string()));
        }
        Ok(())
    }
}

/// TOML config file contents, every key optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub host_url: Option<String>,
    #[serde(default)]
    pub bind: Option<String>,
    #[serde(default)]
    pub contact_url: Option<String>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_orcid: Option<String>,
    #[serde(default)]
    pub org_name: Option<String>,
    #[serde(default)]
    pub default_subject: Option<String>,
    #[serde(default)]
    pub harvester_url: Option<String>,
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
    #[serde(default)]
    pub harvester_timeout_secs: Option<u64>,
    #[serde(default)]
    pub cors_enabled: Option<bool>,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

impl TomlConfig {
    /// Read and parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

/// Resolves [`Settings`] from the four configuration tiers
pub struct SettingsResolver {
    cli_bind: Option<String>,
    cli_config: Option<PathBuf>,
}

impl SettingsResolver {
    pub fn new() -> Self {
        Self {
            cli_bind: None,
            cli_config: None,
        }
    }

    /// Bind address given on the command line
    pub fn with_bind(mut self, bind: Option<String>) -> Self {
        self.cli_bind = bind;
        self
    }

    /// Config file path given on the command line
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.cli_config = path;
        self
    }

    /// Resolve settings. A missing or malformed TOML file only logs a warning.
    pub fn resolve(&self) -> Settings {
        let toml_config = self.load_toml();
        let defaults = Settings::default();

        let string = |env_name: &str, toml_value: Option<String>, default: String| {
            env_string(env_name).or(toml_value).unwrap_or(default)
        };
        let number = |env_name: &str, toml_value: Option<u64>, default: u64| {
            env_parsed(env_name).or(toml_value).unwrap_or(default)
        };

        Settings {
            host: string("FAIR_HOST", toml_config.host, defaults.host),
            host_url: string("FAIR_HOST_URL", toml_config.host_url, defaults.host_url),
            bind: self
                .cli_bind
                .clone()
                .unwrap_or_else(|| string("FAIR_BIND", toml_config.bind, defaults.bind)),
            contact_url: string("FAIR_CONTACT_URL", toml_config.contact_url, defaults.contact_url),
            contact_name: string(
                "FAIR_CONTACT_NAME",
                toml_config.contact_name,
                defaults.contact_name,
            ),
            contact_email: string(
                "FAIR_CONTACT_EMAIL",
                toml_config.contact_email,
                defaults.contact_email,
            ),
            contact_orcid: string(
                "FAIR_CONTACT_ORCID",
                toml_config.contact_orcid,
                defaults.contact_orcid,
            ),
            org_name: string("FAIR_ORG_NAME", toml_config.org_name, defaults.org_name),
            default_subject: string(
                "FAIR_DEFAULT_SUBJECT",
                toml_config.default_subject,
                defaults.default_subject,
            ),
            harvester_url: string(
                "FAIR_HARVESTER_URL",
                toml_config.harvester_url,
                defaults.harvester_url,
            ),
            http_timeout_secs: number(
                "FAIR_HTTP_TIMEOUT_SECS",
                toml_config.http_timeout_secs,
                defaults.http_timeout_secs,
            ),
            harvester_timeout_secs: number(
                "FAIR_HARVESTER_TIMEOUT_SECS",
                toml_config.harvester_timeout_secs,
                defaults.harvester_timeout_secs,
            ),
            cors_enabled: env_parsed("FAIR_CORS_ENABLED")
                .or(toml_config.cors_enabled)
                .unwrap_or(defaults.cors_enabled),
            logging: LoggingConfig {
                level: env_string("FAIR_LOG_LEVEL")
                    .or(toml_config.logging.map(|l| l.level))
                    .unwrap_or(defaults.logging.level),
            },
        }
    }

    fn load_toml(&self) -> TomlConfig {
        let Some(path) = self.config_path() else {
            return TomlConfig::default();
        };

        match TomlConfig::load(&path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                warn!(
                    "Could not load config file {} ({}), using defaults",
                    path.display(),
                    e
                );
                TomlConfig::default()
            }
        }
    }

    /// Config file location: CLI → `FAIR_CONFIG` → user config dir (if present)
    fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cli_config {
            return Some(path.clone());
        }
        if let Some(path) = env_string(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir()
            .map(|d| d.join("fair-metrics").join("config.toml"))
            .filter(|p| p.exists())
    }
}

impl Default for SettingsResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env_string(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid value for {}: {}", name, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.harvester_timeout(), Duration::from_secs(60));
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let settings = Settings {
            http_timeout_secs: 0,
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_partial_toml_parses() {
        let config: TomlConfig = toml::from_str(
            r#"
            harvester_url = "http://localhost:9000/harvester"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.harvester_url.as_deref(),
            Some("http://localhost:9000/harvester")
        );
        assert_eq!(config.logging.unwrap().level, "debug");
        assert!(config.host_url.is_none());
    }
}
