//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `sprinklerctl.toml` in the working directory unless a path is
//! given. Every field has a sensible default so the file is optional.
//! Environment variables take precedence over file values; command-line
//! flags are applied by the caller on top of both.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use sprinkler_adapter_http_reqwest::DeviceConfig;
use sprinkler_app::poller::PollerSettings;
use sprinkler_domain::relay::{DEFAULT_STATION_NAMES, RELAY_COUNT, RelayId};

/// Default configuration file name.
pub const DEFAULT_PATH: &str = "sprinklerctl.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Controller connection settings.
    pub device: DeviceSection,
    /// Poll and countdown cadence.
    pub poll: PollConfig,
    /// Local cache settings.
    pub cache: CacheConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Station labels.
    pub stations: StationsConfig,
}

/// Controller connection configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeviceSection {
    /// Origin of the controller.
    pub base_url: String,
    /// Timeout for ordinary API calls, in seconds.
    pub timeout_secs: u64,
    /// Timeout for a firmware upload, in seconds.
    pub upload_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub status_interval_secs: u64,
    pub countdown_interval_secs: u64,
}

/// `SQLite` local cache configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StationsConfig {
    /// One label per relay, in relay order.
    pub names: Vec<String>,
}

impl Config {
    /// Load configuration from `path` (or [`DEFAULT_PATH`]) if present, then
    /// apply environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed or fails
    /// validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path.unwrap_or_else(|| Path::new(DEFAULT_PATH)))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SPRINKLER_DEVICE_URL") {
            self.device.base_url = val;
        }
        if let Ok(val) = std::env::var("SPRINKLER_CACHE_URL") {
            self.cache.url = val;
        }
        if let Ok(val) = std::env::var("SPRINKLER_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    /// Check values the defaults cannot fix.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] describing the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.base_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "device.base_url must not be empty".to_string(),
            ));
        }
        if self.device.timeout_secs == 0 || self.device.upload_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "device timeouts must be non-zero".to_string(),
            ));
        }
        if self.poll.status_interval_secs == 0 || self.poll.countdown_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "poll intervals must be non-zero".to_string(),
            ));
        }
        if self.stations.names.len() != usize::from(RELAY_COUNT) {
            return Err(ConfigError::Validation(format!(
                "stations.names must list exactly {RELAY_COUNT} names, got {}",
                self.stations.names.len()
            )));
        }
        Ok(())
    }

    /// Settings for the HTTP device adapter.
    #[must_use]
    pub fn device_config(&self) -> DeviceConfig {
        DeviceConfig {
            base_url: self.device.base_url.clone(),
            timeout: Duration::from_secs(self.device.timeout_secs),
            upload_timeout: Duration::from_secs(self.device.upload_timeout_secs),
            ..DeviceConfig::default()
        }
    }

    #[must_use]
    pub fn poller_settings(&self) -> PollerSettings {
        PollerSettings {
            status_interval: Duration::from_secs(self.poll.status_interval_secs),
            countdown_interval: Duration::from_secs(self.poll.countdown_interval_secs),
        }
    }

    /// Return the cache URL in `sqlx`-compatible format.
    #[must_use]
    pub fn cache_url(&self) -> &str {
        &self.cache.url
    }

    /// Label of the station wired to `relay`.
    #[must_use]
    pub fn station_name(&self, relay: RelayId) -> &str {
        self.stations
            .names
            .get(relay.index())
            .map_or(DEFAULT_STATION_NAMES[relay.index()], String::as_str)
    }

    /// All station labels in relay order.
    #[must_use]
    pub fn station_names(&self) -> Vec<String> {
        RelayId::all()
            .map(|relay| self.station_name(relay).to_string())
            .collect()
    }
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            base_url: "http://192.168.4.1".to_string(),
            timeout_secs: 10,
            upload_timeout_secs: 300,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            status_interval_secs: 10,
            countdown_interval_secs: 1,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:sprinklerctl.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "sprinklerctl=info,sprinkler=info,warn".to_string(),
        }
    }
}

impl Default for StationsConfig {
    fn default() -> Self {
        Self {
            names: DEFAULT_STATION_NAMES.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
