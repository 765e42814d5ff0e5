//! Configuration management for the balita harvester
//!
//! This module handles loading and validating run configuration from
//! environment variables and TOML files. Per-site settings live in
//! [`sources`].

pub mod sources;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::error::ConfigError;
pub use sources::{builtin, builtin_names, CategorySeeds, SourceProfile};

fn default_shuffle_seed() -> u64 {
    42
}

fn default_output() -> PathBuf {
    PathBuf::from("dataset.csv")
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_log_format() -> String {
    String::from("text")
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub harvest: HarvestConfig,

    /// Overrides applied on top of a source profile's fetch policy
    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Run-level harvest settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Records per category; the profile's default when unset
    #[serde(default)]
    pub quota: Option<usize>,

    /// Seed for the final row shuffle
    #[serde(default = "default_shuffle_seed")]
    pub shuffle_seed: u64,

    /// Dataset file
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            quota: None,
            shuffle_seed: default_shuffle_seed(),
            output: default_output(),
        }
    }
}

/// HTTP overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Fixed User-Agent instead of rotating through the built-in pool
    #[serde(default)]
    pub user_agent: Option<String>,

    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Politeness interval between requests
    #[serde(default)]
    pub min_interval_ms: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from `BALITA_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let quota = env_parse::<usize>("BALITA_QUOTA")?;
        let shuffle_seed = env_parse::<u64>("BALITA_SHUFFLE_SEED")?.unwrap_or_else(default_shuffle_seed);
        let output = std::env::var("BALITA_OUTPUT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_output());

        let user_agent = std::env::var("BALITA_USER_AGENT").ok();
        let request_timeout_secs = env_parse::<u64>("BALITA_REQUEST_TIMEOUT")?;
        let min_interval_ms = env_parse::<u64>("BALITA_MIN_INTERVAL_MS")?;

        let level = std::env::var("BALITA_LOG_LEVEL").unwrap_or_else(|_| default_log_level());
        let format = std::env::var("BALITA_LOG_FORMAT").unwrap_or_else(|_| default_log_format());

        let config = Self {
            harvest: HarvestConfig {
                quota,
                shuffle_seed,
                output,
            },
            http: HttpConfig {
                user_agent,
                request_timeout_secs,
                min_interval_ms,
            },
            logging: LoggingConfig { level, format },
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.display().to_string(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.harvest.quota == Some(0) {
            return Err(ConfigError::invalid("harvest.quota", "must be greater than 0"));
        }

        if self.http.request_timeout_secs == Some(0) {
            return Err(ConfigError::invalid(
                "http.request_timeout_secs",
                "must be greater than 0",
            ));
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(ConfigError::invalid(
                "logging.format",
                format!("expected 'text' or 'json', got '{}'", self.logging.format),
            ));
        }

        Ok(())
    }

    /// Apply HTTP overrides to a source profile
    pub fn apply_to(&self, profile: &mut SourceProfile) {
        if let Some(secs) = self.http.request_timeout_secs {
            profile.fetch.request_timeout_secs = secs;
        }
        if let Some(ms) = self.http.min_interval_ms {
            profile.fetch.min_interval_ms = ms;
        }
    }

    /// Quota per category for `profile`
    #[must_use]
    pub fn quota_for(&self, profile: &SourceProfile) -> usize {
        self.harvest.quota.unwrap_or(profile.default_quota)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::invalid(key, format!("cannot parse '{value}'"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.harvest.shuffle_seed, 42);
    }

    #[test]
    fn test_zero_quota_rejected() {
        let mut config = Config::default();
        config.harvest.quota = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_quota_falls_back_to_profile() {
        let profile = sources::verafiles();
        let mut config = Config::default();
        assert_eq!(config.quota_for(&profile), 200);
        config.harvest.quota = Some(5);
        assert_eq!(config.quota_for(&profile), 5);
    }

    #[test]
    fn test_overrides_applied_to_profile() {
        let mut profile = sources::mindanews();
        let mut config = Config::default();
        config.http.min_interval_ms = Some(0);
        config.http.request_timeout_secs = Some(5);
        config.apply_to(&mut profile);
        assert_eq!(profile.fetch.min_interval_ms, 0);
        assert_eq!(profile.fetch.request_timeout_secs, 5);
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [harvest]
            quota = 10

            [logging]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.harvest.quota, Some(10));
        assert_eq!(config.harvest.output, PathBuf::from("dataset.csv"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("BALITA_QUOTA", "25");
        std::env::set_var("BALITA_LOG_FORMAT", "json");
        let config = Config::from_env();
        std::env::remove_var("BALITA_QUOTA");
        std::env::remove_var("BALITA_LOG_FORMAT");

        let config = config.unwrap();
        assert_eq!(config.harvest.quota, Some(25));
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_garbage() {
        std::env::set_var("BALITA_QUOTA", "lots");
        let result = Config::from_env();
        std::env::remove_var("BALITA_QUOTA");

        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}
