//! Configuration management for keywarden
//!
//! Values come from built-in defaults, an optional `.env` file and
//! `KEYWARDEN_*` environment variables, in increasing order of precedence.
//! Command line flags are applied on top by the binary.

use config::{Config, Environment, Map};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Prefix of every keywarden environment variable
pub const ENV_PREFIX: &str = "KEYWARDEN";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid key expiration {value:?}: {source}")]
    InvalidDuration {
        value: String,
        #[source]
        source: humantime::DurationError,
    },
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Console,
    /// One JSON object per line
    Json,
}

/// Application configuration
///
/// Unset optional values leave the library defaults in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub log_level: String,
    pub log_format: LogFormat,
    pub key_expiration: Option<Duration>,
    pub groups: Option<String>,
    pub profile: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    log_level: String,
    log_format: LogFormat,
    key_expiration: Option<String>,
    groups: Option<String>,
    profile: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();
        Self::load(Environment::with_prefix(ENV_PREFIX))
    }

    /// Load configuration from an explicit variable map instead of the
    /// process environment
    pub fn from_map(vars: Map<String, String>) -> Result<Self, ConfigError> {
        Self::load(Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
    }

    fn load(environment: Environment) -> Result<Self, ConfigError> {
        let raw: RawConfig = Config::builder()
            .set_default("log_level", "info")?
            .set_default("log_format", "console")?
            .add_source(environment.ignore_empty(true))
            .build()?
            .try_deserialize()?;

        let key_expiration = raw
            .key_expiration
            .map(|value| {
                humantime::parse_duration(&value)
                    .map_err(|source| ConfigError::InvalidDuration { value, source })
            })
            .transpose()?;

        Ok(Self {
            log_level: raw.log_level,
            log_format: raw.log_format,
            key_expiration,
            groups: raw.groups,
            profile: raw.profile,
        })
    }

    /// Get log level, defaulting to "info"
    pub fn log_level(&self) -> &str {
        if self.log_level.is_empty() {
            "info"
        } else {
            &self.log_level
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Console,
            key_expiration: None,
            groups: None,
            profile: None,
        }
    }
}
