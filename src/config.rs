use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::constants::{DEFAULT_BASE_URL, SCRAPER_USER_AGENT};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as number: {source}")]
    ParseFloat {
        name: String,
        #[source]
        source: std::num::ParseFloatError,
    },
}

/// Scraper configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Site
    pub base_url: String,

    // Request pacing
    pub throttle: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,

    // Session
    pub cookies_file_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to a value that cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Site
            base_url: env_or_default("FA_BASE_URL", DEFAULT_BASE_URL),

            // Request pacing
            throttle: parse_env_secs_f64("FA_THROTTLE_SECS", 1.0)?,
            request_timeout: Duration::from_secs(parse_env_u64("FA_REQUEST_TIMEOUT_SECS", 30)?),
            user_agent: env_or_default("FA_USER_AGENT", SCRAPER_USER_AGENT),

            // Session
            cookies_file_path: optional_env("FA_COOKIES_FILE").map(PathBuf::from),
        })
    }

    /// Defaults for every setting, without touching the environment.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            throttle: Duration::ZERO,
            request_timeout: Duration::from_secs(10),
            user_agent: SCRAPER_USER_AGENT.to_string(),
            cookies_file_path: None,
        }
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match url::Url::parse(&self.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(ConfigError::InvalidValue {
                    name: "FA_BASE_URL".to_string(),
                    message: format!("must be an http(s) URL, got '{}'", self.base_url),
                });
            }
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "FA_REQUEST_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.user_agent.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "FA_USER_AGENT".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_secs_f64(name: &str, default: f64) -> Result<Duration, ConfigError> {
    let secs = match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseFloat {
            name: name.to_string(),
            source: e,
        })?,
        _ => default,
    };
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidValue {
        name: name.to_string(),
        message: format!("must be a non-negative number of seconds, got {secs}"),
    })
}
