//! Configuration management.
//!
//! This module handles:
//! - Environment variable loading
//! - Configuration validation
//! - Default value handling
//!
//! # Example
//!
//! ```
//! use health_snapshots::config::{Config, LogFormat};
//!
//! // Use Config::from_env() in production
//! let config = Config {
//!     database_path: "./data/snapshots.db".to_string(),
//!     log_format: LogFormat::Json,
//!     ..Config::default()
//! };
//!
//! assert_eq!(config.default_list_limit, 20);
//! assert_eq!(config.request_timeout().as_millis(), 10_000);
//! ```

#![allow(clippy::should_implement_trait)]

mod validation;

pub use validation::{validate_config, MAX_LIST_LIMIT_CEILING, MAX_TIMEOUT_MS, MIN_TIMEOUT_MS};

use std::time::Duration;

use crate::error::ConfigError;

/// Default snapshot database path.
pub const DEFAULT_DATABASE_PATH: &str = "./data/snapshots.db";

/// Default operational (source) database path.
pub const DEFAULT_SOURCE_DATABASE_PATH: &str = "./data/health_office.db";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default per-operation timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Default number of snapshots returned by a listing.
pub const DEFAULT_LIST_LIMIT: u32 = 20;

/// Default upper bound on a listing's limit.
pub const DEFAULT_MAX_LIST_LIMIT: u32 = 200;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Convert to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }

    /// Parse from string, ignoring case.
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Application configuration.
///
/// Use [`Config::from_env`] to load configuration from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Snapshot database path.
    pub database_path: String,
    /// Health office database path, opened read-only.
    pub source_database_path: String,
    /// Log level (error, warn, info, debug, trace) or a full filter directive.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
    /// Per-operation timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Listing limit when the caller gives none.
    pub default_list_limit: u32,
    /// Listing limits above this are clamped.
    pub max_list_limit: u32,
    /// Run embedded migrations when the store is opened.
    pub auto_migrate: bool,
    /// Compare only shared metrics instead of failing on structural mismatch,
    /// unless a request says otherwise.
    pub compare_allow_mismatch: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            source_database_path: DEFAULT_SOURCE_DATABASE_PATH.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::Text,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            default_list_limit: DEFAULT_LIST_LIMIT,
            max_list_limit: DEFAULT_MAX_LIST_LIMIT,
            auto_migrate: true,
            compare_allow_mismatch: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional environment variables (with defaults):
    /// - `DATABASE_PATH`: Snapshot database (default: `./data/snapshots.db`)
    /// - `SOURCE_DATABASE_PATH`: Health office database (default: `./data/health_office.db`)
    /// - `LOG_LEVEL`: Logging level (default: `info`)
    /// - `LOG_FORMAT`: `text` or `json` (default: `text`)
    /// - `REQUEST_TIMEOUT_MS`: Per-operation timeout (default: `10000`)
    /// - `DEFAULT_LIST_LIMIT`: Listing default (default: `20`)
    /// - `MAX_LIST_LIMIT`: Listing clamp (default: `200`)
    /// - `AUTO_MIGRATE`: Run migrations on open (default: `true`)
    /// - `COMPARE_ALLOW_MISMATCH`: Partial comparisons by default (default: `false`)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if:
    /// - A numeric variable is not a valid positive integer
    /// - A boolean variable is not `true`/`false`/`1`/`0`
    /// - `LOG_FORMAT` is neither `text` nor `json`
    /// - Any value fails validation (see [`validate_config`])
    #[must_use = "configuration should be used"]
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let database_path =
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| DEFAULT_DATABASE_PATH.into());
        let source_database_path = std::env::var("SOURCE_DATABASE_PATH")
            .unwrap_or_else(|_| DEFAULT_SOURCE_DATABASE_PATH.into());

        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.into());
        let log_format = match std::env::var("LOG_FORMAT") {
            Ok(value) => LogFormat::from_str(&value).ok_or_else(|| ConfigError::InvalidValue {
                var: "LOG_FORMAT".into(),
                reason: "must be 'text' or 'json'".into(),
            })?,
            Err(_) => LogFormat::Text,
        };

        let request_timeout_ms = parse_env_u64("REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)?;
        let default_list_limit = parse_env_u32("DEFAULT_LIST_LIMIT", DEFAULT_LIST_LIMIT)?;
        let max_list_limit = parse_env_u32("MAX_LIST_LIMIT", DEFAULT_MAX_LIST_LIMIT)?;
        let auto_migrate = parse_env_bool("AUTO_MIGRATE", true)?;
        let compare_allow_mismatch = parse_env_bool("COMPARE_ALLOW_MISMATCH", false)?;

        let config = Self {
            database_path,
            source_database_path,
            log_level,
            log_format,
            request_timeout_ms,
            default_list_limit,
            max_list_limit,
            auto_migrate,
            compare_allow_mismatch,
        };

        validate_config(&config)?;
        Ok(config)
    }

    /// Per-operation timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Parse an environment variable as u64, using a default if not set.
fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    std::env::var(name).map_or(Ok(default), |val| {
        val.parse().map_err(|_| ConfigError::InvalidValue {
            var: name.into(),
            reason: "must be a positive integer".into(),
        })
    })
}

/// Parse an environment variable as u32, using a default if not set.
fn parse_env_u32(name: &str, default: u32) -> Result<u32, ConfigError> {
    std::env::var(name).map_or(Ok(default), |val| {
        val.parse().map_err(|_| ConfigError::InvalidValue {
            var: name.into(),
            reason: "must be a positive integer".into(),
        })
    })
}

/// Parse an environment variable as a boolean, using a default if not set.
fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    std::env::var(name).map_or(Ok(default), |val| {
        match val.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                var: name.into(),
                reason: "must be true or false".into(),
            }),
        }
    })
}
