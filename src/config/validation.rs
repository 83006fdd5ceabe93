//! Configuration validation.
//!
//! This module provides validation logic for configuration values,
//! ensuring they are within acceptable ranges.

use super::Config;
use crate::error::ConfigError;

/// Minimum allowed timeout in milliseconds.
pub const MIN_TIMEOUT_MS: u64 = 100;

/// Maximum allowed timeout in milliseconds (5 minutes).
pub const MAX_TIMEOUT_MS: u64 = 300_000;

/// Largest value accepted for `MAX_LIST_LIMIT`.
pub const MAX_LIST_LIMIT_CEILING: u32 = 10_000;

/// Validate configuration values.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] if any value is out of range:
/// - `DATABASE_PATH` and `SOURCE_DATABASE_PATH` must not be empty
/// - `REQUEST_TIMEOUT_MS` must be between 100 and 300000
/// - `DEFAULT_LIST_LIMIT` must be at least 1 and at most `MAX_LIST_LIMIT`
/// - `MAX_LIST_LIMIT` must be at most 10000
#[must_use = "validation result should be checked"]
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.database_path.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            var: "DATABASE_PATH".into(),
            reason: "must not be empty".into(),
        });
    }

    if config.source_database_path.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            var: "SOURCE_DATABASE_PATH".into(),
            reason: "must not be empty".into(),
        });
    }

    if config.request_timeout_ms < MIN_TIMEOUT_MS || config.request_timeout_ms > MAX_TIMEOUT_MS {
        return Err(ConfigError::InvalidValue {
            var: "REQUEST_TIMEOUT_MS".into(),
            reason: format!("must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS} ms"),
        });
    }

    if config.max_list_limit > MAX_LIST_LIMIT_CEILING {
        return Err(ConfigError::InvalidValue {
            var: "MAX_LIST_LIMIT".into(),
            reason: format!("must be at most {MAX_LIST_LIMIT_CEILING}"),
        });
    }

    if config.default_list_limit == 0 || config.default_list_limit > config.max_list_limit {
        return Err(ConfigError::InvalidValue {
            var: "DEFAULT_LIST_LIMIT".into(),
            reason: format!("must be between 1 and {}", config.max_list_limit),
        });
    }

    Ok(())
}
