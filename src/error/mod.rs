//! Error types for the snapshot store.
//!
//! This module defines a hierarchical error system:
//! - [`AppError`]: Top-level application errors
//! - [`StorageError`]: Snapshot persistence errors
//! - [`CollectorError`]: Aggregate collection errors
//! - [`ComparisonError`]: Snapshot comparison errors
//! - [`PolicyError`]: Authorization errors
//! - [`McpError`]: MCP protocol errors
//! - [`ConfigError`]: Configuration errors
//!
//! All errors implement `Send + Sync` for async compatibility.
//! [`ErrorKind`] collapses the hierarchy into the categories a presentation
//! layer shows distinct messages for.

mod kind;

pub use kind::{ErrorKind, ErrorReport};

use thiserror::Error;

/// Top-level application error.
///
/// This is the main error type returned by public API functions.
/// It wraps all subsystem errors for unified error handling.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AppError {
    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Collector error.
    #[error("Collector error: {0}")]
    Collector(#[from] CollectorError),

    /// Comparison error.
    #[error("Comparison error: {0}")]
    Comparison(#[from] ComparisonError),

    /// Authorization error.
    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    /// MCP protocol error.
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Caller supplied an unusable parameter.
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput {
        /// The offending parameter.
        field: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Storage errors.
///
/// These errors represent failures in snapshot persistence.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The persistence layer is unreachable or not provisioned.
    #[error("Storage unavailable: {message}")]
    Unavailable {
        /// Description of why storage cannot be used.
        message: String,
    },

    /// Failed to connect to the database.
    #[error("Database connection failed: {message}")]
    ConnectionFailed {
        /// Description of the connection failure.
        message: String,
    },

    /// A database query failed.
    #[error("Query failed: {query} - {message}")]
    QueryFailed {
        /// The query that failed (may be truncated).
        query: String,
        /// Description of the failure.
        message: String,
    },

    /// Snapshot not found.
    #[error("Snapshot not found: {snapshot_id}")]
    SnapshotNotFound {
        /// The snapshot ID that was not found.
        snapshot_id: i64,
    },

    /// Database migration failed.
    #[error("Migration failed: {version} - {message}")]
    MigrationFailed {
        /// The migration version that failed.
        version: String,
        /// Description of the failure.
        message: String,
    },

    /// Operation exceeded its time budget.
    #[error("Storage operation timed out after {timeout_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Internal storage error.
    #[error("Internal storage error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Returns true if a caller may reasonably retry the operation.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable { .. } | Self::ConnectionFailed { .. } | Self::Timeout { .. }
        )
    }
}

/// Aggregate collector errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollectorError {
    /// The source data cannot be read (missing database or tables).
    #[error("Data unavailable: {message}")]
    DataUnavailable {
        /// Description of what is missing.
        message: String,
    },

    /// A source query failed for another reason.
    #[error("Source query failed: {query} - {message}")]
    QueryFailed {
        /// The query that failed.
        query: String,
        /// Description of the failure.
        message: String,
    },

    /// Collection exceeded its time budget.
    #[error("Collection timed out after {timeout_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds.
        timeout_ms: u64,
    },
}

/// Snapshot comparison errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComparisonError {
    /// Both sides of the comparison are the same snapshot.
    #[error("Cannot compare snapshot {snapshot_id} with itself")]
    SameSnapshot {
        /// The repeated snapshot ID.
        snapshot_id: i64,
    },

    /// The two bundles do not share the same metric structure.
    #[error(
        "Snapshots are structurally incompatible: only in before {only_in_before:?}, \
         only in after {only_in_after:?}, kind mismatch {kind_mismatch:?}"
    )]
    StructuralMismatch {
        /// Metrics present only in the earlier snapshot.
        only_in_before: Vec<String>,
        /// Metrics present only in the later snapshot.
        only_in_after: Vec<String>,
        /// Metrics that are scalar on one side and categorical on the other.
        kind_mismatch: Vec<String>,
    },

    /// Loading a snapshot failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Authorization errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// The actor's role does not permit the action.
    #[error("Actor {actor} ({role}) is not allowed to {action}")]
    Forbidden {
        /// Actor identity.
        actor: String,
        /// Actor role.
        role: String,
        /// Attempted action.
        action: String,
    },
}

/// MCP protocol errors.
///
/// These errors represent failures in MCP JSON-RPC communication.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum McpError {
    /// Invalid parameters for a tool.
    #[error("Invalid parameters for {tool}: {message}")]
    InvalidParameters {
        /// The tool name.
        tool: String,
        /// Description of what's invalid.
        message: String,
    },

    /// Internal server error.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

/// Configuration errors.
///
/// These errors represent failures in configuration loading and validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required configuration is missing.
    #[error("Missing required: {var}")]
    MissingRequired {
        /// The missing variable name.
        var: String,
    },

    /// Configuration value is invalid.
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue {
        /// The variable name.
        var: String,
        /// Why the value is invalid.
        reason: String,
    },
}
