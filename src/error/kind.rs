//! Machine-readable error categories.
//!
//! The presentation layer needs one distinct message per failure class
//! ("tables not set up" vs "snapshot not found" vs "select two different
//! snapshots"). [`ErrorKind`] is that class, and [`ErrorReport`] is the
//! serializable envelope returned to clients.

use serde::{Deserialize, Serialize};

use super::{AppError, CollectorError, ComparisonError, StorageError};

/// Category of error for machine parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Source data for collection is missing or unreadable.
    DataUnavailable,
    /// Snapshot storage is unreachable or not provisioned.
    StorageUnavailable,
    /// Referenced snapshot does not exist.
    NotFound,
    /// A snapshot was compared with itself.
    SameSnapshot,
    /// Two bundles have incompatible metric structures.
    StructuralMismatch,
    /// The actor lacks permission.
    Forbidden,
    /// A request parameter was rejected.
    InvalidInput,
    /// The operation exceeded its timeout.
    Timeout,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// Convert to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DataUnavailable => "data_unavailable",
            Self::StorageUnavailable => "storage_unavailable",
            Self::NotFound => "not_found",
            Self::SameSnapshot => "same_snapshot",
            Self::StructuralMismatch => "structural_mismatch",
            Self::Forbidden => "forbidden",
            Self::InvalidInput => "invalid_input",
            Self::Timeout => "timeout",
            Self::Internal => "internal",
        }
    }

    /// Returns true if a caller may retry after a delay.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable | Self::Timeout)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StorageError {
    /// Category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unavailable { .. } | Self::ConnectionFailed { .. } => {
                ErrorKind::StorageUnavailable
            }
            Self::SnapshotNotFound { .. } => ErrorKind::NotFound,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::QueryFailed { .. } | Self::MigrationFailed { .. } | Self::Internal { .. } => {
                ErrorKind::Internal
            }
        }
    }
}

impl CollectorError {
    /// Category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DataUnavailable { .. } => ErrorKind::DataUnavailable,
            Self::QueryFailed { .. } => ErrorKind::Internal,
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }
}

impl ComparisonError {
    /// Category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::SameSnapshot { .. } => ErrorKind::SameSnapshot,
            Self::StructuralMismatch { .. } => ErrorKind::StructuralMismatch,
            Self::Storage(inner) => inner.kind(),
        }
    }
}

impl AppError {
    /// Category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Storage(e) => e.kind(),
            Self::Collector(e) => e.kind(),
            Self::Comparison(e) => e.kind(),
            Self::Policy(_) => ErrorKind::Forbidden,
            Self::InvalidInput { .. } | Self::Mcp(super::McpError::InvalidParameters { .. }) => {
                ErrorKind::InvalidInput
            }
            Self::Mcp(_) | Self::Config(_) => ErrorKind::Internal,
        }
    }
}

/// Serializable error envelope for clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Error category.
    pub kind: ErrorKind,
    /// Original error message.
    pub message: String,
    /// Whether a caller-side retry makes sense.
    pub retryable: bool,
}

impl From<&AppError> for ErrorReport {
    fn from(err: &AppError) -> Self {
        let kind = err.kind();
        Self {
            kind,
            message: err.to_string(),
            retryable: kind.is_retryable(),
        }
    }
}
