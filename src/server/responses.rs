//! Response types for snapshot tools.
//!
//! Every tool answers with a single JSON text content. Failures become tool
//! errors whose text is an [`ErrorReport`].

use chrono::{DateTime, Utc};
use rmcp::model::{CallToolResult, Content};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorReport};
use crate::schedule::ScheduleStatus;
use crate::storage::{Snapshot, SnapshotId, SnapshotKind, SnapshotMetadata};

/// Response from `snapshot_generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// A snapshot was captured.
    pub generated: bool,
    /// The new snapshot, when generated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Snapshot>,
    /// Why nothing was generated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Response from `snapshot_list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResponse {
    /// Snapshots, most recent first, without metrics.
    pub snapshots: Vec<SnapshotMetadata>,
    /// Number of snapshots returned.
    pub count: usize,
    /// The limit applied after clamping.
    pub limit: u32,
}

/// Response from `snapshot_delete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// The removed snapshot.
    pub snapshot_id: SnapshotId,
    /// Always true on success.
    pub deleted: bool,
}

/// Response from `snapshot_schedule`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleResponse {
    /// Evaluation time.
    pub as_of: DateTime<Utc>,
    /// Periodic kinds currently due.
    pub due: Vec<SnapshotKind>,
    /// Per-kind detail.
    pub kinds: Vec<ScheduleStatus>,
}

/// Wrap a response as a successful tool result.
pub(crate) fn success<T: Serialize>(response: &T) -> CallToolResult {
    match serde_json::to_string(response) {
        Ok(json) => CallToolResult::success(vec![Content::text(json)]),
        Err(e) => failure(&AppError::Mcp(crate::error::McpError::Internal {
            message: format!("Failed to encode response: {e}"),
        })),
    }
}

/// Wrap an error as a tool error carrying an [`ErrorReport`].
pub(crate) fn failure(err: &AppError) -> CallToolResult {
    let report = ErrorReport::from(err);
    let json = serde_json::to_string(&report).unwrap_or_else(|_| {
        format!(
            r#"{{"kind":"{}","message":"error","retryable":{}}}"#,
            report.kind, report.retryable
        )
    });
    CallToolResult::error(vec![Content::text(json)])
}

/// Convert a handler outcome into a tool result.
pub(crate) fn into_tool_result<T: Serialize>(outcome: Result<T, AppError>) -> CallToolResult {
    match outcome {
        Ok(response) => success(&response),
        Err(err) => {
            tracing::debug!(kind = %err.kind(), error = %err, "tool failed");
            failure(&err)
        }
    }
}
