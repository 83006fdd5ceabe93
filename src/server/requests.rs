//! Request types for snapshot tools.
//!
//! This module contains all request types with `JsonSchema` support for tool
//! parameters. Enumerated values arrive as strings and are parsed here, so an
//! unknown kind or role is reported as `invalid_input` like any other bad
//! parameter.

use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::policy::{Actor, Role};
use crate::storage::{SnapshotId, SnapshotKind};

/// Request to capture a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SnapshotGenerateRequest {
    /// Snapshot kind: manual, quarterly, semi_annual or annual.
    pub kind: String,
    /// Free-text notes stored with the snapshot.
    pub notes: Option<String>,
    /// Identifier of the requesting actor.
    pub actor_id: String,
    /// Role of the requesting actor: admin, staff, viewer or system.
    pub role: String,
    /// Only generate if the kind is due in the current calendar period.
    pub only_if_due: Option<bool>,
}

/// Request to list snapshots.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SnapshotListRequest {
    /// Maximum number of snapshots to return.
    pub limit: Option<u32>,
    /// Restrict to one kind.
    pub kind: Option<String>,
    /// Captured at or after this time (RFC 3339 or YYYY-MM-DD).
    pub since: Option<String>,
    /// Captured at or before this time (RFC 3339 or YYYY-MM-DD).
    pub until: Option<String>,
}

/// Request to load one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SnapshotGetRequest {
    /// Snapshot identifier.
    pub snapshot_id: i64,
}

/// Request to delete a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SnapshotDeleteRequest {
    /// Snapshot identifier.
    pub snapshot_id: i64,
    /// Identifier of the requesting actor.
    pub actor_id: String,
    /// Role of the requesting actor.
    pub role: String,
}

/// Request to compare two snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SnapshotCompareRequest {
    /// The earlier snapshot.
    pub before_id: i64,
    /// The later snapshot.
    pub after_id: i64,
    /// Compare shared metrics only instead of failing on a structural mismatch.
    pub allow_structural_mismatch: Option<bool>,
}

/// Request for the periodic schedule state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SnapshotScheduleRequest {
    /// Restrict to one periodic kind.
    pub kind: Option<String>,
}

/// Parse a snapshot kind parameter.
pub(crate) fn parse_kind(field: &str, value: &str) -> Result<SnapshotKind, AppError> {
    SnapshotKind::from_str(value.trim()).ok_or_else(|| AppError::InvalidInput {
        field: field.to_string(),
        reason: format!("unknown kind '{value}', expected manual, quarterly, semi_annual or annual"),
    })
}

/// Build the actor from `actor_id` and `role` parameters.
pub(crate) fn parse_actor(actor_id: &str, role: &str) -> Result<Actor, AppError> {
    let actor_id = actor_id.trim();
    if actor_id.is_empty() {
        return Err(AppError::InvalidInput {
            field: "actor_id".into(),
            reason: "must not be empty".into(),
        });
    }
    let role = Role::from_str(role.trim()).ok_or_else(|| AppError::InvalidInput {
        field: "role".into(),
        reason: format!("unknown role '{role}', expected admin, staff, viewer or system"),
    })?;
    Ok(Actor::new(actor_id, role))
}

/// Parse a time bound. A bare date means midnight UTC.
pub(crate) fn parse_time(field: &str, value: &str) -> Result<DateTime<Utc>, AppError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| AppError::InvalidInput {
            field: field.to_string(),
            reason: format!("'{value}' is not an RFC 3339 timestamp or YYYY-MM-DD date"),
        })
}

/// Validate a snapshot id parameter.
pub(crate) fn parse_id(field: &str, value: i64) -> Result<SnapshotId, AppError> {
    if value < 1 {
        return Err(AppError::InvalidInput {
            field: field.to_string(),
            reason: "must be a positive integer".into(),
        });
    }
    Ok(SnapshotId(value))
}
