//! Storage types for snapshot persistence.
//!
//! This module defines the types stored in the database:
//! - [`SnapshotId`]: Datastore-assigned identifier
//! - [`SnapshotKind`]: Cadence tag
//! - [`SnapshotMetadata`]: Everything except the metrics payload
//! - [`Snapshot`]: Metadata plus the [`MetricsBundle`]
//! - [`SnapshotFilter`]: Listing criteria

#![allow(clippy::should_implement_trait)]

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::bundle::MetricsBundle;

/// Snapshot identifier assigned by the datastore.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct SnapshotId(pub i64);

impl SnapshotId {
    /// Raw integer value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for SnapshotId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cadence or purpose of a snapshot.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    /// Requested explicitly by a user.
    #[default]
    Manual,
    /// Once per calendar quarter.
    Quarterly,
    /// Once per half-year.
    SemiAnnual,
    /// Once per calendar year.
    Annual,
}

impl SnapshotKind {
    /// All kinds, in cadence order.
    pub const ALL: [Self; 4] = [Self::Manual, Self::Quarterly, Self::SemiAnnual, Self::Annual];

    /// Kinds generated on a calendar schedule.
    pub const PERIODIC: [Self; 3] = [Self::Quarterly, Self::SemiAnnual, Self::Annual];

    /// Convert to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Quarterly => "quarterly",
            Self::SemiAnnual => "semi_annual",
            Self::Annual => "annual",
        }
    }

    /// Parse from string.
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(Self::Manual),
            "quarterly" => Some(Self::Quarterly),
            "semi_annual" => Some(Self::SemiAnnual),
            "annual" => Some(Self::Annual),
            _ => None,
        }
    }

    /// Returns true for calendar-scheduled kinds.
    #[must_use]
    pub const fn is_periodic(&self) -> bool {
        !matches!(self, Self::Manual)
    }
}

impl std::fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot fields other than the metrics payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// Unique snapshot identifier.
    pub id: SnapshotId,
    /// Capture timestamp.
    pub captured_at: DateTime<Utc>,
    /// Cadence tag.
    pub kind: SnapshotKind,
    /// Optional free-text notes.
    pub notes: Option<String>,
    /// Actor that requested the snapshot.
    pub created_by: Option<String>,
}

impl SnapshotMetadata {
    /// Create metadata with no notes or creator.
    #[must_use]
    pub const fn new(id: SnapshotId, captured_at: DateTime<Utc>, kind: SnapshotKind) -> Self {
        Self {
            id,
            captured_at,
            kind,
            notes: None,
            created_by: None,
        }
    }

    /// Set notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Set creator.
    #[must_use]
    pub fn with_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }
}

/// A stored snapshot, including its metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot metadata.
    #[serde(flatten)]
    pub metadata: SnapshotMetadata,
    /// Captured metrics.
    pub metrics: MetricsBundle,
}

impl Snapshot {
    /// Snapshot identifier.
    #[must_use]
    pub const fn id(&self) -> SnapshotId {
        self.metadata.id
    }
}

/// Criteria for listing snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SnapshotFilter {
    /// Restrict to one kind.
    pub kind: Option<SnapshotKind>,
    /// Only snapshots captured at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Only snapshots captured at or before this instant.
    pub until: Option<DateTime<Utc>>,
    /// Maximum number of rows.
    pub limit: u32,
}

impl SnapshotFilter {
    /// The most recent `limit` snapshots of any kind.
    #[must_use]
    pub const fn latest(limit: u32) -> Self {
        Self {
            kind: None,
            since: None,
            until: None,
            limit,
        }
    }

    /// Restrict to one kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: SnapshotKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Lower bound on `captured_at`.
    #[must_use]
    pub const fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Upper bound on `captured_at`.
    #[must_use]
    pub const fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }
}
