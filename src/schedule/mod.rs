//! Calendar schedule for periodic snapshots.
//!
//! Periodic kinds are due once per calendar period:
//!
//! | Kind | Period starts |
//! |------|---------------|
//! | `quarterly` | Jan 1, Apr 1, Jul 1, Oct 1 |
//! | `semi_annual` | Jan 1, Jul 1 |
//! | `annual` | Jan 1 |
//!
//! All periods are UTC. Nothing here runs on a timer: callers ask whether a
//! kind is due and then decide to generate.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{SnapshotKind, SnapshotMetadata};

/// Start of the calendar period containing `now`.
///
/// Returns `None` for [`SnapshotKind::Manual`], which has no period.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use health_snapshots::schedule::period_start;
/// use health_snapshots::storage::SnapshotKind;
///
/// let now = Utc.with_ymd_and_hms(2026, 8, 14, 9, 30, 0).unwrap();
/// let start = period_start(SnapshotKind::Quarterly, now).unwrap();
/// assert_eq!(start, Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap());
/// ```
#[must_use]
pub fn period_start(kind: SnapshotKind, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let months_per_period = match kind {
        SnapshotKind::Manual => return None,
        SnapshotKind::Quarterly => 3,
        SnapshotKind::SemiAnnual => 6,
        SnapshotKind::Annual => 12,
    };
    let month = now.month0() / months_per_period * months_per_period + 1;
    Utc.with_ymd_and_hms(now.year(), month, 1, 0, 0, 0).single()
}

/// Returns true if a snapshot of `kind` should be generated at `now`.
///
/// Manual snapshots are always allowed. A periodic kind is due unless
/// `existing` already holds a snapshot of that kind captured at or after the
/// current period start.
#[must_use]
pub fn should_generate(existing: &[SnapshotMetadata], kind: SnapshotKind, now: DateTime<Utc>) -> bool {
    period_start(kind, now).is_none_or(|start| latest_in_period(existing, kind, start).is_none())
}

/// Periodic kinds that are due at `now`.
#[must_use]
pub fn due_kinds(existing: &[SnapshotMetadata], now: DateTime<Utc>) -> Vec<SnapshotKind> {
    SnapshotKind::PERIODIC
        .into_iter()
        .filter(|kind| should_generate(existing, *kind, now))
        .collect()
}

/// Schedule state of one periodic kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleStatus {
    /// The periodic kind.
    pub kind: SnapshotKind,
    /// Start of the current period.
    pub period_start: DateTime<Utc>,
    /// No snapshot of this kind exists in the current period.
    pub due: bool,
    /// Capture time of the newest snapshot in the current period.
    pub captured_in_period: Option<DateTime<Utc>>,
}

/// Schedule state for each requested periodic kind.
///
/// Manual kinds are ignored.
#[must_use]
pub fn schedule_status(
    existing: &[SnapshotMetadata],
    kinds: &[SnapshotKind],
    now: DateTime<Utc>,
) -> Vec<ScheduleStatus> {
    kinds
        .iter()
        .filter_map(|&kind| {
            let start = period_start(kind, now)?;
            let captured_in_period = latest_in_period(existing, kind, start);
            Some(ScheduleStatus {
                kind,
                period_start: start,
                due: captured_in_period.is_none(),
                captured_in_period,
            })
        })
        .collect()
}

fn latest_in_period(
    existing: &[SnapshotMetadata],
    kind: SnapshotKind,
    start: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    existing
        .iter()
        .filter(|s| s.kind == kind && s.captured_at >= start)
        .map(|s| s.captured_at)
        .max()
}
