//! Test utilities and mock factories.
//!
//! This module provides shared testing infrastructure:
//! - A fixed clock
//! - Mock factories for the collector
//! - Snapshot fixtures
//!
//! Only compiled for tests (`#[cfg(test)]`).

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{DateTime, TimeZone, Utc};

use crate::bundle::MetricsBundle;
use crate::error::CollectorError;
use crate::storage::{SnapshotId, SnapshotKind, SnapshotMetadata};
use crate::traits::{MockAggregateCollector, TimeProvider};

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl TimeProvider for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Midnight UTC on the given date.
#[must_use]
pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// The bundle used throughout the examples: 500 patients in two districts.
#[must_use]
pub fn sample_bundle() -> MetricsBundle {
    MetricsBundle::new()
        .with_scalar("total_patients", 500)
        .with_categorical("by_district", [("North", 300), ("South", 200)])
}

/// Metadata for a snapshot captured at `captured_at`.
#[must_use]
pub fn metadata(id: i64, kind: SnapshotKind, captured_at: DateTime<Utc>) -> SnapshotMetadata {
    SnapshotMetadata::new(SnapshotId(id), captured_at, kind)
}

/// Create a mock collector that always returns `bundle`.
#[must_use]
pub fn mock_collector(bundle: MetricsBundle) -> MockAggregateCollector {
    let mut mock = MockAggregateCollector::new();
    mock.expect_collect().returning(move || Ok(bundle.clone()));
    mock
}

/// Create a mock collector that always fails with `error`.
#[must_use]
pub fn mock_collector_error(error: CollectorError) -> MockAggregateCollector {
    let mut mock = MockAggregateCollector::new();
    mock.expect_collect().returning(move || Err(error.clone()));
    mock
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::AggregateCollector;

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock(date(2026, 4, 1));
        assert_eq!(clock.now(), date(2026, 4, 1));
    }

    #[tokio::test]
    async fn test_mock_collector_factories() {
        let ok = mock_collector(sample_bundle());
        assert_eq!(ok.collect().await.unwrap(), sample_bundle());

        let failing = mock_collector_error(CollectorError::DataUnavailable {
            message: "gone".into(),
        });
        assert!(failing.collect().await.is_err());
    }
}
