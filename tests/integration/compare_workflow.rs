//! Comparison workflow: generate → change source → generate → compare.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use std::sync::Arc;

use health_snapshots::bundle::MetricsBundle;
use health_snapshots::collector::SqliteDemographicsCollector;
use health_snapshots::differ::{CompareOptions, Direction, SkipReason};
use health_snapshots::error::{AppError, ComparisonError};
use health_snapshots::policy::{Actor, Role};
use health_snapshots::storage::SnapshotKind;
use health_snapshots::traits::SnapshotRepository;
use pretty_assertions::assert_eq;
use serial_test::serial;
use tempfile::TempDir;

use super::support::{at, baseline_bundle, create_store, service, ManualClock, SourceDb, StaticCollector};

#[tokio::test]
#[serial]
async fn test_quarter_over_quarter_growth() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(at(2026, 3, 31));
    let source = SourceDb::create(&dir).await;
    source.add(300, "F", "1990-06-01", "North").await;
    source.add(200, "M", "1990-06-01", "South").await;

    let collector = SqliteDemographicsCollector::connect(&source.path)
        .await
        .unwrap()
        .with_clock(clock.clone());
    let store: Arc<dyn SnapshotRepository> = Arc::new(create_store(&dir, clock.clone()).await);
    let service = service(store, Arc::new(collector), clock.clone());
    let system = Actor::system();

    let q1 = service
        .generate(&system, SnapshotKind::Quarterly, None)
        .await
        .unwrap();

    source.add(30, "F", "1990-06-01", "North").await;
    source.add(10, "M", "1990-06-01", "South").await;
    clock.set(at(2026, 6, 30));

    let q2 = service
        .generate(&system, SnapshotKind::Quarterly, None)
        .await
        .unwrap();

    let result = service.compare(q1.id(), q2.id(), None).await.unwrap();
    assert_eq!(result.before.id, q1.id());
    assert_eq!(result.after.id, q2.id());

    let total = result.scalar("total_patients").unwrap();
    assert_eq!((total.before, total.after, total.change), (500, 540, 40));
    assert_eq!(total.change_percent, Some(8.0));
    assert_eq!(total.direction, Direction::Increase);

    let north = result.category("by_district", "North").unwrap();
    assert_eq!(north.change, 30);
    assert_eq!(north.change_percent, Some(10.0));

    let south = result.category("by_district", "South").unwrap();
    assert_eq!(south.change_percent, Some(5.0));

    let unspecified = result.category("by_sex", "unspecified").unwrap();
    assert_eq!(unspecified.direction, Direction::NoChange);
    assert_eq!(unspecified.change_percent, Some(0.0));

    // total, female, male, 25-44, North, South grew; the other sex and age
    // labels stayed at zero.
    assert_eq!(result.summary.increased, 6);
    assert_eq!(result.summary.decreased, 0);
    assert_eq!(result.summary.unchanged, 7);
    assert!(result.skipped.is_empty());
}

#[tokio::test]
#[serial]
async fn test_reverse_comparison_flips_direction() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(at(2026, 1, 1));
    let collector = StaticCollector::new(baseline_bundle());
    let store: Arc<dyn SnapshotRepository> = Arc::new(create_store(&dir, clock.clone()).await);
    let service = service(store, collector.clone(), clock.clone());
    let admin = Actor::new("admin", Role::Admin);

    let before = service
        .generate(&admin, SnapshotKind::Manual, None)
        .await
        .unwrap();
    collector.set(
        MetricsBundle::new()
            .with_scalar("total_patients", 450)
            .with_categorical("by_district", [("North", 250), ("South", 200)]),
    );
    let after = service
        .generate(&admin, SnapshotKind::Manual, None)
        .await
        .unwrap();

    let forward = service.compare(before.id(), after.id(), None).await.unwrap();
    let backward = service.compare(after.id(), before.id(), None).await.unwrap();

    let f = forward.scalar("total_patients").unwrap();
    let b = backward.scalar("total_patients").unwrap();
    assert_eq!(f.change, -50);
    assert_eq!(f.change_percent, Some(-10.0));
    assert_eq!(b.change, 50);
    assert_eq!(b.direction, f.direction.flipped());
    assert_eq!(forward.summary.decreased, backward.summary.increased);

    // Comparing again gives an identical result
    let again = service.compare(before.id(), after.id(), None).await.unwrap();
    assert_eq!(again, forward);
}

#[tokio::test]
#[serial]
async fn test_new_district_has_no_percentage() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(at(2026, 1, 1));
    let collector = StaticCollector::new(baseline_bundle());
    let store: Arc<dyn SnapshotRepository> = Arc::new(create_store(&dir, clock.clone()).await);
    let service = service(store, collector.clone(), clock);
    let admin = Actor::new("admin", Role::Admin);

    let before = service
        .generate(&admin, SnapshotKind::Manual, None)
        .await
        .unwrap();
    collector.set(
        MetricsBundle::new()
            .with_scalar("total_patients", 520)
            .with_categorical("by_district", [("East", 20), ("North", 300), ("South", 200)]),
    );
    let after = service
        .generate(&admin, SnapshotKind::Manual, None)
        .await
        .unwrap();

    let result = service.compare(before.id(), after.id(), None).await.unwrap();
    let east = result.category("by_district", "East").unwrap();
    assert_eq!((east.before, east.after), (0, 20));
    assert!(east.new_metric);
    assert_eq!(east.change_percent, None);

    let json = serde_json::to_value(&result).unwrap();
    let labels: Vec<&String> = json["deltas"]["by_district"]
        .as_object()
        .unwrap()
        .keys()
        .collect();
    assert_eq!(labels.len(), 3);
    assert!(json["deltas"]["by_district"]["East"]["change_percent"].is_null());
}

#[tokio::test]
#[serial]
async fn test_structural_mismatch_strict_and_partial() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(at(2026, 1, 1));
    let collector = StaticCollector::new(baseline_bundle());
    let store: Arc<dyn SnapshotRepository> = Arc::new(create_store(&dir, clock.clone()).await);
    let service = service(store, collector.clone(), clock);
    let admin = Actor::new("admin", Role::Admin);

    let before = service
        .generate(&admin, SnapshotKind::Manual, None)
        .await
        .unwrap();
    collector.set(
        MetricsBundle::new()
            .with_scalar("total_patients", 510)
            .with_scalar("by_district", 2)
            .with_scalar("visits", 90),
    );
    let after = service
        .generate(&admin, SnapshotKind::Manual, None)
        .await
        .unwrap();

    let err = service
        .compare(before.id(), after.id(), None)
        .await
        .unwrap_err();
    match err {
        AppError::Comparison(ComparisonError::StructuralMismatch {
            only_in_before,
            only_in_after,
            kind_mismatch,
        }) => {
            assert!(only_in_before.is_empty());
            assert_eq!(only_in_after, vec!["visits".to_string()]);
            assert_eq!(kind_mismatch, vec!["by_district".to_string()]);
        }
        other => unreachable!("expected structural mismatch, got {other:?}"),
    }

    let partial = service
        .compare(
            before.id(),
            after.id(),
            Some(CompareOptions {
                allow_structural_mismatch: true,
            }),
        )
        .await
        .unwrap();
    assert_eq!(partial.deltas.len(), 1);
    assert_eq!(partial.scalar("total_patients").unwrap().change, 10);
    let reasons: Vec<(&str, SkipReason)> = partial
        .skipped
        .iter()
        .map(|s| (s.name.as_str(), s.reason))
        .collect();
    assert_eq!(
        reasons,
        vec![
            ("by_district", SkipReason::KindMismatch),
            ("visits", SkipReason::OnlyInAfter),
        ]
    );
}
