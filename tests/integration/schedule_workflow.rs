//! Schedule workflow: periodic kinds are generated at most once per period.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use health_snapshots::policy::Actor;
use health_snapshots::storage::SnapshotKind;
use health_snapshots::traits::SnapshotRepository;
use serial_test::serial;
use tempfile::TempDir;

use super::support::{at, baseline_bundle, create_store, service, ManualClock, StaticCollector};

#[tokio::test]
#[serial]
async fn test_quarterly_generated_once_per_quarter() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(at(2026, 2, 10));
    let store: Arc<dyn SnapshotRepository> = Arc::new(create_store(&dir, clock.clone()).await);
    let service = service(
        store,
        StaticCollector::new(baseline_bundle()),
        clock.clone(),
    );
    let system = Actor::system();

    let first = service
        .generate_if_due(&system, SnapshotKind::Quarterly, None)
        .await
        .unwrap();
    assert!(first.is_some());

    clock.set(at(2026, 3, 31));
    let again = service
        .generate_if_due(&system, SnapshotKind::Quarterly, None)
        .await
        .unwrap();
    assert!(again.is_none());

    clock.set(at(2026, 4, 1));
    let next_quarter = service
        .generate_if_due(&system, SnapshotKind::Quarterly, None)
        .await
        .unwrap();
    assert!(next_quarter.is_some());

    assert_eq!(service.list(None).await.unwrap().len(), 2);
}

#[tokio::test]
#[serial]
async fn test_manual_snapshots_are_never_throttled() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(at(2026, 9, 9));
    let store: Arc<dyn SnapshotRepository> = Arc::new(create_store(&dir, clock.clone()).await);
    let service = service(store, StaticCollector::new(baseline_bundle()), clock);

    for _ in 0..3 {
        let generated = service
            .generate_if_due(&Actor::system(), SnapshotKind::Manual, None)
            .await
            .unwrap();
        assert!(generated.is_some());
    }
}

#[tokio::test]
#[serial]
async fn test_schedule_status_tracks_each_period() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(at(2026, 8, 20));
    let store: Arc<dyn SnapshotRepository> = Arc::new(create_store(&dir, clock.clone()).await);
    let service = service(
        store,
        StaticCollector::new(baseline_bundle()),
        clock.clone(),
    );

    // An annual snapshot from last year does not count for this year
    clock.set(at(2025, 12, 31));
    service
        .generate(&Actor::system(), SnapshotKind::Annual, None)
        .await
        .unwrap();
    clock.set(at(2026, 8, 20));
    let semi = service
        .generate(&Actor::system(), SnapshotKind::SemiAnnual, None)
        .await
        .unwrap();

    let statuses = service.schedule(&SnapshotKind::PERIODIC).await.unwrap();
    let due: Vec<(SnapshotKind, bool)> = statuses.iter().map(|s| (s.kind, s.due)).collect();
    assert_eq!(
        due,
        vec![
            (SnapshotKind::Quarterly, true),
            (SnapshotKind::SemiAnnual, false),
            (SnapshotKind::Annual, true),
        ]
    );

    let semi_status = &statuses[1];
    assert_eq!(semi_status.period_start, at(2026, 7, 1));
    assert_eq!(semi_status.captured_in_period, Some(semi.metadata.captured_at));
}
