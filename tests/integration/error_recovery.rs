//! Error recovery and edge case tests.
//!
//! Tests how the system handles error conditions and recovers gracefully.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use health_snapshots::bundle::MetricsBundle;
use health_snapshots::collector::SqliteDemographicsCollector;
use health_snapshots::error::{
    AppError, ComparisonError, ErrorKind, ErrorReport, PolicyError, StorageError,
};
use health_snapshots::policy::{Actor, Role};
use health_snapshots::service::{DynSnapshotService, ServiceOptions};
use health_snapshots::storage::{
    Snapshot, SnapshotFilter, SnapshotId, SnapshotKind, SnapshotMetadata, SqliteSnapshotStore,
};
use health_snapshots::traits::SnapshotRepository;
use serial_test::serial;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection};
use tempfile::TempDir;

use super::support::{at, baseline_bundle, create_store, service, ManualClock, SourceDb, StaticCollector};

#[tokio::test]
#[serial]
async fn test_missing_source_saves_nothing() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(at(2026, 5, 1));
    let collector =
        SqliteDemographicsCollector::open_lazy(dir.path().join("not-there.db")).unwrap();
    let store: Arc<dyn SnapshotRepository> = Arc::new(create_store(&dir, clock.clone()).await);
    let service = service(store, Arc::new(collector), clock);

    let err = service
        .generate(&Actor::system(), SnapshotKind::Quarterly, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataUnavailable);
    assert!(!ErrorReport::from(&err).retryable);
    assert!(service.list(None).await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_source_created_after_startup() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(at(2026, 5, 1));
    let path = dir.path().join("health_office.db");
    let collector = SqliteDemographicsCollector::open_lazy(&path).unwrap();
    let store: Arc<dyn SnapshotRepository> = Arc::new(create_store(&dir, clock.clone()).await);
    let service = service(store, Arc::new(collector), clock);

    assert!(service
        .generate(&Actor::system(), SnapshotKind::Manual, None)
        .await
        .is_err());

    let source = SourceDb::create(&dir).await;
    assert_eq!(source.path, path);
    source.add(2, "F", "2000-01-01", "North").await;

    let snapshot = service
        .generate(&Actor::system(), SnapshotKind::Manual, None)
        .await
        .unwrap();
    assert_eq!(service.list(None).await.unwrap()[0].id, snapshot.id());
}

#[tokio::test]
#[serial]
async fn test_source_without_patients_table() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.db");
    {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .connect_with(
                sqlx::sqlite::SqliteConnectOptions::new()
                    .filename(&path)
                    .create_if_missing(true),
            )
            .await
            .unwrap();
        sqlx::query("CREATE TABLE visits (id INTEGER PRIMARY KEY)")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;
    }

    let clock = ManualClock::new(at(2026, 5, 1));
    let collector = SqliteDemographicsCollector::connect(&path).await.unwrap();
    let store: Arc<dyn SnapshotRepository> = Arc::new(create_store(&dir, clock.clone()).await);
    let service = service(store, Arc::new(collector), clock);

    let err = service
        .generate(&Actor::system(), SnapshotKind::Manual, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataUnavailable);
}

#[tokio::test]
#[serial]
async fn test_role_checks() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(at(2026, 5, 1));
    let store: Arc<dyn SnapshotRepository> = Arc::new(create_store(&dir, clock.clone()).await);
    let service = service(store, StaticCollector::new(baseline_bundle()), clock);

    let viewer = Actor::new("guest", Role::Viewer);
    let err = service
        .generate(&viewer, SnapshotKind::Manual, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Policy(PolicyError::Forbidden { ref action, .. }) if action == "generate"
    ));
    assert!(service.list(None).await.unwrap().is_empty());

    let staff = Actor::new("nurse", Role::Staff);
    let snapshot = service
        .generate(&staff, SnapshotKind::Manual, None)
        .await
        .unwrap();

    let err = service.delete(&staff, snapshot.id()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert!(service.get(snapshot.id()).await.is_ok());
}

#[tokio::test]
#[serial]
async fn test_delete_twice_is_not_found() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(at(2026, 5, 1));
    let store: Arc<dyn SnapshotRepository> = Arc::new(create_store(&dir, clock.clone()).await);
    let service = service(store, StaticCollector::new(baseline_bundle()), clock);
    let admin = Actor::new("admin", Role::Admin);

    let snapshot = service
        .generate(&admin, SnapshotKind::Manual, None)
        .await
        .unwrap();
    service.delete(&admin, snapshot.id()).await.unwrap();

    let err = service.delete(&admin, snapshot.id()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
#[serial]
async fn test_compare_same_or_missing_snapshot() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(at(2026, 5, 1));
    let store: Arc<dyn SnapshotRepository> = Arc::new(create_store(&dir, clock.clone()).await);
    let service = service(store, StaticCollector::new(baseline_bundle()), clock);

    // Same id is rejected before any lookup, even when it does not exist
    let err = service
        .compare(SnapshotId(77), SnapshotId(77), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Comparison(ComparisonError::SameSnapshot { snapshot_id: 77 })
    ));

    let snapshot = service
        .generate(&Actor::system(), SnapshotKind::Manual, None)
        .await
        .unwrap();
    let err = service
        .compare(snapshot.id(), SnapshotId(78), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
#[serial]
async fn test_closed_store_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(at(2026, 5, 1));
    let store = Arc::new(create_store(&dir, clock.clone()).await);
    let repository: Arc<dyn SnapshotRepository> = store.clone();
    let service = service(repository, StaticCollector::new(baseline_bundle()), clock);

    store.close().await;

    let err = service.list(None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
    let report = ErrorReport::from(&err);
    assert!(report.retryable);

    let err = service
        .generate(&Actor::system(), SnapshotKind::Manual, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
}

#[tokio::test]
#[serial]
async fn test_unprovisioned_store_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let store = SqliteSnapshotStore::open(
        dir.path().join("bare.db"),
        health_snapshots::storage::StoreOptions {
            auto_migrate: false,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(!store.is_provisioned().await.unwrap());

    let err = store
        .save(SnapshotKind::Manual, None, None, baseline_bundle())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StorageUnavailable);

    store.run_migrations().await.unwrap();
    assert!(store.is_provisioned().await.unwrap());
}

/// Store whose reads fail while writes still succeed.
struct WriteOnlyStore(SqliteSnapshotStore);

#[async_trait]
impl SnapshotRepository for WriteOnlyStore {
    async fn insert(
        &self,
        kind: SnapshotKind,
        notes: Option<String>,
        created_by: Option<String>,
        metrics: &MetricsBundle,
    ) -> Result<SnapshotMetadata, StorageError> {
        self.0.insert(kind, notes, created_by, metrics).await
    }

    async fn list(&self, limit: u32) -> Result<Vec<SnapshotMetadata>, StorageError> {
        self.0.list(limit).await
    }

    async fn list_filtered(
        &self,
        filter: &SnapshotFilter,
    ) -> Result<Vec<SnapshotMetadata>, StorageError> {
        self.0.list_filtered(filter).await
    }

    async fn get(&self, _id: SnapshotId) -> Result<Snapshot, StorageError> {
        Err(StorageError::Unavailable {
            message: "read failed".into(),
        })
    }

    async fn delete(&self, id: SnapshotId) -> Result<(), StorageError> {
        self.0.delete(id).await
    }
}

#[tokio::test]
#[serial]
async fn test_generate_succeeds_when_reads_fail() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(at(2026, 5, 20));
    let store = create_store(&dir, clock.clone()).await;
    let repo: Arc<dyn SnapshotRepository> = Arc::new(WriteOnlyStore(store.clone()));
    let service = service(repo, StaticCollector::new(baseline_bundle()), clock);

    let snapshot = service
        .generate_if_due(&Actor::system(), SnapshotKind::Quarterly, None)
        .await
        .unwrap()
        .expect("quarterly snapshot is due");
    assert_eq!(snapshot.metrics, baseline_bundle());
    assert_eq!(snapshot.metadata.captured_at, at(2026, 5, 20));

    let retry = service
        .generate_if_due(&Actor::system(), SnapshotKind::Quarterly, None)
        .await
        .unwrap();
    assert!(retry.is_none());
    assert_eq!(store.list(10).await.unwrap().len(), 1);
    assert_eq!(store.get(snapshot.id()).await.unwrap(), snapshot);
}

#[tokio::test]
#[serial]
async fn test_timed_out_save_leaves_nothing_visible() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(at(2026, 6, 1));
    let store = create_store(&dir, clock.clone()).await;

    // Hold the write lock so the INSERT blocks inside its transaction.
    let mut writer = SqliteConnectOptions::new()
        .filename(dir.path().join("snapshots.db"))
        .connect()
        .await
        .unwrap();
    sqlx::query("BEGIN IMMEDIATE")
        .execute(&mut writer)
        .await
        .unwrap();

    let options = ServiceOptions {
        timeout: Duration::from_millis(200),
        ..ServiceOptions::default()
    };
    let service = DynSnapshotService::new(
        Arc::new(store.clone()),
        StaticCollector::new(baseline_bundle()),
        options,
    )
    .with_clock(clock);

    let err = service
        .generate(&Actor::new("admin-1", Role::Admin), SnapshotKind::Manual, None)
        .await
        .unwrap_err();
    assert_eq!(err, AppError::Storage(StorageError::Timeout { timeout_ms: 200 }));
    assert!(ErrorReport::from(&err).retryable);

    sqlx::query("ROLLBACK").execute(&mut writer).await.unwrap();
    writer.close().await.unwrap();

    assert!(service.list(None).await.unwrap().is_empty());

    let snapshot = service
        .generate(&Actor::new("admin-1", Role::Admin), SnapshotKind::Manual, None)
        .await
        .unwrap();
    let listed = service.list(None).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, snapshot.id());
    assert_eq!(service.get(snapshot.id()).await.unwrap().metrics, baseline_bundle());
}
