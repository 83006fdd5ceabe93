//! Shared fixtures for workflow tests.

#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use health_snapshots::bundle::MetricsBundle;
use health_snapshots::error::CollectorError;
use health_snapshots::service::{DynSnapshotService, ServiceOptions};
use health_snapshots::storage::SqliteSnapshotStore;
use health_snapshots::traits::{AggregateCollector, SnapshotRepository, TimeProvider};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tempfile::TempDir;

/// Midnight UTC on the given date.
pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// Clock that tests can move forward.
#[derive(Debug)]
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self(Mutex::new(now)))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.0.lock().unwrap() = now;
    }
}

impl TimeProvider for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Collector returning whatever bundle the test last set.
#[derive(Debug)]
pub struct StaticCollector(Mutex<MetricsBundle>);

impl StaticCollector {
    pub fn new(bundle: MetricsBundle) -> Arc<Self> {
        Arc::new(Self(Mutex::new(bundle)))
    }

    pub fn set(&self, bundle: MetricsBundle) {
        *self.0.lock().unwrap() = bundle;
    }
}

#[async_trait]
impl AggregateCollector for StaticCollector {
    async fn collect(&self) -> Result<MetricsBundle, CollectorError> {
        Ok(self.0.lock().unwrap().clone())
    }
}

/// A health office database with a `patients` table.
pub struct SourceDb {
    pub path: PathBuf,
    pool: SqlitePool,
}

impl SourceDb {
    pub async fn create(dir: &TempDir) -> Self {
        let path = dir.path().join("health_office.db");
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("Failed to create source database");
        sqlx::query(
            "CREATE TABLE patients (
                id INTEGER PRIMARY KEY,
                full_name TEXT,
                sex TEXT,
                birth_date TEXT,
                district TEXT
            )",
        )
        .execute(&pool)
        .await
        .expect("Failed to create patients table");
        Self { path, pool }
    }

    /// Insert `count` identical patients.
    pub async fn add(&self, count: usize, sex: &str, birth_date: &str, district: &str) {
        let mut tx = self.pool.begin().await.unwrap();
        for i in 0..count {
            sqlx::query(
                "INSERT INTO patients (full_name, sex, birth_date, district) VALUES (?, ?, ?, ?)",
            )
            .bind(format!("Patient {i}"))
            .bind(sex)
            .bind(birth_date)
            .bind(district)
            .execute(&mut *tx)
            .await
            .unwrap();
        }
        tx.commit().await.unwrap();
    }

    pub async fn count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM patients")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

/// File-backed snapshot store in `dir`.
pub async fn create_store(dir: &TempDir, clock: Arc<ManualClock>) -> SqliteSnapshotStore {
    SqliteSnapshotStore::new(dir.path().join("snapshots.db"))
        .await
        .expect("Failed to create snapshot store")
        .with_clock(clock)
}

/// Service over the given parts, sharing one clock.
pub fn service(
    repository: Arc<dyn SnapshotRepository>,
    collector: Arc<dyn AggregateCollector>,
    clock: Arc<ManualClock>,
) -> DynSnapshotService {
    DynSnapshotService::new(repository, collector, ServiceOptions::default()).with_clock(clock)
}

/// Two districts, 500 patients.
pub fn baseline_bundle() -> MetricsBundle {
    MetricsBundle::new()
        .with_scalar("total_patients", 500)
        .with_categorical("by_district", [("North", 300), ("South", 200)])
}
