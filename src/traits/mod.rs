//! Trait definitions for mockable dependencies.
//!
//! This module defines traits for:
//! - [`SnapshotRepository`]: Snapshot persistence abstraction
//! - [`AggregateCollector`]: Source of the current metrics bundle
//! - [`TimeProvider`]: Time abstraction for testing
//!
//! # Mocking
//!
//! All traits are annotated with `#[cfg_attr(test, mockall::automock)]`
//! which generates mock implementations automatically for testing.
//!
//! # Example
//!
//! ```
//! use health_snapshots::traits::{TimeProvider, RealTimeProvider};
//!
//! let time_provider = RealTimeProvider;
//! let now = time_provider.now();
//! println!("Current time: {now}");
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::bundle::MetricsBundle;
use crate::error::{CollectorError, StorageError};
use crate::storage::{Snapshot, SnapshotFilter, SnapshotId, SnapshotKind, SnapshotMetadata};

/// Snapshot repository trait for mocking.
///
/// Snapshots are write-once: there is no update operation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Persist a new snapshot and return its stored metadata.
    ///
    /// The repository assigns the id and `captured_at`. The snapshot is
    /// visible to `list` and `get` as soon as this returns.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] if the store is unreachable or
    /// not provisioned.
    async fn insert(
        &self,
        kind: SnapshotKind,
        notes: Option<String>,
        created_by: Option<String>,
        metrics: &MetricsBundle,
    ) -> Result<SnapshotMetadata, StorageError>;

    /// Persist a new snapshot and return its identifier.
    ///
    /// # Errors
    ///
    /// Same as [`SnapshotRepository::insert`].
    async fn save(
        &self,
        kind: SnapshotKind,
        notes: Option<String>,
        created_by: Option<String>,
        metrics: MetricsBundle,
    ) -> Result<SnapshotId, StorageError> {
        let metadata = self.insert(kind, notes, created_by, &metrics).await?;
        Ok(metadata.id)
    }

    /// Most recent snapshots first, without metrics payloads.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the database operation fails.
    async fn list(&self, limit: u32) -> Result<Vec<SnapshotMetadata>, StorageError>;

    /// Like [`SnapshotRepository::list`], restricted by kind and time range.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the database operation fails.
    async fn list_filtered(
        &self,
        filter: &SnapshotFilter,
    ) -> Result<Vec<SnapshotMetadata>, StorageError>;

    /// Load a snapshot including its metrics.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::SnapshotNotFound`] if no snapshot has this id.
    async fn get(&self, id: SnapshotId) -> Result<Snapshot, StorageError>;

    /// Permanently remove a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::SnapshotNotFound`] if no snapshot has this id,
    /// including when it was already deleted.
    async fn delete(&self, id: SnapshotId) -> Result<(), StorageError>;
}

/// Aggregate collector trait for mocking.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AggregateCollector: Send + Sync {
    /// Compute the current metrics bundle from live data.
    ///
    /// An empty source yields zero-valued metrics, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::DataUnavailable`] if the source cannot be
    /// queried at all.
    async fn collect(&self) -> Result<MetricsBundle, CollectorError>;
}

/// Time provider trait for mocking.
///
/// This trait abstracts time operations to allow for
/// deterministic testing with controlled time values.
#[cfg_attr(test, mockall::automock)]
pub trait TimeProvider: Send + Sync {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Real time provider using system clock.
///
/// This is the production implementation that returns the actual current time.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealTimeProvider;

impl TimeProvider for RealTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Shared handle to a time provider.
pub type SharedTimeProvider = Arc<dyn TimeProvider>;

#[async_trait]
impl<T: SnapshotRepository + ?Sized> SnapshotRepository for Arc<T> {
    async fn insert(
        &self,
        kind: SnapshotKind,
        notes: Option<String>,
        created_by: Option<String>,
        metrics: &MetricsBundle,
    ) -> Result<SnapshotMetadata, StorageError> {
        self.as_ref().insert(kind, notes, created_by, metrics).await
    }

    async fn list(&self, limit: u32) -> Result<Vec<SnapshotMetadata>, StorageError> {
        self.as_ref().list(limit).await
    }

    async fn list_filtered(
        &self,
        filter: &SnapshotFilter,
    ) -> Result<Vec<SnapshotMetadata>, StorageError> {
        self.as_ref().list_filtered(filter).await
    }

    async fn get(&self, id: SnapshotId) -> Result<Snapshot, StorageError> {
        self.as_ref().get(id).await
    }

    async fn delete(&self, id: SnapshotId) -> Result<(), StorageError> {
        self.as_ref().delete(id).await
    }
}

#[async_trait]
impl<T: AggregateCollector + ?Sized> AggregateCollector for Arc<T> {
    async fn collect(&self) -> Result<MetricsBundle, CollectorError> {
        self.as_ref().collect().await
    }
}
