//! `SnapshotRepository` implementation for `SqliteSnapshotStore`.

#![allow(clippy::missing_errors_doc)]

use async_trait::async_trait;

use crate::bundle::MetricsBundle;
use crate::error::StorageError;
use crate::traits::SnapshotRepository;

use super::core::SqliteSnapshotStore;
use super::types::{Snapshot, SnapshotFilter, SnapshotId, SnapshotKind, SnapshotMetadata};

#[async_trait]
impl SnapshotRepository for SqliteSnapshotStore {
    async fn insert(
        &self,
        kind: SnapshotKind,
        notes: Option<String>,
        created_by: Option<String>,
        metrics: &MetricsBundle,
    ) -> Result<SnapshotMetadata, StorageError> {
        self.insert_snapshot(kind, notes.as_deref(), created_by.as_deref(), metrics)
            .await
    }

    async fn list(&self, limit: u32) -> Result<Vec<SnapshotMetadata>, StorageError> {
        self.list_snapshots(&SnapshotFilter::latest(limit)).await
    }

    async fn list_filtered(
        &self,
        filter: &SnapshotFilter,
    ) -> Result<Vec<SnapshotMetadata>, StorageError> {
        self.list_snapshots(filter).await
    }

    async fn get(&self, id: SnapshotId) -> Result<Snapshot, StorageError> {
        self.get_snapshot(id)
            .await?
            .ok_or(StorageError::SnapshotNotFound {
                snapshot_id: id.get(),
            })
    }

    async fn delete(&self, id: SnapshotId) -> Result<(), StorageError> {
        self.delete_snapshot(id).await
    }
}
