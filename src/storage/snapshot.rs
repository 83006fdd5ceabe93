//! Snapshot storage operations.

#![allow(clippy::missing_errors_doc)]

use chrono::SubsecRound;
use sqlx::{QueryBuilder, Row, Sqlite};

use crate::bundle::MetricsBundle;
use crate::error::StorageError;
use crate::traits::TimeProvider;

use super::core::SqliteSnapshotStore;
use super::types::{Snapshot, SnapshotFilter, SnapshotId, SnapshotKind, SnapshotMetadata};

const METADATA_COLUMNS: &str = "id, captured_at, kind, notes, created_by";

impl SqliteSnapshotStore {
    /// Insert a snapshot and return its new id.
    ///
    /// The INSERT runs in its own transaction: if the future is dropped
    /// before commit, the transaction rolls back and nothing is visible.
    pub async fn insert_snapshot(
        &self,
        kind: SnapshotKind,
        notes: Option<&str>,
        created_by: Option<&str>,
        metrics: &MetricsBundle,
    ) -> Result<SnapshotMetadata, StorageError> {
        // Truncated to the stored precision so the returned metadata equals a later read.
        let captured_at = self.clock.now().trunc_subsecs(6);
        let captured_at_str = Self::format_datetime(&captured_at);
        let metrics_json = metrics.to_json().map_err(|e| StorageError::Internal {
            message: format!("Failed to encode metrics: {e}"),
        })?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Self::query_error("BEGIN", &e))?;

        let result = sqlx::query(
            "INSERT INTO snapshots (captured_at, kind, notes, created_by, metrics)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&captured_at_str)
        .bind(kind.as_str())
        .bind(notes)
        .bind(created_by)
        .bind(&metrics_json)
        .execute(&mut *tx)
        .await
        .map_err(|e| Self::query_error("INSERT snapshots", &e))?;

        tx.commit()
            .await
            .map_err(|e| Self::query_error("COMMIT", &e))?;

        let id = SnapshotId(result.last_insert_rowid());
        tracing::info!(snapshot_id = %id, kind = %kind, metrics = metrics.len(), "snapshot saved");

        let mut metadata = SnapshotMetadata::new(id, captured_at, kind);
        metadata.notes = notes.map(str::to_string);
        metadata.created_by = created_by.map(str::to_string);
        Ok(metadata)
    }

    /// Get a snapshot by ID, including metrics.
    pub async fn get_snapshot(&self, id: SnapshotId) -> Result<Option<Snapshot>, StorageError> {
        let row = sqlx::query(
            "SELECT id, captured_at, kind, notes, created_by, metrics
             FROM snapshots WHERE id = ?",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Self::query_error("SELECT snapshots", &e))?;

        match row {
            Some(row) => {
                let metadata = Self::row_to_metadata(&row)?;
                let metrics_json: String = row.get("metrics");
                let metrics =
                    MetricsBundle::from_json(&metrics_json).map_err(|e| StorageError::Internal {
                        message: format!("Failed to decode metrics of snapshot {id}: {e}"),
                    })?;
                Ok(Some(Snapshot { metadata, metrics }))
            }
            None => Ok(None),
        }
    }

    /// List snapshot metadata, newest first (ties by id descending).
    pub async fn list_snapshots(
        &self,
        filter: &SnapshotFilter,
    ) -> Result<Vec<SnapshotMetadata>, StorageError> {
        let mut builder: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new(format!("SELECT {METADATA_COLUMNS} FROM snapshots WHERE 1 = 1"));

        if let Some(kind) = filter.kind {
            builder.push(" AND kind = ").push_bind(kind.as_str());
        }
        if let Some(since) = filter.since {
            builder
                .push(" AND captured_at >= ")
                .push_bind(Self::format_datetime(&since));
        }
        if let Some(until) = filter.until {
            builder
                .push(" AND captured_at <= ")
                .push_bind(Self::format_datetime(&until));
        }
        builder
            .push(" ORDER BY captured_at DESC, id DESC LIMIT ")
            .push_bind(i64::from(filter.limit));

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::query_error("SELECT snapshots", &e))?;

        let mut snapshots = Vec::with_capacity(rows.len());
        for row in &rows {
            snapshots.push(Self::row_to_metadata(row)?);
        }

        tracing::debug!(count = snapshots.len(), limit = filter.limit, "snapshots listed");
        Ok(snapshots)
    }

    /// Delete a snapshot.
    pub async fn delete_snapshot(&self, id: SnapshotId) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM snapshots WHERE id = ?")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| Self::query_error("DELETE snapshots", &e))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::SnapshotNotFound {
                snapshot_id: id.get(),
            });
        }

        tracing::info!(snapshot_id = %id, "snapshot deleted");
        Ok(())
    }

    /// Convert a database row to `SnapshotMetadata`.
    fn row_to_metadata(row: &sqlx::sqlite::SqliteRow) -> Result<SnapshotMetadata, StorageError> {
        let id: i64 = row.get("id");
        let captured_at_str: String = row.get("captured_at");
        let kind_str: String = row.get("kind");
        let notes: Option<String> = row.get("notes");
        let created_by: Option<String> = row.get("created_by");

        let captured_at = Self::parse_datetime(&captured_at_str)?;
        let kind = SnapshotKind::from_str(&kind_str).ok_or_else(|| StorageError::Internal {
            message: format!("Unknown snapshot kind '{kind_str}' for snapshot {id}"),
        })?;

        Ok(SnapshotMetadata {
            id: SnapshotId(id),
            captured_at,
            kind,
            notes,
            created_by,
        })
    }
}
