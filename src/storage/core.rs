//! Core `SQLite` storage implementation.
//!
//! This module provides the main [`SqliteSnapshotStore`] struct, pool setup,
//! migrations, and the error classification shared by all queries.

#![allow(clippy::missing_errors_doc)]

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::error::StorageError;
use crate::traits::{RealTimeProvider, SharedTimeProvider};

/// Options controlling how the store is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Run embedded migrations after connecting.
    pub auto_migrate: bool,
    /// Maximum pooled connections.
    pub max_connections: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            auto_migrate: true,
            max_connections: 5,
        }
    }
}

/// `SQLite` snapshot store.
///
/// Provides persistent, write-once storage for metrics snapshots.
#[derive(Clone)]
pub struct SqliteSnapshotStore {
    pub(crate) pool: SqlitePool,
    pub(crate) clock: SharedTimeProvider,
}

impl std::fmt::Debug for SqliteSnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSnapshotStore")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl SqliteSnapshotStore {
    /// Get a clone of the connection pool.
    #[must_use]
    pub fn get_pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    /// Open (and by default migrate) a store at the given path.
    ///
    /// # Arguments
    ///
    /// * `database_path` - Path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ConnectionFailed`] if the connection fails.
    pub async fn new(database_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::open(database_path, StoreOptions::default()).await
    }

    /// Open a store with explicit options.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ConnectionFailed`] if the connection fails, or
    /// [`StorageError::MigrationFailed`] if a migration cannot be applied.
    pub async fn open(
        database_path: impl AsRef<Path>,
        options: StoreOptions,
    ) -> Result<Self, StorageError> {
        let path = database_path.as_ref();

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::ConnectionFailed {
                message: format!("Failed to create database directory: {e}"),
            })?;
        }

        let connect_options =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", path.display()))
                .map_err(|e| StorageError::ConnectionFailed {
                    message: format!("Invalid database path: {e}"),
                })?
                .journal_mode(SqliteJournalMode::Wal)
                .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(options.max_connections)
            .connect_with(connect_options)
            .await
            .map_err(|e| StorageError::ConnectionFailed {
                message: format!("Failed to connect to database: {e}"),
            })?;

        tracing::debug!(path = %path.display(), "snapshot store connected");
        Self::from_pool(pool, options.auto_migrate).await
    }

    /// Create a new in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ConnectionFailed`] if the connection fails.
    pub async fn new_in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StorageError::ConnectionFailed {
                message: format!("Invalid memory database options: {e}"),
            })?
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionFailed {
                message: format!("Failed to create in-memory database: {e}"),
            })?;

        Self::from_pool(pool, true).await
    }

    /// Wrap an existing pool.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::MigrationFailed`] if `migrate` is set and a
    /// migration fails.
    pub async fn from_pool(pool: SqlitePool, migrate: bool) -> Result<Self, StorageError> {
        let storage = Self {
            pool,
            clock: Arc::new(RealTimeProvider),
        };
        if migrate {
            storage.run_migrations().await?;
        }
        Ok(storage)
    }

    /// Replace the clock used to stamp `captured_at`.
    #[must_use]
    pub fn with_clock(mut self, clock: SharedTimeProvider) -> Self {
        self.clock = clock;
        self
    }

    /// Run database migrations.
    ///
    /// Each migration is idempotent (uses IF NOT EXISTS).
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        let schema_001 = include_str!("../../migrations/001_snapshots.sql");
        sqlx::query(schema_001)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::MigrationFailed {
                version: "001".to_string(),
                message: format!("Failed to run migration 001: {e}"),
            })?;

        Ok(())
    }

    /// Returns true if the `snapshots` table exists.
    pub async fn is_provisioned(&self) -> Result<bool, StorageError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'snapshots'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Self::query_error("SELECT sqlite_master", &e))?;
        Ok(count > 0)
    }

    /// Close the pool. Later operations fail with [`StorageError::Unavailable`].
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Format a timestamp for storage.
    ///
    /// Fixed-width UTC text, so lexical order equals chronological order.
    pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Parse a datetime string from the database.
    pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StorageError> {
        s.parse::<DateTime<Utc>>()
            .map_err(|e| StorageError::Internal {
                message: format!("Failed to parse datetime '{s}': {e}"),
            })
    }

    /// Classify a query failure.
    ///
    /// A missing `snapshots` table, a closed pool, or an I/O failure means the
    /// store is unavailable; everything else is a plain query failure.
    pub(crate) fn query_error(query: &str, err: &sqlx::Error) -> StorageError {
        match err {
            sqlx::Error::Database(db) if db.message().contains("no such table") => {
                StorageError::Unavailable {
                    message: format!("snapshot storage is not provisioned: {}", db.message()),
                }
            }
            sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
                StorageError::Unavailable {
                    message: format!("{query}: {err}"),
                }
            }
            _ => StorageError::QueryFailed {
                query: query.to_string(),
                message: err.to_string(),
            },
        }
    }
}
