//! Storage backend.
//!
//! This module provides:
//! - `SQLite` snapshot store implementation
//! - Write-once snapshot persistence
//! - Reverse-chronological listing with filters
//!
//! # Architecture
//!
//! The storage layer uses `SQLite` with the `sqlx` crate for async operations.
//! Ids come from `AUTOINCREMENT`, so concurrent saves never collide and
//! deleted ids are never reused. Each save is a single transaction.
//!
//! The implementation is split across submodules:
//! - `core`: Pool management, migrations, and helper functions
//! - `snapshot`: Snapshot CRUD operations
//! - `trait_impl`: `SnapshotRepository` implementation
//! - `types`: Stored types
//!
//! # Example
//!
//! ```ignore
//! use health_snapshots::storage::{SqliteSnapshotStore, SnapshotKind};
//! use health_snapshots::traits::SnapshotRepository;
//!
//! let store = SqliteSnapshotStore::new("./data/snapshots.db").await?;
//! let id = store.save(SnapshotKind::Manual, None, None, bundle).await?;
//! ```

mod core;
mod snapshot;
mod trait_impl;
mod types;

pub use self::core::{SqliteSnapshotStore, StoreOptions};
pub use types::{Snapshot, SnapshotFilter, SnapshotId, SnapshotKind, SnapshotMetadata};
