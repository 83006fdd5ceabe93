//! Integration tests for the snapshot server.
//!
//! These tests verify end-to-end workflows including:
//! - Snapshot lifecycle against a file-backed source database
//! - Comparison of real snapshots
//! - Periodic schedule tracking
//! - Error recovery paths

mod compare_workflow;
mod error_recovery;
mod schedule_workflow;
mod support;
