//! Health Office Metrics Snapshots
//!
//! An MCP server that captures point-in-time aggregate demographics from a
//! health office patient database, stores them as immutable snapshots and
//! compares any two snapshots metric by metric.
//!
//! # Features
//!
//! - Aggregate-only collection: counts by sex, age bracket and district
//! - Write-once `SQLite` snapshot store
//! - Deterministic snapshot comparison with percent change and direction
//! - Quarterly, semi-annual and annual schedule tracking
//! - Role-based access for generate and delete; reads are open to all roles
//!
//! # Quick Start
//!
//! ```bash
//! SOURCE_DATABASE_PATH=./data/health_office.db ./health-snapshots
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     stdin      ┌─────────────────┐
//! │ MCP client  │───────────────▶│   MCP Server    │──────▶ source SQLite (read-only)
//! │             │◀───────────────│     (Rust)      │
//! └─────────────┘     stdout     └────────┬────────┘
//!                                         │
//!                                         ▼
//!                                  snapshot SQLite
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod bundle;
pub mod collector;
pub mod config;
pub mod differ;
pub mod error;
pub mod policy;
pub mod schedule;
pub mod server;
pub mod service;
pub mod storage;
pub mod traits;

#[cfg(test)]
mod test_utils;
