//! MCP server implementation.
//!
//! This module provides:
//! - Tool definitions with rmcp macros
//! - Request parsing and JSON responses
//! - Stdio transport
//!
//! # Tools
//!
//! | Tool | Purpose |
//! |------|---------|
//! | `snapshot_generate` | Capture aggregate metrics (staff, admin, system) |
//! | `snapshot_list` | Browse snapshot metadata |
//! | `snapshot_get` | Load one snapshot with metrics |
//! | `snapshot_delete` | Remove a snapshot (admin) |
//! | `snapshot_compare` | Diff two snapshots |
//! | `snapshot_schedule` | Periodic kinds due now |
//!
//! Failed tools return an error result whose text is an
//! [`ErrorReport`](crate::error::ErrorReport).
//!
//! # Example
//!
//! ```no_run
//! use health_snapshots::config::Config;
//! use health_snapshots::server::McpServer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let server = McpServer::new(Config::from_env()?);
//! server.run_stdio().await?;
//! # Ok(())
//! # }
//! ```

pub mod handlers;
mod mcp;
mod requests;
mod responses;
mod tools;
mod transport;
mod types;

pub use mcp::McpServer;
pub use requests::{
    SnapshotCompareRequest, SnapshotDeleteRequest, SnapshotGenerateRequest, SnapshotGetRequest,
    SnapshotListRequest, SnapshotScheduleRequest,
};
pub use responses::{DeleteResponse, GenerateResponse, ListResponse, ScheduleResponse};
pub use tools::SnapshotServer;
pub use transport::StdioTransport;
pub use types::AppState;
