//! Transport layer for MCP server.
//!
//! Stdio is the only transport. Logs go to stderr so stdout stays reserved
//! for JSON-RPC frames.

use rmcp::service::{serve_server, RoleServer, RunningService};
use rmcp::transport::io::stdio;

use super::tools::SnapshotServer;
use crate::error::AppError;

/// Stdio transport handler.
#[derive(Debug, Default)]
pub struct StdioTransport;

impl StdioTransport {
    /// Creates a new stdio transport.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Start serving over stdin/stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if the MCP handshake fails.
    pub async fn serve(
        self,
        server: SnapshotServer,
    ) -> Result<RunningService<RoleServer, SnapshotServer>, AppError> {
        serve_server(server, stdio()).await.map_err(|e| {
            AppError::Mcp(crate::error::McpError::Internal {
                message: e.to_string(),
            })
        })
    }
}
