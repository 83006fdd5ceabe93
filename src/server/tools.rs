//! Tool definitions with rmcp macros.
//!
//! `#[tool_router]` on the impl collects the six snapshot tools and
//! `#[tool_handler]` wires them into [`ServerHandler`]. Each tool delegates to
//! a function in [`super::handlers`] and wraps the outcome as JSON text.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData, ServerHandler};

use super::handlers;
use super::requests::{
    SnapshotCompareRequest, SnapshotDeleteRequest, SnapshotGenerateRequest, SnapshotGetRequest,
    SnapshotListRequest, SnapshotScheduleRequest,
};
use super::responses::into_tool_result;
use super::types::AppState;

const INSTRUCTIONS: &str = "Health office metrics snapshots. Capture aggregate demographics \
with snapshot_generate, browse with snapshot_list and snapshot_get, compare two snapshots \
with snapshot_compare and check which periodic snapshots are due with snapshot_schedule. \
Snapshots hold counts only, never patient records.";

/// MCP server exposing the snapshot tools.
#[derive(Clone)]
pub struct SnapshotServer {
    state: Arc<AppState>,
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for SnapshotServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotServer")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[tool_router]
impl SnapshotServer {
    /// Create a new server over shared state.
    #[must_use]
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    /// The shared state.
    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    #[tool(
        name = "snapshot_generate",
        description = "Capture a snapshot of aggregate demographics: kind=manual/quarterly/semi_annual/annual, role=admin/staff/system. only_if_due skips kinds already captured this period."
    )]
    async fn snapshot_generate(
        &self,
        Parameters(req): Parameters<SnapshotGenerateRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(into_tool_result(
            handlers::generate(self.state.service.as_ref(), req).await,
        ))
    }

    #[tool(
        name = "snapshot_list",
        description = "List snapshots most recent first, without metrics. Optional kind, since and until filters."
    )]
    async fn snapshot_list(
        &self,
        Parameters(req): Parameters<SnapshotListRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(into_tool_result(
            handlers::list(self.state.service.as_ref(), req).await,
        ))
    }

    #[tool(
        name = "snapshot_get",
        description = "Load one snapshot with its full metrics bundle."
    )]
    async fn snapshot_get(
        &self,
        Parameters(req): Parameters<SnapshotGetRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(into_tool_result(
            handlers::get(self.state.service.as_ref(), req).await,
        ))
    }

    #[tool(
        name = "snapshot_delete",
        description = "Delete a snapshot. Admin role only."
    )]
    async fn snapshot_delete(
        &self,
        Parameters(req): Parameters<SnapshotDeleteRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(into_tool_result(
            handlers::delete(self.state.service.as_ref(), req).await,
        ))
    }

    #[tool(
        name = "snapshot_compare",
        description = "Compare two snapshots: per-metric change, percent change and direction, plus an increased/decreased/unchanged summary."
    )]
    async fn snapshot_compare(
        &self,
        Parameters(req): Parameters<SnapshotCompareRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(into_tool_result(
            handlers::compare(self.state.service.as_ref(), req).await,
        ))
    }

    #[tool(
        name = "snapshot_schedule",
        description = "Show which periodic snapshot kinds are due in the current calendar period."
    )]
    async fn snapshot_schedule(
        &self,
        Parameters(req): Parameters<SnapshotScheduleRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(into_tool_result(
            handlers::schedule(self.state.service.as_ref(), req).await,
        ))
    }
}

#[tool_handler]
impl ServerHandler for SnapshotServer {
    #[allow(clippy::field_reassign_with_default)]
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info = Implementation::from_build_env();
        info.server_info.name = env!("CARGO_PKG_NAME").to_string();
        info.server_info.version = env!("CARGO_PKG_VERSION").to_string();
        info.instructions = Some(INSTRUCTIONS.to_string());
        info
    }
}
