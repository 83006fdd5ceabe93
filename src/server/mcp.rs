//! Main MCP server orchestration.
//!
//! This module provides the main entry point for running the snapshot server.

use std::sync::Arc;

use crate::collector::SqliteDemographicsCollector;
use crate::config::Config;
use crate::error::AppError;
use crate::service::{DynSnapshotService, ServiceOptions};
use crate::storage::{SqliteSnapshotStore, StoreOptions};
use crate::traits::{AggregateCollector, SnapshotRepository};

use super::tools::SnapshotServer;
use super::transport::StdioTransport;
use super::types::AppState;

/// Main MCP server that orchestrates all components.
///
/// Opens the snapshot store and the read-only source database, then serves
/// the snapshot tools over stdio.
#[derive(Debug)]
pub struct McpServer {
    /// Server configuration.
    config: Config,
}

impl McpServer {
    /// Creates a new MCP server with the given configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Build the application state from configuration.
    ///
    /// The source database is opened lazily, so a missing source only fails
    /// the collections that need it.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot store cannot be opened or migrated, or
    /// if the source path is not a valid connection string.
    pub async fn build_state(&self) -> Result<AppState, AppError> {
        let store = SqliteSnapshotStore::open(
            &self.config.database_path,
            StoreOptions {
                auto_migrate: self.config.auto_migrate,
                ..StoreOptions::default()
            },
        )
        .await?;
        if !store.is_provisioned().await? {
            tracing::warn!(
                path = %self.config.database_path,
                "snapshot store has no schema; enable AUTO_MIGRATE or provision it"
            );
        }

        let collector = SqliteDemographicsCollector::open_lazy(&self.config.source_database_path)?;

        let repository: Arc<dyn SnapshotRepository> = Arc::new(store);
        let collector: Arc<dyn AggregateCollector> = Arc::new(collector);
        let service = DynSnapshotService::new(
            repository,
            collector,
            ServiceOptions::from_config(&self.config),
        );

        Ok(AppState::new(service, self.config.clone()))
    }

    /// Runs the server using stdio transport.
    ///
    /// This function initializes all components and starts serving requests
    /// over stdin/stdout. It blocks until the client disconnects or an error occurs.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Storage initialization fails
    /// - The source path is invalid
    /// - Server encounters a runtime error
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub async fn run_stdio(&self) -> Result<(), AppError> {
        let state = self.build_state().await?;
        let server = SnapshotServer::new(Arc::new(state));

        tracing::info!(
            database = %self.config.database_path,
            source = %self.config.source_database_path,
            "snapshot server listening on stdio"
        );

        let transport = StdioTransport::new();
        let running = transport.serve(server).await?;

        let reason = running.waiting().await.map_err(|e| {
            AppError::Mcp(crate::error::McpError::Internal {
                message: format!("Server task failed: {e}"),
            })
        })?;
        tracing::info!(?reason, "snapshot server stopped");

        Ok(())
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }
}
