//! Server types and shared state.

use std::sync::Arc;

use crate::config::Config;
use crate::service::DynSnapshotService;

/// Shared application state for all tool handlers.
#[derive(Clone)]
pub struct AppState {
    /// The snapshot service.
    pub service: Arc<DynSnapshotService>,
    /// Server configuration.
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates a new application state.
    ///
    /// # Arguments
    ///
    /// * `service` - The snapshot service
    /// * `config` - Server configuration
    #[must_use]
    pub fn new(service: DynSnapshotService, config: Config) -> Self {
        Self {
            service: Arc::new(service),
            config: Arc::new(config),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
