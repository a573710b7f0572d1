//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use revoice_core::Orchestrator;

use crate::config::Config;

/// State shared across all HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Handle over the task store, the conversion engine and the work root.
    pub tasks: Arc<Orchestrator>,
}
