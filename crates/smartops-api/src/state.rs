//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use smartops_action::CommandOrchestrator;
use smartops_core::config::SmartOpsConfig;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration, fixed for the lifetime of the server.
    pub config: Arc<SmartOpsConfig>,
    /// The command pipeline, including the job table and operation log.
    pub orchestrator: Arc<CommandOrchestrator>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: SmartOpsConfig, orchestrator: Arc<CommandOrchestrator>) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator,
            start_time: Instant::now(),
        }
    }
}
