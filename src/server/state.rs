//! Application state shared across HTTP handlers

use crate::config::Config;
use crate::gateway::GatewayContext;
use std::sync::Arc;
use std::time::Instant;

/// HTTP server state shared across handlers
///
/// All shared resources live behind Arc; handlers never touch globals.
#[derive(Clone)]
pub struct AppState {
    /// Gateway configuration (shared read-only)
    pub config: Arc<Config>,
    /// Admission pipeline resources
    pub context: Arc<GatewayContext>,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Create a new AppState with shared resources
    pub fn new(config: Config, context: GatewayContext) -> Self {
        Self {
            config: Arc::new(config),
            context: Arc::new(context),
            started_at: Instant::now(),
        }
    }
}
