//! HTTP server core implementation

use crate::config::Config;
use crate::gateway::{GatewayContext, TracingSink};
use crate::metrics::{spawn_refresh_loop, GateMetrics};
use crate::server::routes;
use crate::server::state::AppState;
use crate::storage::RedisPool;
use crate::utils::error::{GatewayError, Result};
use actix_web::{
    middleware::{DefaultHeaders, Logger},
    web, App, HttpServer as ActixHttpServer,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// HTTP server for the ingestion gateway
pub struct HttpServer {
    config: Config,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server: connect (or degrade) the cache, build the
    /// metrics registry and the gateway context.
    pub async fn new(config: Config) -> Result<Self> {
        info!("Creating ingestion gateway");

        let cache = RedisPool::connect(&config.redis).await;
        let metrics = Arc::new(GateMetrics::new()?);
        let context = GatewayContext::new(&config, cache, metrics, Box::new(TracingSink));
        let state = AppState::new(config.clone(), context);

        Ok(Self { config, state })
    }

    /// Start the server and the background gauge-refresh loop
    pub async fn start(self) -> Result<()> {
        let bind_addr = format!("{}:{}", self.config.server.host, self.config.server.port);
        info!("Starting HTTP server on {}", bind_addr);

        let refresh = spawn_refresh_loop(
            self.state.context.metrics.clone(),
            self.state.context.cache.clone(),
            Duration::from_secs(self.config.metrics.refresh_interval_secs),
        );

        let state = web::Data::new(self.state);
        let server = ActixHttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .wrap(Logger::default())
                .wrap(DefaultHeaders::new().add(("Server", "canarygate")))
                .configure(routes::configure_routes)
        })
        .bind(&bind_addr)
        .map_err(|e| GatewayError::internal(format!("Failed to bind {}: {}", bind_addr, e)))?
        .run();

        info!("HTTP server listening on {}", bind_addr);
        let result = server
            .await
            .map_err(|e| GatewayError::internal(format!("Server error: {}", e)));

        refresh.stop().await;
        info!("HTTP server stopped");
        result
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}
