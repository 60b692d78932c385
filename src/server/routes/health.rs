//! Health, readiness, and scrape endpoints

use crate::server::state::AppState;
use crate::metrics::DURABLE_EVENT_COUNTER_KEY;
use actix_web::{web, HttpResponse, Result as ActixResult};
use serde::Serialize;
use tracing::{debug, error};

/// Configure health and metrics routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/ready", web::get().to(ready))
        .route("/metrics", web::get().to(metrics));
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    version: &'static str,
    uptime_seconds: u64,
    components: Components,
}

#[derive(Debug, Serialize)]
struct Components {
    cache: &'static str,
    rate_limiter: RateLimiterInfo,
    dedup_ttl_sec: u64,
    durable_event_count: i64,
}

#[derive(Debug, Serialize)]
struct RateLimiterInfo {
    capacity: f64,
    refill: f64,
}

#[derive(Debug, Serialize)]
struct ReadyStatus {
    status: &'static str,
    cache: &'static str,
}

/// Liveness: reports per-component state but always answers 200
async fn health(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    debug!("Health check requested");
    let ctx = &state.context;

    let cache_status = if ctx.cache.is_noop() {
        "unavailable"
    } else if ctx.cache.health_check().await.is_ok() {
        "healthy"
    } else {
        "unhealthy"
    };

    let durable_event_count = ctx
        .cache
        .get_counter(DURABLE_EVENT_COUNTER_KEY)
        .await
        .unwrap_or(0);

    let status = HealthStatus {
        status: if cache_status == "healthy" {
            "healthy"
        } else {
            "degraded"
        },
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        components: Components {
            cache: cache_status,
            rate_limiter: RateLimiterInfo {
                capacity: ctx.rate_limiter.capacity(),
                refill: ctx.rate_limiter.refill_per_sec(),
            },
            dedup_ttl_sec: ctx.deduper.ttl_secs(),
            durable_event_count,
        },
    };

    Ok(HttpResponse::Ok().json(status))
}

/// Readiness: not ready while the durable cache is unreachable
async fn ready(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let cache_ok = state.context.cache.health_check().await.is_ok();
    let status = ReadyStatus {
        status: if cache_ok { "ready" } else { "not_ready" },
        cache: if cache_ok { "ok" } else { "fail" },
    };

    if cache_ok {
        Ok(HttpResponse::Ok().json(status))
    } else {
        Ok(HttpResponse::ServiceUnavailable().json(status))
    }
}

/// Prometheus text exposition of all gate metrics
async fn metrics(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    match state.context.metrics.render() {
        Ok(body) => Ok(HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4; charset=utf-8")
            .body(body)),
        Err(e) => {
            error!("Metrics encoding failed: {}", e);
            Ok(HttpResponse::InternalServerError().body("metrics unavailable"))
        }
    }
}
