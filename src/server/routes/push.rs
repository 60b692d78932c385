//! Push ingestion endpoint
//!
//! `POST /push/deployment?env=&service=&source=&commit=&id=` runs the full
//! admission pipeline synchronously in the request handler: bearer auth,
//! required-field validation, dedup, rate limit, then record. Duplicate
//! submissions are an idempotent success (`200 "dedup"`), not an error.

use crate::gateway::{mask_token, DeploymentEvent};
use crate::metrics::DURABLE_EVENT_COUNTER_KEY;
use crate::server::state::AppState;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError, Result as ActixResult};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Configure push routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // Registering only POST makes actix answer 405 for other methods here.
    cfg.service(web::resource("/push/deployment").route(web::post().to(push_deployment)));
}

/// Handle a pushed deployment event
pub async fn push_deployment(
    req: HttpRequest,
    query: web::Query<HashMap<String, String>>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let ctx = &state.context;

    // Auth first: nothing else about the request is trusted before this.
    let bearer = extract_bearer(&req);
    if !ctx.authorize(bearer.as_deref()) {
        let peer = req
            .connection_info()
            .peer_addr()
            .unwrap_or("unknown")
            .to_string();
        warn!(
            "Unauthorized push from {} (token: {})",
            peer,
            mask_token(bearer.as_deref().unwrap_or(""))
        );
        ctx.metrics.rejections.with_label_values(&["auth"]).inc();
        return Ok(HttpResponse::Unauthorized().body("unauthorized"));
    }

    let event = match DeploymentEvent::from_fields(
        query.get("env").map(String::as_str),
        query.get("service").map(String::as_str),
        query.get("source").map(String::as_str),
        query.get("commit").map(String::as_str),
        query.get("id").map(String::as_str),
    ) {
        Ok(event) => event,
        Err(e) => {
            ctx.metrics
                .rejections
                .with_label_values(&["validation"])
                .inc();
            return Ok(e.error_response());
        }
    };

    if ctx.deduper.dedupe(&event.id).await {
        debug!("Duplicate event {} dropped within dedup TTL", event.id);
        ctx.metrics.dedup_total.inc();
        return Ok(HttpResponse::Ok().body("dedup"));
    }

    if !ctx.rate_limiter.admit(&event.source, 1.0) {
        // The id was marked seen just above but the event is not recorded;
        // release it so a backoff retry is not dropped as a duplicate.
        ctx.deduper.forget(&event.id).await;
        ctx.metrics.rate_limited_total.inc();
        return Ok(HttpResponse::TooManyRequests().body("rate_limited"));
    }

    // Record: in-process counters always; the durable counter best-effort.
    ctx.metrics
        .record_event(&event.env, &event.service, &event.source, &event.commit);
    match ctx.cache.increment(DURABLE_EVENT_COUNTER_KEY, 1).await {
        Ok(count) => ctx.metrics.durable_events.set(count),
        Err(e) => warn!("Durable counter increment failed for {}: {}", event.id, e),
    }
    ctx.sink.emit(&event).await;

    Ok(HttpResponse::Ok().body("ok"))
}

fn extract_bearer(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::gateway::{GatewayContext, NoopSink};
    use crate::metrics::GateMetrics;
    use crate::storage::RedisPool;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use std::sync::Arc;

    fn test_state() -> AppState {
        let mut config = Config::default();
        config.auth.push_token = "secret".to_string();
        config.rate_limit.capacity = 3.0;
        config.rate_limit.refill_per_sec = 0.001;
        let cache = RedisPool::create_noop(&config.redis);
        let metrics = Arc::new(GateMetrics::new().unwrap());
        let context = GatewayContext::new(&config, cache, metrics, Box::new(NoopSink));
        AppState::new(config, context)
    }

    fn cached_state(capacity: f64) -> AppState {
        let mut config = Config::default();
        config.auth.push_token = "secret".to_string();
        config.rate_limit.capacity = capacity;
        config.rate_limit.refill_per_sec = 0.001;
        let cache = RedisPool::create_in_memory(&config.redis);
        let metrics = Arc::new(GateMetrics::new().unwrap());
        let context = GatewayContext::new(&config, cache, metrics, Box::new(NoopSink));
        AppState::new(config, context)
    }

    fn push_uri(id: &str) -> String {
        format!(
            "/push/deployment?env=prod&service=checkout&source=ci&commit=abc&id={}",
            id
        )
    }

    #[actix_web::test]
    async fn test_push_requires_auth() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post().uri(&push_uri("d1")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri(&push_uri("d1"))
            .insert_header(("Authorization", "Bearer wrong"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_push_records_event() {
        let state = test_state();
        let metrics = state.context.metrics.clone();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri(&push_uri("d1"))
            .insert_header(("Authorization", "Bearer secret"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "ok");
        assert_eq!(metrics.events_total.get(), 1);
    }

    #[actix_web::test]
    async fn test_missing_fields_returns_csv() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/push/deployment?service=checkout&commit=abc")
            .insert_header(("Authorization", "Bearer secret"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(test::read_body(resp).await, "env,source,id");
    }

    #[actix_web::test]
    async fn test_rate_limit_exhaustion() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .configure(configure_routes),
        )
        .await;

        // Capacity 3 with negligible refill: the 4th distinct event is denied.
        for i in 0..3 {
            let req = test::TestRequest::post()
                .uri(&push_uri(&format!("d{}", i)))
                .insert_header(("Authorization", "Bearer secret"))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let req = test::TestRequest::post()
            .uri(&push_uri("d9"))
            .insert_header(("Authorization", "Bearer secret"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(test::read_body(resp).await, "rate_limited");
    }

    #[actix_web::test]
    async fn test_duplicate_push_is_idempotent() {
        let state = cached_state(10.0);
        let metrics = state.context.metrics.clone();
        let cache = state.context.cache.clone();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let first = test::TestRequest::post()
            .uri(&push_uri("d1"))
            .insert_header(("Authorization", "Bearer secret"))
            .to_request();
        let resp = test::call_service(&app, first).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "ok");

        let second = test::TestRequest::post()
            .uri(&push_uri("d1"))
            .insert_header(("Authorization", "Bearer secret"))
            .to_request();
        let resp = test::call_service(&app, second).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "dedup");

        // One recorded event, one durable increment, one dropped duplicate.
        assert_eq!(metrics.events_total.get(), 1);
        assert_eq!(metrics.dedup_total.get(), 1);
        assert_eq!(
            cache.get_counter(DURABLE_EVENT_COUNTER_KEY).await.unwrap(),
            1
        );
    }

    #[actix_web::test]
    async fn test_rate_limited_push_releases_dedup_key() {
        let state = cached_state(1.0);
        let cache = state.context.cache.clone();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri(&push_uri("d1"))
            .insert_header(("Authorization", "Bearer secret"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri(&push_uri("d2"))
            .insert_header(("Authorization", "Bearer secret"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

        // The recorded event keeps its key; the rejected one gets it back.
        assert!(cache.get("canarygate:dedup:d1").await.unwrap().is_some());
        assert!(cache.get("canarygate:dedup:d2").await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn test_non_post_is_method_not_allowed() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri(&push_uri("d1")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
