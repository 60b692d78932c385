//! Ingestion gateway
//!
//! Admission pipeline for pushed deployment events: bearer auth, required-field
//! validation, TTL-boxed dedup against the durable cache, and per-source
//! token-bucket rate limiting. All shared resources live in [`GatewayContext`],
//! constructed once at startup and injected into handlers.

pub mod dedup;
pub mod event;
pub mod rate_limiter;
pub mod sink;

pub use dedup::Deduper;
pub use event::DeploymentEvent;
pub use rate_limiter::RateLimiter;
pub use sink::{EventSink, NoopSink, TracingSink};

use crate::config::Config;
use crate::metrics::GateMetrics;
use crate::storage::RedisPool;
use std::sync::Arc;

/// Shared gateway resources, constructed once at startup.
///
/// Handlers receive this by reference through the server state; there are no
/// module-level mutable globals.
pub struct GatewayContext {
    /// Bearer token expected on push requests
    pub push_token: String,
    /// Per-source admission control
    pub rate_limiter: RateLimiter,
    /// TTL-boxed idempotency-key tracking
    pub deduper: Deduper,
    /// Durable cache handle
    pub cache: RedisPool,
    /// In-process metrics registry
    pub metrics: Arc<GateMetrics>,
    /// Optional trace sink for recorded events
    pub sink: Box<dyn EventSink>,
}

impl GatewayContext {
    /// Build the context from configuration and a connected (or no-op) cache
    pub fn new(
        config: &Config,
        cache: RedisPool,
        metrics: Arc<GateMetrics>,
        sink: Box<dyn EventSink>,
    ) -> Self {
        Self {
            push_token: config.auth.push_token.clone(),
            rate_limiter: RateLimiter::new(
                config.rate_limit.capacity,
                config.rate_limit.refill_per_sec,
            ),
            deduper: Deduper::new(cache.clone(), config.dedup.ttl_secs),
            cache,
            metrics,
            sink,
        }
    }

    /// Constant-time-ish bearer token check.
    ///
    /// Token values are never logged in full; callers log the masked form.
    pub fn authorize(&self, bearer: Option<&str>) -> bool {
        match bearer {
            Some(token) if !self.push_token.is_empty() => token == self.push_token,
            _ => false,
        }
    }
}

/// Mask a token for logging: keep the first 4 characters at most.
pub fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    format!("{}***", visible)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("secret-token"), "secr***");
        assert_eq!(mask_token("ab"), "ab***");
        assert_eq!(mask_token(""), "***");
    }

    #[test]
    fn test_mask_token_multibyte() {
        // Truncation must land on a char boundary, not a byte offset.
        assert_eq!(mask_token("жетон-доступа"), "жето***");
    }
}
