//! TTL-boxed event deduplication
//!
//! Backed by the cache's atomic SET NX EX, which gives the cross-process
//! guarantee that each idempotency key is admitted at most once per TTL even
//! under concurrent duplicate submissions. When the cache is down the posture
//! is "treat as not seen and warn": ingestion must never crash and an
//! occasional double count in degraded mode beats dropping real events.

use crate::storage::RedisPool;
use tracing::warn;

const DEDUP_KEY_PREFIX: &str = "canarygate:dedup:";

/// Idempotency-key tracker over the durable cache
pub struct Deduper {
    cache: RedisPool,
    ttl_secs: u64,
}

impl Deduper {
    /// Create a deduper with the given TTL window
    pub fn new(cache: RedisPool, ttl_secs: u64) -> Self {
        Self { cache, ttl_secs }
    }

    /// Returns `true` when `event_id` was already seen within the TTL (the
    /// caller must drop the event as a duplicate), `false` when the id is now
    /// marked seen.
    pub async fn dedupe(&self, event_id: &str) -> bool {
        let key = format!("{}{}", DEDUP_KEY_PREFIX, event_id);
        match self.cache.set_nx_ex(&key, "1", self.ttl_secs).await {
            Ok(newly_set) => !newly_set,
            Err(e) => {
                warn!(
                    "Dedup check unavailable for event {} ({}); treating as not seen",
                    event_id, e
                );
                false
            }
        }
    }

    /// Release a previously marked id.
    ///
    /// Used when a later pipeline stage rejects the event, so a retry is not
    /// treated as a duplicate of an event that was never recorded. Best
    /// effort: a failed release only shortens to the TTL.
    pub async fn forget(&self, event_id: &str) {
        let key = format!("{}{}", DEDUP_KEY_PREFIX, event_id);
        if let Err(e) = self.cache.delete(&key).await {
            warn!("Could not release dedup key for event {}: {}", event_id, e);
        }
    }

    /// Configured TTL window in seconds
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RedisConfig;

    #[tokio::test]
    async fn test_cache_unavailable_fails_open() {
        let deduper = Deduper::new(RedisPool::create_noop(&RedisConfig::default()), 600);
        // No cache: never reported as duplicate, never panics.
        assert!(!deduper.dedupe("deploy-1").await);
        assert!(!deduper.dedupe("deploy-1").await);
    }

    #[tokio::test]
    async fn test_duplicate_detected_with_live_cache() {
        let deduper = Deduper::new(RedisPool::create_in_memory(&RedisConfig::default()), 600);
        assert!(!deduper.dedupe("deploy-1").await, "first sighting is new");
        assert!(deduper.dedupe("deploy-1").await, "second sighting is a duplicate");
        assert!(!deduper.dedupe("deploy-2").await, "other ids are unaffected");
    }

    #[tokio::test]
    async fn test_forget_allows_retry() {
        let deduper = Deduper::new(RedisPool::create_in_memory(&RedisConfig::default()), 600);
        assert!(!deduper.dedupe("deploy-1").await);
        deduper.forget("deploy-1").await;
        assert!(!deduper.dedupe("deploy-1").await);
    }

    #[test]
    fn test_ttl_exposed_for_health() {
        let deduper = Deduper::new(RedisPool::create_noop(&RedisConfig::default()), 900);
        assert_eq!(deduper.ttl_secs(), 900);
    }
}
