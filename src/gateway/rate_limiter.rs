//! Per-source token-bucket admission control
//!
//! One bucket per source identifier, refilled lazily from elapsed time. The
//! refill-and-subtract is a read-modify-write, so the whole bucket map sits
//! behind a mutex; critical sections are a few float ops.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;

/// Token bucket state for one source
#[derive(Debug, Clone, Copy)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket rate limiter keyed by source identifier
pub struct RateLimiter {
    capacity: f64,
    refill_per_sec: f64,
    buckets: Mutex<HashMap<String, TokenBucket>>,
}

impl RateLimiter {
    /// Create a limiter where every source gets `capacity` tokens refilled at
    /// `refill_per_sec`.
    pub fn new(capacity: f64, refill_per_sec: f64) -> Self {
        Self {
            capacity,
            refill_per_sec,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Try to admit a request of the given cost for `source_key`.
    ///
    /// Refills the bucket by `elapsed * refill_per_sec` capped at capacity,
    /// then subtracts `cost` only when sufficient tokens exist. The invariant
    /// `0 <= tokens <= capacity` holds on every exit path.
    pub fn admit(&self, source_key: &str, cost: f64) -> bool {
        let now = Instant::now();
        let mut buckets = self.buckets.lock();
        let bucket = buckets
            .entry(source_key.to_string())
            .or_insert_with(|| TokenBucket {
                tokens: self.capacity,
                last_refill: now,
            });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= cost {
            bucket.tokens -= cost;
            true
        } else {
            debug!(
                "Rate limit exceeded for {}: {:.2} tokens < cost {:.2}",
                source_key, bucket.tokens, cost
            );
            false
        }
    }

    /// Configured bucket capacity
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Configured refill rate (tokens per second)
    pub fn refill_per_sec(&self) -> f64 {
        self.refill_per_sec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_capacity_admits_then_denies() {
        let limiter = RateLimiter::new(10.0, 10.0);
        for i in 0..10 {
            assert!(limiter.admit("ci", 1.0), "admit {} should pass", i);
        }
        assert!(!limiter.admit("ci", 1.0), "11th immediate admit must fail");
    }

    #[test]
    fn test_refill_after_wait() {
        let limiter = RateLimiter::new(10.0, 10.0);
        for _ in 0..10 {
            assert!(limiter.admit("ci", 1.0));
        }
        assert!(!limiter.admit("ci", 1.0));

        // 10 tokens/s restores at least one full token within ~100ms.
        std::thread::sleep(Duration::from_millis(120));
        assert!(limiter.admit("ci", 1.0));
    }

    #[test]
    fn test_sources_are_independent() {
        let limiter = RateLimiter::new(1.0, 0.001);
        assert!(limiter.admit("a", 1.0));
        assert!(!limiter.admit("a", 1.0));
        assert!(limiter.admit("b", 1.0));
    }

    #[test]
    fn test_cost_above_capacity_never_admits() {
        let limiter = RateLimiter::new(5.0, 100.0);
        assert!(!limiter.admit("bulk", 6.0));
        // The failed attempt must not have gone negative.
        assert!(limiter.admit("bulk", 5.0));
    }
}
