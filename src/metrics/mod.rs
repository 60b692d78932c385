//! Metrics exposition
//!
//! In-process counters and gauges for the gate, rendered in the Prometheus
//! text format on scrape. Promotion decisions are gauges (one per outcome)
//! rather than counters so restarts do not fabricate unbounded growth; the
//! durable event count is mirrored from the cache by the refresh loop.

pub mod refresh;

pub use refresh::{spawn_refresh_loop, RefreshHandle};

use crate::utils::error::Result;
use prometheus::{
    Encoder, Gauge, GaugeVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

/// Cache key of the durable (restart-surviving) event counter
pub const DURABLE_EVENT_COUNTER_KEY: &str = "canarygate:events:durable";

/// Cache key where evaluation runs publish the latest objective delta
pub const EVALUATION_SCORE_KEY: &str = "canarygate:evaluation:score";

/// Cache key where the latest promotion outcome is published (promote/hold)
pub const LAST_DECISION_KEY: &str = "canarygate:promotion:decision";

/// Cache key of the current canary traffic share
pub const TRAFFIC_RATIO_KEY: &str = "canarygate:canary:traffic_ratio";

/// All gate metrics, registered against one registry
pub struct GateMetrics {
    registry: Registry,
    /// Deployment events recorded since process start
    pub events_total: IntCounter,
    /// Deployment events by env/service/source/commit
    pub events_labeled: IntCounterVec,
    /// Durable event count mirrored from the cache
    pub durable_events: IntGauge,
    /// Pushes dropped as duplicates
    pub dedup_total: IntCounter,
    /// Pushes rejected by the rate limiter
    pub rate_limited_total: IntCounter,
    /// Pushes rejected before admission, by reason
    pub rejections: IntCounterVec,
    /// Latest A/B evaluation objective delta
    pub evaluation_score: Gauge,
    /// Promotion decision by outcome: 1 for the latest outcome, 0 otherwise
    pub promotion_decision: GaugeVec,
    /// Share of live traffic currently routed to the canary
    pub canary_traffic_ratio: Gauge,
}

impl GateMetrics {
    /// Create and register all metrics
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let events_total = IntCounter::new(
            "canarygate_deployment_events_total",
            "Deployment events recorded since process start",
        )?;
        let events_labeled = IntCounterVec::new(
            Opts::new(
                "canarygate_deployment_events",
                "Deployment events by environment, service, source and commit",
            ),
            &["env", "service", "source", "commit"],
        )?;
        let durable_events = IntGauge::new(
            "canarygate_durable_deployment_events",
            "Deployment events recorded in the durable cache across restarts",
        )?;
        let dedup_total = IntCounter::new(
            "canarygate_dedup_dropped_total",
            "Pushes dropped as duplicates within the dedup TTL",
        )?;
        let rate_limited_total = IntCounter::new(
            "canarygate_rate_limited_total",
            "Pushes rejected by per-source rate limiting",
        )?;
        let rejections = IntCounterVec::new(
            Opts::new(
                "canarygate_push_rejections_total",
                "Pushes rejected before admission, by reason",
            ),
            &["reason"],
        )?;
        let evaluation_score = Gauge::new(
            "canarygate_evaluation_score",
            "Objective delta of the most recent A/B evaluation",
        )?;
        let promotion_decision = GaugeVec::new(
            Opts::new(
                "canarygate_promotion_decision",
                "Latest promotion decision: 1 for the chosen outcome, 0 otherwise",
            ),
            &["outcome"],
        )?;
        let canary_traffic_ratio = Gauge::new(
            "canarygate_canary_traffic_ratio",
            "Share of live traffic currently routed to the canary",
        )?;

        registry.register(Box::new(events_total.clone()))?;
        registry.register(Box::new(events_labeled.clone()))?;
        registry.register(Box::new(durable_events.clone()))?;
        registry.register(Box::new(dedup_total.clone()))?;
        registry.register(Box::new(rate_limited_total.clone()))?;
        registry.register(Box::new(rejections.clone()))?;
        registry.register(Box::new(evaluation_score.clone()))?;
        registry.register(Box::new(promotion_decision.clone()))?;
        registry.register(Box::new(canary_traffic_ratio.clone()))?;

        Ok(Self {
            registry,
            events_total,
            events_labeled,
            durable_events,
            dedup_total,
            rate_limited_total,
            rejections,
            evaluation_score,
            promotion_decision,
            canary_traffic_ratio,
        })
    }

    /// Record an accepted deployment event
    pub fn record_event(&self, env: &str, service: &str, source: &str, commit: &str) {
        self.events_total.inc();
        self.events_labeled
            .with_label_values(&[env, service, source, commit])
            .inc();
    }

    /// Record a promotion decision, zeroing the other outcome gauges
    pub fn record_decision(&self, outcome: &str) {
        for known in ["promote", "hold"] {
            self.promotion_decision
                .with_label_values(&[known])
                .set(if known == outcome { 1.0 } else { 0.0 });
        }
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_event_shows_in_exposition() {
        let metrics = GateMetrics::new().unwrap();
        metrics.record_event("prod", "checkout", "ci", "abc123");
        metrics.record_event("prod", "checkout", "ci", "abc123");

        let rendered = metrics.render().unwrap();
        assert!(rendered.contains("canarygate_deployment_events_total 2"));
        assert!(rendered.contains("env=\"prod\""));
        assert!(rendered.contains("service=\"checkout\""));
    }

    #[test]
    fn test_decision_gauges_are_exclusive() {
        let metrics = GateMetrics::new().unwrap();
        metrics.record_decision("promote");
        metrics.record_decision("hold");

        let promote = metrics
            .promotion_decision
            .with_label_values(&["promote"])
            .get();
        let hold = metrics.promotion_decision.with_label_values(&["hold"]).get();
        assert_eq!(promote, 0.0);
        assert_eq!(hold, 1.0);
    }

    #[test]
    fn test_durable_gauge_settable() {
        let metrics = GateMetrics::new().unwrap();
        metrics.durable_events.set(42);
        assert!(metrics
            .render()
            .unwrap()
            .contains("canarygate_durable_deployment_events 42"));
    }
}
