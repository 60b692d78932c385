//! Background gauge refresh
//!
//! Recomputes derived gauges from the durable cache on a fixed interval so a
//! scrape reflects recent state without per-scrape recomputation. The loop is
//! stopped through a watch channel, so tests shut it down deterministically
//! instead of leaking a daemon task.

use super::{
    GateMetrics, DURABLE_EVENT_COUNTER_KEY, EVALUATION_SCORE_KEY, LAST_DECISION_KEY,
    TRAFFIC_RATIO_KEY,
};
use crate::storage::RedisPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Handle to a running refresh loop
pub struct RefreshHandle {
    shutdown: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl RefreshHandle {
    /// Stop the loop and wait for it to finish
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

/// Spawn the periodic refresh task
pub fn spawn_refresh_loop(
    metrics: Arc<GateMetrics>,
    cache: RedisPool,
    interval: Duration,
) -> RefreshHandle {
    let (shutdown, mut rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    refresh_once(&metrics, &cache).await;
                }
                _ = rx.changed() => {
                    debug!("Metrics refresh loop stopping");
                    break;
                }
            }
        }
    });

    RefreshHandle { shutdown, task }
}

/// One refresh pass: mirror the durable counters and the gauges published by
/// external evaluation runs into the exposition registry.
pub async fn refresh_once(metrics: &GateMetrics, cache: &RedisPool) {
    match cache.get_counter(DURABLE_EVENT_COUNTER_KEY).await {
        Ok(count) => {
            metrics.durable_events.set(count);
            debug!("Refreshed durable event gauge: {}", count);
        }
        Err(e) => {
            warn!("Durable counter unavailable during refresh: {}", e);
        }
    }

    if let Ok(Some(score)) = cache.get_float(EVALUATION_SCORE_KEY).await {
        metrics.evaluation_score.set(score);
    }
    if let Ok(Some(ratio)) = cache.get_float(TRAFFIC_RATIO_KEY).await {
        metrics.canary_traffic_ratio.set(ratio);
    }
    if let Ok(Some(outcome)) = cache.get(LAST_DECISION_KEY).await {
        metrics.record_decision(&outcome);
    }
}
