//! Optional trace sink for recorded events
//!
//! The dedup/rate-limit/metrics pipeline works without any external trace
//! system, so the fire-and-forget emission sits behind a trait. The default is
//! a no-op; the tracing sink logs a structured line per recorded event.

use super::event::DeploymentEvent;
use async_trait::async_trait;
use tracing::info;

/// Destination for recorded deployment events
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emit a recorded event. Failures are the sink's own concern; the
    /// ingestion path never fails because a sink did.
    async fn emit(&self, event: &DeploymentEvent);
}

/// Sink that drops every event
pub struct NoopSink;

#[async_trait]
impl EventSink for NoopSink {
    async fn emit(&self, _event: &DeploymentEvent) {}
}

/// Sink that logs each event through tracing
pub struct TracingSink;

#[async_trait]
impl EventSink for TracingSink {
    async fn emit(&self, event: &DeploymentEvent) {
        info!(
            event_id = %event.id,
            env = %event.env,
            service = %event.service,
            source = %event.source,
            commit = %event.commit,
            "deployment event recorded"
        );
    }
}
