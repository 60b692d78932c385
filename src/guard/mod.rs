//! Canary guard
//!
//! Single-shot evaluation of live latency quantiles against their SLOs. For
//! each of p95/p99 and each deployment phase present in the queried window,
//! the guard pulls the series, counts samples strictly above the SLO, and
//! checks the Wilson upper bound of the exceed rate. A phase fails on either a
//! freshly regressed latest sample (fail fast) or a statistically significant
//! sustained violation; the two conditions exist because one regressed sample
//! should trip immediately while noisy drift should only trip once the bound
//! clears the configured ratio.

pub mod promql;

pub use promql::{MetricSeries, PromClient};

use crate::stats::wilson_upper_bound;
use crate::utils::error::Result;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome for one (metric, phase) combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    /// Within SLO at the configured confidence
    Ok,
    /// Latest sample or Wilson bound exceeds the allowed ratio
    Fail,
    /// No samples in the window, or the series pull failed
    NoData,
}

/// Result of one SLO check
#[derive(Debug, Clone, Serialize)]
pub struct SloCheckResult {
    /// Quantile metric checked (p95 or p99)
    pub metric_name: String,
    /// Deployment phase label of the series
    pub phase_label: String,
    /// Finite samples in the window
    pub sample_count: u64,
    /// Samples strictly above the SLO
    pub exceed_count: u64,
    /// exceed_count / sample_count
    pub exceed_rate: f64,
    /// One-sided Wilson upper bound on the exceed rate
    pub wilson_upper_bound: f64,
    /// Verdict
    pub status: CheckStatus,
}

/// Full guard run output
#[derive(Debug, Serialize)]
pub struct GuardReport {
    /// One entry per (metric, phase)
    pub results: Vec<SloCheckResult>,
    /// False when any phase failed for either metric
    pub passed: bool,
}

/// Canary guard configuration
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Metrics store base URL
    pub metrics_url: String,
    /// Evaluation window
    pub window: Duration,
    /// Query resolution step
    pub step: Duration,
    /// p95 latency SLO in seconds
    pub p95_slo_secs: f64,
    /// p99 latency SLO in seconds
    pub p99_slo_secs: f64,
    /// Allowed SLO-exceed ratio before the statistical check fails
    pub min_exceed_ratio: f64,
    /// Confidence level for the Wilson bound
    pub confidence: f64,
}

/// PromQL queries per quantile; series are expected to carry a `phase` label.
const QUANTILE_QUERIES: &[(&str, &str)] = &[
    ("p95", "service_latency_p95_seconds"),
    ("p99", "service_latency_p99_seconds"),
];

/// Canary guard runner
pub struct CanaryGuard {
    config: GuardConfig,
    client: PromClient,
}

impl CanaryGuard {
    /// Build a guard; outbound calls are bounded by twice the step, floor 5s
    pub fn new(config: GuardConfig) -> Result<Self> {
        let timeout = (config.step * 2).max(Duration::from_secs(5));
        let client = PromClient::new(&config.metrics_url, timeout)?;
        Ok(Self { config, client })
    }

    /// Evaluate every quantile across all phases present in the window
    pub async fn run(&self) -> GuardReport {
        let end_unix = chrono::Utc::now().timestamp() as f64;
        let mut results = Vec::new();

        for (metric_name, query) in QUANTILE_QUERIES {
            let slo = match *metric_name {
                "p95" => self.config.p95_slo_secs,
                _ => self.config.p99_slo_secs,
            };

            match self
                .client
                .query_range(
                    query,
                    end_unix,
                    self.config.window.as_secs(),
                    self.config.step.as_secs().max(1),
                )
                .await
            {
                Ok(series) if series.is_empty() => {
                    results.push(no_data_result(metric_name, "*"));
                }
                Ok(series) => {
                    for s in series {
                        let phase = s
                            .labels
                            .get("phase")
                            .cloned()
                            .unwrap_or_else(|| "unknown".to_string());
                        results.push(self.check_series(metric_name, &phase, &s, slo));
                    }
                }
                Err(e) => {
                    // One unreachable series never aborts the whole run.
                    warn!("Series pull failed for {}: {}; reporting NO_DATA", query, e);
                    results.push(no_data_result(metric_name, "*"));
                }
            }
        }

        let passed = !results.iter().any(|r| r.status == CheckStatus::Fail);
        info!(
            "Canary guard evaluated {} series: {}",
            results.len(),
            if passed { "pass" } else { "fail" }
        );

        GuardReport { results, passed }
    }

    fn check_series(
        &self,
        metric_name: &str,
        phase: &str,
        series: &MetricSeries,
        slo_secs: f64,
    ) -> SloCheckResult {
        let values = series.finite_values();
        let n = values.len() as u64;

        if n == 0 {
            return no_data_result(metric_name, phase);
        }

        let exceed_count = values.iter().filter(|v| **v > slo_secs).count() as u64;
        let exceed_rate = exceed_count as f64 / n as f64;
        let bound = wilson_upper_bound(exceed_rate, n, self.config.confidence);

        let latest_exceeds = values.last().map(|v| *v > slo_secs).unwrap_or(false);
        let bound_exceeds = bound > self.config.min_exceed_ratio;

        let status = if latest_exceeds || bound_exceeds {
            CheckStatus::Fail
        } else {
            CheckStatus::Ok
        };

        SloCheckResult {
            metric_name: metric_name.to_string(),
            phase_label: phase.to_string(),
            sample_count: n,
            exceed_count,
            exceed_rate,
            wilson_upper_bound: bound,
            status,
        }
    }
}

fn no_data_result(metric_name: &str, phase: &str) -> SloCheckResult {
    SloCheckResult {
        metric_name: metric_name.to_string(),
        phase_label: phase.to_string(),
        sample_count: 0,
        exceed_count: 0,
        exceed_rate: 0.0,
        wilson_upper_bound: 0.0,
        status: CheckStatus::NoData,
    }
}

/// Parse a humane duration string: `15s`, `15m`, `2h`, or bare seconds.
pub fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    let (number, multiplier) = match raw.chars().last() {
        Some('s') => (&raw[..raw.len() - 1], 1),
        Some('m') => (&raw[..raw.len() - 1], 60),
        Some('h') => (&raw[..raw.len() - 1], 3600),
        _ => (raw, 1),
    };

    number
        .parse::<u64>()
        .map(|n| Duration::from_secs(n * multiplier))
        .map_err(|_| {
            crate::utils::error::GatewayError::Config(format!("invalid duration: {:?}", raw))
        })
}
