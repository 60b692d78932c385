//! Prometheus-compatible metrics store client
//!
//! Thin wrapper over the `query_range` HTTP API. Every call carries a bounded
//! timeout; a failed or timed-out pull surfaces as an error the guard maps to
//! NO_DATA for that series, never an aborted evaluation.

use crate::utils::error::{GatewayError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// A named, labeled sequence of (timestamp, value) samples
#[derive(Debug, Clone)]
pub struct MetricSeries {
    /// Label set of the series as returned by the store
    pub labels: HashMap<String, String>,
    /// (unix seconds, value) pairs, in store order
    pub samples: Vec<(f64, f64)>,
}

impl MetricSeries {
    /// Finite sample values, in series order
    pub fn finite_values(&self) -> Vec<f64> {
        self.samples
            .iter()
            .map(|(_, v)| *v)
            .filter(|v| v.is_finite())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct PromResponse {
    status: String,
    #[serde(default)]
    data: PromData,
}

#[derive(Debug, Default, Deserialize)]
struct PromData {
    #[serde(default)]
    result: Vec<PromSeries>,
}

#[derive(Debug, Deserialize)]
struct PromSeries {
    #[serde(default)]
    metric: HashMap<String, String>,
    #[serde(default)]
    values: Vec<(f64, String)>,
}

/// HTTP client for a Prometheus-compatible metrics store
pub struct PromClient {
    http: reqwest::Client,
    base_url: String,
}

impl PromClient {
    /// Create a client with a bounded per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GatewayError::HttpClient)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Run a range query over `[end - window, end]` at the given step
    pub async fn query_range(
        &self,
        query: &str,
        end_unix: f64,
        window_secs: u64,
        step_secs: u64,
    ) -> Result<Vec<MetricSeries>> {
        let start_unix = end_unix - window_secs as f64;
        let url = format!("{}/api/v1/query_range", self.base_url);
        debug!("Querying metrics store: {} [{}s/{}s]", query, window_secs, step_secs);

        let params: [(&str, String); 4] = [
            ("query", query.to_string()),
            ("start", start_unix.to_string()),
            ("end", end_unix.to_string()),
            ("step", format!("{}s", step_secs)),
        ];
        let response = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(GatewayError::HttpClient)?
            .error_for_status()
            .map_err(GatewayError::HttpClient)?;

        let body: PromResponse = response.json().await.map_err(GatewayError::HttpClient)?;
        if body.status != "success" {
            return Err(GatewayError::DependencyUnavailable(format!(
                "metrics store returned status {:?} for {}",
                body.status, query
            )));
        }

        let series = body
            .data
            .result
            .into_iter()
            .map(|s| MetricSeries {
                labels: s.metric,
                samples: s
                    .values
                    .into_iter()
                    .filter_map(|(ts, raw)| raw.parse::<f64>().ok().map(|v| (ts, v)))
                    .collect(),
            })
            .collect();

        Ok(series)
    }
}
