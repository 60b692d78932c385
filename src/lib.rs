//! # Canarygate
//!
//! A progressive-delivery statistical gate. It ingests deployment events and
//! service-level latency metrics and decides, with confidence-interval and
//! hypothesis-testing math rather than fixed thresholds, whether a candidate
//! version is safe to promote and whether a canary has regressed against its
//! SLO.
//!
//! ## Components
//!
//! - **Statistics kernel** ([`stats`]): Wilson score bounds, Welch's t-test,
//!   policy-operator evaluation. Pure math, no I/O.
//! - **Ingestion gateway** ([`gateway`], [`server`]): authenticated push
//!   endpoint with dedup and per-source token-bucket rate limiting.
//! - **Metrics exposition** ([`metrics`]): Prometheus-format counters/gauges
//!   with a background refresh loop.
//! - **Canary guard** ([`guard`]): pulls p95/p99 series per deployment phase
//!   and applies a Wilson upper bound to the SLO-exceed rate.
//! - **Promotion gate** ([`gate`]): evaluates an A/B result against a
//!   declarative policy, fail-closed.
//!
//! ## Gateway mode
//!
//! ```rust,no_run
//! use canarygate::{config::Config, server::HttpServer};
//!
//! #[tokio::main]
//! async fn main() -> canarygate::Result<()> {
//!     let config = Config::from_env()?;
//!     HttpServer::new(config).await?.start().await
//! }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod gate;
pub mod gateway;
pub mod guard;
pub mod metrics;
pub mod server;
pub mod stats;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use utils::error::{GatewayError, Result};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
