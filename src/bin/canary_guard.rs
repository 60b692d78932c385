//! Canary guard CLI
//!
//! Single-shot SLO evaluation against a Prometheus-compatible metrics store.
//! Exit code 0 when every phase passes, 2 when one or more phases failed.

use canarygate::guard::{parse_duration, CanaryGuard, GuardConfig};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "canary-guard", about = "Statistical SLO guard for canary phases")]
struct Args {
    /// Base URL of the metrics store
    #[arg(long, env = "CANARYGATE_METRICS_URL")]
    metrics_url: String,

    /// Evaluation window (e.g. 15m)
    #[arg(long, default_value = "15m")]
    window: String,

    /// Query resolution step (e.g. 15s)
    #[arg(long, default_value = "15s")]
    step: String,

    /// p95 latency SLO in milliseconds
    #[arg(long, default_value_t = 350.0)]
    p95_slo_ms: f64,

    /// p99 latency SLO in milliseconds
    #[arg(long, default_value_t = 800.0)]
    p99_slo_ms: f64,

    /// Allowed SLO-exceed ratio before the statistical check fails
    #[arg(long, default_value_t = 0.2)]
    min_exceed_ratio: f64,

    /// Confidence level for the Wilson bound
    #[arg(long, default_value_t = 0.95)]
    confidence: f64,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(passed) => {
            if passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> canarygate::Result<bool> {
    let config = GuardConfig {
        metrics_url: args.metrics_url,
        window: parse_duration(&args.window)?,
        step: parse_duration(&args.step)?,
        p95_slo_secs: args.p95_slo_ms / 1000.0,
        p99_slo_secs: args.p99_slo_ms / 1000.0,
        min_exceed_ratio: args.min_exceed_ratio,
        confidence: args.confidence,
    };

    let guard = CanaryGuard::new(config)?;
    let report = guard.run().await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(report.passed)
}
