//! Promotion gate CLI
//!
//! Evaluates a JSON A/B result file against a YAML/JSON policy file and prints
//! the decision as JSON. Exit code 1 when the gate blocks promotion, so the
//! binary slots directly into automated pipelines.

use canarygate::gate::{self, AbResult, EvaluationPolicy};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "promotion-gate", about = "Statistical promotion gate for A/B results")]
struct Args {
    /// Path to the JSON A/B result file
    #[arg(long)]
    result: PathBuf,

    /// Path to the YAML/JSON policy file; omit to use the built-in default
    /// policy (delta > 0, p_value <= 0.05)
    #[arg(long)]
    policy: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_target(false)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> canarygate::Result<bool> {
    let result_raw = tokio::fs::read_to_string(&args.result).await?;
    let result: AbResult = serde_json::from_str(&result_raw)?;

    let policy = match &args.policy {
        Some(path) => EvaluationPolicy::from_file(path).await?,
        None => EvaluationPolicy::default_policy(),
    };

    let decision = gate::evaluate(&result, &policy);
    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(decision.overall_pass)
}
