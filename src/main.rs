//! Canarygate ingestion gateway

use canarygate::config::Config;
use canarygate::server::HttpServer;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> canarygate::Result<()> {
    // A config file is optional; env vars always apply on top.
    let config = match std::env::var("CANARYGATE_CONFIG") {
        Ok(path) => Config::from_file(&path).await?,
        Err(_) => Config::from_env()?,
    };

    HttpServer::new(config).await?.start().await
}
