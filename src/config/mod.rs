//! Configuration management for the gate
//!
//! Handles loading, validation, and env-variable overrides for the ingestion
//! gateway. Every knob has a documented default so the service starts with an
//! empty environment, except the push token which must be set explicitly.

use crate::utils::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// Main configuration struct for the gate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Push-endpoint authentication
    #[serde(default)]
    pub auth: AuthConfig,
    /// Durable cache (Redis) configuration
    #[serde(default)]
    pub redis: RedisConfig,
    /// Per-source admission control
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Event deduplication
    #[serde(default)]
    pub dedup: DedupConfig,
    /// Metrics exposition
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Push-endpoint authentication configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Bearer token required on every push request
    #[serde(default)]
    pub push_token: String,
}

/// Durable cache (Redis) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Connection URL
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// When false the gateway runs with a no-op cache (degraded mode)
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Bound on connection establishment and per-command time
    #[serde(default = "default_redis_timeout")]
    pub connection_timeout_secs: u64,
}

/// Per-source token-bucket configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum tokens a bucket can hold
    #[serde(default = "default_capacity")]
    pub capacity: f64,
    /// Tokens restored per second
    #[serde(default = "default_refill")]
    pub refill_per_sec: f64,
}

/// Dedup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Window during which a previously seen event id is a duplicate
    #[serde(default = "default_dedup_ttl")]
    pub ttl_secs: u64,
}

/// Metrics exposition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Interval of the background gauge-refresh loop
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_true() -> bool {
    true
}

fn default_redis_timeout() -> u64 {
    2
}

fn default_capacity() -> f64 {
    10.0
}

fn default_refill() -> f64 {
    10.0
}

fn default_dedup_ttl() -> u64 {
    600
}

fn default_refresh_interval() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            enabled: default_true(),
            connection_timeout_secs: default_redis_timeout(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            refill_per_sec: default_refill(),
        }
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_dedup_ttl(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file, then apply env overrides
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GatewayError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .map_err(|e| GatewayError::Config(format!("Failed to parse config: {}", e)))?;

        config.apply_env();
        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from environment variables over defaults
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let mut config = Config::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply `CANARYGATE_*` environment overrides in place
    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("CANARYGATE_HOST") {
            self.server.host = v;
        }
        if let Some(v) = parse_env("CANARYGATE_PORT") {
            self.server.port = v;
        }
        if let Ok(v) = std::env::var("CANARYGATE_PUSH_TOKEN") {
            self.auth.push_token = v;
        }
        if let Ok(v) = std::env::var("CANARYGATE_REDIS_URL") {
            self.redis.url = v;
        }
        if let Some(v) = parse_env("CANARYGATE_RATE_CAPACITY") {
            self.rate_limit.capacity = v;
        }
        if let Some(v) = parse_env("CANARYGATE_RATE_REFILL") {
            self.rate_limit.refill_per_sec = v;
        }
        if let Some(v) = parse_env("CANARYGATE_DEDUP_TTL_SECS") {
            self.dedup.ttl_secs = v;
        }
        if let Some(v) = parse_env("CANARYGATE_METRICS_REFRESH_SECS") {
            self.metrics.refresh_interval_secs = v;
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        if self.auth.push_token.is_empty() {
            warn!("No push token configured; all push requests will be rejected");
        }
        if self.rate_limit.capacity <= 0.0 {
            return Err(GatewayError::Config(
                "rate_limit.capacity must be positive".to_string(),
            ));
        }
        if self.rate_limit.refill_per_sec <= 0.0 {
            return Err(GatewayError::Config(
                "rate_limit.refill_per_sec must be positive".to_string(),
            ));
        }
        if self.dedup.ttl_secs == 0 {
            return Err(GatewayError::Config(
                "dedup.ttl_secs must be at least 1".to_string(),
            ));
        }
        if self.metrics.refresh_interval_secs == 0 {
            return Err(GatewayError::Config(
                "metrics.refresh_interval_secs must be at least 1".to_string(),
            ));
        }

        debug!("Configuration validation completed");
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    match std::env::var(name) {
        Ok(raw) => match raw.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring unparseable value for {}: {:?}", name, raw);
                None
            }
        },
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8090);
        assert_eq!(config.rate_limit.capacity, 10.0);
        assert_eq!(config.rate_limit.refill_per_sec, 10.0);
        assert_eq!(config.dedup.ttl_secs, 600);
        assert_eq!(config.metrics.refresh_interval_secs, 30);
        assert!(config.redis.enabled);
    }

    #[test]
    fn test_yaml_partial_override() {
        let yaml = "server:\n  port: 9999\nrate_limit:\n  capacity: 25\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.rate_limit.capacity, 25.0);
        // Untouched sections keep their defaults.
        assert_eq!(config.dedup.ttl_secs, 600);
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let config = Config {
            dedup: DedupConfig { ttl_secs: 0 },
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nonpositive_refill() {
        let config = Config {
            rate_limit: RateLimitConfig {
                capacity: 10.0,
                refill_per_sec: 0.0,
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
