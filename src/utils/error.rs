//! Error handling for the gate
//!
//! Defines the error taxonomy shared by the gateway, the canary guard, and the
//! promotion gate. The mapping to HTTP statuses lives here so handlers never
//! build ad-hoc error responses.

use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// Result type alias for the gate
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for the gate
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or malformed required fields; carries the missing field names
    #[error("Validation error: missing fields: {}", .0.join(","))]
    Validation(Vec<String>),

    /// Bad or missing bearer token
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Token bucket exhausted for a source
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// External cache or metrics store unreachable
    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    /// Unexpected failure inside the promotion-gate or statistics evaluator.
    /// Always resolves to a blocking decision, never an approval.
    #[error("Evaluator error: {0}")]
    Evaluator(String),

    /// Fewer observations than a statistical routine requires
    #[error("Insufficient sample: {0}")]
    InsufficientSample(String),

    /// Invalid promotion policy
    #[error("Policy error: {0}")]
    Policy(String),

    /// Redis errors
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Metrics registry errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Create an internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

impl ResponseError for GatewayError {
    fn error_response(&self) -> HttpResponse {
        match self {
            GatewayError::Validation(fields) => {
                HttpResponse::BadRequest().body(fields.join(","))
            }
            GatewayError::Auth(_) => HttpResponse::Unauthorized().body("unauthorized"),
            GatewayError::RateLimit(_) => HttpResponse::TooManyRequests().body("rate_limited"),
            GatewayError::DependencyUnavailable(msg) => {
                HttpResponse::ServiceUnavailable().body(msg.clone())
            }
            _ => HttpResponse::InternalServerError().body("internal error"),
        }
    }
}
