//! Deployment events
//!
//! A `DeploymentEvent` is created on each accepted push and is immutable from
//! then on. The `id` field is a client-supplied idempotency key; events with a
//! previously seen id inside the dedup TTL are dropped as duplicates.

use crate::utils::error::{GatewayError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single deployment event pushed by an external caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentEvent {
    /// Client-supplied idempotency key
    pub id: String,
    /// Target environment (e.g. staging, production)
    pub env: String,
    /// Service being deployed
    pub service: String,
    /// Originating system (e.g. ci, operator)
    pub source: String,
    /// Commit hash of the deployed revision
    pub commit: String,
    /// Server-side receipt time
    pub timestamp: DateTime<Utc>,
}

impl DeploymentEvent {
    /// Build an event from raw query fields, validating that every required
    /// field is present and non-empty.
    ///
    /// On failure returns `Validation` carrying the missing field names, in a
    /// fixed order so the 400 body is deterministic.
    pub fn from_fields(
        env: Option<&str>,
        service: Option<&str>,
        source: Option<&str>,
        commit: Option<&str>,
        id: Option<&str>,
    ) -> Result<Self> {
        let mut missing = Vec::new();
        let mut require = |name: &str, value: Option<&str>| -> String {
            match value {
                Some(v) if !v.is_empty() => v.to_string(),
                _ => {
                    missing.push(name.to_string());
                    String::new()
                }
            }
        };

        let env = require("env", env);
        let service = require("service", service);
        let source = require("source", source);
        let commit = require("commit", commit);
        let id = require("id", id);

        if !missing.is_empty() {
            return Err(GatewayError::Validation(missing));
        }

        Ok(Self {
            id,
            env,
            service,
            source,
            commit,
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_fields_present() {
        let event = DeploymentEvent::from_fields(
            Some("prod"),
            Some("checkout"),
            Some("ci"),
            Some("abc123"),
            Some("deploy-42"),
        )
        .unwrap();
        assert_eq!(event.env, "prod");
        assert_eq!(event.id, "deploy-42");
    }

    #[test]
    fn test_missing_fields_listed_in_order() {
        let err = DeploymentEvent::from_fields(None, Some("checkout"), Some(""), Some("abc"), None)
            .unwrap_err();
        match err {
            GatewayError::Validation(fields) => {
                assert_eq!(fields, vec!["env", "source", "id"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_string_counts_as_missing() {
        let err =
            DeploymentEvent::from_fields(Some(""), Some(""), Some(""), Some(""), Some("")).unwrap_err();
        match err {
            GatewayError::Validation(fields) => assert_eq!(fields.len(), 5),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
