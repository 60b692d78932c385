//! Declarative promotion policies
//!
//! A policy is a named set of statistical checks, each a tagged
//! `Check { op, threshold }` parsed and validated once at load time. Unknown
//! check names and empty policies are rejected immediately, not at evaluation
//! time.

use crate::stats::Operator;
use crate::utils::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Check names the evaluator knows how to extract from an A/B result
pub const KNOWN_CHECKS: &[&str] = &["delta", "p_value", "ci_width", "power", "mes"];

/// One statistical criterion
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Check {
    /// Comparison operator
    pub op: Operator,
    /// Threshold the extracted value is compared against
    pub threshold: f64,
}

/// Minimum per-variant sample sizes
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MinSamples {
    /// Minimum observations in variant A
    #[serde(default)]
    pub n_a: Option<u64>,
    /// Minimum observations in variant B
    #[serde(default)]
    pub n_b: Option<u64>,
}

impl MinSamples {
    fn is_empty(&self) -> bool {
        self.n_a.is_none() && self.n_b.is_none()
    }
}

/// A named promotion policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationPolicy {
    /// Policy name
    #[serde(default = "default_name")]
    pub name: String,
    /// Version string recorded on every decision made under this policy
    #[serde(default = "default_version")]
    pub version: String,
    /// Named checks; BTreeMap keeps decision output in a stable order
    #[serde(default)]
    pub checks: BTreeMap<String, Check>,
    /// Optional minimum sample sizes per variant
    #[serde(default)]
    pub min_samples: MinSamples,
}

fn default_name() -> String {
    "unnamed".to_string()
}

fn default_version() -> String {
    "0".to_string()
}

impl EvaluationPolicy {
    /// The documented fallback used when a caller supplies no policy:
    /// `delta > 0` and `p_value <= 0.05`.
    pub fn default_policy() -> Self {
        let mut checks = BTreeMap::new();
        checks.insert(
            "delta".to_string(),
            Check {
                op: Operator::Gt,
                threshold: 0.0,
            },
        );
        checks.insert(
            "p_value".to_string(),
            Check {
                op: Operator::Le,
                threshold: 0.05,
            },
        );
        Self {
            name: "default".to_string(),
            version: "builtin-default".to_string(),
            checks,
            min_samples: MinSamples::default(),
        }
    }

    /// Parse a policy from YAML or JSON text (YAML is a JSON superset here)
    pub fn from_str(content: &str) -> Result<Self> {
        let policy: EvaluationPolicy = serde_yaml::from_str(content)
            .map_err(|e| GatewayError::Policy(format!("failed to parse policy: {}", e)))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Load and validate a policy file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_str(&content)
    }

    /// A policy must name at least one criterion and only known ones
    pub fn validate(&self) -> Result<()> {
        if self.checks.is_empty() && self.min_samples.is_empty() {
            return Err(GatewayError::Policy(
                "policy has no checks; an empty policy would approve everything".to_string(),
            ));
        }

        for name in self.checks.keys() {
            if !KNOWN_CHECKS.contains(&name.as_str()) {
                return Err(GatewayError::Policy(format!(
                    "unknown check {:?}; known checks: {}",
                    name,
                    KNOWN_CHECKS.join(", ")
                )));
            }
        }

        if !self.threshold_values_finite() {
            return Err(GatewayError::Policy(
                "check thresholds must be finite numbers".to_string(),
            ));
        }

        Ok(())
    }

    fn threshold_values_finite(&self) -> bool {
        self.checks.values().all(|c| c.threshold.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_policy() {
        let yaml = r#"
name: conservative
version: "3"
checks:
  delta: {op: gt, threshold: 0}
  p_value: {op: le, threshold: 0.05}
  ci_width: {op: le, threshold: 0.01}
min_samples:
  n_a: 10
  n_b: 10
"#;
        let policy = EvaluationPolicy::from_str(yaml).unwrap();
        assert_eq!(policy.name, "conservative");
        assert_eq!(policy.checks.len(), 3);
        assert_eq!(policy.min_samples.n_a, Some(10));
        assert_eq!(policy.checks["p_value"].op, Operator::Le);
    }

    #[test]
    fn test_parse_json_policy() {
        let json = r#"{"name": "j", "checks": {"delta": {"op": "gt", "threshold": 0}}}"#;
        let policy = EvaluationPolicy::from_str(json).unwrap();
        assert_eq!(policy.checks.len(), 1);
    }

    #[test]
    fn test_empty_policy_rejected() {
        let err = EvaluationPolicy::from_str("name: empty\n").unwrap_err();
        assert!(matches!(err, GatewayError::Policy(_)));
    }

    #[test]
    fn test_unknown_check_rejected_at_load() {
        let yaml = "checks:\n  vibes: {op: gt, threshold: 1}\n";
        let err = EvaluationPolicy::from_str(yaml).unwrap_err();
        assert!(err.to_string().contains("vibes"));
    }

    #[test]
    fn test_min_samples_only_is_valid() {
        let policy = EvaluationPolicy::from_str("min_samples:\n  n_a: 5\n").unwrap();
        assert_eq!(policy.min_samples.n_a, Some(5));
    }

    #[test]
    fn test_default_policy_contract() {
        let policy = EvaluationPolicy::default_policy();
        assert_eq!(policy.checks["delta"].op, Operator::Gt);
        assert_eq!(policy.checks["delta"].threshold, 0.0);
        assert_eq!(policy.checks["p_value"].op, Operator::Le);
        assert_eq!(policy.checks["p_value"].threshold, 0.05);
        policy.validate().unwrap();
    }
}
