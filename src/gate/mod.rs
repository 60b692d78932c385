//! Promotion gate
//!
//! Evaluates an A/B comparison result against a declarative policy and
//! produces a fail-closed decision: every failing check carries a reason, and
//! any internal evaluator failure resolves to a blocking decision rather than
//! an approval.

pub mod ab;
pub mod policy;

pub use ab::{run_ab_comparison, AbResult};
pub use policy::{Check, EvaluationPolicy, MinSamples};

use crate::stats::evaluate_operator;
use crate::utils::error::GatewayError;
use serde::Serialize;
use tracing::{error, warn};

/// Outcome of a single policy check
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    /// Check name from the policy
    pub name: String,
    /// Whether the check passed
    pub passed: bool,
    /// Human-readable reason, always populated
    pub reason: String,
}

/// Terminal output of a promotion-gate evaluation; never mutated after
/// creation.
#[derive(Debug, Clone, Serialize)]
pub struct GateDecision {
    /// Logical AND of every configured check
    pub overall_pass: bool,
    /// Per-check outcomes in policy order
    pub checks: Vec<CheckOutcome>,
    /// Version of the policy that produced this decision
    pub policy_version: String,
}

/// Evaluate `result` against `policy`, fail-closed.
///
/// An empty policy is replaced by the documented default
/// (`delta > 0`, `p_value <= 0.05`) so a missing policy never silently
/// approves. A panic inside evaluation yields `overall_pass = false` with the
/// panic text recorded as a reason.
pub fn evaluate(result: &AbResult, policy: &EvaluationPolicy) -> GateDecision {
    let fallback;
    let policy = if policy.checks.is_empty() && policy.min_samples.n_a.is_none()
        && policy.min_samples.n_b.is_none()
    {
        warn!("Empty policy supplied; substituting built-in default policy");
        fallback = EvaluationPolicy::default_policy();
        &fallback
    } else {
        policy
    };

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        evaluate_inner(result, policy)
    }));

    match outcome {
        Ok(decision) => decision,
        Err(panic) => {
            let text = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown evaluator panic".to_string());
            error!("Promotion evaluator panicked: {}", text);
            GateDecision {
                overall_pass: false,
                checks: vec![CheckOutcome {
                    name: "evaluator".to_string(),
                    passed: false,
                    reason: GatewayError::Evaluator(text).to_string(),
                }],
                policy_version: policy.version.clone(),
            }
        }
    }
}

fn evaluate_inner(result: &AbResult, policy: &EvaluationPolicy) -> GateDecision {
    let mut checks = Vec::new();

    for (name, check) in &policy.checks {
        let value = extract_value(result, name);
        let passed = evaluate_operator(value, check.op, check.threshold);
        let reason = match value {
            Some(v) => format!(
                "{} = {:.6} {} {:.6}: {}",
                name,
                v,
                check.op,
                check.threshold,
                if passed { "pass" } else { "fail" }
            ),
            None => format!("{}: value missing from result: fail", name),
        };
        checks.push(CheckOutcome {
            name: name.clone(),
            passed,
            reason,
        });
    }

    if let Some(min_a) = policy.min_samples.n_a {
        checks.push(min_sample_outcome("n_a", result.n_a, min_a));
    }
    if let Some(min_b) = policy.min_samples.n_b {
        checks.push(min_sample_outcome("n_b", result.n_b, min_b));
    }

    GateDecision {
        overall_pass: checks.iter().all(|c| c.passed),
        checks,
        policy_version: policy.version.clone(),
    }
}

fn extract_value(result: &AbResult, check_name: &str) -> Option<f64> {
    match check_name {
        "delta" => result.objective_delta,
        "p_value" => result.p_value,
        "ci_width" => result.ci_width(),
        // Minimum effect size compares the magnitude of the delta.
        "mes" => result.objective_delta.map(f64::abs),
        "power" => result.power,
        other => panic!("unvalidated check name reached evaluation: {:?}", other),
    }
}

fn min_sample_outcome(name: &str, actual: Option<u64>, minimum: u64) -> CheckOutcome {
    match actual {
        Some(n) => {
            let passed = n >= minimum;
            CheckOutcome {
                name: format!("{}.min", name),
                passed,
                reason: format!(
                    "{} = {} >= minimum {}: {}",
                    name,
                    n,
                    minimum,
                    if passed { "pass" } else { "fail" }
                ),
            }
        }
        None => CheckOutcome {
            name: format!("{}.min", name),
            passed: false,
            reason: format!("{}: sample size missing from result: fail", name),
        },
    }
}
