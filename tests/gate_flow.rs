//! End-to-end promotion flow: raw samples through the A/B runner, policy file
//! from disk, fail-closed decision out.

use canarygate::gate::{self, run_ab_comparison, AbResult, EvaluationPolicy};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_policy(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn improvement_passes_conservative_policy() {
    let baseline: Vec<f64> = (0..50).map(|i| 0.70 + 0.002 * (i % 9) as f64).collect();
    let candidate: Vec<f64> = (0..50).map(|i| 0.76 + 0.002 * (i % 9) as f64).collect();
    let result = run_ab_comparison(&baseline, &candidate, 0.95).unwrap();

    let policy_file = write_policy(
        r#"
name: conservative
version: "2"
checks:
  delta: {op: gt, threshold: 0}
  p_value: {op: le, threshold: 0.05}
  power: {op: ge, threshold: 0.8}
min_samples:
  n_a: 30
  n_b: 30
"#,
    );
    let policy = EvaluationPolicy::from_file(policy_file.path()).await.unwrap();

    let decision = gate::evaluate(&result, &policy);
    assert!(decision.overall_pass, "checks: {:?}", decision.checks);
    assert_eq!(decision.policy_version, "2");
    assert_eq!(decision.checks.len(), 5);
}

#[tokio::test]
async fn regression_is_blocked_with_reasons() {
    let baseline: Vec<f64> = (0..50).map(|i| 0.76 + 0.002 * (i % 9) as f64).collect();
    let candidate: Vec<f64> = (0..50).map(|i| 0.70 + 0.002 * (i % 9) as f64).collect();
    let result = run_ab_comparison(&baseline, &candidate, 0.95).unwrap();

    let policy_file = write_policy(
        "checks:\n  delta: {op: gt, threshold: 0}\n  p_value: {op: le, threshold: 0.05}\n",
    );
    let policy = EvaluationPolicy::from_file(policy_file.path()).await.unwrap();

    let decision = gate::evaluate(&result, &policy);
    assert!(!decision.overall_pass);
    let delta = decision.checks.iter().find(|c| c.name == "delta").unwrap();
    assert!(!delta.passed);
    assert!(delta.reason.contains("fail"));
}

#[tokio::test]
async fn malformed_policy_is_rejected_at_load() {
    let policy_file = write_policy("checks:\n  sparkle: {op: gt, threshold: 0}\n");
    assert!(EvaluationPolicy::from_file(policy_file.path()).await.is_err());
}

#[test]
fn external_partial_result_fails_unsupplied_checks() {
    // A pipeline that only produced delta and p_value cannot pass a policy
    // that also demands power.
    let result: AbResult =
        serde_json::from_str(r#"{"objective_delta": 0.04, "p_value": 0.01}"#).unwrap();
    let policy = EvaluationPolicy::from_str(
        "checks:\n  delta: {op: gt, threshold: 0}\n  power: {op: ge, threshold: 0.8}\n",
    )
    .unwrap();

    let decision = gate::evaluate(&result, &policy);
    assert!(!decision.overall_pass);
    assert!(decision
        .checks
        .iter()
        .any(|c| c.name == "power" && c.reason.contains("missing")));
}
