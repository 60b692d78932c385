//! Wilson score upper bound for binomial proportions
//!
//! The canary guard judges an SLO-violation *rate* from a small number of
//! quantile samples. A naive ratio overstates confidence at small `n`; the
//! Wilson interval stays well calibrated there, so the guard compares its
//! upper bound against the allowed exceed ratio instead of the raw ratio.

/// Fixed z-scores for the supported confidence levels. An unknown confidence
/// falls back to 0.95 (z = 1.96).
pub(crate) fn z_score(confidence: f64) -> f64 {
    if (confidence - 0.90).abs() < 1e-9 {
        1.645
    } else if (confidence - 0.95).abs() < 1e-9 {
        1.96
    } else if (confidence - 0.975).abs() < 1e-9 {
        2.241
    } else if (confidence - 0.99).abs() < 1e-9 {
        2.576
    } else {
        1.96
    }
}

/// Upper bound of the Wilson score interval for an observed proportion
/// `p_hat` over `n` observations.
///
/// Returns 0.0 when `n == 0`: with no data we cannot claim a violation.
pub fn wilson_upper_bound(p_hat: f64, n: u64, confidence: f64) -> f64 {
    if n == 0 {
        return 0.0;
    }

    let z = z_score(confidence);
    let n = n as f64;
    let z2 = z * z;

    let denom = 1.0 + z2 / n;
    let center = p_hat + z2 / (2.0 * n);
    let margin = z * (p_hat * (1.0 - p_hat) / n + z2 / (4.0 * n * n)).sqrt();

    ((center + margin) / denom).min(1.0)
}
