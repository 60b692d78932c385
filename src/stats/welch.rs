//! Welch's t-test for two independent samples
//!
//! Used by the A/B runner to compare candidate and production objective
//! samples without assuming equal variances. Degrees of freedom come from the
//! Welch–Satterthwaite equation. Deriving an exact Student-t p-value is left
//! to the caller; the A/B runner approximates it from the normal tail.

use crate::utils::error::{GatewayError, Result};

/// Output of a Welch two-sample t-test.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct WelchResult {
    /// t-statistic
    pub t: f64,
    /// Welch–Satterthwaite degrees of freedom
    pub df: f64,
    /// Mean of sample A
    pub mean_a: f64,
    /// Mean of sample B
    pub mean_b: f64,
}

pub(crate) fn mean_and_var(sample: &[f64]) -> (f64, f64) {
    let n = sample.len() as f64;
    let mean = sample.iter().sum::<f64>() / n;
    // Sample variance (n - 1 denominator).
    let var = sample.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var)
}

/// Welch's t-statistic and Satterthwaite degrees of freedom for two samples.
///
/// Errors with `InsufficientSample` when either sample has fewer than 2
/// observations, since the sample variance is undefined below that.
pub fn welch_t_test(sample_a: &[f64], sample_b: &[f64]) -> Result<WelchResult> {
    if sample_a.len() < 2 || sample_b.len() < 2 {
        return Err(GatewayError::InsufficientSample(format!(
            "welch t-test needs at least 2 observations per sample, got {} and {}",
            sample_a.len(),
            sample_b.len()
        )));
    }

    let n_a = sample_a.len() as f64;
    let n_b = sample_b.len() as f64;
    let (mean_a, var_a) = mean_and_var(sample_a);
    let (mean_b, var_b) = mean_and_var(sample_b);

    let se2 = var_a / n_a + var_b / n_b;
    let t = if se2 > 0.0 {
        (mean_a - mean_b) / se2.sqrt()
    } else {
        0.0
    };

    // Welch–Satterthwaite approximation.
    let df_num = se2 * se2;
    let df_den = (var_a * var_a) / (n_a * n_a * (n_a - 1.0))
        + (var_b * var_b) / (n_b * n_b * (n_b - 1.0));
    let df = if df_den > 0.0 {
        df_num / df_den
    } else {
        n_a + n_b - 2.0
    };

    Ok(WelchResult {
        t,
        df,
        mean_a,
        mean_b,
    })
}
