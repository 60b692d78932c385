//! Statistics kernel
//!
//! Pure math shared by the canary guard and the promotion gate: Wilson score
//! bounds for SLO-violation rates, Welch's t-test for A/B comparisons, and the
//! comparison-operator evaluation used by declarative policies. No I/O.

pub mod operator;
pub mod welch;
pub mod wilson;

pub use operator::{evaluate_operator, Operator};
pub use welch::{welch_t_test, WelchResult};
pub use wilson::wilson_upper_bound;

/// Standard normal CDF via the Abramowitz & Stegun erf approximation.
///
/// Accurate to ~1.5e-7, which is far below the resolution any promotion
/// policy threshold operates at.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

fn erf(x: f64) -> f64 {
    // Abramowitz & Stegun 7.1.26
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    sign * y
}
