//! Comparison-operator evaluation for declarative policy checks
//!
//! Policies express each statistical criterion as `{op, threshold}`. The
//! contract is boundary-inclusive for `ge`/`le`/`eq`: a p-value of exactly
//! 0.05 passes a `le 0.05` check. That is deliberate and covered by tests.

use serde::{Deserialize, Serialize};

/// Comparison operator used by promotion-policy checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Strictly greater than
    Gt,
    /// Greater than or equal
    Ge,
    /// Strictly less than
    Lt,
    /// Less than or equal
    Le,
    /// Exactly equal
    Eq,
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Eq => "==",
        };
        f.write_str(s)
    }
}

/// Evaluate `value op threshold`.
///
/// A missing (`None`) value never passes: a policy cannot approve on a field
/// the result did not supply.
pub fn evaluate_operator(value: Option<f64>, op: Operator, threshold: f64) -> bool {
    let Some(value) = value else {
        return false;
    };
    if value.is_nan() || threshold.is_nan() {
        return false;
    }

    match op {
        Operator::Gt => value > threshold,
        Operator::Ge => value >= threshold,
        Operator::Lt => value < threshold,
        Operator::Le => value <= threshold,
        Operator::Eq => value == threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_inclusive() {
        assert!(evaluate_operator(Some(0.05), Operator::Le, 0.05));
        assert!(evaluate_operator(Some(0.05), Operator::Ge, 0.05));
        assert!(evaluate_operator(Some(0.05), Operator::Eq, 0.05));
    }

    #[test]
    fn test_strict_operators_exclude_boundary() {
        // A delta of exactly 0 must fail a `gt 0` check.
        assert!(!evaluate_operator(Some(0.0), Operator::Gt, 0.0));
        assert!(!evaluate_operator(Some(0.0), Operator::Lt, 0.0));
    }

    #[test]
    fn test_missing_value_fails() {
        assert!(!evaluate_operator(None, Operator::Gt, -1.0));
    }

    #[test]
    fn test_nan_fails() {
        assert!(!evaluate_operator(Some(f64::NAN), Operator::Le, 1.0));
        assert!(!evaluate_operator(Some(0.0), Operator::Le, f64::NAN));
    }

    #[test]
    fn test_serde_names() {
        let op: Operator = serde_json::from_str("\"ge\"").unwrap();
        assert_eq!(op, Operator::Ge);
        assert_eq!(serde_json::to_string(&Operator::Lt).unwrap(), "\"lt\"");
    }
}
