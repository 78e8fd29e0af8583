use crate::relaxation::{RelaxationResult, RelaxationStatus};
use crate::Instance;

/// Fractionality of the relaxed solution and how many integer variables
/// could be rounded in each direction on their own.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntegerViolations {
    pub status: RelaxationStatus,
    /// Integer variables with a fractional relaxed value
    pub violations: usize,
    /// Sum of distances to the nearest integer over violating variables
    pub total_fractionality: f64,
    /// Violating variables whose floor keeps every row satisfied
    pub down_locks: usize,
    /// Violating variables whose floor + 1 keeps every row satisfied
    pub up_locks: usize,
}

impl IntegerViolations {
    fn degraded(status: RelaxationStatus) -> Self {
        Self {
            status,
            violations: 0,
            total_fractionality: 0.0,
            down_locks: 0,
            up_locks: 0,
        }
    }
}

/// Distance from `value` to the nearest integer
pub fn fractionality(value: f64) -> f64 {
    let frac = value - value.floor();
    frac.min(1.0 - frac)
}

pub fn is_fractional(value: f64, tolerance: f64) -> bool {
    fractionality(value) > tolerance
}

/// Count fractional integer variables and test, one variable at a time,
/// whether moving it to `floor(v)` or `floor(v) + 1` keeps the relaxed
/// point feasible. All other variables stay at their relaxed values.
pub fn integer_violations(instance: &dyn Instance, relaxation: &RelaxationResult, tolerance: f64) -> IntegerViolations {
    let Some(primal) = relaxation.primal() else {
        return IntegerViolations::degraded(relaxation.status());
    };

    let mut result = IntegerViolations::degraded(RelaxationStatus::Optimal);
    let mut x = primal.to_vec();

    for (i, &value) in primal.iter().enumerate() {
        if !instance.variable(i).is_integer || !is_fractional(value, tolerance) {
            continue;
        }
        result.violations += 1;
        result.total_fractionality += fractionality(value);

        let down = value.floor();
        x[i] = down;
        if instance.is_lp_feasible(&x, tolerance) {
            result.down_locks += 1;
        }
        x[i] = down + 1.0;
        if instance.is_lp_feasible(&x, tolerance) {
            result.up_locks += 1;
        }
        x[i] = value;
    }

    tracing::debug!(
        violations = result.violations,
        total_fractionality = result.total_fractionality,
        down_locks = result.down_locks,
        up_locks = result.up_locks,
        "integer violations"
    );
    result
}
