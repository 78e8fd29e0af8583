use mipfeatures_solver::{SolveError, Solver};

use crate::relaxation::relaxation_problem;
use crate::Instance;

/// Range a variable actually spans over the LP relaxation's feasible region
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolyhedralBound {
    pub lower: f64,
    pub upper: f64,
}

impl PolyhedralBound {
    pub fn open() -> Self {
        Self {
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
        }
    }

    pub fn range(&self) -> f64 {
        self.upper - self.lower
    }
}

/// `+1` on `index` to minimize it, `-1` to maximize it; zero elsewhere.
fn single_variable_objective(n: usize, index: usize, upper: bool) -> Vec<f64> {
    let mut coefficients = vec![0.0; n];
    coefficients[index] = if upper { -1.0 } else { 1.0 };
    coefficients
}

/// Solve a fresh LP for every variable and direction.
pub fn polyhedral_bounds(instance: &dyn Instance, solver: &Solver) -> Result<Vec<PolyhedralBound>, SolveError> {
    let n = instance.num_variables();
    let base = relaxation_problem(instance);

    let extreme = |index: usize, upper: bool| -> Result<f64, SolveError> {
        let mut problem = base.clone();
        problem.set_objective(single_variable_objective(n, index, upper), true);
        let solution = solver.solve(&problem)?;
        tracing::trace!(index, upper, status = ?solution.status, "bound solve");
        Ok(match (solution.is_optimal(), upper) {
            (true, _) => solution.values[index],
            (false, false) => f64::NEG_INFINITY,
            (false, true) => f64::INFINITY,
        })
    };

    (0..n)
        .map(|j| {
            Ok(PolyhedralBound {
                lower: extreme(j, false)?,
                upper: extreme(j, true)?,
            })
        })
        .collect()
}

/// Same quantities as [`polyhedral_bounds`], reusing one model: each bound
/// only swaps the objective and re-optimizes from the previous basis.
pub fn polyhedral_bounds_fast(instance: &dyn Instance, solver: &Solver) -> Result<Vec<PolyhedralBound>, SolveError> {
    let n = instance.num_variables();
    let mut model = solver.model(&relaxation_problem(instance))?;

    let mut bounds = Vec::with_capacity(n);
    for j in 0..n {
        model.set_objective(single_variable_objective(n, j, false), true)?;
        let solution = model.optimize();
        tracing::trace!(index = j, upper = false, status = ?solution.status, "bound solve");
        bounds.push(if solution.is_optimal() {
            PolyhedralBound {
                lower: solution.values[j],
                upper: f64::INFINITY,
            }
        } else {
            PolyhedralBound::open()
        });
    }

    for (j, bound) in bounds.iter_mut().enumerate() {
        model.set_objective(single_variable_objective(n, j, true), true)?;
        let solution = model.optimize();
        tracing::trace!(index = j, upper = true, status = ?solution.status, "bound solve");
        if solution.is_optimal() {
            bound.upper = solution.values[j];
        }
    }

    Ok(bounds)
}

/// Smallest over largest polyhedral range. `None` when there are no
/// variables, every range is zero, or the ratio is not finite.
pub fn flatness(bounds: &[PolyhedralBound]) -> Option<f64> {
    let (min, max) = bounds
        .iter()
        .map(PolyhedralBound::range)
        .fold(None, |acc: Option<(f64, f64)>, r| match acc {
            None => Some((r, r)),
            Some((lo, hi)) => Some((lo.min(r), hi.max(r))),
        })?;

    if max == 0.0 {
        return None;
    }
    let ratio = min / max;
    ratio.is_finite().then_some(ratio)
}
