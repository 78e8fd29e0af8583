use mipfeatures_solver::{LpProblem, SolveError, Solution, SolutionStatus, Solver};

use crate::Instance;

/// Outcome of a single LP relaxation solve
#[derive(Debug, Clone, PartialEq)]
pub enum RelaxationResult {
    Optimal(Vec<f64>),
    Infeasible,
    Unbounded,
    /// Iteration limit or any other inconclusive termination
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RelaxationStatus {
    Optimal,
    Infeasible,
    Unbounded,
    Unknown,
}

impl RelaxationResult {
    pub fn status(&self) -> RelaxationStatus {
        match self {
            RelaxationResult::Optimal(_) => RelaxationStatus::Optimal,
            RelaxationResult::Infeasible => RelaxationStatus::Infeasible,
            RelaxationResult::Unbounded => RelaxationStatus::Unbounded,
            RelaxationResult::Unknown => RelaxationStatus::Unknown,
        }
    }

    pub fn primal(&self) -> Option<&[f64]> {
        match self {
            RelaxationResult::Optimal(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    pub fn is_optimal(&self) -> bool {
        matches!(self, RelaxationResult::Optimal(_))
    }
}

impl From<Solution> for RelaxationResult {
    fn from(solution: Solution) -> Self {
        match solution.status {
            SolutionStatus::Optimal => RelaxationResult::Optimal(solution.values),
            SolutionStatus::Infeasible => RelaxationResult::Infeasible,
            SolutionStatus::Unbounded => RelaxationResult::Unbounded,
            SolutionStatus::IterationLimit => RelaxationResult::Unknown,
        }
    }
}

/// The instance as a minimization LP: rows become ranged constraints,
/// declared variable bounds are kept and integrality is dropped.
pub fn relaxation_problem(instance: &dyn Instance) -> LpProblem {
    let n = instance.num_variables();
    let mut problem = LpProblem::with_variables(n);
    problem.set_objective(instance.objective(), true);

    for j in 0..n {
        let v = instance.variable(j);
        problem.set_bounds(j, v.lower, v.upper);
    }

    for i in 0..instance.num_constraints() {
        let row = instance.constraint(i);
        let mut coefficients = vec![0.0; n];
        for (&j, &a) in row.columns.iter().zip(row.coefficients) {
            coefficients[j] = a;
        }
        problem.add_range_constraint(format!("r{i}"), coefficients, row.lower, row.upper);
    }

    problem
}

/// Solve the LP relaxation once. Inconclusive terminations come back as
/// [`RelaxationResult::Unknown`]; only a model the solver refuses is an error.
pub fn solve_relaxation(instance: &dyn Instance, solver: &Solver) -> Result<RelaxationResult, SolveError> {
    let problem = relaxation_problem(instance);
    let solution = solver.solve(&problem)?;
    tracing::debug!(
        status = ?solution.status,
        iterations = solution.iterations,
        objective = solution.objective_value,
        "solved LP relaxation"
    );
    Ok(solution.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MipInstance, Variable};

    #[test]
    fn test_optimal_relaxation() {
        // max x0 + x1 s.t. 2x0 + 2x1 <= 3, binaries -> LP optimum 1.5
        let instance = MipInstance::builder()
            .variable(Variable::binary().with_objective(-1.0))
            .variable(Variable::binary().with_objective(-1.0))
            .constraint(vec![0, 1], vec![2.0, 2.0], f64::NEG_INFINITY, 3.0)
            .build()
            .unwrap();

        let result = solve_relaxation(&instance, &Solver::new()).unwrap();

        assert_eq!(result.status(), RelaxationStatus::Optimal);
        let x = result.primal().unwrap();
        assert!((x[0] + x[1] - 1.5).abs() < 1e-9);
        assert!(x.iter().all(|&v| (-1e-9..=1.0 + 1e-9).contains(&v)));
    }

    #[test]
    fn test_infeasible_relaxation() {
        let instance = MipInstance::builder()
            .variable(Variable::integer(0.0, 1.0))
            .constraint(vec![0], vec![1.0], 2.0, f64::INFINITY)
            .build()
            .unwrap();

        let result = solve_relaxation(&instance, &Solver::new()).unwrap();

        assert_eq!(result, RelaxationResult::Infeasible);
        assert!(result.primal().is_none());
    }

    #[test]
    fn test_unbounded_relaxation() {
        let instance = MipInstance::builder()
            .variable(Variable::continuous(f64::NEG_INFINITY, f64::INFINITY).with_objective(1.0))
            .build()
            .unwrap();

        let result = solve_relaxation(&instance, &Solver::new()).unwrap();

        assert_eq!(result, RelaxationResult::Unbounded);
    }

    #[test]
    fn test_iteration_limit_is_unknown() {
        let instance = MipInstance::builder()
            .variable(Variable::continuous(0.0, f64::INFINITY).with_objective(-1.0))
            .constraint(vec![0], vec![1.0], f64::NEG_INFINITY, 4.0)
            .build()
            .unwrap();

        let result = solve_relaxation(&instance, &Solver::new().with_max_iterations(0)).unwrap();

        assert_eq!(result.status(), RelaxationStatus::Unknown);
    }

    #[test]
    fn test_relaxation_problem_shape() {
        let instance = MipInstance::builder()
            .variable(Variable::integer(-2.0, 5.0).with_objective(4.0))
            .variable(Variable::continuous(0.0, 1.0))
            .constraint(vec![1, 0], vec![3.0, 1.0], 1.0, 2.0)
            .build()
            .unwrap();

        let problem = relaxation_problem(&instance);

        assert_eq!(problem.num_variables(), 2);
        assert_eq!(problem.num_constraints(), 2);
        assert_eq!(problem.constraints[0].coefficients, vec![1.0, 3.0]);
        assert!(problem.objective.minimize);
        assert_eq!(problem.objective.coefficients, vec![4.0, 0.0]);
        assert_eq!(problem.bounds[0].lower, -2.0);
        assert_eq!(problem.bounds[0].upper, 5.0);
    }
}
