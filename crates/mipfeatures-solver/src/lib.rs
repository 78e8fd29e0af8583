mod error;
mod problem;
mod simplex;
mod solution;

pub use error::SolveError;
pub use problem::{Constraint, ConstraintOp, LpProblem, Objective, VariableBounds};
pub use simplex::{SimplexModel, Solver};
pub use solution::{Solution, SolutionStatus};
