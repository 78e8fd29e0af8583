use thiserror::Error;

/// A problem that cannot be turned into a tableau.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("Objective has {found} coefficients, expected {expected}")]
    ObjectiveLength { expected: usize, found: usize },
    #[error("Bounds given for {found} variables, expected {expected}")]
    BoundsLength { expected: usize, found: usize },
    #[error("Constraint {constraint} has {found} coefficients, expected {expected}")]
    ConstraintLength {
        constraint: String,
        expected: usize,
        found: usize,
    },
    #[error("Non-finite objective coefficient on variable {0}")]
    NonFiniteObjective(String),
    #[error("Non-finite coefficient or right-hand side in constraint {0}")]
    NonFiniteConstraint(String),
    #[error("Invalid bounds [{lower}, {upper}] on variable {variable}")]
    InvalidBounds { variable: String, lower: f64, upper: f64 },
    #[error("Variable index {index} out of range for {len} variables")]
    VariableIndex { index: usize, len: usize },
}
