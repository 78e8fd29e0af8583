use mipfeatures_solver::SolveError;
use thiserror::Error;

/// Malformed instance data, reported before any feature is computed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InstanceError {
    #[error("Row {row} has {columns} column indices but {coefficients} coefficients")]
    RowLength {
        row: usize,
        columns: usize,
        coefficients: usize,
    },
    #[error("Row {row} references column {column}, but the instance has {num_variables} variables")]
    ColumnOutOfRange {
        row: usize,
        column: usize,
        num_variables: usize,
    },
    #[error("Row {row} lists column {column} more than once")]
    DuplicateColumn { row: usize, column: usize },
    #[error("Row {row} has a non-finite coefficient on column {column}")]
    NonFiniteCoefficient { row: usize, column: usize },
    #[error("Variable {variable} has a non-finite objective coefficient")]
    NonFiniteObjective { variable: usize },
    #[error("Variable {variable} has invalid bounds [{lower}, {upper}]")]
    InvalidVariableBounds { variable: usize, lower: f64, upper: f64 },
    #[error("Row {row} has invalid bounds [{lower}, {upper}]")]
    InvalidRowBounds { row: usize, lower: f64, upper: f64 },
}

/// Failure inside a single feature group.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("LP solver rejected the model: {0}")]
    Solver(#[from] SolveError),
    #[error("SVD of the {rows}x{cols} constraint matrix did not converge")]
    SvdNoConvergence { rows: usize, cols: usize },
    #[error("Eigen-decomposition of the {order}x{order} {matrix} matrix did not converge")]
    EigenNoConvergence { matrix: &'static str, order: usize },
    #[error("Vertex {vertex} out of range for a graph with {vertices} vertices")]
    VertexOutOfRange { vertex: usize, vertices: usize },
}
