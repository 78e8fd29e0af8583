use std::collections::HashSet;

use crate::InstanceError;

/// Read-only access to a MIP instance. Every analyzer works against this
/// trait, so any storage that can answer these questions can be featurized.
pub trait Instance: Send + Sync {
    fn num_variables(&self) -> usize;
    fn num_constraints(&self) -> usize;
    fn num_nonzeros(&self) -> usize;

    /// Objective coefficient, integrality and declared bounds of a column
    fn variable(&self, index: usize) -> Variable;

    /// Sparse row with its bounds
    fn constraint(&self, index: usize) -> Row<'_>;

    fn objective(&self) -> Vec<f64> {
        (0..self.num_variables()).map(|j| self.variable(j).objective).collect()
    }

    fn rhs(&self) -> Vec<f64> {
        (0..self.num_constraints()).map(|i| self.constraint(i).rhs()).collect()
    }

    /// `A.x <= rhs + tolerance` for every row.
    fn is_lp_feasible(&self, x: &[f64], tolerance: f64) -> bool {
        (0..self.num_constraints()).all(|i| {
            let row = self.constraint(i);
            row.activity(x) - row.rhs() <= tolerance
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable {
    pub objective: f64,
    pub is_integer: bool,
    pub lower: f64,
    pub upper: f64,
}

impl Variable {
    pub fn continuous(lower: f64, upper: f64) -> Self {
        Self {
            objective: 0.0,
            is_integer: false,
            lower,
            upper,
        }
    }

    pub fn integer(lower: f64, upper: f64) -> Self {
        Self {
            objective: 0.0,
            is_integer: true,
            lower,
            upper,
        }
    }

    pub fn binary() -> Self {
        Self::integer(0.0, 1.0)
    }

    pub fn with_objective(mut self, objective: f64) -> Self {
        self.objective = objective;
        self
    }

    pub fn is_binary(&self) -> bool {
        self.is_integer && self.lower == 0.0 && self.upper == 1.0
    }
}

/// Borrowed view of one constraint row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Row<'a> {
    pub columns: &'a [usize],
    pub coefficients: &'a [f64],
    pub lower: f64,
    pub upper: f64,
}

impl Row<'_> {
    /// Upper bound, or the lower bound for rows unbounded above.
    pub fn rhs(&self) -> f64 {
        if self.upper == f64::INFINITY {
            self.lower
        } else {
            self.upper
        }
    }

    pub fn activity(&self, x: &[f64]) -> f64 {
        self.columns
            .iter()
            .zip(self.coefficients)
            .map(|(&j, &a)| a * x[j])
            .sum()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct RowData {
    columns: Vec<usize>,
    coefficients: Vec<f64>,
    lower: f64,
    upper: f64,
}

/// An immutable, validated MIP instance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MipInstance {
    variables: Vec<Variable>,
    rows: Vec<RowData>,
    nonzeros: usize,
}

impl MipInstance {
    pub fn builder() -> InstanceBuilder {
        InstanceBuilder::new()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }
}

impl Instance for MipInstance {
    fn num_variables(&self) -> usize {
        self.variables.len()
    }

    fn num_constraints(&self) -> usize {
        self.rows.len()
    }

    fn num_nonzeros(&self) -> usize {
        self.nonzeros
    }

    fn variable(&self, index: usize) -> Variable {
        self.variables[index]
    }

    fn constraint(&self, index: usize) -> Row<'_> {
        let row = &self.rows[index];
        Row {
            columns: &row.columns,
            coefficients: &row.coefficients,
            lower: row.lower,
            upper: row.upper,
        }
    }
}

/// Collects variables and rows, then validates everything at once in
/// [`InstanceBuilder::build`].
#[derive(Debug, Default, Clone)]
pub struct InstanceBuilder {
    variables: Vec<Variable>,
    rows: Vec<RowData>,
}

impl InstanceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the new variable's column index
    pub fn add_variable(&mut self, variable: Variable) -> usize {
        self.variables.push(variable);
        self.variables.len() - 1
    }

    /// Add `lower <= sum(coefficients[k] * x[columns[k]]) <= upper`.
    /// Returns the row index.
    pub fn add_constraint(&mut self, columns: Vec<usize>, coefficients: Vec<f64>, lower: f64, upper: f64) -> usize {
        self.rows.push(RowData {
            columns,
            coefficients,
            lower,
            upper,
        });
        self.rows.len() - 1
    }

    pub fn variable(mut self, variable: Variable) -> Self {
        self.add_variable(variable);
        self
    }

    pub fn constraint(mut self, columns: Vec<usize>, coefficients: Vec<f64>, lower: f64, upper: f64) -> Self {
        self.add_constraint(columns, coefficients, lower, upper);
        self
    }

    pub fn build(self) -> Result<MipInstance, InstanceError> {
        let num_variables = self.variables.len();

        for (variable, v) in self.variables.iter().enumerate() {
            if !v.objective.is_finite() {
                return Err(InstanceError::NonFiniteObjective { variable });
            }
            if !valid_bounds(v.lower, v.upper) {
                return Err(InstanceError::InvalidVariableBounds {
                    variable,
                    lower: v.lower,
                    upper: v.upper,
                });
            }
        }

        let mut nonzeros = 0;
        let mut seen = HashSet::new();
        for (row, r) in self.rows.iter().enumerate() {
            if r.columns.len() != r.coefficients.len() {
                return Err(InstanceError::RowLength {
                    row,
                    columns: r.columns.len(),
                    coefficients: r.coefficients.len(),
                });
            }
            if !valid_bounds(r.lower, r.upper) {
                return Err(InstanceError::InvalidRowBounds {
                    row,
                    lower: r.lower,
                    upper: r.upper,
                });
            }
            seen.clear();
            for (&column, &a) in r.columns.iter().zip(&r.coefficients) {
                if column >= num_variables {
                    return Err(InstanceError::ColumnOutOfRange {
                        row,
                        column,
                        num_variables,
                    });
                }
                if !seen.insert(column) {
                    return Err(InstanceError::DuplicateColumn { row, column });
                }
                if !a.is_finite() {
                    return Err(InstanceError::NonFiniteCoefficient { row, column });
                }
            }
            nonzeros += r.columns.len();
        }

        Ok(MipInstance {
            variables: self.variables,
            rows: self.rows,
            nonzeros,
        })
    }
}

fn valid_bounds(lower: f64, upper: f64) -> bool {
    !lower.is_nan() && !upper.is_nan() && lower <= upper && lower != f64::INFINITY && upper != f64::NEG_INFINITY
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knapsack() -> MipInstance {
        MipInstance::builder()
            .variable(Variable::binary().with_objective(-3.0))
            .variable(Variable::binary().with_objective(-2.0))
            .variable(Variable::continuous(0.0, f64::INFINITY))
            .constraint(vec![0, 1], vec![2.0, 1.0], f64::NEG_INFINITY, 2.5)
            .constraint(vec![1, 2], vec![1.0, -1.0], 0.0, f64::INFINITY)
            .build()
            .unwrap()
    }

    #[test]
    fn test_accessors() {
        let instance = knapsack();
        assert_eq!(instance.num_variables(), 3);
        assert_eq!(instance.num_constraints(), 2);
        assert_eq!(instance.num_nonzeros(), 4);
        assert_eq!(instance.objective(), vec![-3.0, -2.0, 0.0]);
        assert!(instance.variable(0).is_binary());
        assert!(!instance.variable(2).is_integer);

        let row = instance.constraint(0);
        assert_eq!(row.columns, &[0, 1]);
        assert_eq!(row.coefficients, &[2.0, 1.0]);
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn test_rhs_uses_lower_when_unbounded_above() {
        let instance = knapsack();
        assert_eq!(instance.rhs(), vec![2.5, 0.0]);
    }

    #[test]
    fn test_lp_feasibility() {
        let instance = knapsack();
        assert!(instance.is_lp_feasible(&[1.0, 0.5, 0.5], 1e-5));
        // Rows unbounded above are checked against their lower bound as a ceiling
        assert!(!instance.is_lp_feasible(&[1.0, 0.5, 0.0], 1e-5));
        assert!(!instance.is_lp_feasible(&[1.0, 1.0, 0.0], 1e-5));
        // 2.5 + 1e-6 is inside the tolerance
        assert!(instance.is_lp_feasible(&[1.0, 0.500001, 0.500001], 1e-5));
    }

    #[test]
    fn test_build_rejects_row_length_mismatch() {
        let err = MipInstance::builder()
            .variable(Variable::binary())
            .constraint(vec![0], vec![1.0, 2.0], 0.0, 1.0)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            InstanceError::RowLength {
                row: 0,
                columns: 1,
                coefficients: 2
            }
        );
    }

    #[test]
    fn test_build_rejects_out_of_range_column() {
        let err = MipInstance::builder()
            .variable(Variable::binary())
            .constraint(vec![3], vec![1.0], 0.0, 1.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, InstanceError::ColumnOutOfRange { column: 3, .. }));
    }

    #[test]
    fn test_build_rejects_duplicates_and_bad_bounds() {
        let err = MipInstance::builder()
            .variable(Variable::binary())
            .constraint(vec![0, 0], vec![1.0, 1.0], 0.0, 1.0)
            .build()
            .unwrap_err();
        assert_eq!(err, InstanceError::DuplicateColumn { row: 0, column: 0 });

        let err = MipInstance::builder()
            .variable(Variable::continuous(2.0, 1.0))
            .build()
            .unwrap_err();
        assert!(matches!(err, InstanceError::InvalidVariableBounds { variable: 0, .. }));

        let err = MipInstance::builder()
            .variable(Variable::binary())
            .constraint(vec![0], vec![1.0], f64::NAN, 1.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, InstanceError::InvalidRowBounds { row: 0, .. }));

        let err = MipInstance::builder()
            .variable(Variable::binary())
            .constraint(vec![0], vec![f64::INFINITY], 0.0, 1.0)
            .build()
            .unwrap_err();
        assert_eq!(err, InstanceError::NonFiniteCoefficient { row: 0, column: 0 });
    }

    #[test]
    fn test_empty_instance() {
        let instance = MipInstance::builder().build().unwrap();
        assert_eq!(instance.num_variables(), 0);
        assert_eq!(instance.num_constraints(), 0);
        assert!(instance.is_lp_feasible(&[], 1e-5));
    }
}
