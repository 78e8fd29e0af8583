use nalgebra::{DMatrix, SVD};

use crate::{FeatureError, Instance};

const SVD_MAX_ITERATIONS: usize = 10_000;

/// Dense `num_constraints x num_variables` copy of the constraint matrix.
pub fn constraint_matrix(instance: &dyn Instance) -> DMatrix<f64> {
    let mut matrix = DMatrix::zeros(instance.num_constraints(), instance.num_variables());
    for i in 0..instance.num_constraints() {
        let row = instance.constraint(i);
        for (&j, &a) in row.columns.iter().zip(row.coefficients) {
            matrix[(i, j)] = a;
        }
    }
    matrix
}

/// Singular values in descending order. An empty matrix has none.
pub fn singular_values(matrix: &DMatrix<f64>) -> Result<Vec<f64>, FeatureError> {
    let (rows, cols) = matrix.shape();
    if rows == 0 || cols == 0 {
        return Ok(Vec::new());
    }

    let svd = SVD::try_new(matrix.clone(), false, false, f64::EPSILON, SVD_MAX_ITERATIONS)
        .ok_or(FeatureError::SvdNoConvergence { rows, cols })?;

    let mut values: Vec<f64> = svd.singular_values.iter().copied().collect();
    values.sort_by(|a, b| b.total_cmp(a));
    Ok(values)
}

/// Extreme singular values of the constraint matrix
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SingularValueRange {
    pub largest: Option<f64>,
    /// Smallest singular value above the tolerance
    pub smallest_nonzero: Option<f64>,
}

impl SingularValueRange {
    /// `values` must be sorted descending.
    pub fn from_sorted(values: &[f64], tolerance: f64) -> Self {
        Self {
            largest: values.first().copied(),
            smallest_nonzero: values.iter().rev().copied().find(|&s| s > tolerance),
        }
    }

    pub fn condition(&self) -> Option<f64> {
        match (self.largest, self.smallest_nonzero) {
            (Some(large), Some(small)) => Some(large / small),
            _ => None,
        }
    }

    /// No singular value above the tolerance, including the empty matrix.
    pub fn is_degenerate(&self) -> bool {
        self.smallest_nonzero.is_none()
    }
}

pub fn svd_range(instance: &dyn Instance, tolerance: f64) -> Result<SingularValueRange, FeatureError> {
    let values = singular_values(&constraint_matrix(instance))?;
    let range = SingularValueRange::from_sorted(&values, tolerance);
    tracing::debug!(
        rank = values.iter().filter(|&&s| s > tolerance).count(),
        largest = ?range.largest,
        smallest = ?range.smallest_nonzero,
        "constraint matrix singular values"
    );
    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MipInstance, Variable};

    #[test]
    fn test_constraint_matrix_layout() {
        let instance = MipInstance::builder()
            .variable(Variable::binary())
            .variable(Variable::binary())
            .variable(Variable::binary())
            .constraint(vec![2, 0], vec![5.0, 1.0], 0.0, 1.0)
            .constraint(vec![1], vec![-2.0], 0.0, 1.0)
            .build()
            .unwrap();

        let matrix = constraint_matrix(&instance);

        assert_eq!(matrix.shape(), (2, 3));
        assert_eq!(matrix[(0, 0)], 1.0);
        assert_eq!(matrix[(0, 1)], 0.0);
        assert_eq!(matrix[(0, 2)], 5.0);
        assert_eq!(matrix[(1, 1)], -2.0);
    }

    #[test]
    fn test_diagonal_singular_values() {
        let matrix = DMatrix::from_row_slice(3, 3, &[3.0, 0.0, 0.0, 0.0, -4.0, 0.0, 0.0, 0.0, 0.5]);
        let values = singular_values(&matrix).unwrap();

        assert_eq!(values.len(), 3);
        assert!((values[0] - 4.0).abs() < 1e-10);
        assert!((values[1] - 3.0).abs() < 1e-10);
        assert!((values[2] - 0.5).abs() < 1e-10);

        let range = SingularValueRange::from_sorted(&values, 1e-5);
        assert!((range.condition().unwrap() - 8.0).abs() < 1e-9);
        assert!(!range.is_degenerate());
    }

    #[test]
    fn test_rank_deficient_skips_zero() {
        // Second row is twice the first
        let matrix = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 2.0, 2.0]);
        let values = singular_values(&matrix).unwrap();
        let range = SingularValueRange::from_sorted(&values, 1e-5);

        assert!((range.largest.unwrap() - 10f64.sqrt()).abs() < 1e-9);
        assert!((range.smallest_nonzero.unwrap() - 10f64.sqrt()).abs() < 1e-9);
        assert!((range.condition().unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_matrix_is_degenerate() {
        let instance = MipInstance::builder()
            .variable(Variable::binary())
            .build()
            .unwrap();

        let range = svd_range(&instance, 1e-5).unwrap();

        assert_eq!(range.largest, None);
        assert!(range.is_degenerate());
        assert_eq!(range.condition(), None);
    }

    #[test]
    fn test_zero_matrix_is_degenerate() {
        let range = SingularValueRange::from_sorted(&singular_values(&DMatrix::zeros(2, 3)).unwrap(), 1e-5);
        assert_eq!(range.largest, Some(0.0));
        assert!(range.is_degenerate());
        assert_eq!(range.condition(), None);
    }
}
