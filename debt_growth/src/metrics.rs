//! Fit diagnostics

use crate::error::Result;
use growth_math::{mean_squared_error, r2_score};
use nalgebra::DMatrix;

/// Condition number of a matrix in the 2-norm
///
/// Ratio of the largest to the smallest singular value. Matrices with
/// non-finite entries or a zero singular value are reported as `+∞`.
pub fn condition_number(matrix: &DMatrix<f64>) -> f64 {
    if matrix.is_empty() || matrix.iter().any(|v| !v.is_finite()) {
        return f64::INFINITY;
    }

    let singular_values = matrix.singular_values();
    let s_max = singular_values.max();
    let s_min = singular_values.min();

    if s_min <= 0.0 {
        f64::INFINITY
    } else {
        s_max / s_min
    }
}

/// Curve fit diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct FitDiagnostics {
    /// Condition number of the parameter covariance
    pub condition_number: f64,
    /// Mean Squared Error of in-sample predictions
    pub mse: f64,
    /// Coefficient of determination
    pub r2: f64,
    /// Observations scored
    pub observations: usize,
}

impl FitDiagnostics {
    /// Score in-sample predictions against observed values
    pub fn new(actual: &[f64], predicted: &[f64], condition_number: f64) -> Result<Self> {
        Ok(Self {
            condition_number,
            mse: mean_squared_error(actual, predicted)?,
            r2: r2_score(actual, predicted)?,
            observations: actual.len(),
        })
    }
}

impl std::fmt::Display for FitDiagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Condition number of the covariance matrix: {:.6e}",
            self.condition_number
        )?;
        writeln!(f, "Mean Squared Error: {:.6}", self.mse)?;
        writeln!(f, "R2 score: {:.6}", self.r2)?;
        write!(f, "Observations: {}", self.observations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_condition_number() {
        let diagonal = DMatrix::from_row_slice(2, 2, &[4.0, 0.0, 0.0, 0.5]);
        assert_relative_eq!(condition_number(&diagonal), 8.0, epsilon = 1e-12);

        let singular = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        assert!(condition_number(&singular) > 1e12);

        let undefined = DMatrix::from_element(2, 2, f64::INFINITY);
        assert!(condition_number(&undefined).is_infinite());
    }

    #[test]
    fn test_diagnostics_display() {
        let diagnostics = FitDiagnostics::new(&[1.0, 2.0, 3.0], &[1.0, 2.0, 4.0], 12.5).unwrap();

        assert_relative_eq!(diagnostics.mse, 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(diagnostics.r2, 0.5, epsilon = 1e-12);

        let text = diagnostics.to_string();
        assert!(text.contains("Mean Squared Error: 0.333333"));
        assert!(text.contains("R2 score: 0.500000"));
    }
}
