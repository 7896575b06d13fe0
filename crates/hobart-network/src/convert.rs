//! Covariance and precision matrix conversions.
//!
//! Correlation:         ρ_ij = C_ij / sqrt(C_ii · C_jj)
//! Partial correlation: ρ_ij = -Θ_ij / sqrt(Θ_ii · Θ_jj)
//!
//! Both outputs carry a unit diagonal and are exactly symmetric. Inputs must be
//! square, finite, symmetric within [`SYMMETRY_TOLERANCE`] (relative to the
//! largest diagonal entry) and have a strictly positive diagonal.

use crate::error::NetworkError;
use ndarray::{Array1, Array2};

/// Relative tolerance for the input symmetry check.
pub const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Convert a covariance matrix to a correlation matrix.
pub fn covariance_to_correlation(covariance: &Array2<f64>) -> Result<Array2<f64>, NetworkError> {
    normalize(covariance, 1.0)
}

/// Convert a precision (inverse covariance) matrix to a partial-correlation matrix.
pub fn precision_to_partial_correlation(
    precision: &Array2<f64>,
) -> Result<Array2<f64>, NetworkError> {
    normalize(precision, -1.0)
}

fn normalize(matrix: &Array2<f64>, sign: f64) -> Result<Array2<f64>, NetworkError> {
    let scale = validate_symmetric(matrix, SYMMETRY_TOLERANCE)?;
    let n = matrix.nrows();

    Ok(Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            1.0
        } else {
            // Average mirrored entries so the output is symmetric bit for bit.
            let (a, b) = if i < j { (i, j) } else { (j, i) };
            let value = 0.5 * (matrix[[a, b]] + matrix[[b, a]]);
            sign * value / (scale[a] * scale[b])
        }
    }))
}

/// Check a matrix is square, finite, symmetric with a positive diagonal.
///
/// Returns the square roots of the diagonal.
pub(crate) fn validate_symmetric(
    matrix: &Array2<f64>,
    tolerance: f64,
) -> Result<Array1<f64>, NetworkError> {
    let (rows, cols) = matrix.dim();
    if rows != cols {
        return Err(NetworkError::NotSquare { rows, cols });
    }

    if let Some(((row, col), _)) = matrix.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(NetworkError::NonFinite { row, col });
    }

    let diag = matrix.diag();
    if let Some((index, &value)) = diag.iter().enumerate().find(|&(_, &d)| d <= 0.0) {
        return Err(NetworkError::NonPositiveDiagonal { index, value });
    }

    let max_diag = diag.iter().copied().fold(0.0_f64, f64::max);
    let bound = tolerance * max_diag.max(1.0);
    for i in 0..rows {
        for j in (i + 1)..cols {
            let deviation = (matrix[[i, j]] - matrix[[j, i]]).abs();
            if deviation > bound {
                return Err(NetworkError::Asymmetric {
                    row: i,
                    col: j,
                    deviation,
                });
            }
        }
    }

    Ok(diag.mapv(f64::sqrt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rstest::rstest;

    #[test]
    fn test_correlation_values() {
        let cov = array![[4.0, 2.0, -1.0], [2.0, 9.0, 0.0], [-1.0, 0.0, 1.0]];
        let corr = covariance_to_correlation(&cov).unwrap();

        assert_abs_diff_eq!(corr[[0, 1]], 2.0 / 6.0, epsilon = 1e-15);
        assert_abs_diff_eq!(corr[[0, 2]], -0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(corr[[1, 2]], 0.0, epsilon = 1e-15);
        for i in 0..3 {
            assert_eq!(corr[[i, i]], 1.0);
        }
    }

    #[test]
    fn test_partial_correlation_sign() {
        // A positive off-diagonal precision entry is a negative partial correlation.
        let precision = array![[2.0, 0.5], [0.5, 2.0]];
        let pcorr = precision_to_partial_correlation(&precision).unwrap();
        assert_abs_diff_eq!(pcorr[[0, 1]], -0.25, epsilon = 1e-15);
        assert_eq!(pcorr[[0, 1]], pcorr[[1, 0]]);
        assert_eq!(pcorr[[0, 0]], 1.0);
    }

    #[test]
    fn test_two_variable_partial_equals_correlation() {
        // With two variables there is nothing to condition on.
        let cov = array![[1.5, 0.6], [0.6, 0.8]];
        let det = 1.5 * 0.8 - 0.6 * 0.6;
        let precision = array![[0.8 / det, -0.6 / det], [-0.6 / det, 1.5 / det]];

        let corr = covariance_to_correlation(&cov).unwrap();
        let pcorr = precision_to_partial_correlation(&precision).unwrap();
        assert_abs_diff_eq!(corr[[0, 1]], pcorr[[0, 1]], epsilon = 1e-12);
    }

    #[test]
    fn test_correlation_is_idempotent() {
        let cov = array![[2.0, 0.3, 0.1], [0.3, 1.0, -0.4], [0.1, -0.4, 3.0]];
        let once = covariance_to_correlation(&cov).unwrap();
        let twice = covariance_to_correlation(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_output_is_exactly_symmetric() {
        let mut cov = array![[1.0, 0.3], [0.3, 1.0]];
        cov[[1, 0]] += 1e-12;
        let corr = covariance_to_correlation(&cov).unwrap();
        assert_eq!(corr[[0, 1]], corr[[1, 0]]);
    }

    #[rstest]
    #[case(array![[1.0, 0.1], [0.1, 0.0]])]
    #[case(array![[-1.0, 0.1], [0.1, 1.0]])]
    fn test_non_positive_diagonal(#[case] matrix: Array2<f64>) {
        assert!(matches!(
            covariance_to_correlation(&matrix),
            Err(NetworkError::NonPositiveDiagonal { .. })
        ));
        assert!(precision_to_partial_correlation(&matrix).is_err());
    }

    #[test]
    fn test_rejects_asymmetric_and_non_square() {
        let asymmetric = array![[1.0, 0.5], [0.1, 1.0]];
        assert!(matches!(
            covariance_to_correlation(&asymmetric),
            Err(NetworkError::Asymmetric { row: 0, col: 1, .. })
        ));

        let rect = Array2::<f64>::ones((2, 3));
        assert!(matches!(
            covariance_to_correlation(&rect),
            Err(NetworkError::NotSquare { rows: 2, cols: 3 })
        ));
    }

    #[test]
    fn test_rejects_nan() {
        let cov = array![[1.0, f64::NAN], [f64::NAN, 1.0]];
        assert!(matches!(
            covariance_to_correlation(&cov),
            Err(NetworkError::NonFinite { row: 0, col: 1 })
        ));
    }
}
