//! Utilities for symmetric matrices
//!
//! This module provides the dense linear algebra needed by the estimator and
//! the network analysis: Cholesky factorization and inversion of symmetric
//! positive definite matrices, a full Jacobi eigendecomposition, and a
//! shifted power method that extracts only the top eigenpair.

use super::CovarianceError;
use ndarray::{Array1, Array2};

/// Result of eigenvalue decomposition
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    /// Eigenvalues (sorted in descending order)
    pub eigenvalues: Array1<f64>,
    /// Eigenvectors (columns are eigenvectors)
    pub eigenvectors: Array2<f64>,
}

/// Algebraically largest eigenvalue and its eigenvector
#[derive(Debug, Clone, PartialEq)]
pub struct TopEigenpair {
    /// Largest eigenvalue
    pub eigenvalue: f64,
    /// Unit-length eigenvector whose largest-magnitude entry is positive
    pub eigenvector: Array1<f64>,
    /// Power iterations used
    pub iterations: usize,
}

fn check_square(matrix: &Array2<f64>) -> Result<usize, CovarianceError> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(CovarianceError::DimensionMismatch {
            expected: n,
            actual: matrix.ncols(),
        });
    }
    Ok(n)
}

fn default_jacobi_iterations(n: usize) -> usize {
    (50 * n * n).max(100)
}

/// Cholesky factorization A = L L^T
///
/// # Returns
/// * Lower-triangular factor L
///
/// Fails with [`CovarianceError::NotPositiveDefinite`] when a pivot is not
/// strictly positive.
pub fn cholesky(matrix: &Array2<f64>) -> Result<Array2<f64>, CovarianceError> {
    let n = check_square(matrix)?;
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = matrix[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }

            if i == j {
                if !sum.is_finite() || sum <= 0.0 {
                    return Err(CovarianceError::NotPositiveDefinite);
                }
                l[[i, i]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }

    Ok(l)
}

/// Invert a symmetric positive definite matrix through its Cholesky factor
///
/// Solves L L^T X = I column by column with forward then back substitution.
/// The result is symmetrized to remove rounding asymmetry.
pub fn invert_spd(matrix: &Array2<f64>) -> Result<Array2<f64>, CovarianceError> {
    let l = cholesky(matrix)?;
    let n = l.nrows();
    let mut inv = Array2::<f64>::zeros((n, n));
    let mut y = Array1::<f64>::zeros(n);

    for col in 0..n {
        // Forward substitution: L y = e_col
        for i in 0..n {
            let mut sum = if i == col { 1.0 } else { 0.0 };
            for j in 0..i {
                sum -= l[[i, j]] * y[j];
            }
            y[i] = sum / l[[i, i]];
        }

        // Back substitution: L^T x = y
        for i in (0..n).rev() {
            let mut sum = y[i];
            for j in (i + 1)..n {
                sum -= l[[j, i]] * inv[[j, col]];
            }
            inv[[i, col]] = sum / l[[i, i]];
        }
    }

    Ok((&inv + &inv.t()) / 2.0)
}

/// Check if a matrix is positive definite
///
/// A matrix is positive definite if all eigenvalues are strictly positive.
pub fn is_positive_definite(cov: &Array2<f64>) -> bool {
    is_positive_definite_with_tolerance(cov, 1e-10)
}

/// Check if a matrix is positive definite with a custom tolerance
///
/// # Returns
/// * `true` if all eigenvalues are greater than tolerance
pub fn is_positive_definite_with_tolerance(cov: &Array2<f64>, tolerance: f64) -> bool {
    if cov.nrows() != cov.ncols() {
        return false;
    }

    // Quick check: diagonal elements must be positive
    if cov.diag().iter().any(|&d| d <= 0.0) {
        return false;
    }

    match jacobi_eigendecomp(cov, default_jacobi_iterations(cov.nrows()), 1e-12) {
        Ok(decomp) => decomp.eigenvalues.iter().all(|&v| v > tolerance),
        Err(_) => false,
    }
}

/// Compute the condition number of a matrix
///
/// The condition number is the ratio of the largest to smallest eigenvalue.
///
/// # Returns
/// * Condition number (infinity if smallest eigenvalue is zero or the solver fails)
pub fn condition_number(cov: &Array2<f64>) -> f64 {
    match jacobi_eigendecomp(cov, default_jacobi_iterations(cov.nrows()), 1e-12) {
        Ok(decomp) => {
            let max_eig = decomp
                .eigenvalues
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            let min_eig = decomp
                .eigenvalues
                .iter()
                .copied()
                .fold(f64::INFINITY, f64::min);

            if min_eig.abs() < 1e-15 {
                f64::INFINITY
            } else {
                max_eig / min_eig
            }
        }
        Err(_) => f64::INFINITY,
    }
}

/// Jacobi eigenvalue decomposition for symmetric matrices
///
/// Stable and simple, but computes the full spectrum; use
/// [`dominant_eigenpair`] when only the top eigenpair is needed.
///
/// # Arguments
/// * `matrix` - Symmetric matrix to decompose
/// * `max_iterations` - Maximum number of rotations
/// * `tolerance` - Convergence tolerance for off-diagonal elements
pub fn jacobi_eigendecomp(
    matrix: &Array2<f64>,
    max_iterations: usize,
    tolerance: f64,
) -> Result<EigenDecomposition, CovarianceError> {
    let n = check_square(matrix)?;

    let mut a = matrix.clone();
    let mut v = Array2::<f64>::eye(n);
    let mut converged = n < 2;

    for _iter in 0..max_iterations {
        let (p, q, max_val) = find_largest_off_diagonal(&a);
        if max_val.abs() < tolerance {
            converged = true;
            break;
        }

        let (cos_theta, sin_theta) = compute_rotation(a[[p, p]], a[[q, q]], a[[p, q]]);
        apply_jacobi_rotation(&mut a, &mut v, p, q, cos_theta, sin_theta);
    }

    if !converged {
        let (_, _, max_val) = find_largest_off_diagonal(&a);
        if max_val.abs() >= tolerance {
            return Err(CovarianceError::NoConvergence {
                iterations: max_iterations,
            });
        }
    }

    let eigenvalues: Array1<f64> = a.diag().to_owned();

    // Sort eigenvalues and eigenvectors in descending order
    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by(|&i, &j| eigenvalues[j].total_cmp(&eigenvalues[i]));

    let sorted_eigenvalues = indices.iter().map(|&i| eigenvalues[i]).collect();
    let mut sorted_eigenvectors = Array2::<f64>::zeros((n, n));
    for (new_idx, &old_idx) in indices.iter().enumerate() {
        sorted_eigenvectors
            .column_mut(new_idx)
            .assign(&v.column(old_idx));
    }

    Ok(EigenDecomposition {
        eigenvalues: sorted_eigenvalues,
        eigenvectors: sorted_eigenvectors,
    })
}

/// Find the largest off-diagonal element in a symmetric matrix
fn find_largest_off_diagonal(matrix: &Array2<f64>) -> (usize, usize, f64) {
    let n = matrix.nrows();
    if n < 2 {
        return (0, 0, 0.0);
    }

    let mut max_val = 0.0;
    let mut p = 0;
    let mut q = 1;

    for i in 0..n {
        for j in (i + 1)..n {
            let val = matrix[[i, j]].abs();
            if val > max_val {
                max_val = val;
                p = i;
                q = j;
            }
        }
    }

    (p, q, matrix[[p, q]])
}

/// Compute the rotation (cos, sin) for Jacobi rotation
fn compute_rotation(app: f64, aqq: f64, apq: f64) -> (f64, f64) {
    if apq.abs() < 1e-15 {
        return (1.0, 0.0);
    }

    let tau = (aqq - app) / (2.0 * apq);
    let t = if tau >= 0.0 {
        1.0 / (tau + (1.0 + tau * tau).sqrt())
    } else {
        -1.0 / (-tau + (1.0 + tau * tau).sqrt())
    };

    let cos_theta = 1.0 / (1.0 + t * t).sqrt();
    let sin_theta = t * cos_theta;

    (cos_theta, sin_theta)
}

/// Apply a Jacobi rotation to matrix A and eigenvector matrix V
fn apply_jacobi_rotation(
    a: &mut Array2<f64>,
    v: &mut Array2<f64>,
    p: usize,
    q: usize,
    cos_theta: f64,
    sin_theta: f64,
) {
    let n = a.nrows();

    let app = a[[p, p]];
    let aqq = a[[q, q]];
    let apq = a[[p, q]];

    a[[p, p]] = cos_theta * cos_theta * app - 2.0 * cos_theta * sin_theta * apq
        + sin_theta * sin_theta * aqq;
    a[[q, q]] = sin_theta * sin_theta * app
        + 2.0 * cos_theta * sin_theta * apq
        + cos_theta * cos_theta * aqq;
    a[[p, q]] = 0.0;
    a[[q, p]] = 0.0;

    for i in 0..n {
        if i != p && i != q {
            let aip = a[[i, p]];
            let aiq = a[[i, q]];

            a[[i, p]] = cos_theta * aip - sin_theta * aiq;
            a[[p, i]] = a[[i, p]];

            a[[i, q]] = sin_theta * aip + cos_theta * aiq;
            a[[q, i]] = a[[i, q]];
        }
    }

    for i in 0..n {
        let vip = v[[i, p]];
        let viq = v[[i, q]];

        v[[i, p]] = cos_theta * vip - sin_theta * viq;
        v[[i, q]] = sin_theta * vip + cos_theta * viq;
    }
}

/// Largest eigenpair of a symmetric matrix by shifted power iteration
///
/// The matrix is shifted by a Gershgorin bound so that the algebraically
/// largest eigenvalue also dominates in magnitude, which keeps the iteration
/// correct for indefinite matrices such as partial-correlation matrices.
/// The returned eigenvector has unit L2 norm and its largest-magnitude entry
/// is positive (first such entry on ties).
///
/// # Arguments
/// * `matrix` - Symmetric matrix
/// * `max_iterations` - Iteration budget
/// * `tolerance` - Convergence threshold on the change between iterates
pub fn dominant_eigenpair(
    matrix: &Array2<f64>,
    max_iterations: usize,
    tolerance: f64,
) -> Result<TopEigenpair, CovarianceError> {
    let n = check_square(matrix)?;
    if n == 0 {
        return Err(CovarianceError::DimensionMismatch {
            expected: 1,
            actual: 0,
        });
    }

    let max_diag = matrix.diag().iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let gershgorin_lower = (0..n)
        .map(|i| {
            let radius: f64 = (0..n)
                .filter(|&j| j != i)
                .map(|j| matrix[[i, j]].abs())
                .sum();
            matrix[[i, i]] - radius
        })
        .fold(f64::INFINITY, f64::min);
    let shift = (-(max_diag + gershgorin_lower) / 2.0).max(0.0);

    // Deterministic start that is not orthogonal to structured eigenvectors.
    let mut v =
        Array1::from_shape_fn(n, |i| 1.0 + 0.5 * ((i as f64 + 1.0) * 0.618_033_988_75).fract());
    let start_norm = l2_norm(&v);
    v /= start_norm;

    let mut iterations = 0;
    let mut converged = false;
    while iterations < max_iterations {
        iterations += 1;

        let mut w = matrix.dot(&v) + &v * shift;
        let norm = l2_norm(&w);
        if !norm.is_finite() {
            return Err(CovarianceError::NoConvergence { iterations });
        }
        if norm == 0.0 {
            // v lies in the null space of the shifted matrix
            converged = true;
            break;
        }
        w /= norm;

        let delta = l2_norm(&(&w - &v));
        v = w;
        if delta < tolerance {
            converged = true;
            break;
        }
    }

    if !converged {
        return Err(CovarianceError::NoConvergence { iterations });
    }

    let eigenvalue = v.dot(&matrix.dot(&v));
    fix_sign(&mut v);

    Ok(TopEigenpair {
        eigenvalue,
        eigenvector: v,
        iterations,
    })
}

fn l2_norm(v: &Array1<f64>) -> f64 {
    v.dot(v).sqrt()
}

/// Flip `v` so that its largest-magnitude entry is positive
fn fix_sign(v: &mut Array1<f64>) {
    let mut pivot = 0.0_f64;
    for &x in v.iter() {
        if x.abs() > pivot.abs() {
            pivot = x;
        }
    }
    if pivot < 0.0 {
        v.mapv_inplace(|x| -x);
    }
}

/// Reconstruct a matrix from eigenvalues and eigenvectors: M = V * Λ * V^T
#[cfg(test)]
fn reconstruct_from_eigen(eigenvalues: &Array1<f64>, eigenvectors: &Array2<f64>) -> Array2<f64> {
    let scaled = eigenvectors * &eigenvalues.view().insert_axis(ndarray::Axis(0));
    scaled.dot(&eigenvectors.t())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_jacobi_eigendecomp_diagonal() {
        let matrix = Array2::from_diag(&array![4.0, 1.0, 2.0]);
        let decomp = jacobi_eigendecomp(&matrix, 100, 1e-12).unwrap();

        assert_abs_diff_eq!(decomp.eigenvalues[0], 4.0, epsilon = 1e-10);
        assert_abs_diff_eq!(decomp.eigenvalues[1], 2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(decomp.eigenvalues[2], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_jacobi_eigendecomp_reconstructs() {
        let matrix = array![[2.0, 1.0, 1.0], [1.0, 2.0, 1.0], [1.0, 1.0, 2.0]];
        let decomp = jacobi_eigendecomp(&matrix, 100, 1e-12).unwrap();
        let reconstructed = reconstruct_from_eigen(&decomp.eigenvalues, &decomp.eigenvectors);

        for i in 0..3 {
            for j in 0..3 {
                assert_abs_diff_eq!(matrix[[i, j]], reconstructed[[i, j]], epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn test_jacobi_reports_non_convergence() {
        let matrix = array![[2.0, 1.0, 0.5], [1.0, 2.0, 0.3], [0.5, 0.3, 2.0]];
        assert!(matches!(
            jacobi_eigendecomp(&matrix, 1, 1e-14),
            Err(CovarianceError::NoConvergence { iterations: 1 })
        ));
    }

    #[test]
    fn test_is_positive_definite() {
        let matrix = array![[1.0, 0.5, 0.0], [0.5, 1.0, 0.3], [0.0, 0.3, 1.0]];
        assert!(is_positive_definite(&matrix));

        let indefinite = array![[1.0, 2.0], [2.0, 1.0]];
        assert!(!is_positive_definite(&indefinite));
    }

    #[test]
    fn test_condition_number() {
        assert_abs_diff_eq!(condition_number(&Array2::eye(3)), 1.0, epsilon = 1e-10);

        let ill = Array2::from_diag(&array![1000.0, 1.0, 0.001]);
        assert!(condition_number(&ill) > 100.0);
    }

    #[test]
    fn test_cholesky_factor() {
        let matrix = array![[4.0, 2.0], [2.0, 3.0]];
        let l = cholesky(&matrix).unwrap();
        assert_abs_diff_eq!(l[[0, 0]], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(l[[1, 0]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(l[[1, 1]], 2.0_f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(l[[0, 1]], 0.0);
    }

    #[test]
    fn test_cholesky_rejects_singular() {
        let singular = array![[1.0, 1.0], [1.0, 1.0]];
        assert!(matches!(
            cholesky(&singular),
            Err(CovarianceError::NotPositiveDefinite)
        ));
    }

    #[test]
    fn test_invert_spd() {
        let matrix = array![[4.0, 1.0, 0.5], [1.0, 3.0, 0.2], [0.5, 0.2, 2.0]];
        let inv = invert_spd(&matrix).unwrap();
        let product = matrix.dot(&inv);

        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(product[[i, j]], expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_dominant_eigenpair_matches_jacobi() {
        let matrix = array![[1.0, 0.6, 0.3], [0.6, 1.0, 0.5], [0.3, 0.5, 1.0]];
        let top = dominant_eigenpair(&matrix, 10_000, 1e-12).unwrap();
        let full = jacobi_eigendecomp(&matrix, 100, 1e-14).unwrap();

        assert_abs_diff_eq!(top.eigenvalue, full.eigenvalues[0], epsilon = 1e-9);
        let reference = full.eigenvectors.column(0);
        let sign = if reference.sum() < 0.0 { -1.0 } else { 1.0 };
        for i in 0..3 {
            assert_abs_diff_eq!(top.eigenvector[i], sign * reference[i], epsilon = 1e-6);
        }
        assert_abs_diff_eq!(l2_norm(&top.eigenvector), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_dominant_eigenpair_indefinite_matrix() {
        // Eigenvalues 1.5 and -0.5 (eigenvector (1, -1)/√2 for 1.5).
        let matrix = array![[0.5, -1.0], [-1.0, 0.5]];
        let top = dominant_eigenpair(&matrix, 10_000, 1e-12).unwrap();
        assert_abs_diff_eq!(top.eigenvalue, 1.5, epsilon = 1e-9);
        assert_abs_diff_eq!(top.eigenvector[0].abs(), 0.5_f64.sqrt(), epsilon = 1e-6);
        assert!(top.eigenvector[0] * top.eigenvector[1] < 0.0);
    }

    #[test]
    fn test_dominant_eigenpair_sign_convention() {
        // Largest eigenvalue 3 with eigenvector (0, 0, 1) up to sign.
        let matrix = Array2::from_diag(&array![1.0, 2.0, 3.0]);
        let top = dominant_eigenpair(&matrix, 10_000, 1e-12).unwrap();
        assert_abs_diff_eq!(top.eigenvalue, 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(top.eigenvector[2], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_dominant_eigenpair_budget_exhausted() {
        let matrix = array![[1.0, 0.6, 0.3], [0.6, 1.0, 0.5], [0.3, 0.5, 1.0]];
        assert!(matches!(
            dominant_eigenpair(&matrix, 1, 1e-15),
            Err(CovarianceError::NoConvergence { iterations: 1 })
        ));
    }
}
