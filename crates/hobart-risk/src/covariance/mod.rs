//! Shrinkage covariance estimation
//!
//! Provides the covariance estimators applied to each window of standardized
//! returns, together with the symmetric-matrix utilities used to invert and
//! decompose their output.

pub mod ledoit_wolf;
pub mod utils;

pub use ledoit_wolf::{LedoitWolfConfig, LedoitWolfEstimator, ShrinkageTarget};
pub use utils::{
    EigenDecomposition, TopEigenpair, cholesky, condition_number, dominant_eigenpair,
    invert_spd, is_positive_definite, is_positive_definite_with_tolerance, jacobi_eigendecomp,
};

use ndarray::{Array2, ArrayView2};
use thiserror::Error;

/// Errors that can occur during covariance estimation
#[derive(Debug, Error)]
pub enum CovarianceError {
    /// Insufficient data for estimation
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Matrix is not positive definite
    #[error("Covariance matrix is not positive definite")]
    NotPositiveDefinite,

    /// Column with zero variance inside a window
    #[error("Column {column} has zero variance in this window")]
    DegenerateColumn {
        /// Zero-based column index
        column: usize,
    },

    /// Inverse failed the round-trip check
    #[error("Covariance is not invertible: max |C·Θ - I| = {residual:e}")]
    Singular {
        /// Largest absolute deviation from the identity
        residual: f64,
    },

    /// Iterative solver ran out of iterations
    #[error("Eigensolver did not converge after {iterations} iterations")]
    NoConvergence {
        /// Iterations performed
        iterations: usize,
    },

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// A shrunk covariance matrix and the intensity that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct ShrinkageFit {
    /// Shrunk covariance matrix (p x p)
    pub covariance: Array2<f64>,
    /// Weight placed on the structured target, in [0, 1]
    pub shrinkage: f64,
}

/// Trait for covariance matrix estimators
pub trait CovarianceEstimator {
    /// Estimate the covariance matrix from a sample of returns
    ///
    /// # Arguments
    /// * `returns` - Matrix where each row is a time period and each column an instrument
    ///
    /// # Returns
    /// * Estimated covariance (p x p) and the shrinkage intensity applied
    fn estimate(&self, returns: ArrayView2<'_, f64>) -> Result<ShrinkageFit, CovarianceError>;
}
