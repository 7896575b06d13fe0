//! Error types for graph construction and centrality analysis.

use hobart_risk::CovarianceError;
use thiserror::Error;

/// Errors raised while converting matrices and building graphs
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Matrix is not square
    #[error("Matrix must be square, got {rows}x{cols}")]
    NotSquare {
        /// Row count
        rows: usize,
        /// Column count
        cols: usize,
    },

    /// Matrix size does not match the universe
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// A diagonal entry that must be strictly positive is not
    #[error("Non-positive diagonal entry {value} at index {index}")]
    NonPositiveDiagonal {
        /// Diagonal position
        index: usize,
        /// Offending value
        value: f64,
    },

    /// NaN or infinite entry
    #[error("Non-finite entry at ({row}, {col})")]
    NonFinite {
        /// Row index
        row: usize,
        /// Column index
        col: usize,
    },

    /// Matrix is not symmetric within tolerance
    #[error("Matrix is not symmetric: deviation {deviation:e} at ({row}, {col})")]
    Asymmetric {
        /// Row index
        row: usize,
        /// Column index
        col: usize,
        /// Absolute difference between the mirrored entries
        deviation: f64,
    },
}

/// Errors raised while computing centrality
#[derive(Debug, Error)]
pub enum CentralityError {
    /// Normalizing total is (numerically) zero
    #[error("Cannot normalize centrality: total {total:e} is numerically zero")]
    DegenerateNormalization {
        /// The near-zero total
        total: f64,
    },

    /// A node score is negative, so the vector is not a weight distribution
    #[error("Negative centrality score {value:e} at node {node}")]
    NegativeWeight {
        /// Node index
        node: usize,
        /// Offending score
        value: f64,
    },

    /// Dominant eigenpair could not be computed
    #[error("Eigendecomposition failed: {0}")]
    Eigendecomposition(#[source] CovarianceError),

    /// Vectors or graphs of different sizes were combined
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },
}
