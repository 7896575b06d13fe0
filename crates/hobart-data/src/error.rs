//! Error types for data operations.
//!
//! Every variant here describes a defect in the global input, so the
//! pipeline treats all of them as fatal before any window is processed.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading or validating input data.
#[derive(Debug, Error)]
pub enum DataError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Sector label outside the known set
    #[error("Unknown sector label: {0:?}")]
    UnknownSector(String),

    /// Instrument listed more than once
    #[error("Duplicate instrument: {0}")]
    DuplicateInstrument(String),

    /// The universe contains no instruments
    #[error("Universe contains no instruments")]
    EmptyUniverse,

    /// Missing, non-numeric, non-finite or non-positive cell
    #[error("Invalid value at row {row}, column {column}: {value:?}")]
    InvalidValue {
        /// Zero-based data row
        row: usize,
        /// Column (instrument) name
        column: String,
        /// Raw cell contents
        value: String,
    },

    /// Row label that is not a date
    #[error("Invalid date at row {row}: {value:?}")]
    InvalidDate {
        /// Zero-based data row
        row: usize,
        /// Raw label
        value: String,
    },

    /// Return column with zero variance over the whole sample
    #[error("Constant return series for instrument {0}")]
    ConstantColumn(String),

    /// Not enough rows to build a return series
    #[error("Insufficient data: need at least {required} rows, got {actual}")]
    InsufficientData {
        /// Required number of rows
        required: usize,
        /// Actual number of rows
        actual: usize,
    },

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },
}
