//! Log-return matrices.
//!
//! A [`ReturnMatrix`] is built once per run and never mutated. Rows are time
//! steps in chronological order, columns follow the [`Universe`] order.

use crate::error::{DataError, Result};
use crate::universe::Universe;
use chrono::NaiveDate;
use ndarray::{Array2, ArrayView2, Axis, Slice};

/// Dense T x p matrix of log returns.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMatrix {
    values: Array2<f64>,
    /// Date of each return row. Empty for undated (synthetic) series.
    dates: Vec<NaiveDate>,
}

impl ReturnMatrix {
    /// Build log returns from a price matrix by first differences of logs.
    ///
    /// `dates` labels the price rows and may be empty. The first price row has
    /// no return, so the result has one row fewer than `prices`.
    pub fn from_prices(
        prices: &Array2<f64>,
        dates: &[NaiveDate],
        universe: &Universe,
    ) -> Result<Self> {
        let (n_rows, n_cols) = prices.dim();

        if n_cols != universe.len() {
            return Err(DataError::DimensionMismatch {
                expected: universe.len(),
                actual: n_cols,
            });
        }
        if n_rows < 2 {
            return Err(DataError::InsufficientData {
                required: 2,
                actual: n_rows,
            });
        }
        if !dates.is_empty() && dates.len() != n_rows {
            return Err(DataError::DimensionMismatch {
                expected: n_rows,
                actual: dates.len(),
            });
        }

        for ((row, col), &price) in prices.indexed_iter() {
            if !price.is_finite() || price <= 0.0 {
                return Err(DataError::InvalidValue {
                    row,
                    column: universe.instruments()[col].name.clone(),
                    value: price.to_string(),
                });
            }
        }

        let log_prices = prices.mapv(f64::ln);
        let values = &log_prices.slice_axis(Axis(0), Slice::from(1..n_rows))
            - &log_prices.slice_axis(Axis(0), Slice::from(0..n_rows - 1));
        let dates = if dates.is_empty() {
            Vec::new()
        } else {
            dates[1..].to_vec()
        };

        Self::from_returns(values, dates, universe)
    }

    /// Wrap an existing return matrix after validating it.
    ///
    /// Rejects non-finite entries and columns that are constant over the
    /// whole sample.
    pub fn from_returns(
        values: Array2<f64>,
        dates: Vec<NaiveDate>,
        universe: &Universe,
    ) -> Result<Self> {
        let (n_rows, n_cols) = values.dim();

        if n_cols != universe.len() {
            return Err(DataError::DimensionMismatch {
                expected: universe.len(),
                actual: n_cols,
            });
        }
        if n_rows == 0 {
            return Err(DataError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        if !dates.is_empty() && dates.len() != n_rows {
            return Err(DataError::DimensionMismatch {
                expected: n_rows,
                actual: dates.len(),
            });
        }

        for ((row, col), &value) in values.indexed_iter() {
            if !value.is_finite() {
                return Err(DataError::InvalidValue {
                    row,
                    column: universe.instruments()[col].name.clone(),
                    value: value.to_string(),
                });
            }
        }

        for (col, column) in values.axis_iter(Axis(1)).enumerate() {
            let first = column[0];
            if column.iter().all(|&v| v == first) {
                return Err(DataError::ConstantColumn(
                    universe.instruments()[col].name.clone(),
                ));
            }
        }

        Ok(Self { values, dates })
    }

    /// Number of time steps (T).
    pub fn n_periods(&self) -> usize {
        self.values.nrows()
    }

    /// Number of instruments (p).
    pub fn n_instruments(&self) -> usize {
        self.values.ncols()
    }

    /// The full matrix.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Rows `[start, end)`, clamped to the available periods.
    pub fn rows(&self, start: usize, end: usize) -> ArrayView2<'_, f64> {
        let end = end.min(self.n_periods());
        let start = start.min(end);
        self.values.slice_axis(Axis(0), Slice::from(start..end))
    }

    /// Date of a return row, if the series is dated.
    pub fn date(&self, row: usize) -> Option<NaiveDate> {
        self.dates.get(row).copied()
    }

    /// Dates of all return rows.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }
}
