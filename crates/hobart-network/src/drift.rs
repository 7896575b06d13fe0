//! Dominant eigenvalue series and eigenvector drift across windows.

use crate::centrality::EigenCentrality;
use crate::error::CentralityError;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Euclidean distance between consecutive unit eigenvectors.
pub fn eigenvector_drift(
    previous: ArrayView1<'_, f64>,
    current: ArrayView1<'_, f64>,
) -> Result<f64, CentralityError> {
    if previous.len() != current.len() {
        return Err(CentralityError::DimensionMismatch {
            expected: previous.len(),
            actual: current.len(),
        });
    }
    Ok(previous
        .iter()
        .zip(current.iter())
        .map(|(a, b)| (a - b).powi(2))
        .sum::<f64>()
        .sqrt())
}

/// Eigenvalue and drift series of one graph kind over a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EigenSeries {
    /// Dominant eigenvalue per window, `None` where it is missing
    pub eigenvalues: Vec<Option<f64>>,
    /// Drift between windows `i` and `i + 1`, one entry fewer than windows
    pub drift: Vec<Option<f64>>,
}

/// Accumulates [`EigenSeries`] window by window.
///
/// The previous window's eigenpair is passed in explicitly; the tracker only
/// owns the output series.
#[derive(Debug, Clone, Default)]
pub struct EigenDriftTracker {
    series: EigenSeries,
}

impl EigenDriftTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the next window.
    ///
    /// Every call after the first appends a drift entry, `None` if either side
    /// of the pair is missing. Returns that drift entry.
    pub fn record(
        &mut self,
        previous: Option<&EigenCentrality>,
        current: Option<&EigenCentrality>,
    ) -> Option<f64> {
        let is_first = self.series.eigenvalues.is_empty();
        self.series
            .eigenvalues
            .push(current.map(|eigen| eigen.eigenvalue));
        if is_first {
            return None;
        }

        let drift = match (previous, current) {
            (Some(prev), Some(curr)) => {
                match eigenvector_drift(prev.eigenvector.view(), curr.eigenvector.view()) {
                    Ok(drift) => Some(drift),
                    Err(err) => {
                        tracing::warn!(error = %err, "eigenvector drift unavailable");
                        None
                    }
                }
            }
            _ => None,
        };
        self.series.drift.push(drift);
        drift
    }

    /// Number of windows recorded so far.
    pub fn len(&self) -> usize {
        self.series.eigenvalues.len()
    }

    /// True before the first window.
    pub fn is_empty(&self) -> bool {
        self.series.eigenvalues.is_empty()
    }

    /// The series so far.
    pub const fn series(&self) -> &EigenSeries {
        &self.series
    }

    /// Consume the tracker and return the series.
    pub fn finish(self) -> EigenSeries {
        self.series
    }
}

impl EigenSeries {
    /// Build the series from per-window eigenpairs in window order.
    pub fn from_windows<'a, I>(windows: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a EigenCentrality>>,
    {
        let mut tracker = EigenDriftTracker::new();
        let mut previous = None;
        for current in windows {
            tracker.record(previous, current);
            previous = current;
        }
        tracker.finish()
    }
}
