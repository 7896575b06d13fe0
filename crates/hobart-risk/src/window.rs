//! Sliding-window layout over a return matrix.

use crate::covariance::CovarianceError;
use serde::{Deserialize, Serialize};

/// Window size and stride, in rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    /// Rows per window
    pub window_size: usize,
    /// Rows advanced between consecutive windows
    pub stride: usize,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            window_size: 300,
            stride: 30,
        }
    }
}

impl WindowSpec {
    /// Create a validated window specification.
    pub fn new(window_size: usize, stride: usize) -> Result<Self, CovarianceError> {
        if window_size < 2 {
            return Err(CovarianceError::InvalidParameter(format!(
                "window_size must be at least 2, got {window_size}"
            )));
        }
        if stride == 0 {
            return Err(CovarianceError::InvalidParameter(
                "stride must be positive".to_string(),
            ));
        }
        Ok(Self {
            window_size,
            stride,
        })
    }

    /// Number of windows over `n_periods` rows: `floor((T - window_size) / stride)`.
    ///
    /// Every window counted here leaves at least `stride` rows after its end.
    pub const fn count(&self, n_periods: usize) -> usize {
        if n_periods < self.window_size || self.stride == 0 {
            0
        } else {
            (n_periods - self.window_size) / self.stride
        }
    }

    /// The window with the given index.
    pub const fn window(&self, index: usize) -> Window {
        let start = index * self.stride;
        Window {
            index,
            start,
            end: start + self.window_size,
        }
    }

    /// All windows over `n_periods` rows, in order.
    pub fn windows(&self, n_periods: usize) -> impl Iterator<Item = Window> + use<> {
        let spec = *self;
        (0..spec.count(n_periods)).map(move |i| spec.window(i))
    }
}

/// Half-open row range `[start, end)` of the return matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    /// Position in the window sequence
    pub index: usize,
    /// First row (inclusive)
    pub start: usize,
    /// Last row (exclusive)
    pub end: usize,
}

impl Window {
    /// Number of rows.
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// True for a zero-length window.
    pub const fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Rows strictly after this window: `[end, end + horizon)`.
    pub const fn forward(&self, horizon: usize) -> (usize, usize) {
        (self.end, self.end + horizon)
    }
}
