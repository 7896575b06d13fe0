//! Per-instrument outcomes over the rows that follow a window.

use crate::report::ReportError;
use hobart_data::ReturnMatrix;
use hobart_risk::Window;
use ndarray::{Array1, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Forward quantity that centrality is ranked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForwardTarget {
    /// Mean log return
    Return,
    /// Population standard deviation of log returns
    Risk,
    /// Mean over standard deviation
    Sharpe,
}

impl ForwardTarget {
    /// All targets in reporting order.
    pub const fn all() -> [Self; 3] {
        [Self::Return, Self::Risk, Self::Sharpe]
    }

    /// Identifier used in reports.
    pub const fn identifier(&self) -> &'static str {
        match self {
            Self::Return => "forward_return",
            Self::Risk => "forward_risk",
            Self::Sharpe => "forward_sharpe",
        }
    }
}

impl fmt::Display for ForwardTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Forward return, risk and Sharpe ratio per instrument
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardOutcomes {
    /// First forward row (inclusive)
    pub start: usize,
    /// Last forward row (exclusive)
    pub end: usize,
    returns: Array1<f64>,
    risk: Array1<f64>,
}

impl ForwardOutcomes {
    /// Outcomes over rows `[window.end, window.end + horizon)`.
    ///
    /// Needs at least two forward rows, all inside the return matrix.
    pub fn compute(
        returns: &ReturnMatrix,
        window: &Window,
        horizon: usize,
    ) -> Result<Self, ReportError> {
        if horizon < 2 {
            return Err(ReportError::InsufficientData {
                required: 2,
                actual: horizon,
            });
        }
        let (start, end) = window.forward(horizon);
        if end > returns.n_periods() {
            return Err(ReportError::InsufficientData {
                required: end,
                actual: returns.n_periods(),
            });
        }

        let rows = returns.rows(start, end);
        let mean = rows
            .mean_axis(Axis(0))
            .ok_or(ReportError::InsufficientData {
                required: 2,
                actual: 0,
            })?;
        let risk = rows.std_axis(Axis(0), 0.0);

        Ok(Self {
            start,
            end,
            returns: mean,
            risk,
        })
    }

    /// Number of instruments.
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    /// True for an empty universe.
    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    /// Mean forward return per instrument.
    pub const fn returns(&self) -> &Array1<f64> {
        &self.returns
    }

    /// Forward risk per instrument.
    pub const fn risk(&self) -> &Array1<f64> {
        &self.risk
    }

    /// Forward Sharpe ratio per instrument; `None` where the risk is zero.
    pub fn sharpe(&self) -> Vec<Option<f64>> {
        self.returns
            .iter()
            .zip(self.risk.iter())
            .map(|(&r, &s)| (s > 0.0).then(|| r / s))
            .collect()
    }

    /// Values of one target, `None` where undefined.
    pub fn target(&self, target: ForwardTarget) -> Vec<Option<f64>> {
        match target {
            ForwardTarget::Return => self.returns.iter().map(|&v| Some(v)).collect(),
            ForwardTarget::Risk => self.risk.iter().map(|&v| Some(v)).collect(),
            ForwardTarget::Sharpe => self.sharpe(),
        }
    }
}
