//! Windowed covariance/precision estimation.
//!
//! For each window the sample is standardized with that window's own mean and
//! standard deviation, shrunk with a [`CovarianceEstimator`], and inverted.
//! Nothing is carried from one window to the next.

use crate::covariance::{
    CovarianceError, CovarianceEstimator, LedoitWolfEstimator, ShrinkageFit, condition_number,
    invert_spd,
};
use crate::window::{Window, WindowSpec};
use hobart_data::ReturnMatrix;
use ndarray::{Array2, ArrayView2, Axis};

/// Default bound on `max |C·Θ - I|` for an accepted inverse.
pub const DEFAULT_INVERSE_TOLERANCE: f64 = 1e-8;

/// Standard deviations at or below this are treated as zero.
const MIN_STD: f64 = 1e-12;

/// Covariance, its inverse and the shrinkage that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecisionPair {
    /// Symmetric positive definite covariance (p x p)
    pub covariance: Array2<f64>,
    /// Inverse of `covariance`
    pub precision: Array2<f64>,
    /// Shrinkage intensity in [0, 1]
    pub shrinkage: f64,
}

/// Standardize columns to zero mean and unit (population) variance.
///
/// Fails with [`CovarianceError::DegenerateColumn`] when a column has no
/// variance in the sample.
pub fn standardize(sample: ArrayView2<'_, f64>) -> Result<Array2<f64>, CovarianceError> {
    let n_obs = sample.nrows();
    if n_obs < 2 {
        return Err(CovarianceError::InsufficientData {
            required: 2,
            actual: n_obs,
        });
    }

    let means = sample
        .mean_axis(Axis(0))
        .ok_or(CovarianceError::InsufficientData {
            required: 2,
            actual: 0,
        })?;
    let stds = sample.std_axis(Axis(0), 0.0);

    if let Some(column) = stds.iter().position(|&s| !(s > MIN_STD)) {
        return Err(CovarianceError::DegenerateColumn { column });
    }

    Ok((&sample - &means.insert_axis(Axis(0))) / &stds.insert_axis(Axis(0)))
}

/// Slides a window over a return matrix and estimates a [`PrecisionPair`] per window.
#[derive(Debug, Clone)]
pub struct WindowedEstimator<E = LedoitWolfEstimator> {
    spec: WindowSpec,
    estimator: E,
    inverse_tolerance: f64,
}

impl WindowedEstimator<LedoitWolfEstimator> {
    /// Ledoit-Wolf estimation with the default identity target.
    pub fn ledoit_wolf(spec: WindowSpec) -> Self {
        Self::new(spec, LedoitWolfEstimator::default())
    }
}

impl<E: CovarianceEstimator> WindowedEstimator<E> {
    /// Create an estimator over the given window layout.
    pub const fn new(spec: WindowSpec, estimator: E) -> Self {
        Self {
            spec,
            estimator,
            inverse_tolerance: DEFAULT_INVERSE_TOLERANCE,
        }
    }

    /// Override the inverse round-trip tolerance.
    pub const fn with_inverse_tolerance(mut self, tolerance: f64) -> Self {
        self.inverse_tolerance = tolerance;
        self
    }

    /// The window layout.
    pub const fn spec(&self) -> WindowSpec {
        self.spec
    }

    /// Windows over the given return matrix.
    pub fn windows(&self, returns: &ReturnMatrix) -> Vec<Window> {
        self.spec.windows(returns.n_periods()).collect()
    }

    /// Estimate the covariance/precision pair of a single window.
    pub fn estimate_window(
        &self,
        returns: &ReturnMatrix,
        window: &Window,
    ) -> Result<PrecisionPair, CovarianceError> {
        if window.end > returns.n_periods() {
            return Err(CovarianceError::InsufficientData {
                required: window.end,
                actual: returns.n_periods(),
            });
        }

        let standardized = standardize(returns.rows(window.start, window.end))?;
        let ShrinkageFit {
            covariance,
            shrinkage,
        } = self.estimator.estimate(standardized.view())?;

        if !(0.0..=1.0).contains(&shrinkage) {
            return Err(CovarianceError::InvalidParameter(format!(
                "shrinkage intensity {shrinkage} outside [0, 1]"
            )));
        }
        if covariance.diag().iter().any(|&d| !(d > 0.0)) {
            return Err(CovarianceError::NotPositiveDefinite);
        }

        let precision = invert_spd(&covariance)?;
        let residual = inverse_residual(&covariance, &precision);
        if !(residual <= self.inverse_tolerance) {
            return Err(CovarianceError::Singular { residual });
        }

        if tracing::enabled!(tracing::Level::DEBUG) {
            tracing::debug!(
                window = window.index,
                start = window.start,
                shrinkage,
                condition = condition_number(&covariance),
                "estimated precision pair"
            );
        }

        Ok(PrecisionPair {
            covariance,
            precision,
            shrinkage,
        })
    }

    /// Estimate every window; failures are returned per window, not raised.
    pub fn estimate_all(
        &self,
        returns: &ReturnMatrix,
    ) -> Vec<(Window, Result<PrecisionPair, CovarianceError>)> {
        self.windows(returns)
            .into_iter()
            .map(|window| {
                let estimate = self.estimate_window(returns, &window);
                if let Err(err) = &estimate {
                    tracing::warn!(window = window.index, error = %err, "window estimate failed");
                }
                (window, estimate)
            })
            .collect()
    }
}

fn inverse_residual(covariance: &Array2<f64>, precision: &Array2<f64>) -> f64 {
    let product = covariance.dot(precision);
    product
        .indexed_iter()
        .map(|((i, j), &v)| (v - if i == j { 1.0 } else { 0.0 }).abs())
        .fold(0.0, f64::max)
}
