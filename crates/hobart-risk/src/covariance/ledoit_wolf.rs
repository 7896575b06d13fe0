//! Ledoit-Wolf Shrinkage Covariance Estimator
//!
//! Implements the analytical shrinkage estimator from:
//! "Honey, I Shrunk the Sample Covariance Matrix" (Ledoit & Wolf, 2004)
//!
//! The estimator has the form:
//! Σ_LW = δ* F + (1-δ*) S
//!
//! where:
//! - S is the sample covariance matrix (normalized by T)
//! - F is the shrinkage target
//! - δ* = clamp((π̂ - ρ̂) / (T γ̂), 0, 1)
//!
//! with π̂ the summed asymptotic variances of the entries of S, ρ̂ the
//! target-specific covariance correction and γ̂ = ||S - F||²_F.
//!
//! For the scaled identity target this coincides with the estimator of
//! Ledoit & Wolf (2004, JMVA), as implemented by common statistics packages.

use super::{CovarianceError, CovarianceEstimator, ShrinkageFit};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shrinkage target types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShrinkageTarget {
    /// Identity matrix scaled by average variance: F = μ * I where μ = trace(S)/p
    #[default]
    Identity,

    /// Diagonal variances with constant average correlation
    ConstantCorrelation,

    /// Diagonal matrix (no off-diagonal elements)
    Diagonal,
}

impl ShrinkageTarget {
    /// Identifier used in configuration files
    pub const fn identifier(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::ConstantCorrelation => "constant_correlation",
            Self::Diagonal => "diagonal",
        }
    }
}

impl FromStr for ShrinkageTarget {
    type Err = CovarianceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "identity" => Ok(Self::Identity),
            "constant_correlation" => Ok(Self::ConstantCorrelation),
            "diagonal" => Ok(Self::Diagonal),
            other => Err(CovarianceError::InvalidParameter(format!(
                "unknown shrinkage target {other:?}"
            ))),
        }
    }
}

impl fmt::Display for ShrinkageTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Ledoit-Wolf covariance estimator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedoitWolfConfig {
    /// Minimum number of observations required (default: 2)
    pub min_observations: usize,

    /// Shrinkage target type (default: Identity)
    pub target: ShrinkageTarget,

    /// Whether to center returns (subtract mean) before computing covariance
    pub center: bool,
}

impl Default for LedoitWolfConfig {
    fn default() -> Self {
        Self {
            min_observations: 2,
            target: ShrinkageTarget::Identity,
            center: true,
        }
    }
}

/// Ledoit-Wolf shrinkage covariance estimator
#[derive(Debug, Clone, Default)]
pub struct LedoitWolfEstimator {
    config: LedoitWolfConfig,
}

impl LedoitWolfEstimator {
    /// Create a new Ledoit-Wolf estimator with the given configuration
    pub const fn new(config: LedoitWolfConfig) -> Self {
        Self { config }
    }

    /// Estimator shrinking toward `target` with otherwise default settings
    pub fn with_target(target: ShrinkageTarget) -> Self {
        Self::new(LedoitWolfConfig {
            target,
            ..Default::default()
        })
    }

    /// The active configuration
    pub const fn config(&self) -> &LedoitWolfConfig {
        &self.config
    }

    fn centered(&self, returns: ArrayView2<'_, f64>) -> Array2<f64> {
        if self.config.center {
            match returns.mean_axis(Axis(0)) {
                Some(means) => &returns - &means.insert_axis(Axis(0)),
                None => returns.to_owned(),
            }
        } else {
            returns.to_owned()
        }
    }

    /// Compute the sample covariance matrix S = (1/T) * Y^T * Y
    fn sample_covariance(centered: &Array2<f64>) -> Array2<f64> {
        let n = centered.nrows() as f64;
        centered.t().dot(centered) / n
    }

    /// Compute the shrinkage target matrix F
    fn shrinkage_target(&self, sample_cov: &Array2<f64>) -> Array2<f64> {
        let p = sample_cov.nrows();

        match self.config.target {
            ShrinkageTarget::Identity => {
                let mu = sample_cov.diag().sum() / p as f64;
                Array2::eye(p) * mu
            }

            ShrinkageTarget::Diagonal => Array2::from_diag(&sample_cov.diag()),

            ShrinkageTarget::ConstantCorrelation => {
                let variances: Array1<f64> = sample_cov.diag().to_owned();
                let std_devs = variances.mapv(f64::sqrt);
                let avg_corr = average_correlation(sample_cov, &std_devs);

                Array2::from_shape_fn((p, p), |(i, j)| {
                    if i == j {
                        variances[i]
                    } else {
                        avg_corr * std_devs[i] * std_devs[j]
                    }
                })
            }
        }
    }

    /// Compute the optimal shrinkage intensity
    fn shrinkage_intensity(
        &self,
        centered: &Array2<f64>,
        sample_cov: &Array2<f64>,
        target: &Array2<f64>,
    ) -> f64 {
        let (n_periods, p) = centered.dim();
        let n = n_periods as f64;

        // π_ij = (1/T) Σ_t (y_ti y_tj - s_ij)²
        let squared = centered.mapv(|v| v * v);
        let pi_mat = squared.t().dot(&squared) / n - sample_cov.mapv(|v| v * v);
        let pi_hat = pi_mat.sum();

        let rho_hat = match self.config.target {
            ShrinkageTarget::Identity => 0.0,
            ShrinkageTarget::Diagonal => pi_mat.diag().sum(),
            ShrinkageTarget::ConstantCorrelation => {
                let std_devs = sample_cov.diag().mapv(f64::sqrt);
                let avg_corr = average_correlation(sample_cov, &std_devs);

                // θ_ii,ij = (1/T) Σ_t (y_ti² - s_ii)(y_ti y_tj - s_ij)
                let cubed = centered.mapv(|v| v * v * v);
                let theta = cubed.t().dot(centered) / n;

                let mut off_diag = 0.0;
                for i in 0..p {
                    for j in 0..p {
                        if i == j {
                            continue;
                        }
                        let theta_ii = theta[[i, j]] - sample_cov[[i, i]] * sample_cov[[i, j]];
                        let theta_jj = theta[[j, i]] - sample_cov[[j, j]] * sample_cov[[i, j]];
                        off_diag += (std_devs[j] / std_devs[i]) * theta_ii
                            + (std_devs[i] / std_devs[j]) * theta_jj;
                    }
                }
                pi_mat.diag().sum() + avg_corr / 2.0 * off_diag
            }
        };

        let gamma_hat = (sample_cov - target).mapv(|v| v * v).sum();

        if gamma_hat > 0.0 {
            ((pi_hat - rho_hat) / (n * gamma_hat)).clamp(0.0, 1.0)
        } else {
            // S already equals the target
            0.0
        }
    }
}

fn average_correlation(sample_cov: &Array2<f64>, std_devs: &Array1<f64>) -> f64 {
    let p = sample_cov.nrows();
    let mut sum_corr = 0.0;
    let mut count = 0;
    for i in 0..p {
        for j in (i + 1)..p {
            let denom = std_devs[i] * std_devs[j];
            if denom > 0.0 {
                sum_corr += sample_cov[[i, j]] / denom;
            }
            count += 1;
        }
    }
    if count > 0 {
        sum_corr / count as f64
    } else {
        0.0
    }
}

impl CovarianceEstimator for LedoitWolfEstimator {
    fn estimate(&self, returns: ArrayView2<'_, f64>) -> Result<ShrinkageFit, CovarianceError> {
        let (n_periods, _) = returns.dim();

        if n_periods < self.config.min_observations {
            return Err(CovarianceError::InsufficientData {
                required: self.config.min_observations,
                actual: n_periods,
            });
        }

        let centered = self.centered(returns);
        let sample_cov = Self::sample_covariance(&centered);
        let target = self.shrinkage_target(&sample_cov);
        let delta = self.shrinkage_intensity(&centered, &sample_cov, &target);

        // Σ_LW = δ* F + (1-δ*) S
        let covariance = &target * delta + &sample_cov * (1.0 - delta);

        Ok(ShrinkageFit {
            covariance,
            shrinkage: delta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::covariance::utils::is_positive_definite;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rstest::rstest;

    fn wavy(n_obs: usize, n_cols: usize) -> Array2<f64> {
        Array2::from_shape_fn((n_obs, n_cols), |(t, j)| {
            ((t * (j + 3)) as f64 * 0.731).sin() + 0.2 * ((t + j) as f64 * 0.37).cos()
        })
    }

    #[test]
    fn test_ledoit_wolf_config_default() {
        let config = LedoitWolfConfig::default();
        assert_eq!(config.min_observations, 2);
        assert_eq!(config.target, ShrinkageTarget::Identity);
        assert!(config.center);
    }

    #[rstest]
    #[case("identity", ShrinkageTarget::Identity)]
    #[case("diagonal", ShrinkageTarget::Diagonal)]
    #[case("constant_correlation", ShrinkageTarget::ConstantCorrelation)]
    fn test_target_from_identifier(#[case] raw: &str, #[case] expected: ShrinkageTarget) {
        assert_eq!(raw.parse::<ShrinkageTarget>().unwrap(), expected);
        assert_eq!(expected.to_string(), raw);
    }

    #[test]
    fn test_unknown_target() {
        assert!("graphical_lasso".parse::<ShrinkageTarget>().is_err());
    }

    #[test]
    fn test_insufficient_data() {
        let estimator = LedoitWolfEstimator::default();
        let returns = Array2::<f64>::zeros((1, 3));
        assert!(matches!(
            estimator.estimate(returns.view()),
            Err(CovarianceError::InsufficientData { required: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_sample_covariance_simple() {
        let returns = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0]];
        let sample_cov = LedoitWolfEstimator::sample_covariance(&returns);

        // (1/3) * [[14, 28], [28, 56]]
        assert_relative_eq!(sample_cov[[0, 0]], 14.0 / 3.0, epsilon = 1e-10);
        assert_relative_eq!(sample_cov[[0, 1]], 28.0 / 3.0, epsilon = 1e-10);
        assert_relative_eq!(sample_cov[[1, 1]], 56.0 / 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_identity_target() {
        let estimator = LedoitWolfEstimator::default();
        let sample_cov = array![[4.0, 1.0, 0.5], [1.0, 9.0, 1.5], [0.5, 1.5, 16.0]];
        let target = estimator.shrinkage_target(&sample_cov);

        let mu = 29.0 / 3.0;
        for i in 0..3 {
            assert_relative_eq!(target[[i, i]], mu, epsilon = 1e-10);
        }
        assert_relative_eq!(target[[0, 1]], 0.0);
        assert_relative_eq!(target[[0, 2]], 0.0);
    }

    #[test]
    fn test_diagonal_target() {
        let estimator = LedoitWolfEstimator::with_target(ShrinkageTarget::Diagonal);
        let sample_cov = array![[4.0, 1.0, 0.5], [1.0, 9.0, 1.5], [0.5, 1.5, 16.0]];
        let target = estimator.shrinkage_target(&sample_cov);

        assert_relative_eq!(target[[0, 0]], 4.0);
        assert_relative_eq!(target[[1, 1]], 9.0);
        assert_relative_eq!(target[[2, 2]], 16.0);
        assert_relative_eq!(target[[1, 2]], 0.0);
    }

    #[test]
    fn test_constant_correlation_target() {
        let estimator = LedoitWolfEstimator::with_target(ShrinkageTarget::ConstantCorrelation);
        // corr = 2/(2*3) = 1/3
        let sample_cov = array![[4.0, 2.0], [2.0, 9.0]];
        let target = estimator.shrinkage_target(&sample_cov);

        assert_relative_eq!(target[[0, 0]], 4.0, epsilon = 1e-10);
        assert_relative_eq!(target[[1, 1]], 9.0, epsilon = 1e-10);
        assert_relative_eq!(target[[0, 1]], 2.0, epsilon = 1e-10);
        assert_relative_eq!(target[[1, 0]], 2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_identity_intensity_matches_closed_form() {
        // Two perfectly anti-correlated columns of ±1:
        // S = [[1, -1], [-1, 1]], μ = 1, γ = 2, every π_ij = 1 - 1 = 0.
        let returns = array![[1.0, -1.0], [-1.0, 1.0], [1.0, -1.0], [-1.0, 1.0]];
        let fit = LedoitWolfEstimator::default()
            .estimate(returns.view())
            .unwrap();
        assert_relative_eq!(fit.shrinkage, 0.0, epsilon = 1e-12);

        // Uncorrelated alternating columns: S = I exactly, so no shrinkage.
        let returns = array![[1.0, 1.0], [-1.0, 1.0], [1.0, -1.0], [-1.0, -1.0]];
        let fit = LedoitWolfEstimator::default()
            .estimate(returns.view())
            .unwrap();
        assert_relative_eq!(fit.shrinkage, 0.0, epsilon = 1e-12);
        assert_relative_eq!(fit.covariance[[0, 1]], 0.0, epsilon = 1e-12);
    }

    #[rstest]
    #[case(ShrinkageTarget::Identity)]
    #[case(ShrinkageTarget::Diagonal)]
    #[case(ShrinkageTarget::ConstantCorrelation)]
    fn test_shrinkage_intensity_bounds(#[case] target: ShrinkageTarget) {
        let estimator = LedoitWolfEstimator::with_target(target);
        for (n_obs, n_cols) in [(10, 3), (40, 5), (6, 8)] {
            let fit = estimator.estimate(wavy(n_obs, n_cols).view()).unwrap();
            assert!(
                (0.0..=1.0).contains(&fit.shrinkage),
                "shrinkage {} out of range for {target}",
                fit.shrinkage
            );
        }
    }

    #[test]
    fn test_estimate_produces_valid_covariance() {
        let estimator = LedoitWolfEstimator::default();
        let fit = estimator.estimate(wavy(20, 3).view()).unwrap();
        let cov = fit.covariance;

        assert_eq!(cov.dim(), (3, 3));
        for i in 0..3 {
            assert!(cov[[i, i]] > 0.0);
            for j in 0..3 {
                assert_relative_eq!(cov[[i, j]], cov[[j, i]], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_shrinkage_restores_definiteness_when_p_exceeds_t() {
        // 6 observations of 8 series: the sample covariance is rank deficient.
        let returns = wavy(6, 8);
        let estimator = LedoitWolfEstimator::default();
        let fit = estimator.estimate(returns.view()).unwrap();

        assert!(fit.shrinkage > 0.0);
        assert!(is_positive_definite(&fit.covariance));
    }
}
