//! Run parameters.

use crate::error::PipelineError;
use hobart_network::EdgeWeighting;
use hobart_network::centrality::{DEFAULT_EIGEN_MAX_ITERATIONS, DEFAULT_EIGEN_TOLERANCE};
use hobart_risk::{ShrinkageTarget, WindowSpec};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters of a pipeline run.
///
/// Missing fields take their defaults when deserialized, so a JSON file only
/// needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Rows per window
    pub window_size: usize,
    /// Rows between consecutive window starts
    pub stride: usize,
    /// Clustering restarts per window and graph
    pub restart_count: usize,
    /// Ledoit-Wolf shrinkage target
    pub shrinkage_target: ShrinkageTarget,
    /// Base seed for clustering restarts
    pub seed: u64,
    /// Rows after a window used for forward outcomes; the stride when absent
    pub forward_horizon: Option<usize>,
    /// Edge weighting for weighted degree
    pub degree_weighting: EdgeWeighting,
    /// Power-iteration budget for eigenvector centrality
    pub eigen_max_iterations: usize,
    /// Power-iteration convergence tolerance
    pub eigen_tolerance: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_size: 300,
            stride: 30,
            restart_count: 10,
            shrinkage_target: ShrinkageTarget::Identity,
            seed: 42,
            forward_horizon: None,
            degree_weighting: EdgeWeighting::Absolute,
            eigen_max_iterations: DEFAULT_EIGEN_MAX_ITERATIONS,
            eigen_tolerance: DEFAULT_EIGEN_TOLERANCE,
        }
    }
}

impl PipelineConfig {
    /// Parse a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PipelineError::Config(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.window_size < 2 {
            return Err(PipelineError::Config(format!(
                "window_size must be at least 2, got {}",
                self.window_size
            )));
        }
        if self.stride == 0 {
            return Err(PipelineError::Config("stride must be at least 1".to_string()));
        }
        if self.restart_count == 0 {
            return Err(PipelineError::Config(
                "restart_count must be at least 1".to_string(),
            ));
        }
        if self.forward_horizon.is_some_and(|h| h < 2) {
            return Err(PipelineError::Config(
                "forward_horizon must be at least 2".to_string(),
            ));
        }
        if self.eigen_max_iterations == 0 {
            return Err(PipelineError::Config(
                "eigen_max_iterations must be at least 1".to_string(),
            ));
        }
        if !(self.eigen_tolerance > 0.0) {
            return Err(PipelineError::Config(format!(
                "eigen_tolerance must be positive, got {}",
                self.eigen_tolerance
            )));
        }
        Ok(())
    }

    /// Window layout.
    pub fn window_spec(&self) -> Result<WindowSpec, PipelineError> {
        WindowSpec::new(self.window_size, self.stride)
            .map_err(|e| PipelineError::Config(e.to_string()))
    }

    /// Forward horizon in rows.
    pub fn horizon(&self) -> usize {
        self.forward_horizon.unwrap_or(self.stride)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.window_size, 300);
        assert_eq!(config.stride, 30);
        assert_eq!(config.restart_count, 10);
        assert_eq!(config.seed, 42);
        assert_eq!(config.horizon(), 30);
        assert_eq!(config.eigen_max_iterations, 10_000);
        assert_eq!(config.degree_weighting, EdgeWeighting::Absolute);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = PipelineConfig::from_json(
            r#"{"window_size": 120, "shrinkage_target": "constant_correlation", "degree_weighting": "signed"}"#,
        )
        .unwrap();
        assert_eq!(config.window_size, 120);
        assert_eq!(config.stride, 30);
        assert_eq!(config.shrinkage_target, ShrinkageTarget::ConstantCorrelation);
        assert_eq!(config.degree_weighting, EdgeWeighting::Signed);
    }

    #[rstest]
    #[case(r#"{"window_size": 1}"#)]
    #[case(r#"{"stride": 0}"#)]
    #[case(r#"{"restart_count": 0}"#)]
    #[case(r#"{"forward_horizon": 1}"#)]
    #[case(r#"{"eigen_tolerance": 0.0}"#)]
    #[case(r#"{"shrinkage_target": "oracle"}"#)]
    fn test_rejected(#[case] json: &str) {
        assert!(matches!(
            PipelineConfig::from_json(json),
            Err(PipelineError::Config(_))
        ));
    }
}
