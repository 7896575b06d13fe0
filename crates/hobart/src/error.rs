//! Pipeline error taxonomy.
//!
//! [`PipelineError::DataQuality`] and [`PipelineError::Config`] stop a run
//! before any window is processed. Every other variant is scoped to one window
//! and is recorded in that window's outcome while the run continues.

use hobart_community::ClusteringError;
use hobart_data::DataError;
use hobart_network::{CentralityError, GraphKind, NetworkError};
use hobart_output::{ExportError, ReportError};
use hobart_risk::CovarianceError;
use thiserror::Error;

/// Errors raised by the pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Defect in the input data
    #[error("Data quality: {0}")]
    DataQuality(#[from] DataError),

    /// Invalid run parameters
    #[error("Configuration error: {0}")]
    Config(String),

    /// Covariance could not be estimated or inverted for a window
    #[error("Window {window}: singular estimate: {source}")]
    SingularEstimate {
        /// Window index
        window: usize,
        /// Underlying estimator error
        #[source]
        source: CovarianceError,
    },

    /// Graphs could not be built from a window's estimate
    #[error("Window {window}: graph construction failed: {source}")]
    GraphConstruction {
        /// Window index
        window: usize,
        /// Underlying conversion error
        #[source]
        source: NetworkError,
    },

    /// Weighted degree could not be normalized
    #[error("Window {window} ({kind}): weighted degree failed: {source}")]
    Centrality {
        /// Window index
        window: usize,
        /// Graph kind
        kind: GraphKind,
        /// Underlying centrality error
        #[source]
        source: CentralityError,
    },

    /// Dominant eigenpair could not be obtained or normalized
    #[error("Window {window} ({kind}): eigendecomposition failed: {source}")]
    Eigendecomposition {
        /// Window index
        window: usize,
        /// Graph kind
        kind: GraphKind,
        /// Underlying centrality error
        #[source]
        source: CentralityError,
    },

    /// Community detection failed
    #[error("Window {window} ({kind}): clustering failed: {source}")]
    ClusteringFailure {
        /// Window index
        window: usize,
        /// Graph kind
        kind: GraphKind,
        /// Underlying strategy error
        #[source]
        source: ClusteringError,
    },

    /// Forward outcomes or rank statistics could not be computed
    #[error("Window {window}: statistics unavailable: {source}")]
    Statistics {
        /// Window index
        window: usize,
        /// Underlying report error
        #[source]
        source: ReportError,
    },

    /// Writing artifacts failed
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

impl PipelineError {
    /// Short label used in summary tables.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::DataQuality(_) => "data_quality",
            Self::Config(_) => "config",
            Self::SingularEstimate { .. } => "singular_estimate",
            Self::GraphConstruction { .. } => "graph_construction",
            Self::Centrality { .. } => "weighted_degree",
            Self::Eigendecomposition { .. } => "eigendecomposition",
            Self::ClusteringFailure { .. } => "clustering",
            Self::Statistics { .. } => "statistics",
            Self::Export(_) => "export",
        }
    }

    /// Window the error belongs to, if it is window-scoped.
    pub const fn window(&self) -> Option<usize> {
        match self {
            Self::SingularEstimate { window, .. }
            | Self::GraphConstruction { window, .. }
            | Self::Centrality { window, .. }
            | Self::Eigendecomposition { window, .. }
            | Self::ClusteringFailure { window, .. }
            | Self::Statistics { window, .. } => Some(*window),
            Self::DataQuality(_) | Self::Config(_) | Self::Export(_) => None,
        }
    }

    /// Graph kind the error belongs to, if it is specific to one graph.
    pub const fn graph_kind(&self) -> Option<GraphKind> {
        match self {
            Self::Centrality { kind, .. }
            | Self::Eigendecomposition { kind, .. }
            | Self::ClusteringFailure { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
