#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod builder;
pub mod centrality;
pub mod convert;
pub mod drift;
pub mod error;
pub mod graph;

pub use builder::{NetworkBuilder, NetworkPair};
pub use centrality::{
    CentralityAnalyzer, CentralityKind, CentralityMeasure, CentralityVector, EdgeWeighting, EigenCentrality,
    SectorCentrality, SectorStat,
};
pub use convert::{covariance_to_correlation, precision_to_partial_correlation};
pub use drift::{EigenDriftTracker, EigenSeries, eigenvector_drift};
pub use error::{CentralityError, NetworkError};
pub use graph::{Edge, EdgeWeightSummary, GraphKind, WeightedGraph};
