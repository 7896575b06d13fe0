#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod covariance;
pub mod estimator;
pub mod window;

// Re-export main types
pub use covariance::{
    CovarianceError, CovarianceEstimator, LedoitWolfConfig, LedoitWolfEstimator, ShrinkageFit,
    ShrinkageTarget,
};
pub use estimator::{PrecisionPair, WindowedEstimator, standardize};
pub use window::{Window, WindowSpec};
