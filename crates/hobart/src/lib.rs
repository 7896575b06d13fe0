#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod pipeline;

// Re-export the component crates
pub use hobart_community as community;
pub use hobart_data as data;
pub use hobart_network as network;
pub use hobart_output as output;
pub use hobart_risk as risk;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use pipeline::{
    GraphOutcome, Pipeline, PipelineOutput, WindowMatrices, WindowOutcome, load_market_data,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
