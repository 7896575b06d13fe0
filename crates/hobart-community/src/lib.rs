#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod louvain;
pub mod similarity;
pub mod stability;
pub mod strategy;

pub use louvain::{Louvain, modularity};
pub use similarity::adjusted_rand_index;
pub use stability::{
    CommunityStabilityTracker, MeanStd, PartitionStatsSeries, WindowClusterings,
    WindowPartitionStats, restart_seed,
};
pub use strategy::{Clustering, ClusteringError, ClusteringStrategy, Partition};
