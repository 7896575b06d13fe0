//! Clustering strategy contract and partition types.

use hobart_network::WeightedGraph;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by clustering strategies and partition comparisons
#[derive(Debug, Error)]
pub enum ClusteringError {
    /// Graph has no nodes
    #[error("Cannot cluster an empty graph")]
    EmptyGraph,

    /// No positive edge weight to build communities from
    #[error("Graph has no positive edge weight")]
    NoPositiveWeight,

    /// Partitions or graphs of different sizes were combined
    #[error("Size mismatch: expected {expected}, got {actual}")]
    SizeMismatch {
        /// Expected node count
        expected: usize,
        /// Actual node count
        actual: usize,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Assignment of each node to a community.
///
/// Community ids are canonical: they are numbered `0, 1, ...` in order of
/// first appearance, so equal groupings compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Partition {
    labels: Vec<usize>,
}

impl Partition {
    /// Build a partition from arbitrary community labels.
    pub fn from_labels<L: Eq + std::hash::Hash + Clone>(labels: &[L]) -> Self {
        let mut ids = std::collections::HashMap::new();
        let labels = labels
            .iter()
            .map(|label| {
                let next = ids.len();
                *ids.entry(label.clone()).or_insert(next)
            })
            .collect();
        Self { labels }
    }

    /// Every node in its own community.
    pub fn singletons(n: usize) -> Self {
        Self {
            labels: (0..n).collect(),
        }
    }

    /// Community id per node.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Community of one node.
    pub fn community_of(&self, node: usize) -> Option<usize> {
        self.labels.get(node).copied()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True for a partition of zero nodes.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of distinct communities.
    pub fn community_count(&self) -> usize {
        self.labels.iter().max().map_or(0, |&max| max + 1)
    }

    /// Member lists, indexed by community id.
    pub fn communities(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.community_count()];
        for (node, &label) in self.labels.iter().enumerate() {
            groups[label].push(node);
        }
        groups
    }
}

/// Output of one clustering run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clustering {
    /// Community assignment
    pub partition: Partition,
    /// Modularity of the assignment on the clustered graph
    pub modularity: f64,
}

/// A community detection algorithm.
///
/// Implementations must be deterministic for a given graph and seed.
pub trait ClusteringStrategy {
    /// Short name for logs and reports.
    fn name(&self) -> &'static str;

    /// Partition the nodes of a graph.
    fn cluster(&self, graph: &WeightedGraph, seed: u64) -> Result<Clustering, ClusteringError>;
}
