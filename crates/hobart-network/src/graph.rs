//! Complete weighted graphs over the instrument universe.

use crate::convert::{SYMMETRY_TOLERANCE, validate_symmetric};
use crate::error::NetworkError;
use hobart_data::{Sector, Universe};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Which dependence matrix a graph was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphKind {
    /// Pairwise (marginal) correlation
    Correlation,
    /// Partial correlation conditioned on all other instruments
    PartialCorrelation,
}

impl GraphKind {
    /// Both kinds, in reporting order.
    pub const fn all() -> [Self; 2] {
        [Self::Correlation, Self::PartialCorrelation]
    }

    /// Identifier used in artifact keys and reports.
    pub const fn identifier(&self) -> &'static str {
        match self {
            Self::Correlation => "correlation",
            Self::PartialCorrelation => "partial_correlation",
        }
    }
}

impl fmt::Display for GraphKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// An undirected edge `source < target`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Lower node index
    pub source: usize,
    /// Higher node index
    pub target: usize,
    /// Signed edge weight
    pub weight: f64,
}

/// Distribution of off-diagonal edge weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeWeightSummary {
    /// Number of edges
    pub count: usize,
    /// Mean weight
    pub mean: f64,
    /// Population standard deviation of the weights
    pub std: f64,
    /// Smallest weight
    pub min: f64,
    /// Largest weight
    pub max: f64,
    /// Share of edges with a strictly positive weight
    pub positive_fraction: f64,
}

/// Complete weighted graph with a unit diagonal that is not part of the edge set.
///
/// Nodes are the instruments of the universe in canonical order.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedGraph {
    kind: GraphKind,
    universe: Arc<Universe>,
    weights: Array2<f64>,
}

impl WeightedGraph {
    /// Wrap a symmetric weight matrix.
    ///
    /// The matrix must match the universe size, be finite and symmetric.
    pub fn new(
        kind: GraphKind,
        universe: Arc<Universe>,
        weights: Array2<f64>,
    ) -> Result<Self, NetworkError> {
        if weights.nrows() != universe.len() {
            return Err(NetworkError::DimensionMismatch {
                expected: universe.len(),
                actual: weights.nrows(),
            });
        }
        validate_symmetric(&weights, SYMMETRY_TOLERANCE)?;

        Ok(Self {
            kind,
            universe,
            weights,
        })
    }

    /// Graph kind.
    pub const fn kind(&self) -> GraphKind {
        self.kind
    }

    /// The instrument universe.
    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Shared handle to the universe.
    pub fn universe_handle(&self) -> Arc<Universe> {
        Arc::clone(&self.universe)
    }

    /// Full weight matrix, diagonal included.
    pub const fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    /// Number of nodes.
    pub fn n_nodes(&self) -> usize {
        self.weights.nrows()
    }

    /// Number of edges, `p(p-1)/2`.
    pub fn n_edges(&self) -> usize {
        let n = self.n_nodes();
        n * n.saturating_sub(1) / 2
    }

    /// Weight between two nodes, `None` when out of range.
    pub fn weight(&self, i: usize, j: usize) -> Option<f64> {
        self.weights.get([i, j]).copied()
    }

    /// Sector of a node.
    pub fn sector(&self, node: usize) -> Option<Sector> {
        self.universe.sector_of(node)
    }

    /// Edges over `i < j`, row by row.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        let n = self.n_nodes();
        (0..n).flat_map(move |source| {
            ((source + 1)..n).map(move |target| Edge {
                source,
                target,
                weight: self.weights[[source, target]],
            })
        })
    }

    /// Summary of the edge-weight distribution, `None` for a single node.
    pub fn edge_summary(&self) -> Option<EdgeWeightSummary> {
        let count = self.n_edges();
        if count == 0 {
            return None;
        }

        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut positive = 0usize;
        for edge in self.edges() {
            sum += edge.weight;
            min = min.min(edge.weight);
            max = max.max(edge.weight);
            if edge.weight > 0.0 {
                positive += 1;
            }
        }
        let mean = sum / count as f64;
        let variance = self
            .edges()
            .map(|e| (e.weight - mean).powi(2))
            .sum::<f64>()
            / count as f64;

        Some(EdgeWeightSummary {
            count,
            mean,
            std: variance.sqrt(),
            min,
            max,
            positive_fraction: positive as f64 / count as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use hobart_data::Instrument;
    use ndarray::array;

    fn universe() -> Arc<Universe> {
        Arc::new(
            Universe::new(vec![
                Instrument::new("A", Sector::Technology),
                Instrument::new("B", Sector::Energy),
                Instrument::new("C", Sector::Energy),
            ])
            .unwrap(),
        )
    }

    fn graph() -> WeightedGraph {
        let weights = array![[1.0, 0.5, -0.2], [0.5, 1.0, 0.3], [-0.2, 0.3, 1.0]];
        WeightedGraph::new(GraphKind::Correlation, universe(), weights).unwrap()
    }

    #[test]
    fn test_edges_exclude_diagonal() {
        let g = graph();
        let edges: Vec<_> = g.edges().collect();
        assert_eq!(edges.len(), g.n_edges());
        assert_eq!(edges.len(), 3);
        assert!(edges.iter().all(|e| e.source < e.target));
        assert_eq!(edges[1].weight, -0.2);
    }

    #[test]
    fn test_edge_summary() {
        let summary = graph().edge_summary().unwrap();
        assert_eq!(summary.count, 3);
        assert_abs_diff_eq!(summary.mean, 0.2, epsilon = 1e-12);
        assert_eq!(summary.min, -0.2);
        assert_eq!(summary.max, 0.5);
        assert_abs_diff_eq!(summary.positive_fraction, 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_lookup() {
        let g = graph();
        assert_eq!(g.weight(2, 1), Some(0.3));
        assert_eq!(g.weight(3, 0), None);
        assert_eq!(g.sector(1), Some(Sector::Energy));
        assert_eq!(g.kind().identifier(), "correlation");
    }

    #[test]
    fn test_size_must_match_universe() {
        let weights = Array2::<f64>::eye(2);
        assert!(matches!(
            WeightedGraph::new(GraphKind::PartialCorrelation, universe(), weights),
            Err(NetworkError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(GraphKind::PartialCorrelation.to_string(), "partial_correlation");
    }
}
