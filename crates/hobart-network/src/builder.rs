//! Builds the per-window correlation and partial-correlation graphs.

use crate::convert::{covariance_to_correlation, precision_to_partial_correlation};
use crate::error::NetworkError;
use crate::graph::{GraphKind, WeightedGraph};
use hobart_data::Universe;
use hobart_risk::PrecisionPair;
use std::sync::Arc;

/// The two graphs derived from one window's estimate
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkPair {
    /// Graph over pairwise correlations
    pub correlation: WeightedGraph,
    /// Graph over partial correlations
    pub partial_correlation: WeightedGraph,
}

impl NetworkPair {
    /// Graph of the given kind.
    pub const fn get(&self, kind: GraphKind) -> &WeightedGraph {
        match kind {
            GraphKind::Correlation => &self.correlation,
            GraphKind::PartialCorrelation => &self.partial_correlation,
        }
    }

    /// Both graphs in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = &WeightedGraph> {
        [&self.correlation, &self.partial_correlation].into_iter()
    }
}

/// Converts [`PrecisionPair`]s into [`NetworkPair`]s over a fixed universe
#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    universe: Arc<Universe>,
}

impl NetworkBuilder {
    /// Create a builder for the given universe.
    pub const fn new(universe: Arc<Universe>) -> Self {
        Self { universe }
    }

    /// Build one graph kind.
    pub fn build_kind(
        &self,
        kind: GraphKind,
        pair: &PrecisionPair,
    ) -> Result<WeightedGraph, NetworkError> {
        let weights = match kind {
            GraphKind::Correlation => covariance_to_correlation(&pair.covariance)?,
            GraphKind::PartialCorrelation => precision_to_partial_correlation(&pair.precision)?,
        };
        WeightedGraph::new(kind, Arc::clone(&self.universe), weights)
    }

    /// Build both graphs from a window estimate.
    pub fn build(&self, pair: &PrecisionPair) -> Result<NetworkPair, NetworkError> {
        Ok(NetworkPair {
            correlation: self.build_kind(GraphKind::Correlation, pair)?,
            partial_correlation: self.build_kind(GraphKind::PartialCorrelation, pair)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use hobart_data::{Instrument, Sector};
    use hobart_risk::covariance::invert_spd;
    use ndarray::array;

    fn pair() -> PrecisionPair {
        let covariance = array![[1.0, 0.4, 0.2], [0.4, 1.0, 0.1], [0.2, 0.1, 1.0]];
        let precision = invert_spd(&covariance).unwrap();
        PrecisionPair {
            covariance,
            precision,
            shrinkage: 0.1,
        }
    }

    fn builder() -> NetworkBuilder {
        let universe = Universe::new(vec![
            Instrument::new("A", Sector::Technology),
            Instrument::new("B", Sector::Technology),
            Instrument::new("C", Sector::Utilities),
        ])
        .unwrap();
        NetworkBuilder::new(Arc::new(universe))
    }

    #[test]
    fn test_build_both_kinds() {
        let networks = builder().build(&pair()).unwrap();

        for graph in networks.iter() {
            for i in 0..3 {
                assert_eq!(graph.weights()[[i, i]], 1.0);
                for j in 0..3 {
                    assert_eq!(graph.weights()[[i, j]], graph.weights()[[j, i]]);
                }
            }
        }
        assert_eq!(networks.get(GraphKind::Correlation).kind(), GraphKind::Correlation);
        assert_abs_diff_eq!(
            networks.correlation.weights()[[0, 1]],
            0.4,
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_partial_correlation_removes_indirect_link() {
        // B and C are linked only through A: their partial correlation vanishes.
        let covariance = array![[1.0, 0.5, 0.5], [0.5, 1.0, 0.25], [0.5, 0.25, 1.0]];
        let precision = invert_spd(&covariance).unwrap();
        let pair = PrecisionPair {
            covariance,
            precision,
            shrinkage: 0.0,
        };

        let networks = builder().build(&pair).unwrap();
        assert_abs_diff_eq!(networks.correlation.weights()[[1, 2]], 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(
            networks.partial_correlation.weights()[[1, 2]],
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_universe_size_mismatch() {
        let mut pair = pair();
        pair.covariance = ndarray::Array2::eye(2);
        assert!(builder().build(&pair).is_err());
    }
}
