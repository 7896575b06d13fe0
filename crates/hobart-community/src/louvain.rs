//! Louvain modularity optimization.
//!
//! Runs on the positive part of the off-diagonal weights: negative edges and
//! the unit diagonal are ignored. Each level repeatedly moves single nodes to
//! the neighbouring community with the largest modularity gain, visiting nodes
//! in an order shuffled by the seed, until no move improves modularity. The
//! communities are then collapsed into nodes of a new graph and the process
//! repeats until a level makes no move.
//!
//! Modularity with resolution γ:
//! Q = Σ_c [ in_c / 2m - γ (tot_c / 2m)² ]

use crate::strategy::{Clustering, ClusteringError, ClusteringStrategy, Partition};
use hobart_network::WeightedGraph;
use ndarray::Array2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Louvain community detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Louvain {
    /// Resolution γ; larger values favour smaller communities
    pub resolution: f64,
    /// Minimum gain for a node move to count as an improvement
    pub min_gain: f64,
    /// Maximum aggregation levels
    pub max_levels: usize,
    /// Maximum local-moving sweeps per level
    pub max_sweeps: usize,
}

impl Default for Louvain {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            min_gain: 1e-12,
            max_levels: 32,
            max_sweeps: 1_000,
        }
    }
}

impl Louvain {
    /// Louvain with a custom resolution.
    pub fn with_resolution(resolution: f64) -> Self {
        Self {
            resolution,
            ..Self::default()
        }
    }

    /// Local moving on one level. Returns the community of each node and
    /// whether any node moved.
    fn move_nodes(&self, adjacency: &Array2<f64>, rng: &mut StdRng) -> (Vec<usize>, bool) {
        let n = adjacency.nrows();
        let strength: Vec<f64> = adjacency.rows().into_iter().map(|row| row.sum()).collect();
        let two_m: f64 = strength.iter().sum();

        let mut community: Vec<usize> = (0..n).collect();
        let mut totals = strength.clone();
        let mut links = vec![0.0; n];
        let mut seen = vec![false; n];
        let mut touched = Vec::with_capacity(n);

        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);

        let mut improved = false;
        for _ in 0..self.max_sweeps {
            let mut moves = 0usize;

            for &node in &order {
                let current = community[node];
                let k = strength[node];

                touched.clear();
                touched.push(current);
                seen[current] = true;
                for (other, &w) in adjacency.row(node).iter().enumerate() {
                    if other == node || w <= 0.0 {
                        continue;
                    }
                    let c = community[other];
                    if !seen[c] {
                        seen[c] = true;
                        touched.push(c);
                    }
                    links[c] += w;
                }

                totals[current] -= k;
                let gain = |c: usize| links[c] - self.resolution * totals[c] * k / two_m;

                let mut best = current;
                let mut best_gain = gain(current);
                for &c in &touched[1..] {
                    let g = gain(c);
                    if g > best_gain + self.min_gain {
                        best = c;
                        best_gain = g;
                    }
                }

                totals[best] += k;
                community[node] = best;
                if best != current {
                    moves += 1;
                }

                for &c in &touched {
                    links[c] = 0.0;
                    seen[c] = false;
                }
            }

            if moves == 0 {
                break;
            }
            improved = true;
        }

        (community, improved)
    }
}

/// Positive off-diagonal weights of a graph.
fn positive_adjacency(graph: &WeightedGraph) -> Array2<f64> {
    let mut adjacency = graph.weights().mapv(|w| w.max(0.0));
    adjacency.diag_mut().fill(0.0);
    adjacency
}

/// Renumber communities in order of first appearance.
fn renumber(community: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping = vec![usize::MAX; community.len()];
    let mut next = 0;
    let labels = community
        .iter()
        .map(|&c| {
            if mapping[c] == usize::MAX {
                mapping[c] = next;
                next += 1;
            }
            mapping[c]
        })
        .collect();
    (labels, next)
}

/// Collapse communities into single nodes; internal weight becomes a self-loop.
fn aggregate(adjacency: &Array2<f64>, labels: &[usize], count: usize) -> Array2<f64> {
    let mut collapsed = Array2::zeros((count, count));
    for ((i, j), &w) in adjacency.indexed_iter() {
        if w != 0.0 {
            collapsed[[labels[i], labels[j]]] += w;
        }
    }
    collapsed
}

/// Modularity of a partition on a non-negative adjacency matrix.
pub fn modularity(adjacency: &Array2<f64>, partition: &Partition, resolution: f64) -> f64 {
    let two_m = adjacency.sum();
    if two_m <= 0.0 {
        return 0.0;
    }

    let count = partition.community_count();
    let labels = partition.labels();
    let mut internal = vec![0.0; count];
    let mut totals = vec![0.0; count];
    for ((i, j), &w) in adjacency.indexed_iter() {
        totals[labels[i]] += w;
        if labels[i] == labels[j] {
            internal[labels[i]] += w;
        }
    }

    internal
        .iter()
        .zip(&totals)
        .map(|(&inside, &tot)| inside / two_m - resolution * (tot / two_m).powi(2))
        .sum()
}

impl ClusteringStrategy for Louvain {
    fn name(&self) -> &'static str {
        "louvain"
    }

    fn cluster(&self, graph: &WeightedGraph, seed: u64) -> Result<Clustering, ClusteringError> {
        if !(self.resolution > 0.0) {
            return Err(ClusteringError::InvalidParameter(format!(
                "resolution must be positive, got {}",
                self.resolution
            )));
        }

        let n = graph.n_nodes();
        if n == 0 {
            return Err(ClusteringError::EmptyGraph);
        }

        let original = positive_adjacency(graph);
        if !(original.sum() > 0.0) {
            return Err(ClusteringError::NoPositiveWeight);
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut membership: Vec<usize> = (0..n).collect();
        let mut level = original.clone();

        for _ in 0..self.max_levels {
            let (community, improved) = self.move_nodes(&level, &mut rng);
            if !improved {
                break;
            }

            let (labels, count) = renumber(&community);
            for m in &mut membership {
                *m = labels[*m];
            }
            if count == level.nrows() {
                break;
            }
            level = aggregate(&level, &labels, count);
        }

        let partition = Partition::from_labels(&membership);
        let score = modularity(&original, &partition, self.resolution);

        tracing::trace!(
            seed,
            communities = partition.community_count(),
            modularity = score,
            "louvain partition"
        );

        Ok(Clustering {
            partition,
            modularity: score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use hobart_data::{Instrument, Sector, Universe};
    use hobart_network::GraphKind;
    use std::sync::Arc;

    fn graph(weights: Array2<f64>) -> WeightedGraph {
        let n = weights.nrows();
        let universe = Universe::new(
            (0..n)
                .map(|i| Instrument::new(format!("N{i}"), Sector::FinancialServices))
                .collect(),
        )
        .unwrap();
        WeightedGraph::new(GraphKind::Correlation, Arc::new(universe), weights).unwrap()
    }

    /// `blocks` groups of `size` nodes, strong inside, weak or negative across.
    fn block_graph(blocks: usize, size: usize) -> WeightedGraph {
        let n = blocks * size;
        graph(Array2::from_shape_fn((n, n), |(i, j)| {
            if i == j {
                1.0
            } else if i / size == j / size {
                0.8
            } else if (i + j) % 3 == 0 {
                -0.1
            } else {
                0.05
            }
        }))
    }

    #[test]
    fn test_recovers_blocks() {
        let clustering = Louvain::default().cluster(&block_graph(3, 4), 7).unwrap();
        let expected = Partition::from_labels(&[0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2]);
        assert_eq!(clustering.partition, expected);
        assert!(clustering.modularity > 0.3);
    }

    #[test]
    fn test_deterministic_per_seed() {
        let g = graph(Array2::from_shape_fn((10, 10), |(i, j)| {
            if i == j {
                1.0
            } else {
                (((i * 7 + j * 7) % 11) as f64 / 11.0 - 0.3) * 0.5
            }
        }));
        let louvain = Louvain::default();
        for seed in [0, 1, 42, u64::MAX] {
            let a = louvain.cluster(&g, seed).unwrap();
            let b = louvain.cluster(&g, seed).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_modularity_matches_definition() {
        // Two disjoint edges: the natural split has Q = 1/2.
        let adjacency = ndarray::array![
            [0.0, 1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
            [0.0, 0.0, 1.0, 0.0]
        ];
        let split = Partition::from_labels(&[0, 0, 1, 1]);
        assert_abs_diff_eq!(modularity(&adjacency, &split, 1.0), 0.5, epsilon = 1e-12);

        let together = Partition::from_labels(&[0, 0, 0, 0]);
        assert_abs_diff_eq!(modularity(&adjacency, &together, 1.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_aggregation_preserves_modularity() {
        let g = block_graph(2, 3);
        let adjacency = positive_adjacency(&g);
        let partition = Partition::from_labels(&[0, 0, 0, 1, 1, 1]);
        let collapsed = aggregate(&adjacency, partition.labels(), 2);

        assert_abs_diff_eq!(collapsed.sum(), adjacency.sum(), epsilon = 1e-12);
        assert_abs_diff_eq!(
            modularity(&collapsed, &Partition::singletons(2), 1.0),
            modularity(&adjacency, &partition, 1.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_no_positive_weight() {
        let g = graph(ndarray::array![[1.0, -0.4], [-0.4, 1.0]]);
        assert!(matches!(
            Louvain::default().cluster(&g, 0),
            Err(ClusteringError::NoPositiveWeight)
        ));
    }

    #[test]
    fn test_invalid_resolution() {
        let louvain = Louvain::with_resolution(0.0);
        assert!(louvain.cluster(&block_graph(2, 2), 0).is_err());
    }
}
