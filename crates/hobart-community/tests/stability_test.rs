//! Community stability over a sequence of changing graphs.

use hobart_community::{
    ClusteringStrategy, CommunityStabilityTracker, Louvain, Partition, adjusted_rand_index,
    restart_seed,
};
use hobart_data::{Instrument, Sector, Universe};
use hobart_network::{GraphKind, WeightedGraph};
use ndarray::Array2;
use std::sync::Arc;

fn universe(n: usize) -> Arc<Universe> {
    Arc::new(
        Universe::new(
            (0..n)
                .map(|i| Instrument::new(format!("S{i:02}"), Sector::Industrials))
                .collect(),
        )
        .unwrap(),
    )
}

/// Graph whose communities are given by `labels`.
fn planted(labels: &[usize]) -> WeightedGraph {
    let n = labels.len();
    let weights = Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            1.0
        } else if labels[i] == labels[j] {
            0.7
        } else {
            0.01
        }
    });
    WeightedGraph::new(GraphKind::Correlation, universe(n), weights).unwrap()
}

#[test]
fn test_louvain_recovers_planted_partition() {
    let labels = [0, 1, 2, 0, 1, 2, 0, 1, 2, 0, 1, 2];
    let clustering = Louvain::default()
        .cluster(&planted(&labels), restart_seed(42, 0))
        .unwrap();
    assert_eq!(clustering.partition, Partition::from_labels(&labels));
}

#[test]
fn test_regime_change_lowers_consistency() {
    let before = [0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2];
    let after = [0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 0, 0];
    let graphs = [planted(&before), planted(&before), planted(&after)];

    let mut tracker = CommunityStabilityTracker::louvain(4, 7).unwrap();
    let mut previous = None;
    for (window, graph) in graphs.iter().enumerate() {
        previous = tracker.observe(window, previous.as_ref(), Some(graph));
    }
    let series = tracker.finish();

    assert_eq!(series.windows.len(), 3);
    assert_eq!(series.consistency.len(), 2);

    let stable = series.consistency[0].unwrap();
    let changed = series.consistency[1].unwrap();
    assert_eq!(stable.mean, 1.0);

    let expected = adjusted_rand_index(
        &Partition::from_labels(&before),
        &Partition::from_labels(&after),
    )
    .unwrap();
    assert!((changed.mean - expected).abs() < 1e-12);
    assert!(changed.mean < 1.0);
}
