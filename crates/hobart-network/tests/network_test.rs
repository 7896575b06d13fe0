//! Graphs and centralities built from windowed shrinkage estimates.

use approx::assert_abs_diff_eq;
use hobart_data::{Instrument, ReturnMatrix, Sector, Universe};
use hobart_network::{
    CentralityAnalyzer, EdgeWeighting, EigenSeries, GraphKind, NetworkBuilder, SectorCentrality,
};
use hobart_risk::{WindowSpec, WindowedEstimator};
use ndarray::{Array2, Axis, concatenate};
use std::sync::Arc;

fn universe() -> Arc<Universe> {
    Arc::new(
        Universe::new(vec![
            Instrument::new("AAA", Sector::Technology),
            Instrument::new("BBB", Sector::Technology),
            Instrument::new("CCC", Sector::Energy),
            Instrument::new("DDD", Sector::Energy),
            Instrument::new("EEE", Sector::Utilities),
        ])
        .unwrap(),
    )
}

/// Two sector factors and an idiosyncratic term per instrument.
fn block(n_obs: usize) -> Array2<f64> {
    Array2::from_shape_fn((n_obs, 5), |(t, j)| {
        let t = t as f64;
        let tech = (t * 0.71).sin();
        let energy = (t * 1.37).cos();
        let own = ((j as f64 + 1.0) * t * 0.53 + j as f64).sin();
        let factor = match j {
            0 | 1 => tech,
            2 | 3 => energy,
            _ => 0.5 * (tech + energy),
        };
        0.01 * (factor + 0.7 * own)
    })
}

#[test]
fn test_window_graphs_and_centralities() {
    let universe = universe();
    let returns = ReturnMatrix::from_returns(block(200), Vec::new(), &universe).unwrap();
    let estimator = WindowedEstimator::ledoit_wolf(WindowSpec::new(80, 40).unwrap());
    let builder = NetworkBuilder::new(Arc::clone(&universe));
    let analyzer = CentralityAnalyzer::default();

    let estimates = estimator.estimate_all(&returns);
    assert_eq!(estimates.len(), 3);

    for (_, estimate) in estimates {
        let networks = builder.build(&estimate.unwrap()).unwrap();
        for kind in GraphKind::all() {
            let graph = networks.get(kind);
            assert_eq!(graph.kind(), kind);
            for i in 0..5 {
                assert_eq!(graph.weights()[[i, i]], 1.0);
                for j in 0..5 {
                    assert_eq!(graph.weights()[[i, j]], graph.weights()[[j, i]]);
                    assert!(graph.weights()[[i, j]].abs() <= 1.0 + 1e-12);
                }
            }

            let degree = analyzer.weighted_degree(graph).unwrap();
            assert_abs_diff_eq!(degree.values().sum(), 1.0, epsilon = 1e-10);

            let sectors = SectorCentrality::from_centrality(&degree, &universe).unwrap();
            assert_abs_diff_eq!(sectors.total(), 1.0, epsilon = 1e-10);
        }

        let eigen = analyzer.eigenvector(&networks.correlation).unwrap();
        assert!(eigen.eigenvalue > 1.0);
        assert_abs_diff_eq!(eigen.distribution.values().sum(), 1.0, epsilon = 1e-10);
    }
}

#[test]
fn test_identical_windows_have_zero_drift() {
    let universe = universe();
    let one = block(60);
    let values = concatenate(Axis(0), &[one.view(), one.view(), one.view()]).unwrap();
    let returns = ReturnMatrix::from_returns(values, Vec::new(), &universe).unwrap();

    let estimator = WindowedEstimator::ledoit_wolf(WindowSpec::new(60, 60).unwrap());
    let builder = NetworkBuilder::new(Arc::clone(&universe));
    let analyzer = CentralityAnalyzer::new(EdgeWeighting::Absolute, 10_000, 1e-12);

    let eigens: Vec<_> = estimator
        .estimate_all(&returns)
        .into_iter()
        .map(|(_, estimate)| {
            let networks = builder.build(&estimate.unwrap()).unwrap();
            analyzer.eigenvector(&networks.correlation).ok()
        })
        .collect();
    assert_eq!(eigens.len(), 2);

    let series = EigenSeries::from_windows(eigens.iter().map(Option::as_ref));
    assert_eq!(series.eigenvalues.len(), 2);
    assert_eq!(series.eigenvalues[0], series.eigenvalues[1]);
    assert_eq!(series.drift, vec![Some(0.0)]);
}
