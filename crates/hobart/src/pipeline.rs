//! Window-by-window orchestration.
//!
//! Each window flows loader → estimator → builder → {centrality, community} →
//! reporter. The only state carried between windows is the previous window's
//! eigenpair and clusterings, handed to the trackers explicitly.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use chrono::NaiveDate;
use hobart_community::{
    ClusteringStrategy, CommunityStabilityTracker, Louvain, MeanStd, PartitionStatsSeries,
    WindowClusterings, WindowPartitionStats,
};
use hobart_data::{DataError, MarketData, PriceTableLoader, Universe};
use hobart_network::{
    CentralityAnalyzer, CentralityKind, CentralityVector, EdgeWeightSummary, EigenCentrality,
    EigenDriftTracker, EigenSeries, GraphKind, NetworkBuilder, NetworkPair, SectorCentrality,
};
use hobart_output::{
    CentralityMatrixExport, ForwardOutcomes, RankCorrelationTable, SectorCentralityRow,
    StatisticsReporter, SummaryTable, WindowSummary,
};
use hobart_risk::{LedoitWolfEstimator, PrecisionPair, Window, WindowedEstimator};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Per-graph results of one window
#[derive(Debug, Clone)]
pub struct GraphOutcome {
    /// Graph kind
    pub kind: GraphKind,
    /// Distribution of the graph's edge weights
    pub edge_summary: Option<EdgeWeightSummary>,
    /// Weighted-degree centrality
    pub degree: Option<CentralityVector>,
    /// Dominant eigenpair and eigenvector centrality
    pub eigen: Option<EigenCentrality>,
    /// Weighted degree aggregated by sector
    pub degree_sectors: Option<SectorCentrality>,
    /// Eigenvector centrality aggregated by sector
    pub eigen_sectors: Option<SectorCentrality>,
    /// Eigenvector drift from the previous window
    pub drift: Option<f64>,
    /// Clusterings of every restart
    pub clusterings: Option<WindowClusterings>,
    /// Within-window partition statistics
    pub partition_stats: Option<WindowPartitionStats>,
    /// Partition agreement with the previous window
    pub consistency: Option<MeanStd>,
}

impl GraphOutcome {
    const fn empty(kind: GraphKind) -> Self {
        Self {
            kind,
            edge_summary: None,
            degree: None,
            eigen: None,
            degree_sectors: None,
            eigen_sectors: None,
            drift: None,
            clusterings: None,
            partition_stats: None,
            consistency: None,
        }
    }
}

/// Estimate and graphs of one window
#[derive(Debug, Clone)]
pub struct WindowMatrices {
    /// Covariance and precision
    pub estimate: PrecisionPair,
    /// Correlation and partial-correlation graphs
    pub networks: NetworkPair,
}

/// Everything computed for one window
#[derive(Debug)]
pub struct WindowOutcome {
    /// Row range
    pub window: Window,
    /// Date of the last row in the window
    pub date: Option<NaiveDate>,
    /// Shrinkage intensity, when the estimate succeeded
    pub shrinkage: Option<f64>,
    /// Matrices of the window; dropped after the window unless retained
    pub matrices: Option<WindowMatrices>,
    /// Forward outcomes over the rows after the window
    pub forward: Option<ForwardOutcomes>,
    /// One entry per graph kind, in [`GraphKind::all`] order
    pub graphs: Vec<GraphOutcome>,
    /// Window-scoped failures, in the order they occurred
    pub failures: Vec<PipelineError>,
}

impl WindowOutcome {
    /// Results for one graph kind.
    pub fn graph(&self, kind: GraphKind) -> Option<&GraphOutcome> {
        self.graphs.iter().find(|g| g.kind == kind)
    }

    /// True when no step failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn failure_labels(&self, kind: GraphKind) -> String {
        self.failures
            .iter()
            .filter(|f| f.graph_kind().is_none_or(|k| k == kind))
            .map(PipelineError::label)
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Results of a run
#[derive(Debug)]
pub struct PipelineOutput {
    /// Instruments in node order
    pub universe: Arc<Universe>,
    /// Per-window results, indexed by window
    pub windows: Vec<WindowOutcome>,
    /// Dominant eigenvalue and drift series per graph kind
    pub eigen_series: BTreeMap<GraphKind, EigenSeries>,
    /// Partition statistics series per graph kind
    pub partition_series: BTreeMap<GraphKind, PartitionStatsSeries>,
    /// Spearman correlations of centrality against forward outcomes
    pub rank_correlations: RankCorrelationTable,
    /// Flat per-window summary
    pub summary: SummaryTable,
    /// Node centralities per window, one export per graph kind and measure
    pub centralities: Vec<CentralityMatrixExport>,
    /// Sector means per window, graph kind and measure
    pub sector_centralities: Vec<SectorCentralityRow>,
}

impl PipelineOutput {
    /// Number of windows processed.
    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// Total window-scoped failures.
    pub fn failure_count(&self) -> usize {
        self.windows.iter().map(|w| w.failures.len()).sum()
    }
}

/// Runs the full analysis over a return matrix.
#[derive(Debug, Clone)]
pub struct Pipeline<S = Louvain> {
    config: PipelineConfig,
    strategy: S,
    retain_matrices: bool,
}

impl Pipeline<Louvain> {
    /// Pipeline with the default Louvain clustering.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        Self::with_strategy(config, Louvain::default())
    }
}

/// Load a price table; any defect is a [`PipelineError::DataQuality`].
pub fn load_market_data(path: impl AsRef<Path>) -> Result<MarketData, PipelineError> {
    Ok(PriceTableLoader::new().load_path(path)?)
}

fn keep<T>(result: Result<T, PipelineError>, failures: &mut Vec<PipelineError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(window = ?err.window(), step = err.label(), error = %err, "window step failed");
            failures.push(err);
            None
        }
    }
}

impl<S: ClusteringStrategy + Clone> Pipeline<S> {
    /// Pipeline with a custom clustering strategy.
    pub fn with_strategy(config: PipelineConfig, strategy: S) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            config,
            strategy,
            retain_matrices: false,
        })
    }

    /// Keep every window's covariance, precision and graphs in the output.
    pub const fn retain_matrices(mut self, retain: bool) -> Self {
        self.retain_matrices = retain;
        self
    }

    /// Run parameters.
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Number of windows a run over `data` will process.
    pub fn window_count(&self, data: &MarketData) -> Result<usize, PipelineError> {
        Ok(self.config.window_spec()?.count(data.returns.n_periods()))
    }

    /// Run over all windows.
    pub fn run(&self, data: &MarketData) -> Result<PipelineOutput, PipelineError> {
        self.run_with(data, |_| Ok(()))
    }

    /// Run over all windows, handing each finished window to `on_window`
    /// before its matrices are released.
    pub fn run_with<F>(&self, data: &MarketData, mut on_window: F) -> Result<PipelineOutput, PipelineError>
    where
        F: FnMut(&WindowOutcome) -> Result<(), PipelineError>,
    {
        let universe = Arc::new(data.universe.clone());
        let returns = &data.returns;
        if returns.n_instruments() != universe.len() {
            return Err(DataError::DimensionMismatch {
                expected: universe.len(),
                actual: returns.n_instruments(),
            }
            .into());
        }

        let estimator = WindowedEstimator::new(
            self.config.window_spec()?,
            LedoitWolfEstimator::with_target(self.config.shrinkage_target),
        );
        let builder = NetworkBuilder::new(Arc::clone(&universe));
        let analyzer = CentralityAnalyzer::new(
            self.config.degree_weighting,
            self.config.eigen_max_iterations,
            self.config.eigen_tolerance,
        );
        let horizon = self.config.horizon();

        let windows = estimator.windows(returns);
        tracing::info!(
            windows = windows.len(),
            instruments = universe.len(),
            periods = returns.n_periods(),
            window_size = self.config.window_size,
            stride = self.config.stride,
            "starting run"
        );
        if windows.is_empty() {
            tracing::warn!("return series is too short for a single window");
        }

        let mut drift_trackers: BTreeMap<GraphKind, EigenDriftTracker> = GraphKind::all()
            .into_iter()
            .map(|kind| (kind, EigenDriftTracker::new()))
            .collect();
        let mut community_trackers = BTreeMap::new();
        for kind in GraphKind::all() {
            let tracker = CommunityStabilityTracker::new(
                self.strategy.clone(),
                self.config.restart_count,
                self.config.seed,
            )
            .map_err(|e| PipelineError::Config(e.to_string()))?;
            community_trackers.insert(kind, tracker);
        }

        let names: Vec<String> = universe.names().into_iter().map(str::to_string).collect();
        let mut centralities: Vec<CentralityMatrixExport> = GraphKind::all()
            .into_iter()
            .flat_map(|kind| {
                let names = names.clone();
                CentralityKind::all()
                    .into_iter()
                    .map(move |measure| CentralityMatrixExport::new(kind, measure, names.clone()))
            })
            .collect();
        let mut sector_centralities = Vec::new();
        let mut reporter = StatisticsReporter::new();
        let mut summary = SummaryTable::new();
        let mut outcomes: Vec<WindowOutcome> = Vec::with_capacity(windows.len());

        for (position, window) in windows.into_iter().enumerate() {
            let index = window.index;
            let mut failures = Vec::new();
            let date = window.end.checked_sub(1).and_then(|row| returns.date(row));

            let estimate = keep(
                estimator
                    .estimate_window(returns, &window)
                    .map_err(|source| PipelineError::SingularEstimate {
                        window: index,
                        source,
                    }),
                &mut failures,
            );
            let networks = estimate.as_ref().and_then(|pair| {
                keep(
                    builder
                        .build(pair)
                        .map_err(|source| PipelineError::GraphConstruction {
                            window: index,
                            source,
                        }),
                    &mut failures,
                )
            });
            let forward = if networks.is_some() {
                keep(
                    ForwardOutcomes::compute(returns, &window, horizon).map_err(|source| {
                        PipelineError::Statistics {
                            window: index,
                            source,
                        }
                    }),
                    &mut failures,
                )
            } else {
                None
            };

            let previous = outcomes.last();
            let mut graphs = Vec::with_capacity(2);
            for kind in GraphKind::all() {
                let mut result = GraphOutcome::empty(kind);
                let graph = networks.as_ref().map(|n| n.get(kind));
                let prev = previous.and_then(|p| p.graph(kind));

                if let Some(graph) = graph {
                    result.edge_summary = graph.edge_summary();
                    result.degree = keep(
                        analyzer.weighted_degree(graph).map_err(|source| {
                            PipelineError::Centrality {
                                window: index,
                                kind,
                                source,
                            }
                        }),
                        &mut failures,
                    );
                    result.eigen = keep(
                        analyzer.eigenvector(graph).map_err(|source| {
                            PipelineError::Eigendecomposition {
                                window: index,
                                kind,
                                source,
                            }
                        }),
                        &mut failures,
                    );
                }

                result.degree_sectors = result.degree.as_ref().and_then(|c| {
                    keep(
                        SectorCentrality::from_centrality(c, &universe).map_err(|source| {
                            PipelineError::Centrality {
                                window: index,
                                kind,
                                source,
                            }
                        }),
                        &mut failures,
                    )
                });
                result.eigen_sectors = result.eigen.as_ref().and_then(|e| {
                    keep(
                        SectorCentrality::from_centrality(&e.distribution, &universe).map_err(
                            |source| PipelineError::Eigendecomposition {
                                window: index,
                                kind,
                                source,
                            },
                        ),
                        &mut failures,
                    )
                });

                if let Some(tracker) = drift_trackers.get_mut(&kind) {
                    result.drift =
                        tracker.record(prev.and_then(|p| p.eigen.as_ref()), result.eigen.as_ref());
                }

                if let Some(tracker) = community_trackers.get_mut(&kind) {
                    result.clusterings = graph.and_then(|g| {
                        keep(
                            tracker.cluster_window(index, g).map_err(|source| {
                                PipelineError::ClusteringFailure {
                                    window: index,
                                    kind,
                                    source,
                                }
                            }),
                            &mut failures,
                        )
                    });
                    result.partition_stats = tracker.record(
                        prev.and_then(|p| p.clusterings.as_ref()),
                        result.clusterings.as_ref(),
                    );
                    if position > 0 {
                        result.consistency = tracker.series().consistency.last().copied().flatten();
                    }
                }

                if let Some(forward) = &forward {
                    if let Some(degree) = &result.degree {
                        keep(
                            reporter
                                .record(kind, CentralityKind::WeightedDegree, degree, forward)
                                .map_err(|source| PipelineError::Statistics {
                                    window: index,
                                    source,
                                }),
                            &mut failures,
                        );
                    }
                    if let Some(eigen) = &result.eigen {
                        keep(
                            reporter
                                .record(
                                    kind,
                                    CentralityKind::Eigenvector,
                                    &eigen.distribution,
                                    forward,
                                )
                                .map_err(|source| PipelineError::Statistics {
                                    window: index,
                                    source,
                                }),
                            &mut failures,
                        );
                    }
                }

                for export in centralities.iter_mut().filter(|e| e.graph_kind == kind) {
                    let values = match export.measure {
                        CentralityKind::WeightedDegree => result.degree.as_ref(),
                        CentralityKind::Eigenvector => {
                            result.eigen.as_ref().map(|e| &e.distribution)
                        }
                    };
                    export.push(values);
                }
                if let Some(sectors) = &result.degree_sectors {
                    sector_centralities.extend(SectorCentralityRow::from_sector_centrality(
                        index,
                        kind,
                        CentralityKind::WeightedDegree,
                        sectors,
                    ));
                }
                if let Some(sectors) = &result.eigen_sectors {
                    sector_centralities.extend(SectorCentralityRow::from_sector_centrality(
                        index,
                        kind,
                        CentralityKind::Eigenvector,
                        sectors,
                    ));
                }

                tracing::debug!(
                    window = index,
                    kind = %kind,
                    eigenvalue = result.eigen.as_ref().map(|e| e.eigenvalue),
                    drift = result.drift,
                    communities = result.partition_stats.map(|s| s.community_count.mean),
                    "window graph analysed"
                );
                graphs.push(result);
            }

            let mut outcome = WindowOutcome {
                window,
                date,
                shrinkage: estimate.as_ref().map(|e| e.shrinkage),
                matrices: None,
                forward,
                graphs,
                failures,
            };
            if let (Some(estimate), Some(networks)) = (estimate, networks) {
                outcome.matrices = Some(WindowMatrices { estimate, networks });
            }

            for graph in &outcome.graphs {
                summary.push(WindowSummary {
                    window: index,
                    start: window.start,
                    end: window.end,
                    date,
                    shrinkage: outcome.shrinkage,
                    graph_kind: graph.kind,
                    eigenvalue: graph.eigen.as_ref().map(|e| e.eigenvalue),
                    drift: graph.drift,
                    communities_mean: graph.partition_stats.map(|s| s.community_count.mean),
                    communities_std: graph.partition_stats.map(|s| s.community_count.std),
                    modularity_mean: graph.partition_stats.map(|s| s.modularity.mean),
                    restart_agreement: graph
                        .partition_stats
                        .and_then(|s| s.restart_agreement)
                        .map(|a| a.mean),
                    consistency_mean: graph.consistency.map(|c| c.mean),
                    consistency_std: graph.consistency.map(|c| c.std),
                    failures: outcome.failure_labels(graph.kind),
                });
            }

            on_window(&outcome)?;
            if !self.retain_matrices {
                outcome.matrices = None;
            }
            outcomes.push(outcome);
        }

        let eigen_series = drift_trackers
            .into_iter()
            .map(|(kind, tracker)| (kind, tracker.finish()))
            .collect();
        let partition_series = community_trackers
            .into_iter()
            .map(|(kind, tracker)| (kind, tracker.finish()))
            .collect();
        let rank_correlations = reporter.rank_correlations();

        let output = PipelineOutput {
            universe,
            windows: outcomes,
            eigen_series,
            partition_series,
            rank_correlations,
            summary,
            centralities,
            sector_centralities,
        };
        tracing::info!(
            windows = output.window_count(),
            failures = output.failure_count(),
            "run complete"
        );
        Ok(output)
    }
}
