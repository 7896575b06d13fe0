//! Partition stability within and across windows.
//!
//! Every window is clustered `restart_count` times. Restart `r` is seeded
//! with [`restart_seed`]`(base_seed, r)` in every window, so the restart-`r`
//! partitions of consecutive windows differ only because the graphs differ.
//!
//! Per window the tracker reports the mean/stdev of community counts, of
//! modularity and of the adjusted Rand index between each restart and restart
//! 0. Across windows it reports, for each pair of consecutive windows, the
//! mean/stdev over restarts of the ARI between their restart-`r` partitions.

use crate::louvain::Louvain;
use crate::similarity::adjusted_rand_index;
use crate::strategy::{Clustering, ClusteringError, ClusteringStrategy};
use hobart_network::WeightedGraph;
use serde::{Deserialize, Serialize};

/// Default number of clustering restarts per window.
pub const DEFAULT_RESTART_COUNT: usize = 10;

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// Seed for restart `restart`: `base_seed ^ splitmix64(restart)`.
pub fn restart_seed(base_seed: u64, restart: usize) -> u64 {
    base_seed ^ splitmix64(restart as u64)
}

/// Mean and population standard deviation of a sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanStd {
    /// Sample mean
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
}

impl MeanStd {
    /// Summarize a sample, `None` if it is empty.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            mean,
            std: variance.sqrt(),
        })
    }
}

/// Statistics of the restarts of one window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowPartitionStats {
    /// Number of communities
    pub community_count: MeanStd,
    /// Modularity
    pub modularity: MeanStd,
    /// ARI of restarts 1.. against restart 0; `None` with a single restart
    pub restart_agreement: Option<MeanStd>,
}

/// All restarts of one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowClusterings {
    /// Window index
    pub window: usize,
    /// One clustering per restart, in restart order
    pub restarts: Vec<Clustering>,
}

impl WindowClusterings {
    /// Within-window statistics.
    pub fn stats(&self) -> Result<WindowPartitionStats, ClusteringError> {
        let counts: Vec<f64> = self
            .restarts
            .iter()
            .map(|c| c.partition.community_count() as f64)
            .collect();
        let modularity: Vec<f64> = self.restarts.iter().map(|c| c.modularity).collect();

        let agreement = match self.restarts.split_first() {
            Some((reference, others)) => others
                .iter()
                .map(|c| adjusted_rand_index(&reference.partition, &c.partition))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        let empty = || ClusteringError::InvalidParameter("window has no restarts".to_string());
        Ok(WindowPartitionStats {
            community_count: MeanStd::from_values(&counts).ok_or_else(empty)?,
            modularity: MeanStd::from_values(&modularity).ok_or_else(empty)?,
            restart_agreement: MeanStd::from_values(&agreement),
        })
    }

    /// ARI of each restart's partition against the same restart in `previous`,
    /// summarized over restarts.
    pub fn consistency_with(&self, previous: &Self) -> Result<MeanStd, ClusteringError> {
        if previous.restarts.len() != self.restarts.len() {
            return Err(ClusteringError::SizeMismatch {
                expected: previous.restarts.len(),
                actual: self.restarts.len(),
            });
        }
        let scores = previous
            .restarts
            .iter()
            .zip(&self.restarts)
            .map(|(before, after)| adjusted_rand_index(&before.partition, &after.partition))
            .collect::<Result<Vec<_>, _>>()?;
        MeanStd::from_values(&scores)
            .ok_or_else(|| ClusteringError::InvalidParameter("window has no restarts".to_string()))
    }
}

/// Partition statistics of one graph kind over a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionStatsSeries {
    /// Within-window statistics, `None` where clustering failed
    pub windows: Vec<Option<WindowPartitionStats>>,
    /// Cross-window consistency between windows `i` and `i + 1`
    pub consistency: Vec<Option<MeanStd>>,
}

/// Runs seeded restarts per window and accumulates [`PartitionStatsSeries`].
#[derive(Debug, Clone)]
pub struct CommunityStabilityTracker<S = Louvain> {
    strategy: S,
    restart_count: usize,
    base_seed: u64,
    series: PartitionStatsSeries,
}

impl CommunityStabilityTracker<Louvain> {
    /// Louvain with default settings.
    pub fn louvain(restart_count: usize, base_seed: u64) -> Result<Self, ClusteringError> {
        Self::new(Louvain::default(), restart_count, base_seed)
    }
}

impl<S: ClusteringStrategy> CommunityStabilityTracker<S> {
    /// Create a tracker; `restart_count` must be at least 1.
    pub fn new(strategy: S, restart_count: usize, base_seed: u64) -> Result<Self, ClusteringError> {
        if restart_count == 0 {
            return Err(ClusteringError::InvalidParameter(
                "restart_count must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            strategy,
            restart_count,
            base_seed,
            series: PartitionStatsSeries::default(),
        })
    }

    /// Restarts per window.
    pub const fn restart_count(&self) -> usize {
        self.restart_count
    }

    /// The clustering strategy.
    pub const fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Cluster one window's graph once per restart.
    pub fn cluster_window(
        &self,
        window: usize,
        graph: &WeightedGraph,
    ) -> Result<WindowClusterings, ClusteringError> {
        let restarts = (0..self.restart_count)
            .map(|restart| {
                self.strategy
                    .cluster(graph, restart_seed(self.base_seed, restart))
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            window,
            kind = %graph.kind(),
            strategy = self.strategy.name(),
            restarts = restarts.len(),
            "clustered window"
        );

        Ok(WindowClusterings { window, restarts })
    }

    /// Record the next window's clusterings.
    ///
    /// `previous` is the preceding window's result, passed explicitly. Every
    /// call after the first appends a consistency entry, `None` if either side
    /// is missing. Returns the window's statistics.
    pub fn record(
        &mut self,
        previous: Option<&WindowClusterings>,
        current: Option<&WindowClusterings>,
    ) -> Option<WindowPartitionStats> {
        let is_first = self.series.windows.is_empty();

        let stats = current.and_then(|c| match c.stats() {
            Ok(stats) => Some(stats),
            Err(err) => {
                tracing::warn!(window = c.window, error = %err, "partition statistics unavailable");
                None
            }
        });
        self.series.windows.push(stats);

        if !is_first {
            let consistency = match (previous, current) {
                (Some(before), Some(after)) => match after.consistency_with(before) {
                    Ok(score) => Some(score),
                    Err(err) => {
                        tracing::warn!(window = after.window, error = %err, "cluster consistency unavailable");
                        None
                    }
                },
                _ => None,
            };
            self.series.consistency.push(consistency);
        }

        stats
    }

    /// Cluster a window and record it; a clustering failure is logged and
    /// recorded as a gap.
    pub fn observe(
        &mut self,
        window: usize,
        previous: Option<&WindowClusterings>,
        graph: Option<&WeightedGraph>,
    ) -> Option<WindowClusterings> {
        let current = graph.and_then(|g| match self.cluster_window(window, g) {
            Ok(clusterings) => Some(clusterings),
            Err(err) => {
                tracing::warn!(window, error = %err, "clustering failed");
                None
            }
        });
        self.record(previous, current.as_ref());
        current
    }

    /// The series so far.
    pub const fn series(&self) -> &PartitionStatsSeries {
        &self.series
    }

    /// Consume the tracker and return the series.
    pub fn finish(self) -> PartitionStatsSeries {
        self.series
    }
}
