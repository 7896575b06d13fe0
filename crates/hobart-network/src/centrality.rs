//! Node centrality on weighted dependence graphs.
//!
//! Two measures are supported:
//!
//! - **Weighted degree**: `s_i = Σ_{j≠i} |w_ij|`, divided by `Σ_i s_i`. With
//!   [`EdgeWeighting::Signed`] negative edges subtract instead, and a node
//!   whose strength goes negative is reported as an error.
//! - **Eigenvector**: the dominant eigenvector of the weight matrix (unit
//!   diagonal included), reported as a unit vector whose largest-magnitude
//!   entry is positive, and separately as the share `|v_i| / Σ_j |v_j|`.
//!
//! Every [`CentralityVector`] is non-negative and sums to one.
//!
//! Centralities can be aggregated to sector level with [`SectorCentrality`].

use crate::error::CentralityError;
use crate::graph::WeightedGraph;
use hobart_data::{Sector, Universe};
use hobart_risk::covariance::dominant_eigenpair;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Totals at or below this fraction of the absolute mass cannot be normalized.
pub const NORMALIZATION_EPSILON: f64 = 1e-9;

/// Default power-iteration budget for eigenvector centrality.
pub const DEFAULT_EIGEN_MAX_ITERATIONS: usize = 10_000;

/// Default power-iteration convergence tolerance.
pub const DEFAULT_EIGEN_TOLERANCE: f64 = 1e-10;

/// How edge weights enter the weighted degree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeWeighting {
    /// Weights as they are; negative edges reduce a node's strength
    Signed,
    /// Absolute weights
    #[default]
    Absolute,
}

/// Which centrality a series holds, without solver parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CentralityKind {
    /// Normalized node strength
    WeightedDegree,
    /// Dominant-eigenvector share
    Eigenvector,
}

impl CentralityKind {
    /// Both kinds, degree first.
    pub const fn all() -> [Self; 2] {
        [Self::WeightedDegree, Self::Eigenvector]
    }

    /// Identifier used in reports and file names.
    pub const fn identifier(&self) -> &'static str {
        match self {
            Self::WeightedDegree => "weighted_degree",
            Self::Eigenvector => "eigenvector",
        }
    }
}

impl fmt::Display for CentralityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// A centrality measure and its parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CentralityMeasure {
    /// Normalized node strength
    WeightedDegree {
        /// Signed or absolute edge weights
        weighting: EdgeWeighting,
    },
    /// Dominant eigenvector of the weight matrix
    Eigenvector {
        /// Power-iteration budget
        max_iterations: usize,
        /// Convergence tolerance on successive iterates
        tolerance: f64,
    },
}

impl CentralityMeasure {
    /// Weighted degree with absolute weights.
    pub const fn weighted_degree() -> Self {
        Self::WeightedDegree {
            weighting: EdgeWeighting::Absolute,
        }
    }

    /// Eigenvector centrality with default solver settings.
    pub const fn eigenvector() -> Self {
        Self::Eigenvector {
            max_iterations: DEFAULT_EIGEN_MAX_ITERATIONS,
            tolerance: DEFAULT_EIGEN_TOLERANCE,
        }
    }

    /// The measure without its parameters.
    pub const fn kind(&self) -> CentralityKind {
        match self {
            Self::WeightedDegree { .. } => CentralityKind::WeightedDegree,
            Self::Eigenvector { .. } => CentralityKind::Eigenvector,
        }
    }

    /// Identifier used in reports.
    pub const fn identifier(&self) -> &'static str {
        self.kind().identifier()
    }

    /// Compute the sum-to-one centrality vector of a graph.
    pub fn compute(&self, graph: &WeightedGraph) -> Result<CentralityVector, CentralityError> {
        match *self {
            Self::WeightedDegree { weighting } => weighted_degree(graph, weighting),
            Self::Eigenvector {
                max_iterations,
                tolerance,
            } => eigenvector_centrality(graph, max_iterations, tolerance)
                .map(|eigen| eigen.distribution),
        }
    }
}

/// Non-negative per-node centrality weights summing to one
#[derive(Debug, Clone, PartialEq)]
pub struct CentralityVector {
    values: Array1<f64>,
}

impl CentralityVector {
    /// Normalize non-negative raw scores by their sum.
    ///
    /// Scores below `-NORMALIZATION_EPSILON` times the absolute mass are
    /// rejected; smaller negative round-off is clamped to zero. Fails when the
    /// sum is numerically zero relative to the absolute mass.
    pub fn from_scores(scores: Array1<f64>) -> Result<Self, CentralityError> {
        let mass: f64 = scores.iter().map(|v| v.abs()).sum();
        if let Some((node, &value)) = scores
            .iter()
            .enumerate()
            .find(|&(_, &v)| v < -NORMALIZATION_EPSILON * mass)
        {
            return Err(CentralityError::NegativeWeight { node, value });
        }

        let clamped = scores.mapv(|v| v.max(0.0));
        let total = clamped.sum();
        if !(total > NORMALIZATION_EPSILON * mass) || !total.is_finite() {
            return Err(CentralityError::DegenerateNormalization { total });
        }
        Ok(Self {
            values: clamped / total,
        })
    }

    /// Centrality values in node order.
    pub fn values(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }

    /// Centrality of one node.
    pub fn get(&self, node: usize) -> Option<f64> {
        self.values.get(node).copied()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when there are no nodes.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Node indices from most to least central; ties keep node order.
    pub fn ranking(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.values.len()).collect();
        order.sort_by(|&a, &b| self.values[b].total_cmp(&self.values[a]));
        order
    }
}

/// Dominant eigenpair of a graph together with its centrality distribution
#[derive(Debug, Clone, PartialEq)]
pub struct EigenCentrality {
    /// Largest eigenvalue of the weight matrix
    pub eigenvalue: f64,
    /// Unit eigenvector, largest-magnitude entry positive
    pub eigenvector: Array1<f64>,
    /// Eigenvector rescaled to sum to one
    pub distribution: CentralityVector,
    /// Power iterations used
    pub iterations: usize,
}

/// Weighted-degree centrality.
pub fn weighted_degree(
    graph: &WeightedGraph,
    weighting: EdgeWeighting,
) -> Result<CentralityVector, CentralityError> {
    let weights = graph.weights();
    let n = graph.n_nodes();

    let strengths = Array1::from_shape_fn(n, |i| {
        (0..n)
            .filter(|&j| j != i)
            .map(|j| match weighting {
                EdgeWeighting::Signed => weights[[i, j]],
                EdgeWeighting::Absolute => weights[[i, j]].abs(),
            })
            .sum::<f64>()
    });

    CentralityVector::from_scores(strengths)
}

/// Eigenvector centrality from the dominant eigenpair of the weight matrix.
pub fn eigenvector_centrality(
    graph: &WeightedGraph,
    max_iterations: usize,
    tolerance: f64,
) -> Result<EigenCentrality, CentralityError> {
    let top = dominant_eigenpair(graph.weights(), max_iterations, tolerance)
        .map_err(CentralityError::Eigendecomposition)?;
    let distribution = CentralityVector::from_scores(top.eigenvector.mapv(f64::abs))?;

    tracing::trace!(
        kind = %graph.kind(),
        eigenvalue = top.eigenvalue,
        iterations = top.iterations,
        "dominant eigenpair"
    );

    Ok(EigenCentrality {
        eigenvalue: top.eigenvalue,
        eigenvector: top.eigenvector,
        distribution,
        iterations: top.iterations,
    })
}

/// Computes both centrality measures with fixed settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentralityAnalyzer {
    /// Edge weighting for weighted degree
    pub degree_weighting: EdgeWeighting,
    /// Power-iteration budget
    pub max_iterations: usize,
    /// Power-iteration tolerance
    pub tolerance: f64,
}

impl Default for CentralityAnalyzer {
    fn default() -> Self {
        Self {
            degree_weighting: EdgeWeighting::Absolute,
            max_iterations: DEFAULT_EIGEN_MAX_ITERATIONS,
            tolerance: DEFAULT_EIGEN_TOLERANCE,
        }
    }
}

impl CentralityAnalyzer {
    /// Create an analyzer with explicit settings.
    pub const fn new(degree_weighting: EdgeWeighting, max_iterations: usize, tolerance: f64) -> Self {
        Self {
            degree_weighting,
            max_iterations,
            tolerance,
        }
    }

    /// The configured measures, degree first.
    pub const fn measures(&self) -> [CentralityMeasure; 2] {
        [
            CentralityMeasure::WeightedDegree {
                weighting: self.degree_weighting,
            },
            CentralityMeasure::Eigenvector {
                max_iterations: self.max_iterations,
                tolerance: self.tolerance,
            },
        ]
    }

    /// Weighted-degree centrality of a graph.
    pub fn weighted_degree(&self, graph: &WeightedGraph) -> Result<CentralityVector, CentralityError> {
        weighted_degree(graph, self.degree_weighting)
    }

    /// Eigenvector centrality of a graph.
    pub fn eigenvector(&self, graph: &WeightedGraph) -> Result<EigenCentrality, CentralityError> {
        eigenvector_centrality(graph, self.max_iterations, self.tolerance)
    }
}

/// Mean centrality and membership of one sector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectorStat {
    /// Number of instruments in the sector
    pub count: usize,
    /// Unweighted mean centrality over the members
    pub mean: f64,
}

/// Sector-level aggregation of a centrality vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorCentrality {
    stats: BTreeMap<Sector, SectorStat>,
}

impl SectorCentrality {
    /// Aggregate node values by sector.
    pub fn aggregate(values: ArrayView1<'_, f64>, universe: &Universe) -> Result<Self, CentralityError> {
        if values.len() != universe.len() {
            return Err(CentralityError::DimensionMismatch {
                expected: universe.len(),
                actual: values.len(),
            });
        }

        let stats = universe
            .sector_members()
            .into_iter()
            .map(|(sector, members)| {
                let count = members.len();
                let total: f64 = members.iter().map(|&i| values[i]).sum();
                (
                    sector,
                    SectorStat {
                        count,
                        mean: total / count as f64,
                    },
                )
            })
            .collect();

        Ok(Self { stats })
    }

    /// Aggregate a centrality vector by sector.
    pub fn from_centrality(
        centrality: &CentralityVector,
        universe: &Universe,
    ) -> Result<Self, CentralityError> {
        Self::aggregate(centrality.values(), universe)
    }

    /// Statistics of one sector, `None` if it has no members.
    pub fn get(&self, sector: Sector) -> Option<SectorStat> {
        self.stats.get(&sector).copied()
    }

    /// Mean centrality of one sector.
    pub fn mean(&self, sector: Sector) -> Option<f64> {
        self.get(sector).map(|s| s.mean)
    }

    /// Sectors present, in label order, with their statistics.
    pub fn iter(&self) -> impl Iterator<Item = (Sector, SectorStat)> + '_ {
        self.stats.iter().map(|(&sector, &stat)| (sector, stat))
    }

    /// Sum over sectors of `count × mean`, equal to the node total.
    pub fn total(&self) -> f64 {
        self.stats.values().map(|s| s.count as f64 * s.mean).sum()
    }

    /// Sector means rescaled to sum to one, `None` if the means sum to zero.
    pub fn shares(&self) -> Option<BTreeMap<Sector, f64>> {
        let sum: f64 = self.stats.values().map(|s| s.mean).sum();
        let mass: f64 = self.stats.values().map(|s| s.mean.abs()).sum();
        if !(sum.abs() > NORMALIZATION_EPSILON * mass) {
            return None;
        }
        Some(
            self.stats
                .iter()
                .map(|(&sector, stat)| (sector, stat.mean / sum))
                .collect(),
        )
    }
}
