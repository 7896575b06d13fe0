//! Cross-window statistics, summary tables and run reports.

use crate::outcomes::{ForwardOutcomes, ForwardTarget};
use crate::spearman::spearman;
use chrono::{DateTime, NaiveDate, Utc};
use hobart_network::{CentralityKind, CentralityVector, GraphKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur while computing statistics or building reports.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Too few observations for the statistic
    #[error("Insufficient data: need {required}, got {actual}")]
    InsufficientData {
        /// Required count
        required: usize,
        /// Available count
        actual: usize,
    },

    /// A sample has no variation in rank
    #[error("Rank correlation is undefined for a constant sample")]
    ConstantInput,

    /// Paired inputs differ in length
    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Reference distribution could not be constructed
    #[error("Distribution error: {0}")]
    Distribution(String),
}

#[derive(Debug, Clone, Default)]
struct PooledSample {
    windows: usize,
    centrality: Vec<f64>,
    targets: BTreeMap<ForwardTarget, Vec<f64>>,
}

/// Pools centrality and forward outcomes across windows and ranks them.
///
/// Samples are kept per graph kind and centrality measure; every recorded
/// window contributes one pair per instrument. Windows that failed are simply
/// never recorded.
#[derive(Debug, Clone, Default)]
pub struct StatisticsReporter {
    samples: BTreeMap<(GraphKind, CentralityKind), PooledSample>,
}

impl StatisticsReporter {
    /// Create an empty reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one window's centrality and forward outcomes.
    pub fn record(
        &mut self,
        kind: GraphKind,
        measure: CentralityKind,
        centrality: &CentralityVector,
        outcomes: &ForwardOutcomes,
    ) -> Result<(), ReportError> {
        if centrality.len() != outcomes.len() {
            return Err(ReportError::LengthMismatch {
                expected: centrality.len(),
                actual: outcomes.len(),
            });
        }

        let sample = self
            .samples
            .entry((kind, measure))
            .or_default();
        sample.windows += 1;
        sample.centrality.extend(centrality.values().iter().copied());
        for target in ForwardTarget::all() {
            sample
                .targets
                .entry(target)
                .or_default()
                .extend(outcomes.target(target).into_iter().map(|v| v.unwrap_or(f64::NAN)));
        }
        Ok(())
    }

    /// Number of windows recorded for a graph kind and measure.
    pub fn window_count(&self, kind: GraphKind, measure: CentralityKind) -> usize {
        self.samples
            .get(&(kind, measure))
            .map_or(0, |s| s.windows)
    }

    /// Spearman correlation for every recorded (graph kind, measure) and target.
    ///
    /// A statistic that cannot be computed is reported with empty ρ and p.
    pub fn rank_correlations(&self) -> RankCorrelationTable {
        let mut rows = Vec::new();
        for ((kind, measure), sample) in &self.samples {
            for target in ForwardTarget::all() {
                let values = sample.targets.get(&target).map_or(&[][..], Vec::as_slice);
                let n = sample
                    .centrality
                    .iter()
                    .zip(values)
                    .filter(|(a, b)| a.is_finite() && b.is_finite())
                    .count();

                let (rho, p_value) = match spearman(&sample.centrality, values) {
                    Ok(r) => (Some(r.rho), Some(r.p_value)),
                    Err(e) => {
                        tracing::warn!(
                            graph = %kind,
                            measure = %measure,
                            target = %target,
                            error = %e,
                            "rank correlation unavailable"
                        );
                        (None, None)
                    }
                };

                rows.push(RankCorrelationRow {
                    graph_kind: *kind,
                    measure: *measure,
                    target,
                    windows: sample.windows,
                    n,
                    rho,
                    p_value,
                });
            }
        }
        RankCorrelationTable { rows }
    }
}

/// Rank correlation of one centrality series against one forward target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankCorrelationRow {
    /// Graph the centrality was computed on
    pub graph_kind: GraphKind,
    /// Centrality measure
    pub measure: CentralityKind,
    /// Forward quantity
    pub target: ForwardTarget,
    /// Windows pooled
    pub windows: usize,
    /// Pairs used
    pub n: usize,
    /// Spearman ρ
    pub rho: Option<f64>,
    /// Two-sided p-value
    pub p_value: Option<f64>,
}

/// All rank correlations of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankCorrelationTable {
    /// One row per graph kind, measure and target
    pub rows: Vec<RankCorrelationRow>,
}

impl RankCorrelationTable {
    /// Look up one row.
    pub fn get(
        &self,
        kind: GraphKind,
        measure: CentralityKind,
        target: ForwardTarget,
    ) -> Option<&RankCorrelationRow> {
        self.rows
            .iter()
            .find(|r| r.graph_kind == kind && r.measure == measure && r.target == target)
    }

    /// Fixed-width text rendering.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();
        output.push_str("\nCentrality vs forward outcomes (Spearman)\n");
        output.push_str(&"=".repeat(88));
        output.push('\n');
        output.push_str(&format!(
            "{:<20} {:<16} {:<15} {:>8} {:>8} {:>9} {:>9}\n",
            "Graph", "Measure", "Target", "Windows", "N", "Rho", "p-value"
        ));
        output.push_str(&"-".repeat(88));
        output.push('\n');
        for row in &self.rows {
            output.push_str(&format!(
                "{:<20} {:<16} {:<15} {:>8} {:>8} {:>9} {:>9}\n",
                row.graph_kind.identifier(),
                row.measure.identifier(),
                row.target.identifier(),
                row.windows,
                row.n,
                fmt_opt(row.rho, 4),
                fmt_opt(row.p_value, 4)
            ));
        }
        output.push_str(&"=".repeat(88));
        output.push('\n');
        output
    }

    /// Markdown rendering.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        output.push_str("| Graph | Measure | Target | Windows | N | ρ | p-value |\n");
        output.push_str("|-------|---------|--------|---------|---|---|---------|\n");
        for row in &self.rows {
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} |\n",
                row.graph_kind.identifier(),
                row.measure.identifier(),
                row.target.identifier(),
                row.windows,
                row.n,
                fmt_opt(row.rho, 4),
                fmt_opt(row.p_value, 4)
            ));
        }
        output
    }
}

/// One window of one graph kind, flattened for tables and CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    /// Window index
    pub window: usize,
    /// First row (inclusive)
    pub start: usize,
    /// Last row (exclusive)
    pub end: usize,
    /// Date of the last row in the window
    pub date: Option<NaiveDate>,
    /// Ledoit-Wolf shrinkage intensity
    pub shrinkage: Option<f64>,
    /// Graph kind
    pub graph_kind: GraphKind,
    /// Dominant eigenvalue
    pub eigenvalue: Option<f64>,
    /// Eigenvector drift from the previous window
    pub drift: Option<f64>,
    /// Mean community count across restarts
    pub communities_mean: Option<f64>,
    /// Standard deviation of the community count across restarts
    pub communities_std: Option<f64>,
    /// Mean modularity across restarts
    pub modularity_mean: Option<f64>,
    /// Mean ARI of restarts against the first restart
    pub restart_agreement: Option<f64>,
    /// Mean ARI against the previous window
    pub consistency_mean: Option<f64>,
    /// Standard deviation of the ARI against the previous window
    pub consistency_std: Option<f64>,
    /// Failures in this window, `;`-separated
    pub failures: String,
}

/// Per-window summary rows of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    /// Rows in window order, graph kinds interleaved
    pub rows: Vec<WindowSummary>,
}

impl SummaryTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row.
    pub fn push(&mut self, row: WindowSummary) {
        self.rows.push(row);
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no row was added.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows of one graph kind.
    pub fn for_kind(&self, kind: GraphKind) -> impl Iterator<Item = &WindowSummary> + '_ {
        self.rows.iter().filter(move |r| r.graph_kind == kind)
    }

    /// Fixed-width text rendering.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();
        output.push_str("\nWindow summary\n");
        output.push_str(&"=".repeat(112));
        output.push('\n');
        output.push_str(&format!(
            "{:>6} {:<12} {:<20} {:>9} {:>10} {:>8} {:>8} {:>8} {:>8} {}\n",
            "Window", "Date", "Graph", "Shrink", "Eigen", "Drift", "Comm", "Q", "ARI", "Failures"
        ));
        output.push_str(&"-".repeat(112));
        output.push('\n');
        for row in &self.rows {
            let date = row.date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());
            output.push_str(&format!(
                "{:>6} {:<12} {:<20} {:>9} {:>10} {:>8} {:>8} {:>8} {:>8} {}\n",
                row.window,
                date,
                row.graph_kind.identifier(),
                fmt_opt(row.shrinkage, 4),
                fmt_opt(row.eigenvalue, 4),
                fmt_opt(row.drift, 4),
                fmt_opt(row.communities_mean, 2),
                fmt_opt(row.modularity_mean, 3),
                fmt_opt(row.consistency_mean, 3),
                row.failures
            ));
        }
        output.push_str(&"=".repeat(112));
        output.push('\n');
        output
    }

    /// Markdown rendering.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        output.push_str(
            "| Window | Date | Graph | Shrinkage | Eigenvalue | Drift | Communities | Modularity | ARI | Failures |\n",
        );
        output.push_str(
            "|--------|------|-------|-----------|------------|-------|-------------|------------|-----|----------|\n",
        );
        for row in &self.rows {
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
                row.window,
                row.date.map(|d| d.to_string()).unwrap_or_default(),
                row.graph_kind.identifier(),
                fmt_opt(row.shrinkage, 4),
                fmt_opt(row.eigenvalue, 4),
                fmt_opt(row.drift, 4),
                fmt_opt(row.communities_mean, 2),
                fmt_opt(row.modularity_mean, 3),
                fmt_opt(row.consistency_mean, 3),
                row.failures
            ));
        }
        output
    }
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
}

/// A run report with its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report title
    pub title: String,

    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,

    /// Windows analysed
    pub window_count: usize,

    /// Report contents (JSON format).
    pub contents: serde_json::Value,
}

impl Report {
    /// Create a new report.
    pub fn new(title: String, window_count: usize, contents: serde_json::Value) -> Self {
        Self {
            title,
            timestamp: Utc::now(),
            window_count,
            contents,
        }
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builder for creating reports.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    title: Option<String>,
    window_count: Option<usize>,
    contents: Option<serde_json::Value>,
}

impl ReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the number of windows.
    pub const fn window_count(mut self, count: usize) -> Self {
        self.window_count = Some(count);
        self
    }

    /// Set the report contents from any serializable value.
    pub fn contents<T: Serialize>(mut self, contents: &T) -> Result<Self, ReportError> {
        self.contents = Some(serde_json::to_value(contents)?);
        Ok(self)
    }

    /// Build the report.
    pub fn build(self) -> Report {
        Report::new(
            self.title.unwrap_or_else(|| "hobart".to_string()),
            self.window_count.unwrap_or_default(),
            self.contents.unwrap_or(serde_json::Value::Null),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use hobart_data::{Instrument, ReturnMatrix, Sector, Universe};
    use hobart_risk::WindowSpec;
    use ndarray::{Array1, Array2};

    fn outcomes(values: Array2<f64>, window_size: usize, horizon: usize) -> ForwardOutcomes {
        let universe = Universe::new(
            (0..values.ncols())
                .map(|i| Instrument::new(format!("S{i}"), Sector::Utilities))
                .collect(),
        )
        .unwrap();
        let returns = ReturnMatrix::from_returns(values, Vec::new(), &universe).unwrap();
        let window = WindowSpec::new(window_size, horizon).unwrap().window(0);
        ForwardOutcomes::compute(&returns, &window, horizon).unwrap()
    }

    #[test]
    fn test_pooled_rank_correlation() {
        // Forward mean of column j is proportional to j + 1.
        let values = Array2::from_shape_fn((8, 4), |(t, j)| {
            let scale = (j + 1) as f64;
            if t < 4 {
                ((t * 3 + j) % 5) as f64 - 2.0
            } else if t % 2 == 0 {
                0.5 * scale
            } else {
                0.25 * scale
            }
        });
        let outcomes = outcomes(values, 4, 4);
        let centrality =
            CentralityVector::from_scores(Array1::from(vec![0.1, 0.2, 0.3, 0.4])).unwrap();

        let mut reporter = StatisticsReporter::new();
        let (kind, measure) = (GraphKind::Correlation, CentralityKind::WeightedDegree);
        reporter.record(kind, measure, &centrality, &outcomes).unwrap();
        reporter.record(kind, measure, &centrality, &outcomes).unwrap();
        assert_eq!(reporter.window_count(kind, measure), 2);
        assert_eq!(reporter.window_count(kind, CentralityKind::Eigenvector), 0);

        let table = reporter.rank_correlations();
        assert_eq!(table.rows.len(), 3);

        let row = table.get(kind, measure, ForwardTarget::Return).unwrap();
        assert_eq!(row.n, 8);
        assert_eq!(row.windows, 2);
        assert_abs_diff_eq!(row.rho.unwrap(), 1.0, epsilon = 1e-12);

        let risk = table.get(kind, measure, ForwardTarget::Risk).unwrap();
        assert_abs_diff_eq!(risk.rho.unwrap(), 1.0, epsilon = 1e-12);
        assert!(risk.p_value.unwrap() < 0.01);
        let ascii = table.to_ascii_table();
        assert!(ascii.contains("forward_return"));
        assert!(ascii.contains("weighted_degree "));
    }

    #[test]
    fn test_record_length_mismatch() {
        let values = Array2::from_shape_fn((6, 2), |(t, j)| ((t + j) % 3) as f64);
        let outcomes = outcomes(values, 3, 3);
        let centrality = CentralityVector::from_scores(Array1::from(vec![0.2, 0.3, 0.5])).unwrap();
        let mut reporter = StatisticsReporter::new();
        assert!(matches!(
            reporter.record(
                GraphKind::PartialCorrelation,
                CentralityKind::Eigenvector,
                &centrality,
                &outcomes
            ),
            Err(ReportError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_summary_rendering() {
        let mut table = SummaryTable::new();
        table.push(WindowSummary {
            window: 0,
            start: 0,
            end: 300,
            date: NaiveDate::from_ymd_opt(2020, 3, 31),
            shrinkage: Some(0.25),
            graph_kind: GraphKind::PartialCorrelation,
            eigenvalue: Some(1.5),
            drift: None,
            communities_mean: Some(3.0),
            communities_std: Some(0.0),
            modularity_mean: Some(0.41),
            restart_agreement: Some(1.0),
            consistency_mean: None,
            consistency_std: None,
            failures: String::new(),
        });

        let ascii = table.to_ascii_table();
        assert!(ascii.contains("2020-03-31"));
        assert!(ascii.contains("partial_correlation"));
        assert_eq!(table.for_kind(GraphKind::Correlation).count(), 0);
        assert!(table.to_markdown().contains("| 0 | 2020-03-31 |"));
    }

    #[test]
    fn test_report_builder() {
        let report = ReportBuilder::new()
            .title("sectors")
            .window_count(3)
            .contents(&serde_json::json!({"key": "value"}))
            .unwrap()
            .build();

        assert_eq!(report.title, "sectors");
        assert_eq!(report.window_count, 3);
        assert!(report.to_json().unwrap().contains("\"key\""));
    }
}
