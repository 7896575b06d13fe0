//! Export of run artifacts to CSV and JSON.
//!
//! Tables export as CSV (one serde record per row) or JSON. Per-window
//! matrices export as JSON only, keyed by window index and graph kind.

use crate::report::{RankCorrelationTable, SummaryTable};
use hobart_data::Sector;
use hobart_network::{
    CentralityKind, CentralityVector, GraphKind, SectorCentrality, WeightedGraph,
};
use hobart_risk::PrecisionPair;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialized output was not valid UTF-8
    #[error("Invalid UTF-8 in output: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// Trait for types that can be exported.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the format is unsupported.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn csv_string(writer: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

fn records_to_csv<'a, T: Serialize + 'a>(
    records: impl IntoIterator<Item = &'a T>,
) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    csv_string(wtr)
}

fn to_json<T: Serialize + ?Sized>(value: &T, format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(value)?),
        _ => Ok(serde_json::to_string(value)?),
    }
}

impl Exporter for SummaryTable {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => records_to_csv(&self.rows),
            ExportFormat::Json | ExportFormat::PrettyJson => to_json(&self.rows, format),
        }
    }
}

impl Exporter for RankCorrelationTable {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => records_to_csv(&self.rows),
            ExportFormat::Json | ExportFormat::PrettyJson => to_json(&self.rows, format),
        }
    }
}

/// Mean centrality of one sector in one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorCentralityRow {
    /// Window index
    pub window: usize,
    /// Graph kind
    pub graph_kind: GraphKind,
    /// Centrality measure
    pub measure: CentralityKind,
    /// Sector
    pub sector: Sector,
    /// Members in the universe
    pub count: usize,
    /// Unweighted mean centrality of the members
    pub mean: f64,
    /// Mean rescaled so that sector shares sum to one in the window
    pub share: Option<f64>,
}

impl SectorCentralityRow {
    /// One row per sector of an aggregation.
    pub fn from_sector_centrality(
        window: usize,
        graph_kind: GraphKind,
        measure: CentralityKind,
        sectors: &SectorCentrality,
    ) -> Vec<Self> {
        let shares = sectors.shares();
        sectors
            .iter()
            .map(|(sector, stat)| Self {
                window,
                graph_kind,
                measure,
                sector,
                count: stat.count,
                mean: stat.mean,
                share: shares.as_ref().and_then(|s| s.get(&sector).copied()),
            })
            .collect()
    }
}

impl Exporter for Vec<SectorCentralityRow> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => records_to_csv(self),
            ExportFormat::Json | ExportFormat::PrettyJson => to_json(self, format),
        }
    }
}

/// Node centralities of every window for one measure and graph kind.
///
/// Windows where the measure failed keep their slot with no values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentralityMatrixExport {
    /// Graph kind
    pub graph_kind: GraphKind,
    /// Centrality measure
    pub measure: CentralityKind,
    /// Instrument names, in node order
    pub names: Vec<String>,
    /// Node values per window
    pub windows: Vec<Option<Vec<f64>>>,
}

impl CentralityMatrixExport {
    /// Create an empty export for a universe.
    pub const fn new(graph_kind: GraphKind, measure: CentralityKind, names: Vec<String>) -> Self {
        Self {
            graph_kind,
            measure,
            names,
            windows: Vec::new(),
        }
    }

    /// Append the next window.
    pub fn push(&mut self, centrality: Option<&CentralityVector>) {
        self.windows
            .push(centrality.map(|c| c.values().to_vec()));
    }

    /// Number of windows.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// True before any window is pushed.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// File stem, e.g. `centrality_eigenvector_partial_correlation`.
    pub fn file_stem(&self) -> String {
        format!(
            "centrality_{}_{}",
            self.measure.identifier(),
            self.graph_kind.identifier()
        )
    }
}

impl Exporter for CentralityMatrixExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                let mut header = vec!["window".to_string()];
                header.extend(self.names.iter().cloned());
                wtr.write_record(&header)?;

                for (index, values) in self.windows.iter().enumerate() {
                    let mut record = vec![index.to_string()];
                    match values {
                        Some(values) => record.extend(values.iter().map(f64::to_string)),
                        None => record.extend(self.names.iter().map(|_| String::new())),
                    }
                    wtr.write_record(&record)?;
                }
                csv_string(wtr)
            }
            ExportFormat::Json | ExportFormat::PrettyJson => to_json(self, format),
        }
    }
}

/// Matrices of one window and graph kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowArtifact {
    /// Window index
    pub window: usize,
    /// Graph kind
    pub graph_kind: GraphKind,
    /// Instrument names, in node order
    pub names: Vec<String>,
    /// Shrinkage intensity of the estimate
    pub shrinkage: f64,
    /// Precision matrix, row-major
    pub precision: Vec<Vec<f64>>,
    /// Graph weights, row-major
    pub weights: Vec<Vec<f64>>,
}

fn rows_of(matrix: &Array2<f64>) -> Vec<Vec<f64>> {
    matrix.rows().into_iter().map(|row| row.to_vec()).collect()
}

impl WindowArtifact {
    /// Capture the estimate and graph of a window.
    pub fn new(window: usize, pair: &PrecisionPair, graph: &WeightedGraph) -> Self {
        Self {
            window,
            graph_kind: graph.kind(),
            names: graph
                .universe()
                .names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            shrinkage: pair.shrinkage,
            precision: rows_of(&pair.precision),
            weights: rows_of(graph.weights()),
        }
    }

    /// File stem, e.g. `window_0003_correlation`.
    pub fn file_stem(&self) -> String {
        format!("window_{:04}_{}", self.window, self.graph_kind.identifier())
    }
}

impl Exporter for WindowArtifact {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => Err(ExportError::InvalidFormat(
                "window artifacts are exported as JSON only".to_string(),
            )),
            ExportFormat::Json | ExportFormat::PrettyJson => to_json(self, format),
        }
    }
}

/// Output directory that exporters write into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDirectory {
    root: PathBuf,
}

impl ExportDirectory {
    /// Use `root`, creating it and any missing parents.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, ExportError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Create a subdirectory.
    pub fn subdirectory(&self, name: &str) -> Result<Self, ExportError> {
        Self::create(self.root.join(name))
    }

    /// Write `stem.<extension>` and return its path.
    pub fn write<E: Exporter + ?Sized>(
        &self,
        stem: &str,
        exporter: &E,
        format: ExportFormat,
    ) -> Result<PathBuf, ExportError> {
        let path = self.root.join(format!("{stem}.{}", format.extension()));
        exporter.export_to_file(&path, format)?;
        tracing::debug!(path = %path.display(), "exported");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hobart_data::{Instrument, Universe};
    use ndarray::{Array1, array};
    use std::sync::Arc;

    fn universe() -> Arc<Universe> {
        Arc::new(
            Universe::new(vec![
                Instrument::new("AAA", Sector::Energy),
                Instrument::new("BBB", Sector::Energy),
                Instrument::new("CCC", Sector::Healthcare),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_centrality_matrix_csv() {
        let names = universe().names().into_iter().map(str::to_string).collect();
        let mut export = CentralityMatrixExport::new(GraphKind::Correlation, CentralityKind::Eigenvector, names);
        let c = CentralityVector::from_scores(Array1::from(vec![1.0, 1.0, 2.0])).unwrap();
        export.push(Some(&c));
        export.push(None);

        let csv = export.export_to_string(ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "window,AAA,BBB,CCC");
        assert_eq!(lines[1], "0,0.25,0.25,0.5");
        assert_eq!(lines[2], "1,,,");
        assert_eq!(export.file_stem(), "centrality_eigenvector_correlation");
    }

    #[test]
    fn test_sector_rows() {
        let c = CentralityVector::from_scores(Array1::from(vec![1.0, 1.0, 2.0])).unwrap();
        let sectors = SectorCentrality::from_centrality(&c, &universe()).unwrap();
        let rows = SectorCentralityRow::from_sector_centrality(
            4,
            GraphKind::PartialCorrelation,
            CentralityKind::WeightedDegree,
            &sectors,
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sector, Sector::Energy);
        assert_eq!(rows[0].count, 2);

        let csv = rows.export_to_string(ExportFormat::Csv).unwrap();
        assert!(csv.starts_with("window,graph_kind,measure,sector,count,mean,share"));
        assert!(csv.contains("partial_correlation"));
        assert!(csv.contains("healthcare"));
        assert!(csv.contains(",weighted_degree,"));
    }

    #[test]
    fn test_window_artifact_is_json_only() {
        let pair = PrecisionPair {
            covariance: Array2::eye(3),
            precision: Array2::eye(3),
            shrinkage: 0.5,
        };
        let weights = array![[1.0, 0.2, 0.0], [0.2, 1.0, -0.1], [0.0, -0.1, 1.0]];
        let graph = WeightedGraph::new(GraphKind::Correlation, universe(), weights).unwrap();
        let artifact = WindowArtifact::new(3, &pair, &graph);

        assert_eq!(artifact.file_stem(), "window_0003_correlation");
        assert!(matches!(
            artifact.export_to_string(ExportFormat::Csv),
            Err(ExportError::InvalidFormat(_))
        ));
        let json = artifact.export_to_string(ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["graph_kind"], "correlation");
        assert_eq!(value["weights"][1][2], -0.1);
    }

    #[test]
    fn test_extension() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::PrettyJson.extension(), "json");
    }
}
