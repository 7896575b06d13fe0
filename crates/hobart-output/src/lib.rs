#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod export;
pub mod outcomes;
pub mod report;
pub mod spearman;

pub use export::{
    CentralityMatrixExport, ExportDirectory, ExportError, ExportFormat, Exporter,
    SectorCentralityRow, WindowArtifact,
};
pub use outcomes::{ForwardOutcomes, ForwardTarget};
pub use report::{
    RankCorrelationRow, RankCorrelationTable, Report, ReportBuilder, ReportError,
    StatisticsReporter, SummaryTable, WindowSummary,
};
pub use spearman::{RankCorrelation, average_ranks, spearman};
