//! Writers that turn a finished [`BenchmarkReport`] into files.

use crate::domain::BenchmarkReport;
use std::path::PathBuf;
use thiserror::Error;

pub mod csv;
pub mod summary;

pub use self::csv::CsvExporter;
pub use self::summary::SummaryExporter;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("format error: {0}")]
    Format(#[from] std::fmt::Error),
}

pub trait BenchmarkExporter {
    /// Write the report and return the paths produced.
    fn export(&self, report: &BenchmarkReport) -> Result<Vec<PathBuf>, ExportError>;
}
