//! One CSV file per input size.

use super::{BenchmarkExporter, ExportError};
use crate::domain::amount::normalize;
use crate::domain::{BenchmarkReport, BenchmarkResult, NATIVE_DECIMALS};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Column order is the field order.
#[derive(Debug, Serialize, PartialEq)]
struct Row<'a> {
    provider: &'a str,
    input_token_symbol: &'a str,
    output_token_symbol: &'a str,
    input_amount: f64,
    ratio: f64,
    emulated_output_amount: f64,
    output_amount: f64,
    gas_used: f64,
    elapsed: f64,
    max_splits: u32,
    max_length: u32,
    splits: usize,
    error_message: &'a str,
}

impl<'a> Row<'a> {
    /// Failures become zero rows carrying the error message.
    fn from_result(result: &'a BenchmarkResult) -> Self {
        let request = result.request();
        let output_decimals = request.output_token.decimals;
        let mut row = Row {
            provider: &result.provider().name,
            input_token_symbol: &request.input_token.symbol,
            output_token_symbol: &request.output_token.symbol,
            input_amount: normalize(request.input_amount, request.input_token.decimals),
            ratio: 0.0,
            emulated_output_amount: 0.0,
            output_amount: 0.0,
            gas_used: 0.0,
            elapsed: 0.0,
            max_splits: request.max_splits,
            max_length: request.max_length,
            splits: 0,
            error_message: "",
        };

        match result {
            BenchmarkResult::Success(s) => {
                row.ratio = s.ratio;
                row.emulated_output_amount = normalize(s.emulation.output_amount(), output_decimals);
                row.output_amount = normalize(s.route.output_amount, output_decimals);
                row.gas_used = normalize(s.emulation.gas_used(), NATIVE_DECIMALS);
                row.elapsed = s.elapsed;
                row.splits = s.emulation.message_count();
            }
            BenchmarkResult::Failure(f) => row.error_message = &f.message,
        }
        row
    }
}

#[derive(Debug, Clone)]
pub struct CsvExporter {
    directory: PathBuf,
}

impl CsvExporter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn write_bucket(path: &Path, results: &[BenchmarkResult]) -> Result<(), ExportError> {
        let mut writer = ::csv::Writer::from_path(path)?;
        for result in results {
            writer.serialize(Row::from_result(result))?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl BenchmarkExporter for CsvExporter {
    fn export(&self, report: &BenchmarkReport) -> Result<Vec<PathBuf>, ExportError> {
        fs::create_dir_all(&self.directory)?;

        let mut paths = Vec::with_capacity(report.buckets.len());
        for bucket in &report.buckets {
            let path = self.directory.join(format!("{}.csv", bucket.input_amount));
            Self::write_bucket(&path, &bucket.results)?;
            info!(path = %path.display(), rows = bucket.results.len(), "CSV written");
            paths.push(path);
        }
        Ok(paths)
    }
}
