//! Markdown summary of the comparative statistics.

use super::{BenchmarkExporter, ExportError};
use crate::domain::BenchmarkReport;
use crate::engine::{measure_report, StatsGroup};
use chrono::{DateTime, Utc};
use std::fmt::{self, Write as _};
use std::fs;
use std::path::PathBuf;
use tracing::info;

pub const SUMMARY_FILE: &str = "summary.md";

#[derive(Debug, Clone)]
pub struct SummaryExporter {
    directory: PathBuf,
}

impl SummaryExporter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

/// Render stats groups as markdown tables, best profitability first.
pub fn render(groups: &[StatsGroup], generated_at: DateTime<Utc>) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "# DEX aggregator benchmark")?;
    writeln!(out)?;
    writeln!(out, "Generated at {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;

    for group in groups {
        writeln!(out)?;
        writeln!(out, "## Input amount: {}", group.input_amount)?;
        writeln!(out)?;
        writeln!(
            out,
            "| Provider | Type | Best output | Fastest aggregator | Avg build time, s | Best for |"
        )?;
        writeln!(out, "|---|---|---|---|---|---|")?;

        let mut stats: Vec<_> = group.stats.iter().collect();
        stats.sort_by(|a, b| {
            b.profitable_hit
                .cmp(&a.profitable_hit)
                .then_with(|| a.provider_name.cmp(&b.provider_name))
        });

        for s in stats {
            let kind = if s.is_dex { "dex" } else { "aggregator" };
            let fast = if s.is_dex {
                "-".to_string()
            } else {
                format!("{}/{}", s.fast_hit_aggregators, s.fast_total_aggregators)
            };
            let tokens: Vec<&str> = s.tokens.iter().map(String::as_str).collect();
            writeln!(
                out,
                "| {} | {} | {}/{} | {} | {:.3} | {} |",
                s.provider_name,
                kind,
                s.profitable_hit,
                s.profitable_total,
                fast,
                s.avg_elapsed,
                tokens.join(", ")
            )?;
        }
    }

    Ok(out)
}

impl BenchmarkExporter for SummaryExporter {
    fn export(&self, report: &BenchmarkReport) -> Result<Vec<PathBuf>, ExportError> {
        fs::create_dir_all(&self.directory)?;

        let path = self.directory.join(SUMMARY_FILE);
        fs::write(&path, render(&measure_report(report), Utc::now())?)?;
        info!(path = %path.display(), "Summary written");
        Ok(vec![path])
    }
}
