//! Comparative per-provider statistics within one input size.
//!
//! Successful results are grouped by output token symbol. A provider "hits"
//! a group when one of its results is within [`HIT_THRESHOLD`] relative
//! difference of the group's best value.

use crate::domain::{BenchmarkReport, BenchmarkResult, BenchmarkSuccess};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Relative difference below which a value counts as matching the best.
pub const HIT_THRESHOLD: f64 = 1e-4;

/// Hit counting over the symbol groups of one size bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HitStats {
    /// Number of symbol groups.
    pub total: usize,
    pub hits: usize,
    pub symbols: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderStats {
    pub provider_name: String,
    pub is_dex: bool,
    pub profitable_total: usize,
    pub profitable_hit: usize,
    pub fast_total_aggregators: usize,
    pub fast_hit_aggregators: usize,
    /// Mean route build time in seconds over successful trials; 0 if none.
    pub avg_elapsed: f64,
    /// Symbols where this provider had the best ratio.
    pub tokens: BTreeSet<String>,
}

/// Stats for every provider at one input size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsGroup {
    pub input_amount: u64,
    pub stats: Vec<ProviderStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rank {
    HigherIsBetter,
    LowerIsBetter,
}

fn by_symbol(results: &[BenchmarkResult]) -> BTreeMap<&str, Vec<&BenchmarkSuccess>> {
    let mut groups: BTreeMap<&str, Vec<&BenchmarkSuccess>> = BTreeMap::new();
    for success in results.iter().filter_map(BenchmarkResult::as_success) {
        groups
            .entry(success.route.output_token.symbol.as_str())
            .or_default()
            .push(success);
    }
    groups
}

/// Relative shortfall of `value` against `best`. A zero best only matches
/// an exact zero.
fn relative_diff(best: f64, value: f64, rank: Rank) -> f64 {
    if best == 0.0 {
        return if value == 0.0 { 0.0 } else { f64::INFINITY };
    }
    match rank {
        Rank::HigherIsBetter => 1.0 - value / best,
        Rank::LowerIsBetter if value.is_finite() => 1.0 - best / value,
        Rank::LowerIsBetter => f64::INFINITY,
    }
}

fn hit_count<F>(results: &[BenchmarkResult], provider: &str, rank: Rank, extract: F) -> HitStats
where
    F: Fn(&BenchmarkSuccess) -> f64,
{
    let groups = by_symbol(results);
    let mut stats = HitStats {
        total: groups.len(),
        ..Default::default()
    };

    for (symbol, group) in groups {
        let values = group.iter().map(|s| extract(*s));
        let best = match rank {
            Rank::HigherIsBetter => values.fold(f64::NEG_INFINITY, f64::max),
            Rank::LowerIsBetter => values.fold(f64::INFINITY, f64::min),
        };

        let hit = group
            .iter()
            .filter(|s| s.provider.name == provider)
            .any(|s| relative_diff(best, extract(*s), rank) < HIT_THRESHOLD);
        if hit {
            stats.hits += 1;
            stats.symbols.insert(symbol.to_string());
        }
    }

    stats
}

/// Symbols where `provider` achieved the best output ratio.
pub fn most_profitable_all(results: &[BenchmarkResult], provider: &str) -> HitStats {
    hit_count(results, provider, Rank::HigherIsBetter, |s| s.ratio)
}

/// Symbols where `provider` built its route fastest among providers whose
/// `is_dex` equals `dex_flag`. Results of the other kind never win.
pub fn lowest_route_build_time(
    results: &[BenchmarkResult],
    provider: &str,
    dex_flag: bool,
) -> HitStats {
    hit_count(results, provider, Rank::LowerIsBetter, |s| {
        if s.provider.is_dex == dex_flag {
            s.elapsed
        } else {
            f64::INFINITY
        }
    })
}

pub fn measure_provider_stats(
    results: &[BenchmarkResult],
    provider: &str,
    is_dex: bool,
) -> ProviderStats {
    let profitable = most_profitable_all(results, provider);
    let fast = lowest_route_build_time(results, provider, false);

    let elapsed: Vec<f64> = results
        .iter()
        .filter_map(BenchmarkResult::as_success)
        .filter(|s| s.provider.name == provider && s.elapsed > 0.0)
        .map(|s| s.elapsed)
        .collect();
    let avg_elapsed = if elapsed.is_empty() {
        0.0
    } else {
        elapsed.iter().sum::<f64>() / elapsed.len() as f64
    };

    ProviderStats {
        provider_name: provider.to_string(),
        is_dex,
        profitable_total: profitable.total,
        profitable_hit: profitable.hits,
        fast_total_aggregators: fast.total,
        fast_hit_aggregators: fast.hits,
        avg_elapsed,
        tokens: profitable.symbols,
    }
}

/// Stats for every provider with at least one success, per input size.
pub fn measure_report(report: &BenchmarkReport) -> Vec<StatsGroup> {
    let providers = report.successful_providers();
    report
        .buckets
        .iter()
        .map(|bucket| StatsGroup {
            input_amount: bucket.input_amount,
            stats: providers
                .iter()
                .map(|p| measure_provider_stats(&bucket.results, &p.name, p.is_dex))
                .collect(),
        })
        .collect()
}
