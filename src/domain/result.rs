//! Benchmark result records handed to the stats engine and exporters.

use super::amount::normalize;
use super::{Emulation, Route, RouteRequest};
use serde::Serialize;

/// Identity of the provider that produced a result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProviderRef {
    pub name: String,
    pub is_dex: bool,
}

impl ProviderRef {
    pub fn new(name: impl Into<String>, is_dex: bool) -> Self {
        Self {
            name: name.into(),
            is_dex,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BenchmarkSuccess {
    pub route: Route,
    /// Route build time in seconds.
    pub elapsed: f64,
    /// Emulation time in seconds.
    pub emulation_elapsed: f64,
    pub ratio: f64,
    pub provider: ProviderRef,
    pub emulation: Emulation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkFailure {
    pub provider: ProviderRef,
    pub request: RouteRequest,
    pub message: String,
}

/// Exactly one of these is produced per (provider run, token, size) trial.
#[derive(Debug, Clone)]
pub enum BenchmarkResult {
    Success(Box<BenchmarkSuccess>),
    Failure(BenchmarkFailure),
}

impl BenchmarkResult {
    pub fn provider(&self) -> &ProviderRef {
        match self {
            BenchmarkResult::Success(s) => &s.provider,
            BenchmarkResult::Failure(f) => &f.provider,
        }
    }

    pub fn request(&self) -> &RouteRequest {
        match self {
            BenchmarkResult::Success(s) => &s.route.request,
            BenchmarkResult::Failure(f) => &f.request,
        }
    }

    pub fn as_success(&self) -> Option<&BenchmarkSuccess> {
        match self {
            BenchmarkResult::Success(s) => Some(s),
            BenchmarkResult::Failure(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.as_success().is_some()
    }
}

/// Output per unit of input plus gas, both normalized by their decimals.
///
/// Gas is denominated in the native coin, which is also the input token of
/// every trial, so both terms share the input token's decimals.
pub fn compute_ratio(route: &Route, emulation: &Emulation) -> f64 {
    let output = normalize(emulation.output_amount(), route.output_token.decimals);
    let spent = normalize(
        route.input_amount.saturating_add(emulation.gas_used()),
        route.input_token.decimals,
    );
    if spent == 0.0 {
        return 0.0;
    }
    output / spent
}

/// All results for one input size, in evaluation order.
#[derive(Debug, Clone)]
pub struct SizeBucket {
    /// Input size in whole native units.
    pub input_amount: u64,
    pub results: Vec<BenchmarkResult>,
}

/// Mapping input size -> ordered results, keeping the configured size order.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkReport {
    pub buckets: Vec<SizeBucket>,
}

impl BenchmarkReport {
    pub fn push(&mut self, input_amount: u64, results: Vec<BenchmarkResult>) {
        self.buckets.push(SizeBucket {
            input_amount,
            results,
        });
    }

    pub fn get(&self, input_amount: u64) -> Option<&[BenchmarkResult]> {
        self.buckets
            .iter()
            .find(|b| b.input_amount == input_amount)
            .map(|b| b.results.as_slice())
    }

    /// Distinct providers that produced at least one success, first-seen order.
    pub fn successful_providers(&self) -> Vec<ProviderRef> {
        let mut seen: Vec<ProviderRef> = Vec::new();
        for result in self.buckets.iter().flat_map(|b| b.results.iter()) {
            if let BenchmarkResult::Success(s) = result {
                if !seen.iter().any(|p| p.name == s.provider.name) {
                    seen.push(s.provider.clone());
                }
            }
        }
        seen
    }
}
