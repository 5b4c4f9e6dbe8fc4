//! Domain types for the aggregator benchmark.
//!
//! This module provides:
//! - Token and route descriptors exchanged with providers
//! - Emulation context and the `Emulation` capability outcome
//! - Benchmark result records and the size-bucketed report
//! - Amount normalization helpers

pub mod amount;
pub mod emulation;
pub mod result;
pub mod route;
pub mod token;

pub use emulation::{EmulatedResult, Emulation, EmulationSender};
pub use result::{
    compute_ratio, BenchmarkFailure, BenchmarkReport, BenchmarkResult, BenchmarkSuccess,
    ProviderRef, SizeBucket,
};
pub use route::{Route, RouteRequest};
pub use token::{Token, NATIVE_ADDRESS, NATIVE_DECIMALS};
