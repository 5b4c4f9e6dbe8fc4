pub mod app;
pub mod config;
pub mod domain;
pub mod emulator;
pub mod engine;
pub mod error;
pub mod export;
pub mod http;
pub mod indexer;
pub mod orchestration;
pub mod providers;

pub use config::Config;
pub use domain::{
    BenchmarkFailure, BenchmarkReport, BenchmarkResult, BenchmarkSuccess, EmulatedResult,
    Emulation, EmulationSender, ProviderRef, Route, RouteRequest, Token,
};
pub use emulator::{Emulator, MockEmulator, SwapOutputAggregator, TvmEmulatorClient};
pub use error::AppError;
pub use indexer::{ChainIndexer, MockIndexer, TonApiIndexer};
pub use orchestration::{BenchmarkOrchestrator, BenchmarkPlan, GroupPacer, ProviderRun};
pub use providers::{MockProvider, Provider, ProviderError, RateLimiter};
