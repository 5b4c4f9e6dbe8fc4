//! Benchmark scheduling across sizes, tokens and providers.

pub mod orchestrator;
pub mod pacer;

pub use orchestrator::{BenchmarkOrchestrator, BenchmarkPlan, OrchestrationError, ProviderRun};
pub use pacer::GroupPacer;
