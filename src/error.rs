use crate::config::ConfigError;
use crate::export::ExportError;
use crate::http::HttpError;
use crate::orchestration::OrchestrationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("HTTP client error: {0}")]
    Http(#[from] HttpError),
    #[error("Benchmark failed: {0}")]
    Orchestration(#[from] OrchestrationError),
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}
