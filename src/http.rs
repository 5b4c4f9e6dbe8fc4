//! Shared HTTP transport and JSON request helpers.

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

/// Transport-level failure talking to any external endpoint.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP error {status}: {message}")]
    Status { status: u16, message: String },
    #[error("decode error: {0}")]
    Decode(String),
}

impl HttpError {
    /// Worth retrying: connection failures, throttling and server errors.
    pub fn is_transient(&self) -> bool {
        match self {
            HttpError::Network(_) => true,
            HttpError::Status { status, .. } => *status == 429 || *status >= 500,
            HttpError::Decode(_) => false,
        }
    }
}

/// Build the single client shared by every provider, the emulator and the indexer.
///
/// `max_idle_per_host` caps the keep-alive connections reqwest parks between
/// requests. It is not a limit on in-flight requests; reqwest opens extra
/// connections on demand. In-flight load is bounded by each provider's
/// capacity-1 rate limiter instead.
pub fn build_client(timeout: Duration, max_idle_per_host: usize) -> Result<Client, HttpError> {
    Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(max_idle_per_host)
        .build()
        .map_err(|e| HttpError::Network(e.to_string()))
}

/// Send a request and decode a JSON body, failing on any non-2xx status.
pub async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, HttpError> {
    let response = request
        .send()
        .await
        .map_err(|e| HttpError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(256)
            .collect::<String>();
        return Err(HttpError::Status {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| HttpError::Decode(e.to_string()))
}
