//! Scripted provider for testing without network calls.

use super::{Provider, ProviderContext, ProviderError, ProviderExtra, RateLimiter};
use crate::domain::{EmulatedResult, Emulation, EmulationSender, Route, RouteRequest};
use crate::emulator::{MockEmulator, SwapOutputAggregator};
use crate::http::HttpError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

/// Provider that quotes a fixed output and returns a fixed emulation.
#[derive(Debug)]
pub struct MockProvider {
    name: String,
    is_dex: bool,
    output_amount: u128,
    emulation: Option<(u128, u128)>,
    build_error: Option<ProviderError>,
    emulate_error: Option<ProviderError>,
    latency: Duration,
    limiter: RateLimiter,
    build_calls: AtomicUsize,
    requests: Mutex<Vec<RouteRequest>>,
}

impl MockProvider {
    /// A meta-aggregator with no emulation and no rate limit.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            limiter: RateLimiter::unlimited(name.clone()),
            name,
            is_dex: false,
            output_amount: 0,
            emulation: None,
            build_error: None,
            emulate_error: None,
            latency: Duration::ZERO,
            build_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn dex(mut self) -> Self {
        self.is_dex = true;
        self
    }

    /// Set the quoted output amount.
    pub fn with_output(mut self, output_amount: u128) -> Self {
        self.output_amount = output_amount;
        self
    }

    /// Emulate routes as executed with this output and gas.
    pub fn with_emulation(mut self, output_amount: u128, gas_used: u128) -> Self {
        self.emulation = Some((output_amount, gas_used));
        self
    }

    /// Fail route building with a transport error.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.build_error = Some(HttpError::Network(message.into()).into());
        self
    }

    pub fn failing_emulation(mut self, error: ProviderError) -> Self {
        self.emulate_error = Some(error);
        self
    }

    /// Time each route build takes.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_rate_limit(mut self, interval: Duration) -> Self {
        self.limiter = RateLimiter::new(self.name.clone(), interval);
        self
    }

    pub fn build_calls(&self) -> usize {
        self.build_calls.load(Ordering::SeqCst)
    }

    /// Every request seen by `build_route`, in arrival order.
    pub fn requests(&self) -> Vec<RouteRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_dex(&self) -> bool {
        self.is_dex
    }

    async fn build_route(
        &self,
        _sender: &EmulationSender,
        request: &RouteRequest,
    ) -> Result<Route, ProviderError> {
        self.limiter.acquire().await;
        self.build_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }
        if let Some(err) = &self.build_error {
            return Err(err.clone());
        }
        Ok(Route::for_request(
            request,
            self.name.clone(),
            self.output_amount,
            ProviderExtra::None,
        ))
    }

    async fn emulate_route(
        &self,
        _sender: &EmulationSender,
        route: &Route,
    ) -> Result<Emulation, ProviderError> {
        if let Some(err) = &self.emulate_error {
            return Err(err.clone());
        }
        Ok(match self.emulation {
            Some((output_amount, gas_used)) => Emulation::Executed(EmulatedResult {
                output_token: route.output_token.clone(),
                output_amount,
                gas_used,
                message_count: 1,
            }),
            None => Emulation::Unsupported,
        })
    }
}

/// Context backed by an empty [`MockEmulator`] and no rate limiting.
pub fn test_context() -> ProviderContext {
    ProviderContext {
        client: reqwest::Client::new(),
        emulator: Arc::new(MockEmulator::new()),
        aggregator: Arc::new(SwapOutputAggregator::default()),
        rate_limit_interval: Duration::ZERO,
    }
}
