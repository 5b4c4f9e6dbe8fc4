//! Provider abstraction over external routing aggregators.
//!
//! Every provider quotes a route through its own API and, where it can,
//! composes and emulates the resulting transactions. Providers without a
//! composition endpoint delegate emulation to a builder provider.

use crate::domain::{Emulation, EmulationSender, ProviderRef, Route, RouteRequest};
use crate::emulator::{Emulator, EmulatorError, SwapOutputAggregator, UnsignedMessage};
use crate::http::HttpError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub mod dedust;
pub mod dedust_v2;
pub mod mock;
pub mod moki;
pub mod rainbow;
pub mod rate_limiter;
pub mod stonfi;
pub mod swap_coffee;
pub mod titan;
pub mod xdelta;

pub use dedust::DedustProvider;
pub use dedust_v2::DedustV2Provider;
pub use mock::MockProvider;
pub use moki::MokiProvider;
pub use rainbow::RainbowProvider;
pub use rate_limiter::RateLimiter;
pub use stonfi::StonfiProvider;
pub use swap_coffee::{DexPool, SwapCoffeeProvider, SwapRoute};
pub use titan::TitanProvider;
pub use xdelta::XdeltaProvider;

/// One external aggregator.
#[async_trait]
pub trait Provider: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// True for on-chain pools queried directly, false for meta-aggregators.
    fn is_dex(&self) -> bool;

    /// Quote a route. Implementations acquire their rate limiter first.
    async fn build_route(
        &self,
        sender: &EmulationSender,
        request: &RouteRequest,
    ) -> Result<Route, ProviderError>;

    /// Compose and emulate a route built by this provider.
    async fn emulate_route(
        &self,
        _sender: &EmulationSender,
        _route: &Route,
    ) -> Result<Emulation, ProviderError> {
        Ok(Emulation::Unsupported)
    }

    fn provider_ref(&self) -> ProviderRef {
        ProviderRef::new(self.name(), self.is_dex())
    }
}

/// Provider-owned state threaded from `build_route` into `emulate_route`.
#[derive(Debug, Clone, Default)]
pub enum ProviderExtra {
    #[default]
    None,
    SwapCoffee(swap_coffee::SwapCoffeeExtra),
    Rainbow(rainbow::RainbowExtra),
    Titan(titan::TitanExtra),
    Xdelta(xdelta::XdeltaExtra),
    DedustV2(dedust_v2::DedustV2Extra),
    Dedust(dedust::DedustExtra),
    Stonfi(stonfi::StonfiExtra),
    Moki(moki::MokiExtra),
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("malformed {provider} response: {message}")]
    Payload {
        provider: &'static str,
        message: String,
    },
    #[error("emulation failed: {0}")]
    Emulation(#[from] EmulatorError),
    #[error("route extra was not built by {0}")]
    ForeignExtra(&'static str),
}

impl ProviderError {
    pub fn payload(provider: &'static str, message: impl fmt::Display) -> Self {
        ProviderError::Payload {
            provider,
            message: message.to_string(),
        }
    }
}

/// Dependencies shared by every provider instance.
#[derive(Debug, Clone)]
pub struct ProviderContext {
    pub client: Client,
    pub emulator: Arc<dyn Emulator>,
    pub aggregator: Arc<SwapOutputAggregator>,
    pub rate_limit_interval: Duration,
}

impl ProviderContext {
    pub fn rate_limiter(&self, provider: &str) -> RateLimiter {
        RateLimiter::new(provider, self.rate_limit_interval)
    }
}

/// Composed transaction as most composition endpoints return it.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ComposedMessage {
    pub address: String,
    #[serde(deserialize_with = "crate::domain::amount::de_units")]
    pub amount: u128,
    pub payload: String,
}

/// Decode a JSON document into a typed view, tagging failures with the provider.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    provider: &'static str,
    value: serde_json::Value,
) -> Result<T, ProviderError> {
    serde_json::from_value(value).map_err(|e| ProviderError::payload(provider, e))
}

/// Pair each planned split with its composed message, by position.
pub(crate) fn zip_messages<P, M>(
    provider: &'static str,
    splits: &[P],
    messages: &[M],
    mut make: impl FnMut(&P, &M) -> Result<UnsignedMessage, ProviderError>,
) -> Result<Vec<UnsignedMessage>, ProviderError> {
    if messages.len() < splits.len() {
        return Err(ProviderError::payload(
            provider,
            format!(
                "{} messages composed for {} splits",
                messages.len(),
                splits.len()
            ),
        ));
    }
    splits
        .iter()
        .zip(messages.iter())
        .map(|(split, message)| make(split, message))
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::domain::{EmulationSender, RouteRequest, Token};
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    pub fn sender() -> EmulationSender {
        EmulationSender {
            wallet_address: "UQsender".to_string(),
            wallet_address_raw: "0:sender".to_string(),
            jetton_wallet_address: "0:jw".to_string(),
            slippage: 0.05,
            block_seqno: 100,
        }
    }

    pub fn request() -> RouteRequest {
        RouteRequest {
            input_token: Token::native(),
            output_token: Token::new("EQusdt", "USDT", 6),
            input_amount: 1_000_000_000_000,
            max_splits: 4,
            max_length: 5,
        }
    }

    #[derive(Debug, Clone)]
    pub struct StubRequest {
        pub method: String,
        pub path: String,
        pub body: Value,
    }

    /// Local HTTP/1.1 endpoint answering canned JSON by request path and
    /// recording every request it sees. Unknown paths get a 404.
    pub struct StubServer {
        pub url: String,
        requests: Arc<Mutex<Vec<StubRequest>>>,
    }

    impl StubServer {
        pub async fn start(routes: Vec<(&str, Value)>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let url = format!("http://{}", listener.local_addr().unwrap());
            let routes: Arc<HashMap<String, Value>> = Arc::new(
                routes
                    .into_iter()
                    .map(|(path, body)| (path.to_string(), body))
                    .collect(),
            );
            let requests = Arc::new(Mutex::new(Vec::new()));

            let recorded = requests.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let routes = routes.clone();
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        let _ = serve(stream, &routes, &recorded).await;
                    });
                }
            });

            Self { url, requests }
        }

        pub fn requests(&self) -> Vec<StubRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    async fn serve(
        mut stream: TcpStream,
        routes: &HashMap<String, Value>,
        requests: &Mutex<Vec<StubRequest>>,
    ) -> std::io::Result<()> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let header_end = loop {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                return Ok(());
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let mut lines = head.lines();
        let mut request_line = lines.next().unwrap_or_default().split_whitespace();
        let method = request_line.next().unwrap_or_default().to_string();
        let path = request_line.next().unwrap_or_default().to_string();
        let content_length = lines
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        while buf.len() < header_end + content_length {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        let body = serde_json::from_slice(&buf[header_end..]).unwrap_or(Value::Null);

        let (status, payload) = match routes.get(&path) {
            Some(value) => ("200 OK", value.to_string()),
            None => ("404 Not Found", "{}".to_string()),
        };
        requests.lock().unwrap().push(StubRequest { method, path, body });

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            payload.len(),
            payload
        );
        stream.write_all(response.as_bytes()).await?;
        stream.shutdown().await
    }
}
