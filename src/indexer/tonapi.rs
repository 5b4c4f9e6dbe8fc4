//! tonapi.io indexer client.

use super::{ChainIndexer, IndexerError};
use crate::http::send_json;
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_INDEXER_URL: &str = "https://tonapi.io";

#[derive(Debug, Clone)]
pub struct TonApiIndexer {
    client: Client,
    base_url: String,
    max_elapsed: Duration,
}

#[derive(Debug, Deserialize)]
struct MasterchainHead {
    seqno: u64,
}

#[derive(Debug, Deserialize)]
struct MethodResult {
    decoded: Option<DecodedWallet>,
}

#[derive(Debug, Deserialize)]
struct DecodedWallet {
    jetton_wallet_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ParsedAddress {
    raw_form: Option<String>,
}

impl TonApiIndexer {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_elapsed: Duration::from_secs(30),
        }
    }

    pub fn default_url(client: Client) -> Self {
        Self::new(client, DEFAULT_INDEXER_URL)
    }

    /// Upper bound on total time spent retrying one lookup.
    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = max_elapsed;
        self
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, IndexerError> {
        let url = format!("{}{}", self.base_url, path);
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.max_elapsed),
            ..Default::default()
        };

        retry(backoff, || async {
            send_json::<T>(self.client.get(&url)).await.map_err(|e| {
                if e.is_transient() {
                    warn!(url = %url, error = %e, "Indexer request failed, retrying");
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        })
        .await
        .map_err(IndexerError::Http)
    }
}

#[async_trait]
impl ChainIndexer for TonApiIndexer {
    async fn latest_block_seqno(&self) -> Result<u64, IndexerError> {
        let head: MasterchainHead = self.get_json("/v2/blockchain/masterchain-head").await?;
        debug!(seqno = head.seqno, "Resolved masterchain head");
        Ok(head.seqno)
    }

    async fn jetton_wallet_address(
        &self,
        owner: &str,
        master: &str,
    ) -> Result<String, IndexerError> {
        let path = format!(
            "/v2/blockchain/accounts/{}/methods/get_wallet_address?args={}",
            master, owner
        );
        let result: MethodResult = self.get_json(&path).await?;
        result
            .decoded
            .and_then(|d| d.jetton_wallet_address)
            .ok_or(IndexerError::Missing("jetton_wallet_address"))
    }

    async fn raw_address(&self, address: &str) -> Result<String, IndexerError> {
        let parsed: ParsedAddress = self.get_json(&format!("/v2/address/{}/parse", address)).await?;
        parsed.raw_form.ok_or(IndexerError::Missing("raw_form"))
    }
}
