//! HTTP client for the remote TVM emulation service.

use super::trace::{EmulationResponse, TraceNode};
use super::{Emulator, EmulatorError, UnsignedMessage};
use crate::http::send_json;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_EMULATOR_URL: &str = "https://tvm.swap.coffee/api";

#[derive(Debug, Clone)]
pub struct TvmEmulatorClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct SessionRequest {
    block_seqno: u64,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    session_id: String,
}

/// Internal message envelope submitted for emulation.
#[derive(Debug, Serialize)]
struct TraceRequest<'a> {
    src: &'a str,
    dest: &'a str,
    value: String,
    body: &'a str,
}

impl TvmEmulatorClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn default_url(client: Client) -> Self {
        Self::new(client, DEFAULT_EMULATOR_URL)
    }
}

#[async_trait]
impl Emulator for TvmEmulatorClient {
    async fn create_session(&self, block_seqno: u64) -> Result<String, EmulatorError> {
        let url = format!("{}/v1/emulate/session", self.base_url);
        let response: SessionResponse =
            send_json(self.client.post(&url).json(&SessionRequest { block_seqno })).await?;

        if response.session_id.is_empty() {
            return Err(EmulatorError::Session(format!(
                "empty session id for block {}",
                block_seqno
            )));
        }

        debug!(block_seqno, session_id = %response.session_id, "Created emulation session");
        Ok(response.session_id)
    }

    async fn emulate_trace(
        &self,
        session_id: &str,
        message: &UnsignedMessage,
    ) -> Result<TraceNode, EmulatorError> {
        let url = format!("{}/v1/emulate/trace", self.base_url);
        let body = TraceRequest {
            src: &message.source,
            dest: &message.destination,
            value: message.value.to_string(),
            body: &message.body,
        };

        let response: EmulationResponse = send_json(
            self.client
                .post(&url)
                .query(&[("session_id", session_id)])
                .json(&body),
        )
        .await?;

        Ok(response.result)
    }
}
