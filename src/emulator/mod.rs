//! Remote transaction emulation and trace aggregation.

use crate::domain::{EmulatedResult, EmulationSender, Token};
use crate::http::HttpError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod aggregate;
pub mod client;
pub mod mock;
pub mod trace;

pub use aggregate::{
    find_by_body_type, traverse, EmulatedTransaction, SwapOutcome, SwapOutputAggregator,
    DEFAULT_PAYOUT_OP_CODES,
};
pub use client::TvmEmulatorClient;
pub use mock::MockEmulator;
pub use trace::{BodyKind, DecodedMessageBody, EmulationResponse, TraceMessage, TraceNode};

/// One outbound message produced by a provider's swap composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedMessage {
    /// Sender wallet, raw form.
    pub source: String,
    pub destination: String,
    /// Serialized message body as handed out by the composing API.
    pub body: String,
    pub value: u128,
    /// Portion of `value` earmarked as swap input.
    pub swap_input_amount: u128,
    /// Wallet expected to receive the swap output, raw form.
    pub counterparty_wallet: String,
}

impl UnsignedMessage {
    /// Message from the emulation sender's wallet.
    pub fn from_sender(
        sender: &EmulationSender,
        destination: impl Into<String>,
        body: impl Into<String>,
        value: u128,
        swap_input_amount: u128,
    ) -> Self {
        Self {
            source: sender.wallet_address_raw.clone(),
            destination: destination.into(),
            body: body.into(),
            value,
            swap_input_amount,
            counterparty_wallet: sender.jetton_wallet_address.clone(),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum EmulatorError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("emulation session error: {0}")]
    Session(String),
    #[error("no trace for message to {0}")]
    MissingTrace(String),
}

/// Stateful remote emulator: a session pins the chain state at a block and
/// accumulates the effects of every message emulated in it.
#[async_trait]
pub trait Emulator: Send + Sync + fmt::Debug {
    async fn create_session(&self, block_seqno: u64) -> Result<String, EmulatorError>;

    async fn emulate_trace(
        &self,
        session_id: &str,
        message: &UnsignedMessage,
    ) -> Result<TraceNode, EmulatorError>;
}

/// Emulate a route's messages in order inside one fresh session and settle
/// the aggregated outcome.
pub async fn emulate_messages(
    emulator: &dyn Emulator,
    aggregator: &SwapOutputAggregator,
    sender: &EmulationSender,
    output_token: &Token,
    messages: Vec<UnsignedMessage>,
) -> Result<EmulatedResult, EmulatorError> {
    let session_id = emulator.create_session(sender.block_seqno).await?;
    let message_count = messages.len();

    let mut transactions = Vec::with_capacity(message_count);
    for message in messages {
        let trace = emulator.emulate_trace(&session_id, &message).await?;
        transactions.push(EmulatedTransaction { message, trace });
    }

    let outcome = aggregator.compute_swap_output(&transactions);

    Ok(EmulatedResult {
        output_token: output_token.clone(),
        output_amount: outcome.output_amount,
        gas_used: outcome.gas_used,
        message_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> EmulationSender {
        EmulationSender {
            wallet_address: "UQsender".to_string(),
            wallet_address_raw: "0:sender".to_string(),
            jetton_wallet_address: "0:jw".to_string(),
            slippage: 0.05,
            block_seqno: 42,
        }
    }

    #[tokio::test]
    async fn test_emulate_messages_uses_one_session() {
        let trace = TraceNode::new(TraceMessage::new("0:router", 1_200)).with_child(TraceNode::new(
            TraceMessage::new("0:jw", 0).with_body(DecodedMessageBody::jetton_transfer(77)),
        ));
        let emulator = MockEmulator::new().with_trace("0:router", trace);
        let sender = sender();
        let messages = vec![
            UnsignedMessage::from_sender(&sender, "0:router", "te6cc", 1_200, 1_000),
            UnsignedMessage::from_sender(&sender, "0:router", "te6cc", 1_200, 1_000),
        ];

        let result = emulate_messages(
            &emulator,
            &SwapOutputAggregator::default(),
            &sender,
            &Token::native(),
            messages,
        )
        .await
        .unwrap();

        assert_eq!(result.message_count, 2);
        assert_eq!(result.output_amount, 154);
        assert_eq!(result.gas_used, 400);
        assert_eq!(emulator.sessions_created(), 1);
        assert_eq!(emulator.last_block_seqno(), Some(42));
    }

    #[tokio::test]
    async fn test_emulate_messages_propagates_missing_trace() {
        let emulator = MockEmulator::new();
        let sender = sender();
        let err = emulate_messages(
            &emulator,
            &SwapOutputAggregator::default(),
            &sender,
            &Token::native(),
            vec![UnsignedMessage::from_sender(&sender, "0:nowhere", "", 1, 0)],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EmulatorError::MissingTrace(_)));
    }
}
