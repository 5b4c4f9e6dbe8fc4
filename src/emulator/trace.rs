//! Transaction trace model returned by the remote emulator.
//!
//! A trace is a tree: each node is one simulated transaction, keyed by the
//! message that triggered it, with the transactions it caused as children.

use crate::domain::amount::de_units;
use serde::{Deserialize, Serialize};

/// Envelope of one trace-emulation response.
#[derive(Debug, Clone, Deserialize)]
pub struct EmulationResponse {
    pub result: TraceNode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceNode {
    pub in_msg: TraceMessage,
    /// Absent when the compute phase was skipped.
    #[serde(default)]
    pub compute_phase: Option<ComputePhase>,
    #[serde(default)]
    pub children: Vec<TraceNode>,
}

impl TraceNode {
    pub fn new(in_msg: TraceMessage) -> Self {
        Self {
            in_msg,
            compute_phase: None,
            children: Vec::new(),
        }
    }

    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.compute_phase = Some(ComputePhase { exit_code });
        self
    }

    pub fn with_child(mut self, child: TraceNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn compute_exit_code(&self) -> Option<i32> {
        self.compute_phase.as_ref().map(|p| p.exit_code)
    }

    pub fn body_kind(&self) -> BodyKind {
        self.in_msg.body_kind()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputePhase {
    pub exit_code: i32,
}

/// Incoming message of a traced transaction. Addresses are in raw form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceMessage {
    #[serde(default, alias = "src")]
    pub source: Option<String>,
    #[serde(default, rename = "dest", alias = "destination")]
    pub destination: Option<String>,
    #[serde(default, deserialize_with = "de_units")]
    pub value: u128,
    /// Operation code as a `0x`-prefixed hex string.
    #[serde(default)]
    pub decoded_op: Option<String>,
    #[serde(default)]
    pub decoded_body: Option<DecodedMessageBody>,
}

impl TraceMessage {
    pub fn new(destination: impl Into<String>, value: u128) -> Self {
        Self {
            source: None,
            destination: Some(destination.into()),
            value,
            decoded_op: None,
            decoded_body: None,
        }
    }

    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.decoded_op = Some(op.into());
        self
    }

    pub fn with_body(mut self, body: DecodedMessageBody) -> Self {
        self.decoded_body = Some(body);
        self
    }

    pub fn body_kind(&self) -> BodyKind {
        self.decoded_body
            .as_ref()
            .map(DecodedMessageBody::kind)
            .unwrap_or(BodyKind::Other)
    }

    /// Raw-address equality; hex case is not significant.
    pub fn is_destined_to(&self, raw_address: &str) -> bool {
        self.destination
            .as_deref()
            .is_some_and(|d| d.eq_ignore_ascii_case(raw_address))
    }
}

/// Decoded message payloads the aggregator cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecodedMessageBody {
    JettonInternalTransfer {
        #[serde(deserialize_with = "de_units")]
        amount: u128,
        #[serde(default)]
        from: Option<String>,
        #[serde(default)]
        response_address: Option<String>,
    },
    Excesses,
    #[serde(other)]
    Other,
}

impl DecodedMessageBody {
    pub fn jetton_transfer(amount: u128) -> Self {
        DecodedMessageBody::JettonInternalTransfer {
            amount,
            from: None,
            response_address: None,
        }
    }

    pub fn kind(&self) -> BodyKind {
        match self {
            DecodedMessageBody::JettonInternalTransfer { .. } => BodyKind::JettonInternalTransfer,
            DecodedMessageBody::Excesses => BodyKind::Excesses,
            DecodedMessageBody::Other => BodyKind::Other,
        }
    }

    pub fn transfer_amount(&self) -> Option<u128> {
        match self {
            DecodedMessageBody::JettonInternalTransfer { amount, .. } => Some(*amount),
            _ => None,
        }
    }
}

/// Discriminant of [`DecodedMessageBody`], used to search traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyKind {
    JettonInternalTransfer,
    Excesses,
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_trace_tree() {
        let json = serde_json::json!({
            "result": {
                "in_msg": {
                    "src": "0:aa",
                    "dest": "0:bb",
                    "value": "1000000000",
                    "decoded_op": "0x0f8a7ea5"
                },
                "compute_phase": {"exit_code": 0},
                "children": [
                    {
                        "in_msg": {
                            "dest": "0:CC",
                            "value": 50,
                            "decoded_body": {"type": "jetton_internal_transfer", "amount": "123456789012345678901"}
                        },
                        "children": []
                    },
                    {
                        "in_msg": {
                            "dest": "0:aa",
                            "value": "1",
                            "decoded_body": {"type": "excesses", "query_id": 7}
                        }
                    },
                    {
                        "in_msg": {
                            "dest": "0:dd",
                            "value": "1",
                            "decoded_body": {"type": "dedust_swap", "amount": "5"}
                        }
                    }
                ]
            }
        });

        let response: EmulationResponse = serde_json::from_value(json).unwrap();
        let root = response.result;
        assert_eq!(root.in_msg.value, 1_000_000_000);
        assert_eq!(root.compute_exit_code(), Some(0));
        assert_eq!(root.children.len(), 3);
        assert_eq!(root.children[0].compute_exit_code(), None);
        assert_eq!(
            root.children[0].in_msg.decoded_body,
            Some(DecodedMessageBody::jetton_transfer(123_456_789_012_345_678_901))
        );
        assert!(root.children[0].in_msg.is_destined_to("0:cc"));
        assert_eq!(root.children[1].body_kind(), BodyKind::Excesses);
        assert_eq!(root.children[2].body_kind(), BodyKind::Other);
        assert_eq!(root.body_kind(), BodyKind::Other);
    }
}
