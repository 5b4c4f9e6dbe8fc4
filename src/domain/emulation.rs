//! Emulation context and settled outcomes.

use super::Token;
use serde::{Deserialize, Serialize};

/// Context a route is emulated under. One instance is shared by every
/// provider in a (token, size) group so the results are comparable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmulationSender {
    /// Wallet address as configured (user-friendly form), passed to quote APIs.
    pub wallet_address: String,
    /// Same wallet in raw `workchain:hex` form, as it appears in traces.
    pub wallet_address_raw: String,
    /// Sender's jetton wallet for the output token, raw form.
    pub jetton_wallet_address: String,
    pub slippage: f64,
    pub block_seqno: u64,
}

/// Settled outcome of emulating a route's transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmulatedResult {
    pub output_token: Token,
    pub output_amount: u128,
    /// Net native-coin cost beyond the swap input, never negative.
    pub gas_used: u128,
    pub message_count: usize,
}

impl EmulatedResult {
    pub fn zero(output_token: Token) -> Self {
        Self {
            output_token,
            output_amount: 0,
            gas_used: 0,
            message_count: 0,
        }
    }
}

/// Whether a provider actually emulated a route.
///
/// `Unsupported` is a deliberate capability gap, distinct from an executed
/// emulation that produced zero output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emulation {
    Executed(EmulatedResult),
    Unsupported,
}

impl Emulation {
    pub fn is_executed(&self) -> bool {
        matches!(self, Emulation::Executed(_))
    }

    pub fn output_amount(&self) -> u128 {
        match self {
            Emulation::Executed(r) => r.output_amount,
            Emulation::Unsupported => 0,
        }
    }

    pub fn gas_used(&self) -> u128 {
        match self {
            Emulation::Executed(r) => r.gas_used,
            Emulation::Unsupported => 0,
        }
    }

    pub fn message_count(&self) -> usize {
        match self {
            Emulation::Executed(r) => r.message_count,
            Emulation::Unsupported => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_reports_zero() {
        let e = Emulation::Unsupported;
        assert!(!e.is_executed());
        assert_eq!(e.output_amount(), 0);
        assert_eq!(e.gas_used(), 0);
        assert_eq!(e.message_count(), 0);
    }

    #[test]
    fn test_executed_zero_is_distinguishable() {
        let e = Emulation::Executed(EmulatedResult::zero(Token::native()));
        assert!(e.is_executed());
        assert_ne!(e, Emulation::Unsupported);
        assert_eq!(e.output_amount(), 0);
    }
}
