//! Token descriptor shared by every provider.

use serde::{Deserialize, Serialize};

/// Address sentinel for the chain's native coin.
pub const NATIVE_ADDRESS: &str = "native";

/// Decimals of the chain's native coin (TON nanotons).
pub const NATIVE_DECIMALS: u8 = 9;

/// An asset tradable on the chain.
///
/// `address` is an opaque chain address string or [`NATIVE_ADDRESS`].
/// `decimals` is only used for display and normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub address: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Token {
    pub fn new(address: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            address: address.into(),
            symbol: symbol.into(),
            decimals,
        }
    }

    /// The native coin (TON).
    pub fn native() -> Self {
        Self::new(NATIVE_ADDRESS, "TON", NATIVE_DECIMALS)
    }

    pub fn is_native(&self) -> bool {
        self.address == NATIVE_ADDRESS
    }

    /// Address as expected by APIs that spell the native coin differently.
    pub fn address_or<'a>(&'a self, native_alias: &'a str) -> &'a str {
        if self.is_native() {
            native_alias
        } else {
            &self.address
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol)
    }
}
