//! Route requests and the routes providers answer with.

use super::Token;
use crate::providers::ProviderExtra;
use serde::{Deserialize, Serialize};

/// One (pair, size) trial request. Created once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub input_token: Token,
    pub output_token: Token,
    /// Amount of `input_token` in smallest units.
    pub input_amount: u128,
    pub max_splits: u32,
    pub max_length: u32,
}

impl RouteRequest {
    /// Short label used in log lines, e.g. `1000 TON -> USDT`.
    pub fn label(&self) -> String {
        format!(
            "{} {} -> {}",
            super::amount::normalize(self.input_amount, self.input_token.decimals),
            self.input_token.symbol,
            self.output_token.symbol
        )
    }
}

/// A quoted route. `extra` is owned by the provider that built it and is
/// only ever read back by that provider's `emulate_route`.
#[derive(Debug, Clone)]
pub struct Route {
    pub input_token: Token,
    pub output_token: Token,
    pub provider_name: String,
    pub input_amount: u128,
    pub output_amount: u128,
    /// The exact request that produced this route.
    pub request: RouteRequest,
    pub extra: ProviderExtra,
}

impl Route {
    /// Route answering `request` with the request's own tokens and amount.
    pub fn for_request(
        request: &RouteRequest,
        provider_name: impl Into<String>,
        output_amount: u128,
        extra: ProviderExtra,
    ) -> Self {
        Self {
            input_token: request.input_token.clone(),
            output_token: request.output_token.clone(),
            provider_name: provider_name.into(),
            input_amount: request.input_amount,
            output_amount,
            request: request.clone(),
            extra,
        }
    }
}
