//! DeDust router v2: multi-protocol quotes with its own swap composition.

use super::{decode, zip_messages, ComposedMessage, Provider, ProviderContext, ProviderError, ProviderExtra, RateLimiter};
use crate::domain::amount::de_units;
use crate::domain::{Emulation, EmulationSender, Route, RouteRequest};
use crate::emulator::{emulate_messages, UnsignedMessage};
use crate::http::send_json;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

const NAME: &str = "dedust_v2";
pub const DEFAULT_API_URL: &str = "https://api-mainnet.dedust.io/v1/router";

#[derive(Debug, Clone)]
pub struct DedustV2Extra {
    /// `swap_data` from the quote, echoed back to the swap endpoint.
    pub swap_data: Value,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(deserialize_with = "de_units")]
    out_amount: u128,
    swap_data: Value,
}

#[derive(Debug, Deserialize)]
struct SwapData {
    routes: Vec<Vec<RouteStep>>,
}

#[derive(Debug, Deserialize)]
struct RouteStep {
    #[serde(deserialize_with = "de_units")]
    in_amount: u128,
}

#[derive(Debug, Deserialize)]
struct SwapResponse {
    transactions: Vec<ComposedMessage>,
}

#[derive(Debug)]
pub struct DedustV2Provider {
    ctx: ProviderContext,
    api_url: String,
    limiter: RateLimiter,
}

impl DedustV2Provider {
    pub fn new(ctx: ProviderContext) -> Self {
        Self {
            limiter: ctx.rate_limiter(NAME),
            ctx,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

fn quote_body(sender: &EmulationSender, request: &RouteRequest) -> Value {
    json!({
        "in_minter": request.input_token.address,
        "out_minter": request.output_token.address,
        "amount": request.input_amount.to_string(),
        "swap_mode": "exact_in",
        "only_verified_pools": true,
        "slippage_bps": (sender.slippage * 10_000.0).round() as u32,
        "min_pool_usd_tvl": "0",
        "min_economy_bps": 0,
        "protocols": ["dedust", "stonfi_v1", "stonfi_v2"],
        "max_splits": request.max_splits,
        "max_length": request.max_length
    })
}

fn parse_route(request: &RouteRequest, data: Value) -> Result<Route, ProviderError> {
    let quote: Quote = decode(NAME, data)?;
    Ok(Route::for_request(
        request,
        NAME,
        quote.out_amount,
        ProviderExtra::DedustV2(DedustV2Extra {
            swap_data: quote.swap_data,
        }),
    ))
}

/// Each route's first step carries the input for that split.
fn compose_messages(
    sender: &EmulationSender,
    extra: &DedustV2Extra,
    data: Value,
) -> Result<Vec<UnsignedMessage>, ProviderError> {
    let plan: SwapData = decode(NAME, extra.swap_data.clone())?;
    let response: SwapResponse = decode(NAME, data)?;
    zip_messages(NAME, &plan.routes, &response.transactions, |steps, message| {
        let first = steps
            .first()
            .ok_or_else(|| ProviderError::payload(NAME, "empty route in swap_data"))?;
        Ok(UnsignedMessage::from_sender(
            sender,
            message.address.clone(),
            message.payload.clone(),
            message.amount,
            first.in_amount,
        ))
    })
}

#[async_trait]
impl Provider for DedustV2Provider {
    fn name(&self) -> &str {
        NAME
    }

    fn is_dex(&self) -> bool {
        false
    }

    async fn build_route(
        &self,
        sender: &EmulationSender,
        request: &RouteRequest,
    ) -> Result<Route, ProviderError> {
        self.limiter.acquire().await;

        let url = format!("{}/quote", self.api_url);
        let data: Value = send_json(self.ctx.client.post(&url).json(&quote_body(sender, request))).await?;
        parse_route(request, data)
    }

    async fn emulate_route(
        &self,
        sender: &EmulationSender,
        route: &Route,
    ) -> Result<Emulation, ProviderError> {
        let ProviderExtra::DedustV2(extra) = &route.extra else {
            return Err(ProviderError::ForeignExtra(NAME));
        };

        let body = json!({
            "sender_address": sender.wallet_address,
            "swap_data": extra.swap_data
        });
        let url = format!("{}/swap", self.api_url);
        let data: Value = send_json(self.ctx.client.post(&url).json(&body)).await?;

        let messages = compose_messages(sender, extra, data)?;
        let result = emulate_messages(
            self.ctx.emulator.as_ref(),
            &self.ctx.aggregator,
            sender,
            &route.output_token,
            messages,
        )
        .await?;
        Ok(Emulation::Executed(result))
    }
}
