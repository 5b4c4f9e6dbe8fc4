//! titan.tg meta-aggregator.

use super::{decode, zip_messages, ComposedMessage, Provider, ProviderContext, ProviderError, ProviderExtra, RateLimiter};
use crate::domain::amount::de_units;
use crate::domain::{Emulation, EmulationSender, Route, RouteRequest};
use crate::emulator::{emulate_messages, UnsignedMessage};
use crate::http::send_json;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

const NAME: &str = "titan.tg";
pub const DEFAULT_API_URL: &str = "https://api.titan.tg";

/// Native coin as titan spells it.
pub const TON_ADDRESS: &str = "EQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAM9c";

#[derive(Debug, Clone)]
pub struct TitanExtra {
    /// Whole quote, echoed back as `swapDetails` when composing.
    pub quote: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Quote {
    #[serde(deserialize_with = "de_units")]
    expected_amount_out: u128,
    #[serde(default)]
    path_details: Vec<PathDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PathDetail {
    #[serde(deserialize_with = "de_units")]
    amount_in: u128,
}

#[derive(Debug, Deserialize)]
struct SwapMessages {
    messages: Vec<ComposedMessage>,
}

#[derive(Debug)]
pub struct TitanProvider {
    ctx: ProviderContext,
    api_url: String,
    limiter: RateLimiter,
}

impl TitanProvider {
    pub fn new(ctx: ProviderContext) -> Self {
        Self {
            limiter: ctx.rate_limiter(NAME),
            ctx,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

fn query_params(sender: &EmulationSender, request: &RouteRequest) -> Vec<(&'static str, String)> {
    vec![
        ("inputMint", request.input_token.address_or(TON_ADDRESS).to_string()),
        ("outputMint", request.output_token.address_or(TON_ADDRESS).to_string()),
        ("amount", request.input_amount.to_string()),
        ("slippageBps", ((sender.slippage * 10_000.0).round() as u32).to_string()),
        ("dexs", "StonFi_v1,StonFi_v2,DeDust".to_string()),
        ("minPoolLiquidity", "1000".to_string()),
    ]
}

fn parse_route(request: &RouteRequest, data: Value) -> Result<Route, ProviderError> {
    let quote: Quote = decode(NAME, data.clone())?;
    Ok(Route::for_request(
        request,
        NAME,
        quote.expected_amount_out,
        ProviderExtra::Titan(TitanExtra { quote: data }),
    ))
}

fn compose_messages(
    sender: &EmulationSender,
    extra: &TitanExtra,
    data: Value,
) -> Result<Vec<UnsignedMessage>, ProviderError> {
    let quote: Quote = decode(NAME, extra.quote.clone())?;
    let data: SwapMessages = decode(NAME, data)?;
    zip_messages(NAME, &quote.path_details, &data.messages, |path, message| {
        Ok(UnsignedMessage::from_sender(
            sender,
            message.address.clone(),
            message.payload.clone(),
            message.amount,
            path.amount_in,
        ))
    })
}

#[async_trait]
impl Provider for TitanProvider {
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

        let url = format!("{}/v1/quote", self.api_url);
        let data: Value = send_json(
            self.ctx
                .client
                .get(&url)
                .query(&query_params(sender, request)),
        )
        .await?;
        parse_route(request, data)
    }

    async fn emulate_route(
        &self,
        sender: &EmulationSender,
        route: &Route,
    ) -> Result<Emulation, ProviderError> {
        let ProviderExtra::Titan(extra) = &route.extra else {
            return Err(ProviderError::ForeignExtra(NAME));
        };

        let body = json!({
            "senderAddress": sender.wallet_address,
            "swapDetails": extra.quote
        });
        let url = format!("{}/v1/swap-messages", self.api_url);
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
