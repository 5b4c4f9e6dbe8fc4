//! xdelta.fi meta-aggregator.

use super::{decode, zip_messages, ComposedMessage, Provider, ProviderContext, ProviderError, ProviderExtra, RateLimiter};
use crate::domain::amount::{de_units, normalize, to_base_units};
use crate::domain::{Emulation, EmulationSender, Route, RouteRequest};
use crate::emulator::{emulate_messages, UnsignedMessage};
use crate::http::send_json;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

const NAME: &str = "xdelta.fi";
pub const DEFAULT_API_URL: &str = "https://backend.xdelta.fi";

/// Pause before calling the compose endpoint, which rejects back-to-back calls.
pub const DEFAULT_COMPOSE_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct XdeltaExtra {
    pub multiroute: Value,
}

#[derive(Debug, Deserialize)]
struct RouteEnvelope {
    data: RouteData,
}

#[derive(Debug, Deserialize)]
struct RouteData {
    output_amount: f64,
    multiroute: Value,
}

#[derive(Debug, Deserialize)]
struct Multiroute {
    routes: Vec<MultirouteLeg>,
}

#[derive(Debug, Deserialize)]
struct MultirouteLeg {
    #[serde(deserialize_with = "de_units")]
    in_amount: u128,
}

#[derive(Debug, Deserialize)]
struct ComposeEnvelope {
    data: ComposeData,
}

#[derive(Debug, Deserialize)]
struct ComposeData {
    messages: Vec<ComposedMessage>,
}

#[derive(Debug)]
pub struct XdeltaProvider {
    ctx: ProviderContext,
    api_url: String,
    compose_delay: Duration,
    limiter: RateLimiter,
}

impl XdeltaProvider {
    pub fn new(ctx: ProviderContext) -> Self {
        Self {
            limiter: ctx.rate_limiter(NAME),
            ctx,
            api_url: DEFAULT_API_URL.to_string(),
            compose_delay: DEFAULT_COMPOSE_DELAY,
        }
    }

    pub fn with_compose_delay(mut self, compose_delay: Duration) -> Self {
        self.compose_delay = compose_delay;
        self
    }
}

fn route_request_body(request: &RouteRequest) -> Value {
    json!({
        "input_token": request.input_token.address_or("TON"),
        "output_token": request.output_token.address_or("TON"),
        "input_amount": normalize(request.input_amount, request.input_token.decimals).to_string(),
        "max_splits": request.max_splits,
        "max_length": request.max_length,
        "intermediate_tokens": "optimal"
    })
}

fn parse_route(request: &RouteRequest, data: Value) -> Result<Route, ProviderError> {
    let envelope: RouteEnvelope = decode(NAME, data)?;
    let output_amount = to_base_units(envelope.data.output_amount, request.output_token.decimals)
        .ok_or_else(|| ProviderError::payload(NAME, "bad output_amount"))?;

    Ok(Route::for_request(
        request,
        NAME,
        output_amount,
        ProviderExtra::Xdelta(XdeltaExtra {
            multiroute: envelope.data.multiroute,
        }),
    ))
}

fn compose_messages(
    sender: &EmulationSender,
    extra: &XdeltaExtra,
    data: Value,
) -> Result<Vec<UnsignedMessage>, ProviderError> {
    let plan: Multiroute = decode(NAME, extra.multiroute.clone())?;
    let envelope: ComposeEnvelope = decode(NAME, data)?;
    zip_messages(NAME, &plan.routes, &envelope.data.messages, |leg, message| {
        Ok(UnsignedMessage::from_sender(
            sender,
            message.address.clone(),
            message.payload.clone(),
            message.amount,
            leg.in_amount,
        ))
    })
}

#[async_trait]
impl Provider for XdeltaProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn is_dex(&self) -> bool {
        false
    }

    async fn build_route(
        &self,
        _sender: &EmulationSender,
        request: &RouteRequest,
    ) -> Result<Route, ProviderError> {
        self.limiter.acquire().await;

        let url = format!("{}/api/v1/route", self.api_url);
        let data: Value = send_json(self.ctx.client.post(&url).json(&route_request_body(request))).await?;
        parse_route(request, data)
    }

    async fn emulate_route(
        &self,
        sender: &EmulationSender,
        route: &Route,
    ) -> Result<Emulation, ProviderError> {
        let ProviderExtra::Xdelta(extra) = &route.extra else {
            return Err(ProviderError::ForeignExtra(NAME));
        };

        if !self.compose_delay.is_zero() {
            debug!(provider = NAME, delay_ms = self.compose_delay.as_millis() as u64, "Waiting before compose");
            sleep(self.compose_delay).await;
        }

        let body = json!({
            "multiroute": extra.multiroute,
            "user_address": sender.wallet_address,
            "slippage": 5,
            "timeout": 300
        });
        let url = format!("{}/api/v1/compose", self.api_url);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_support::{request, sender};

    #[test]
    fn test_route_request_body() {
        let body = route_request_body(&request());
        assert_eq!(body["input_token"], "TON");
        assert_eq!(body["output_token"], "EQusdt");
        assert_eq!(body["input_amount"], "1000");
        assert_eq!(body["intermediate_tokens"], "optimal");
    }

    #[test]
    fn test_parse_and_compose() {
        let data = json!({
            "data": {
                "output_amount": 12.5,
                "multiroute": {"routes": [{"in_amount": "1000000000000", "hops": 2}]}
            }
        });
        let route = parse_route(&request(), data).unwrap();
        assert_eq!(route.output_amount, 12_500_000);

        let ProviderExtra::Xdelta(extra) = &route.extra else {
            panic!("wrong extra");
        };
        let composed = json!({
            "data": {"messages": [{"address": "0:x", "amount": 1000300000000u64, "payload": "b64"}]}
        });
        let messages = compose_messages(&sender(), extra, composed).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].swap_input_amount, 1_000_000_000_000);
        assert_eq!(messages[0].value, 1_000_300_000_000);
    }
}
