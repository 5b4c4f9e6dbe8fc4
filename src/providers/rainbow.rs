//! rainbow.ag meta-aggregator.

use super::{decode, Provider, ProviderContext, ProviderError, ProviderExtra, RateLimiter};
use crate::domain::amount::to_base_units;
use crate::domain::{Emulation, EmulationSender, Route, RouteRequest};
use crate::emulator::{emulate_messages, UnsignedMessage};
use crate::http::send_json;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

const NAME: &str = "rainbow.ag";
pub const DEFAULT_API_URL: &str = "https://api.rainbow.ag";

/// Empty cell, sent as the body of trailing non-swap messages.
const EMPTY_CELL: &str = "te6cckEBAQEAAgAAAEysuc0=";

#[derive(Debug, Clone)]
pub struct RainbowExtra {
    /// Input share of each split, in percent.
    pub split_percents: Vec<f64>,
    pub messages: Vec<RainbowMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RainbowMessage {
    pub address: String,
    #[serde(deserialize_with = "crate::domain::amount::de_units")]
    pub amount: u128,
    #[serde(default)]
    pub payload: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BestRoute {
    display_data: DisplayData,
    swap_messages: Vec<RainbowMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DisplayData {
    output_asset_amount: f64,
    routes: Vec<DisplayRoute>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DisplayRoute {
    input_percent: f64,
}

#[derive(Debug)]
pub struct RainbowProvider {
    ctx: ProviderContext,
    api_url: String,
    limiter: RateLimiter,
}

impl RainbowProvider {
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
        ("inputAssetAmount", request.input_amount.to_string()),
        ("inputAssetAddress", request.input_token.address_or("ton").to_string()),
        ("outputAssetAddress", request.output_token.address_or("ton").to_string()),
        ("senderAddress", sender.wallet_address.clone()),
        ("maxDepth", request.max_length.to_string()),
        ("maxSplits", request.max_splits.to_string()),
        ("maxSlippage", ((sender.slippage * 100.0).round() as u32).to_string()),
    ]
}

fn parse_route(request: &RouteRequest, data: Value) -> Result<Route, ProviderError> {
    let data: BestRoute = decode(NAME, data)?;
    let output_amount = to_base_units(
        data.display_data.output_asset_amount,
        request.output_token.decimals,
    )
    .ok_or_else(|| ProviderError::payload(NAME, "bad outputAssetAmount"))?;

    Ok(Route::for_request(
        request,
        NAME,
        output_amount,
        ProviderExtra::Rainbow(RainbowExtra {
            split_percents: data.display_data.routes.iter().map(|r| r.input_percent).collect(),
            messages: data.swap_messages,
        }),
    ))
}

/// Messages past the last split carry no swap input and an empty body.
fn compose_messages(sender: &EmulationSender, route: &Route, extra: &RainbowExtra) -> Vec<UnsignedMessage> {
    extra
        .messages
        .iter()
        .enumerate()
        .map(|(idx, message)| {
            let (swap_input, body) = match extra.split_percents.get(idx) {
                Some(percent) => (
                    (route.input_amount as f64 * percent / 100.0) as u128,
                    message.payload.clone().unwrap_or_else(|| EMPTY_CELL.to_string()),
                ),
                None => (0, EMPTY_CELL.to_string()),
            };
            UnsignedMessage::from_sender(sender, message.address.clone(), body, message.amount, swap_input)
        })
        .collect()
}

#[async_trait]
impl Provider for RainbowProvider {
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

        let url = format!("{}/api/best-route", self.api_url);
        let data: Value = send_json(
            self.ctx
                .client
                .get(&url)
                .query(&query_params(sender, request))
                .header("Accept", "application/json, text/plain, */*")
                .header("Origin", "https://rainbow.ag")
                .header("Referer", "https://rainbow.ag/"),
        )
        .await?;
        parse_route(request, data)
    }

    async fn emulate_route(
        &self,
        sender: &EmulationSender,
        route: &Route,
    ) -> Result<Emulation, ProviderError> {
        let ProviderExtra::Rainbow(extra) = &route.extra else {
            return Err(ProviderError::ForeignExtra(NAME));
        };

        let messages = compose_messages(sender, route, extra);
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
    use serde_json::json;

    fn best_route() -> Value {
        json!({
            "displayData": {
                "outputAssetAmount": 3450.5,
                "routes": [{"inputPercent": 70.0}, {"inputPercent": 30.0}]
            },
            "swapMessages": [
                {"address": "0:r1", "amount": "700300000000", "payload": "te6p1"},
                {"address": "0:r2", "amount": "300300000000", "payload": "te6p2"},
                {"address": "0:fee", "amount": "10000000"}
            ]
        })
    }

    #[test]
    fn test_parse_route() {
        let route = parse_route(&request(), best_route()).unwrap();
        assert_eq!(route.output_amount, 3_450_500_000);
        assert_eq!(route.output_token.symbol, "USDT");
        match &route.extra {
            ProviderExtra::Rainbow(extra) => {
                assert_eq!(extra.split_percents, vec![70.0, 30.0]);
                assert_eq!(extra.messages.len(), 3);
            }
            other => panic!("unexpected extra {:?}", other),
        }
    }

    #[test]
    fn test_compose_splits_input_and_pads_extra_messages() {
        let route = parse_route(&request(), best_route()).unwrap();
        let ProviderExtra::Rainbow(extra) = &route.extra else {
            panic!("wrong extra");
        };

        let messages = compose_messages(&sender(), &route, extra);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].swap_input_amount, 700_000_000_000);
        assert_eq!(messages[0].body, "te6p1");
        assert_eq!(messages[1].swap_input_amount, 300_000_000_000);
        assert_eq!(messages[2].swap_input_amount, 0);
        assert_eq!(messages[2].body, EMPTY_CELL);
        assert_eq!(messages[2].value, 10_000_000);
    }

    #[test]
    fn test_query_params_use_ton_alias_and_percent_slippage() {
        let params = query_params(&sender(), &request());
        assert!(params.contains(&("inputAssetAddress", "ton".to_string())));
        assert!(params.contains(&("outputAssetAddress", "EQusdt".to_string())));
        assert!(params.contains(&("maxSlippage", "5".to_string())));
    }
}
