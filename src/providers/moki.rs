//! Moki smart order router. Quotes only; emulation is delegated.

use super::{decode, Provider, ProviderContext, ProviderError, ProviderExtra, RateLimiter};
use super::swap_coffee::{DexPool, SwapCoffeeProvider, SwapRoute};
use crate::domain::amount::{de_units, normalize};
use crate::domain::{Emulation, EmulationSender, Route, RouteRequest, NATIVE_DECIMALS};
use crate::http::send_json;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const NAME: &str = "moki.ag";
pub const DEFAULT_API_URL: &str = "https://api.leapwallet.io/ton-sor-service";

#[derive(Debug, Clone)]
pub struct MokiExtra {
    pub routes: Vec<SwapRoute>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BestRoute {
    best_route: Vec<MokiRoute>,
}

#[derive(Debug, Deserialize)]
struct MokiRoute {
    route: Vec<MokiHop>,
    #[serde(deserialize_with = "de_units")]
    fee: u128,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MokiHop {
    input_asset_address: String,
    output_asset_address: String,
    #[serde(deserialize_with = "de_units")]
    input_asset_amount: u128,
    #[serde(deserialize_with = "de_units")]
    output_asset_amount: u128,
    dex_type: String,
    dex_pair_address: String,
}

#[derive(Debug)]
pub struct MokiProvider {
    ctx: ProviderContext,
    api_url: String,
    limiter: RateLimiter,
    builder: Option<Arc<SwapCoffeeProvider>>,
}

impl MokiProvider {
    pub fn new(ctx: ProviderContext, builder: Option<Arc<SwapCoffeeProvider>>) -> Self {
        Self {
            limiter: ctx.rate_limiter(NAME),
            ctx,
            api_url: DEFAULT_API_URL.to_string(),
            builder,
        }
    }
}

fn dex_name(dex_type: &str) -> Result<&'static str, ProviderError> {
    match dex_type {
        "DeDust" => Ok("dedust"),
        "Ston" => Ok("stonfi"),
        "Ston_V2" => Ok("stonfi_v2"),
        other => Err(ProviderError::payload(NAME, format!("unknown dexType {}", other))),
    }
}

fn parse_route(request: &RouteRequest, data: Value) -> Result<Route, ProviderError> {
    let data: BestRoute = decode(NAME, data)?;
    let output_amount = data
        .best_route
        .first()
        .and_then(|r| r.route.last())
        .map(|hop| hop.output_asset_amount)
        .ok_or_else(|| ProviderError::payload(NAME, "empty bestRoute"))?;

    let mut routes = Vec::with_capacity(data.best_route.len());
    for split in data.best_route {
        let pools = split
            .route
            .into_iter()
            .map(|hop| {
                Ok(DexPool {
                    input_token: hop.input_asset_address,
                    output_token: hop.output_asset_address,
                    amount_in: hop.input_asset_amount,
                    amount_out: hop.output_asset_amount,
                    dex_name: dex_name(&hop.dex_type)?.to_string(),
                    pool_address: hop.dex_pair_address,
                })
            })
            .collect::<Result<Vec<_>, ProviderError>>()?;
        routes.push(SwapRoute {
            gas_amount: normalize(split.fee, NATIVE_DECIMALS),
            pools,
        });
    }

    Ok(Route::for_request(
        request,
        NAME,
        output_amount,
        ProviderExtra::Moki(MokiExtra { routes }),
    ))
}

#[async_trait]
impl Provider for MokiProvider {
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

        let body = json!({
            "inputAssetAmount": request.input_amount.to_string(),
            "inputAssetAddress": request.input_token.address,
            "outputAssetAddress": request.output_token.address
        });
        let url = format!("{}/api/v2/best-route", self.api_url);
        let data: Value = send_json(self.ctx.client.post(&url).json(&body)).await?;
        parse_route(request, data)
    }

    async fn emulate_route(
        &self,
        sender: &EmulationSender,
        route: &Route,
    ) -> Result<Emulation, ProviderError> {
        let Some(builder) = &self.builder else {
            return Ok(Emulation::Unsupported);
        };
        let ProviderExtra::Moki(extra) = &route.extra else {
            return Err(ProviderError::ForeignExtra(NAME));
        };
        builder.emulate_pools(sender, route, &extra.routes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_support::request;

    #[test]
    fn test_parse_route_maps_dex_types_and_fees() {
        let data = json!({
            "bestRoute": [
                {
                    "route": [
                        {
                            "inputAssetAddress": "native",
                            "outputAssetAddress": "EQmid",
                            "inputAssetAmount": "600000000000",
                            "outputAssetAmount": "9000000000",
                            "dexType": "Ston_V2",
                            "dexPairAddress": "EQa"
                        },
                        {
                            "inputAssetAddress": "EQmid",
                            "outputAssetAddress": "EQusdt",
                            "inputAssetAmount": "9000000000",
                            "outputAssetAmount": "2100000000",
                            "dexType": "DeDust",
                            "dexPairAddress": "EQb"
                        }
                    ],
                    "fee": "250000000"
                },
                {
                    "route": [
                        {
                            "inputAssetAddress": "native",
                            "outputAssetAddress": "EQusdt",
                            "inputAssetAmount": "400000000000",
                            "outputAssetAmount": "1390000000",
                            "dexType": "Ston",
                            "dexPairAddress": "EQc"
                        }
                    ],
                    "fee": 150000000
                }
            ]
        });
        let route = parse_route(&request(), data).unwrap();
        assert_eq!(route.output_amount, 2_100_000_000);

        let ProviderExtra::Moki(extra) = &route.extra else {
            panic!("wrong extra");
        };
        assert_eq!(extra.routes.len(), 2);
        assert_eq!(extra.routes[0].gas_amount, 0.25);
        assert_eq!(extra.routes[0].pools[0].dex_name, "stonfi_v2");
        assert_eq!(extra.routes[0].pools[1].dex_name, "dedust");
        assert_eq!(extra.routes[1].pools[0].dex_name, "stonfi");
    }

    #[test]
    fn test_unknown_dex_type_is_payload_error() {
        let data = json!({
            "bestRoute": [{
                "route": [{
                    "inputAssetAddress": "native",
                    "outputAssetAddress": "EQusdt",
                    "inputAssetAmount": "1",
                    "outputAssetAmount": "1",
                    "dexType": "Megaton",
                    "dexPairAddress": "EQd"
                }],
                "fee": "0"
            }]
        });
        let err = parse_route(&request(), data).unwrap_err();
        assert!(matches!(err, ProviderError::Payload { .. }));
    }
}
