//! STON.fi RPC swap simulation. Quotes only; emulation is delegated.

use super::{decode, Provider, ProviderContext, ProviderError, ProviderExtra, RateLimiter};
use super::swap_coffee::{DexPool, SwapCoffeeProvider, SwapRoute};
use crate::domain::amount::de_units;
use crate::domain::{Emulation, EmulationSender, Route, RouteRequest};
use crate::http::send_json;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const NAME: &str = "stonfi";
pub const DEFAULT_API_URL: &str = "https://rpc.ston.fi/";
const GAS_PER_ROUTE: f64 = 0.15;

pub const TON_ADDRESS: &str = "EQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAM9c";

/// Pools behind this router are v1 pools; every other router is v2.
pub const LEGACY_ROUTER: &str = "EQB3ncyBUTjZUA5EnFKR5_EnOMI9V1tTEAAPaiU71gc4TiUt";

#[derive(Debug, Clone)]
pub struct StonfiExtra {
    pub routes: Vec<SwapRoute>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Simulation>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Simulation {
    #[serde(deserialize_with = "de_units")]
    ask_units: u128,
    router_address: String,
    pool_address: String,
}

#[derive(Debug)]
pub struct StonfiProvider {
    ctx: ProviderContext,
    api_url: String,
    limiter: RateLimiter,
    builder: Option<Arc<SwapCoffeeProvider>>,
}

impl StonfiProvider {
    pub fn new(ctx: ProviderContext, builder: Option<Arc<SwapCoffeeProvider>>) -> Self {
        Self {
            limiter: ctx.rate_limiter(NAME),
            ctx,
            api_url: DEFAULT_API_URL.to_string(),
            builder,
        }
    }
}

fn simulate_body(request: &RouteRequest) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "dex.simulate_swap",
        "params": {
            "offer_address": request.input_token.address_or(TON_ADDRESS),
            "offer_units": request.input_amount.to_string(),
            "ask_address": request.output_token.address_or(TON_ADDRESS),
            "slippage_tolerance": "0.05"
        }
    })
}

fn dex_name(router_address: &str) -> &'static str {
    if router_address == LEGACY_ROUTER {
        "stonfi"
    } else {
        "stonfi_v2"
    }
}

fn parse_route(request: &RouteRequest, data: Value) -> Result<Route, ProviderError> {
    let response: RpcResponse = decode(NAME, data)?;
    let simulation = match (response.result, response.error) {
        (Some(simulation), _) => simulation,
        (None, Some(error)) => return Err(ProviderError::payload(NAME, error)),
        (None, None) => return Err(ProviderError::payload(NAME, "empty rpc result")),
    };

    let pool = DexPool {
        input_token: request.input_token.address.clone(),
        output_token: request.output_token.address.clone(),
        amount_in: request.input_amount,
        amount_out: simulation.ask_units,
        dex_name: dex_name(&simulation.router_address).to_string(),
        pool_address: simulation.pool_address,
    };

    Ok(Route::for_request(
        request,
        NAME,
        simulation.ask_units,
        ProviderExtra::Stonfi(StonfiExtra {
            routes: vec![SwapRoute {
                gas_amount: GAS_PER_ROUTE,
                pools: vec![pool],
            }],
        }),
    ))
}

#[async_trait]
impl Provider for StonfiProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn is_dex(&self) -> bool {
        true
    }

    async fn build_route(
        &self,
        _sender: &EmulationSender,
        request: &RouteRequest,
    ) -> Result<Route, ProviderError> {
        self.limiter.acquire().await;

        let data: Value = send_json(self.ctx.client.post(&self.api_url).json(&simulate_body(request))).await?;
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
        let ProviderExtra::Stonfi(extra) = &route.extra else {
            return Err(ProviderError::ForeignExtra(NAME));
        };
        builder.emulate_pools(sender, route, &extra.routes).await
    }
}
