//! DeDust v2 routing plan. Quotes only; emulation is delegated.

use super::{decode, Provider, ProviderContext, ProviderError, ProviderExtra, RateLimiter};
use super::swap_coffee::{DexPool, SwapCoffeeProvider, SwapRoute};
use crate::domain::amount::de_units;
use crate::domain::{Emulation, EmulationSender, Route, RouteRequest, Token};
use crate::http::send_json;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const NAME: &str = "dedust";
pub const DEFAULT_API_URL: &str = "https://api.dedust.io";
const GAS_PER_ROUTE: f64 = 0.15;

#[derive(Debug, Clone)]
pub struct DedustExtra {
    pub routes: Vec<SwapRoute>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanStep {
    pool: PoolRef,
    asset_in: String,
    asset_out: String,
    #[serde(deserialize_with = "de_units")]
    amount_in: u128,
    #[serde(deserialize_with = "de_units")]
    amount_out: u128,
}

#[derive(Debug, Deserialize)]
struct PoolRef {
    address: String,
}

#[derive(Debug)]
pub struct DedustProvider {
    ctx: ProviderContext,
    api_url: String,
    limiter: RateLimiter,
    builder: Option<Arc<SwapCoffeeProvider>>,
}

impl DedustProvider {
    pub fn new(ctx: ProviderContext, builder: Option<Arc<SwapCoffeeProvider>>) -> Self {
        Self {
            limiter: ctx.rate_limiter(NAME),
            ctx,
            api_url: DEFAULT_API_URL.to_string(),
            builder,
        }
    }
}

fn asset(token: &Token) -> String {
    if token.is_native() {
        "native".to_string()
    } else {
        format!("jetton:{}", token.address)
    }
}

fn asset_address(asset: &str) -> String {
    asset.strip_prefix("jetton:").unwrap_or(asset).to_string()
}

/// The first plan is the best one; its last hop yields the output.
fn parse_route(request: &RouteRequest, data: Value) -> Result<Route, ProviderError> {
    let plans: Vec<Vec<PlanStep>> = decode(NAME, data)?;
    let best = plans
        .into_iter()
        .next()
        .filter(|steps| !steps.is_empty())
        .ok_or_else(|| ProviderError::payload(NAME, "empty routing plan"))?;
    let output_amount = best.last().map(|s| s.amount_out).unwrap_or_default();

    let pools = best
        .into_iter()
        .map(|step| DexPool {
            input_token: asset_address(&step.asset_in),
            output_token: asset_address(&step.asset_out),
            amount_in: step.amount_in,
            amount_out: step.amount_out,
            dex_name: NAME.to_string(),
            pool_address: step.pool.address,
        })
        .collect();

    Ok(Route::for_request(
        request,
        NAME,
        output_amount,
        ProviderExtra::Dedust(DedustExtra {
            routes: vec![SwapRoute {
                gas_amount: GAS_PER_ROUTE,
                pools,
            }],
        }),
    ))
}

#[async_trait]
impl Provider for DedustProvider {
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

        let body = json!({
            "from": asset(&request.input_token),
            "to": asset(&request.output_token),
            "amount": request.input_amount.to_string()
        });
        let url = format!("{}/v2/routing/plan", self.api_url);
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
        let ProviderExtra::Dedust(extra) = &route.extra else {
            return Err(ProviderError::ForeignExtra(NAME));
        };
        builder.emulate_pools(sender, route, &extra.routes).await
    }
}
