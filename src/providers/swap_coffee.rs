//! swap.coffee aggregator: routing, transaction composition, and the builder
//! other providers delegate emulation to.

use super::{decode, zip_messages, Provider, ProviderContext, ProviderError, ProviderExtra, RateLimiter};
use crate::domain::amount::{normalize, to_base_units};
use crate::domain::{Emulation, EmulationSender, Route, RouteRequest, Token, NATIVE_DECIMALS};
use crate::emulator::{emulate_messages, UnsignedMessage};
use crate::http::send_json;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

const NAME: &str = "swap.coffee";
pub const DEFAULT_API_URL: &str = "https://backend.swap.coffee";
pub const DEFAULT_TOKENS_URL: &str = "https://tokens.swap.coffee";

/// Routing paths exactly as the routing API returned them; the composition
/// endpoint takes them back verbatim.
#[derive(Debug, Clone)]
pub struct SwapCoffeeExtra {
    pub paths: Vec<Value>,
}

/// One pool hop in a provider-neutral form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DexPool {
    pub input_token: String,
    pub output_token: String,
    pub amount_in: u128,
    pub amount_out: u128,
    pub dex_name: String,
    pub pool_address: String,
}

/// A chain of pools executed by one message, with its gas budget in TON.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapRoute {
    pub gas_amount: f64,
    pub pools: Vec<DexPool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenMetadata {
    fn native() -> Self {
        Self {
            name: "TON".to_string(),
            symbol: "TON".to_string(),
            decimals: NATIVE_DECIMALS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    output_token: ResponseToken,
    output_amount: f64,
    paths: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ResponseToken {
    address: ResponseAddress,
    metadata: ResponseMetadata,
}

#[derive(Debug, Deserialize)]
struct ResponseAddress {
    address: String,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    symbol: String,
    decimals: u8,
}

/// The fields of a path document needed to size its swap input.
#[derive(Debug, Deserialize)]
struct PathView {
    swap: PathSwap,
    input_token: PathToken,
}

#[derive(Debug, Deserialize)]
struct PathSwap {
    input_amount: f64,
}

#[derive(Debug, Deserialize)]
struct PathToken {
    metadata: PathMetadata,
}

#[derive(Debug, Deserialize)]
struct PathMetadata {
    decimals: u8,
}

#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    transactions: Vec<CoffeeTransaction>,
}

#[derive(Debug, Deserialize)]
struct CoffeeTransaction {
    address: String,
    cell: String,
    #[serde(deserialize_with = "crate::domain::amount::de_units")]
    value: u128,
}

#[derive(Debug)]
pub struct SwapCoffeeProvider {
    ctx: ProviderContext,
    api_url: String,
    tokens_url: String,
    limiter: RateLimiter,
}

impl SwapCoffeeProvider {
    pub fn new(ctx: ProviderContext) -> Self {
        Self {
            limiter: ctx.rate_limiter(NAME),
            ctx,
            api_url: DEFAULT_API_URL.to_string(),
            tokens_url: DEFAULT_TOKENS_URL.to_string(),
        }
    }

    pub fn with_urls(mut self, api_url: impl Into<String>, tokens_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self.tokens_url = tokens_url.into();
        self
    }

    pub async fn token_metadata(&self, address: &str) -> Result<TokenMetadata, ProviderError> {
        if address == crate::domain::NATIVE_ADDRESS {
            return Ok(TokenMetadata::native());
        }
        let url = format!("{}/api/v2/tokens/address/{}", self.tokens_url, address);
        Ok(send_json(self.ctx.client.get(&url)).await?)
    }

    /// Turn pool chains into the nested path documents the composition
    /// endpoint expects.
    pub async fn build_paths(&self, routes: &[SwapRoute]) -> Result<Vec<Value>, ProviderError> {
        let mut paths = Vec::with_capacity(routes.len());
        for route in routes {
            let mut hops = Vec::with_capacity(route.pools.len());
            for pool in &route.pools {
                let input = self.token_metadata(&pool.input_token).await?;
                let output = self.token_metadata(&pool.output_token).await?;
                hops.push((pool, input, output));
            }
            if let Some(path) = nest_path(route.gas_amount, &hops) {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    /// Emulate a foreign provider's route by re-expressing it as swap.coffee
    /// paths and running it through this provider's composition.
    pub async fn emulate_pools(
        &self,
        sender: &EmulationSender,
        route: &Route,
        routes: &[SwapRoute],
    ) -> Result<Emulation, ProviderError> {
        let paths = self.build_paths(routes).await?;
        let synthetic = Route {
            extra: ProviderExtra::SwapCoffee(SwapCoffeeExtra { paths }),
            ..route.clone()
        };
        self.emulate_route(sender, &synthetic).await
    }
}

fn nest_path(gas_amount: f64, hops: &[(&DexPool, TokenMetadata, TokenMetadata)]) -> Option<Value> {
    let mut next: Option<Value> = None;

    for (idx, (pool, input, output)) in hops.iter().enumerate().rev() {
        let mut path = json!({
            "blockchain": "ton",
            "dex": pool.dex_name,
            "pool_address": pool.pool_address,
            "input_token": {
                "address": {"blockchain": "ton", "address": pool.input_token},
                "metadata": {"name": input.name, "symbol": input.symbol, "decimals": input.decimals, "listed": true}
            },
            "output_token": {
                "address": {"blockchain": "ton", "address": pool.output_token},
                "metadata": {"name": output.name, "symbol": output.symbol, "decimals": output.decimals, "listed": true}
            },
            "swap": {
                "result": "fully_fulfilled",
                "input_amount": normalize(pool.amount_in, input.decimals),
                "output_amount": normalize(pool.amount_out, output.decimals),
                "before_reserves": [1, 1],
                "after_reserves": [1, 1],
                "left_amount": 1
            },
            "recommended_gas": if idx == 0 { gas_amount } else { 0.0 },
            "average_gas": 0
        });
        if let Some(child) = next.take() {
            path["next"] = json!([child]);
        }
        next = Some(path);
    }

    next
}

fn route_request_body(request: &RouteRequest) -> Value {
    json!({
        "input_token": {"blockchain": "ton", "address": request.input_token.address},
        "output_token": {"blockchain": "ton", "address": request.output_token.address},
        "input_amount": normalize(request.input_amount, request.input_token.decimals),
        "max_splits": request.max_splits,
        "max_length": request.max_length
    })
}

fn parse_route(request: &RouteRequest, data: Value) -> Result<Route, ProviderError> {
    let data: RouteResponse = decode(NAME, data)?;
    let decimals = data.output_token.metadata.decimals;
    let output_amount = to_base_units(data.output_amount, decimals)
        .ok_or_else(|| ProviderError::payload(NAME, format!("bad output_amount {}", data.output_amount)))?;

    let mut route = Route::for_request(
        request,
        NAME,
        output_amount,
        ProviderExtra::SwapCoffee(SwapCoffeeExtra { paths: data.paths }),
    );
    route.output_token = Token::new(
        data.output_token.address.address,
        data.output_token.metadata.symbol,
        decimals,
    );
    Ok(route)
}

fn compose_messages(
    sender: &EmulationSender,
    paths: &[Value],
    data: Value,
) -> Result<Vec<UnsignedMessage>, ProviderError> {
    let data: TransactionsResponse = decode(NAME, data)?;
    let views = paths
        .iter()
        .map(|p| decode::<PathView>(NAME, p.clone()))
        .collect::<Result<Vec<_>, _>>()?;

    zip_messages(NAME, &views, &data.transactions, |path, tx| {
        let swap_input = to_base_units(path.swap.input_amount, path.input_token.metadata.decimals)
            .ok_or_else(|| ProviderError::payload(NAME, "bad path input_amount"))?;
        Ok(UnsignedMessage::from_sender(
            sender,
            tx.address.clone(),
            tx.cell.clone(),
            tx.value,
            swap_input,
        ))
    })
}

#[async_trait]
impl Provider for SwapCoffeeProvider {
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

        let url = format!("{}/v1/route", self.api_url);
        let data: Value = send_json(self.ctx.client.post(&url).json(&route_request_body(request))).await?;
        parse_route(request, data)
    }

    async fn emulate_route(
        &self,
        sender: &EmulationSender,
        route: &Route,
    ) -> Result<Emulation, ProviderError> {
        let ProviderExtra::SwapCoffee(extra) = &route.extra else {
            return Err(ProviderError::ForeignExtra(NAME));
        };

        let body = json!({
            "slippage": sender.slippage,
            "sender_address": sender.wallet_address,
            "paths": extra.paths
        });
        let url = format!("{}/v2/route/transactions", self.api_url);
        let data: Value = send_json(self.ctx.client.post(&url).json(&body)).await?;

        let messages = compose_messages(sender, &extra.paths, data)?;
        debug!(provider = NAME, messages = messages.len(), "Composed transactions");

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
