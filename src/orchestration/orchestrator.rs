use super::pacer::GroupPacer;
use crate::domain::{
    compute_ratio, BenchmarkFailure, BenchmarkReport, BenchmarkResult, BenchmarkSuccess,
    EmulationSender, RouteRequest, Token,
};
use crate::indexer::{ChainIndexer, IndexerError};
use crate::providers::{Provider, ProviderError};
use futures::future::join_all;
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{error, info};

/// One provider entry in the run list. A provider may appear twice, e.g.
/// once with default limits and once with a widened `max_splits`.
#[derive(Debug, Clone)]
pub struct ProviderRun {
    pub provider: Arc<dyn Provider>,
    pub max_splits: Option<u32>,
}

impl ProviderRun {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            max_splits: None,
        }
    }

    pub fn widened(provider: Arc<dyn Provider>, max_splits: u32) -> Self {
        Self {
            provider,
            max_splits: Some(max_splits),
        }
    }
}

/// What to benchmark: every input size against every output token.
#[derive(Debug, Clone)]
pub struct BenchmarkPlan {
    /// Input sizes in whole units of `input_token`.
    pub input_amounts: Vec<u64>,
    pub input_token: Token,
    pub tokens: Vec<Token>,
    pub max_splits: u32,
    pub max_length: u32,
    pub wallet_address: String,
    pub slippage: f64,
}

impl BenchmarkPlan {
    fn base_units(&self, amount: u64) -> Result<u128, OrchestrationError> {
        10u128
            .checked_pow(self.input_token.decimals as u32)
            .and_then(|scale| u128::from(amount).checked_mul(scale))
            .ok_or(OrchestrationError::AmountOverflow(amount))
    }
}

#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error(transparent)]
    Indexer(#[from] IndexerError),
    #[error("input amount {0} overflows base units")]
    AmountOverflow(u64),
}

pub struct BenchmarkOrchestrator {
    runs: Vec<ProviderRun>,
    indexer: Arc<dyn ChainIndexer>,
    pacer: GroupPacer,
}

impl BenchmarkOrchestrator {
    pub fn new(runs: Vec<ProviderRun>, indexer: Arc<dyn ChainIndexer>, pacer: GroupPacer) -> Self {
        Self {
            runs,
            indexer,
            pacer,
        }
    }

    pub fn runs(&self) -> &[ProviderRun] {
        &self.runs
    }

    /// Run every (size, token) group in order and collect one result per trial.
    ///
    /// Only resolving the sender wallet can fail the whole run; anything that
    /// goes wrong inside a group is recorded as failure results.
    pub async fn run(&self, plan: &BenchmarkPlan) -> Result<BenchmarkReport, OrchestrationError> {
        let wallet_raw = self.indexer.raw_address(&plan.wallet_address).await?;
        let mut report = BenchmarkReport::default();

        for &size in &plan.input_amounts {
            let input_amount = plan.base_units(size)?;
            let mut results = Vec::with_capacity(plan.tokens.len() * self.runs.len());

            for token in &plan.tokens {
                let requests: Vec<RouteRequest> = self
                    .runs
                    .iter()
                    .map(|run| RouteRequest {
                        input_token: plan.input_token.clone(),
                        output_token: token.clone(),
                        input_amount,
                        max_splits: run.max_splits.unwrap_or(plan.max_splits),
                        max_length: plan.max_length,
                    })
                    .collect();

                info!(size, token = %token.symbol, trials = requests.len(), "Benchmarking group");

                match self.group_sender(plan, &wallet_raw, token).await {
                    Ok(sender) => results.extend(self.run_group(&sender, requests).await),
                    Err(e) => {
                        error!(size, token = %token.symbol, error = %e, "Group setup failed");
                        let message = format!("group setup failed: {}", e);
                        results.extend(self.runs.iter().zip(requests).map(|(run, request)| {
                            BenchmarkResult::Failure(BenchmarkFailure {
                                provider: run.provider.provider_ref(),
                                request,
                                message: message.clone(),
                            })
                        }));
                    }
                }

                self.pacer.pause().await;
            }

            report.push(size, results);
        }

        Ok(report)
    }

    /// Pin the block and sender wallets shared by every trial of a group.
    async fn group_sender(
        &self,
        plan: &BenchmarkPlan,
        wallet_raw: &str,
        token: &Token,
    ) -> Result<EmulationSender, IndexerError> {
        let block_seqno = self.indexer.latest_block_seqno().await?;
        let jetton_wallet_address = if token.is_native() {
            wallet_raw.to_string()
        } else {
            self.indexer
                .jetton_wallet_address(&plan.wallet_address, &token.address)
                .await?
        };

        Ok(EmulationSender {
            wallet_address: plan.wallet_address.clone(),
            wallet_address_raw: wallet_raw.to_string(),
            jetton_wallet_address,
            slippage: plan.slippage,
            block_seqno,
        })
    }

    /// Fan out every trial of a group and wait for all of them.
    /// Results come back in run-list order.
    async fn run_group(
        &self,
        sender: &EmulationSender,
        requests: Vec<RouteRequest>,
    ) -> Vec<BenchmarkResult> {
        let trials = self
            .runs
            .iter()
            .zip(requests)
            .map(|(run, request)| run_trial(run.provider.as_ref(), sender, request));
        join_all(trials).await
    }
}

/// Trial boundary: every provider error ends here as a failure result.
async fn run_trial(
    provider: &dyn Provider,
    sender: &EmulationSender,
    request: RouteRequest,
) -> BenchmarkResult {
    match try_trial(provider, sender, &request).await {
        Ok(success) => BenchmarkResult::Success(Box::new(success)),
        Err(e) => {
            error!(provider = %provider.name(), request = %request.label(), error = %e, "Error building route");
            BenchmarkResult::Failure(BenchmarkFailure {
                provider: provider.provider_ref(),
                request,
                message: e.to_string(),
            })
        }
    }
}

async fn try_trial(
    provider: &dyn Provider,
    sender: &EmulationSender,
    request: &RouteRequest,
) -> Result<BenchmarkSuccess, ProviderError> {
    let start = Instant::now();
    let route = provider.build_route(sender, request).await?;
    let elapsed = start.elapsed().as_secs_f64();
    info!(provider = %provider.name(), request = %request.label(), elapsed, "Route built");

    let start = Instant::now();
    let emulation = provider.emulate_route(sender, &route).await?;
    let emulation_elapsed = start.elapsed().as_secs_f64();
    info!(
        provider = %provider.name(),
        elapsed = emulation_elapsed,
        gas_used = %emulation.gas_used(),
        executed = emulation.is_executed(),
        "Route emulated"
    );

    let ratio = compute_ratio(&route, &emulation);
    Ok(BenchmarkSuccess {
        route,
        elapsed,
        emulation_elapsed,
        ratio,
        provider: provider.provider_ref(),
        emulation,
    })
}
