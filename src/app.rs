//! Wiring of providers, emulator, indexer and exporters from [`Config`].

use crate::config::{load_tokens, Config};
use crate::domain::Token;
use crate::emulator::{Emulator, SwapOutputAggregator, TvmEmulatorClient};
use crate::error::AppError;
use crate::export::{BenchmarkExporter, CsvExporter, SummaryExporter};
use crate::http::build_client;
use crate::indexer::{ChainIndexer, TonApiIndexer};
use crate::orchestration::{BenchmarkOrchestrator, BenchmarkPlan, GroupPacer, ProviderRun};
use crate::providers::{
    DedustProvider, DedustV2Provider, MokiProvider, Provider, ProviderContext, RainbowProvider,
    StonfiProvider, SwapCoffeeProvider, TitanProvider, XdeltaProvider,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Configured run list in provider order. A provider listed in
/// `wide_split_providers` gets its widened run right after its default run.
/// Delegating providers only appear when listed in `delegated_providers`.
pub fn provider_runs(config: &Config, ctx: &ProviderContext) -> Vec<ProviderRun> {
    let swap_coffee = Arc::new(SwapCoffeeProvider::new(ctx.clone()));
    let builder = config.delegate_emulation.then(|| swap_coffee.clone());

    let mut providers: Vec<Arc<dyn Provider>> = vec![
        swap_coffee.clone(),
        Arc::new(RainbowProvider::new(ctx.clone())),
        Arc::new(TitanProvider::new(ctx.clone())),
        Arc::new(XdeltaProvider::new(ctx.clone())),
    ];

    let delegating: Vec<Arc<dyn Provider>> = vec![
        Arc::new(DedustProvider::new(ctx.clone(), builder.clone())),
        Arc::new(StonfiProvider::new(ctx.clone(), builder.clone())),
        Arc::new(MokiProvider::new(ctx.clone(), builder)),
    ];
    providers.extend(
        delegating
            .into_iter()
            .filter(|p| config.is_delegated_enabled(p.name())),
    );
    providers.push(Arc::new(DedustV2Provider::new(ctx.clone())));

    providers.retain(|p| !config.is_excluded(p.name()));

    let mut runs = Vec::with_capacity(providers.len());
    for provider in providers {
        let widen = config.wide_split_providers.iter().any(|w| w == provider.name());
        runs.push(ProviderRun::new(provider.clone()));
        if widen {
            runs.push(ProviderRun::widened(provider, config.wide_max_splits));
        }
    }
    runs
}

pub fn plan(config: &Config, tokens: Vec<Token>) -> BenchmarkPlan {
    BenchmarkPlan {
        input_amounts: config.input_amounts.clone(),
        input_token: Token::native(),
        tokens,
        max_splits: config.max_splits,
        max_length: config.max_length,
        wallet_address: config.sender_wallet.clone(),
        slippage: config.slippage,
    }
}

/// Run the whole benchmark and write every export. Returns the written paths.
pub async fn run(config: Config) -> Result<Vec<PathBuf>, AppError> {
    let client = build_client(config.http_timeout, config.http_max_connections)?;

    let emulator: Arc<dyn Emulator> =
        Arc::new(TvmEmulatorClient::new(client.clone(), &config.emulator_url));
    let indexer: Arc<dyn ChainIndexer> =
        Arc::new(TonApiIndexer::new(client.clone(), &config.indexer_url));
    let ctx = ProviderContext {
        client,
        emulator,
        aggregator: Arc::new(SwapOutputAggregator::new(&config.payout_op_codes)),
        rate_limit_interval: config.rate_limit_interval,
    };

    let tokens = load_tokens(&config.pairs_file, config.pairs_limit)?;
    let runs = provider_runs(&config, &ctx);
    info!(
        runs = runs.len(),
        tokens = tokens.len(),
        sizes = ?config.input_amounts,
        "Starting benchmark"
    );

    let orchestrator = BenchmarkOrchestrator::new(runs, indexer, GroupPacer::new(config.group_pause));
    let report = orchestrator.run(&plan(&config, tokens)).await?;

    let exporters: Vec<Box<dyn BenchmarkExporter>> = vec![
        Box::new(CsvExporter::new(&config.results_dir)),
        Box::new(SummaryExporter::new(&config.results_dir)),
    ];
    let mut written = Vec::new();
    for exporter in &exporters {
        written.extend(exporter.export(&report)?);
    }
    Ok(written)
}
