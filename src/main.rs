use dexbench::{app, config::Config};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    match app::run(config).await {
        Ok(paths) => tracing::info!(files = paths.len(), "Benchmark finished"),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
