use std::sync::Arc;
use tracing::info;

use rust_cryptofetch::api::{run_server, AppState};
use rust_cryptofetch::config::AppConfig;
use rust_cryptofetch::data::fetcher::DataFetcher;
use rust_cryptofetch::exchange::factory::build_exchange;
use rust_cryptofetch::tools::ToolDispatcher;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    // Setup Logging
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting rust_cryptofetch...");

    // Load Configuration
    let config = AppConfig::load();
    info!("Loaded configuration: {:?}", config);

    // Unknown exchange names are fatal here, before anything is served.
    let exchange = build_exchange(&config)?;

    let fetcher = Arc::new(DataFetcher::connect(exchange, &config).await);
    info!(
        exchange = %fetcher.exchange_name(),
        symbols = fetcher.symbol_table().len(),
        "fetcher ready"
    );

    let dispatcher = ToolDispatcher::new(fetcher.clone(), &config);
    let state = Arc::new(AppState { dispatcher, fetcher });

    run_server(state, &config.listen_addr).await;

    Ok(())
}
