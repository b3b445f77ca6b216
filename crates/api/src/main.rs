// Store Probe API server
// Decision: One GET endpoint runs the whole benchmark inline and answers with a static page
// Decision: STORE_BACKEND=memory runs without a store, for local UI work

use anyhow::{Context, Result};
use std::sync::Arc;
use storeprobe_api::config::AppConfig;
use storeprobe_api::home;
use storeprobe_api::views::ViewRenderer;
use storeprobe_core::memory::InMemoryConnector;
use storeprobe_core::{BenchmarkRunner, DynamoDbConnector, StoreConnector};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "storeprobe_api=debug,storeprobe_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("storeprobe-api starting...");

    let config = AppConfig::from_env().context("Invalid configuration")?;
    tracing::info!(
        region = %config.store.region,
        endpoint = %config.store.endpoint,
        table = %config.store.table_name,
        proxy = config.store.proxy_url.as_deref().unwrap_or("none"),
        credentials = %config.store.credentials,
        "Store configured"
    );

    let connector: Arc<dyn StoreConnector> = if config.in_memory_store {
        tracing::warn!("Using in-memory store; timings do not reflect a real store");
        Arc::new(InMemoryConnector::new())
    } else {
        Arc::new(
            DynamoDbConnector::new(config.store.clone())
                .context("Failed to set up store credentials")?,
        )
    };

    let runner = BenchmarkRunner::new(
        connector,
        config.store.table_name.clone(),
        config.store.proxy_bypass.clone(),
    );
    let views = ViewRenderer::new().context("Failed to load view templates")?;

    let app = storeprobe_api::app(home::AppState::new(runner, views));

    // Start server
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
