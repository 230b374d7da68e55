use anyhow::Context;
use std::sync::Arc;
use tracing::{error, info, warn};

mod api;
mod config;
mod quest;

use config::ServerConfig;
use quest::{QuestCatalog, QuestEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load().context("Failed to load configuration")?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.log_filter)
                .context("Invalid log filter")?,
        )
        .with_ansi(!config.is_production())
        .init();

    info!("Starting QuestCraft API ({} environment)", config.environment);

    // Seed the catalog from TOML quest files, if any
    let mut catalog = QuestCatalog::new();
    if let Err(e) = catalog.load_from_directory(&config.data_dir) {
        error!("Failed to load quest catalog: {}", e);
    }
    if catalog.is_empty() {
        warn!("Quest catalog is empty; define quests with POST /api/quests");
    } else {
        info!("Quest catalog ready with {} quests", catalog.len());
    }

    let engine = Arc::new(QuestEngine::new(catalog));
    let app = api::router(engine);

    let addr = config.socket_addr().await?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("QuestCraft API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
