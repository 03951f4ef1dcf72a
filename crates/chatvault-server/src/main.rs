//! ChatVault — chat history persistence and retrieval server.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod bridge;
mod routes;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = chatvault_core::ChatVaultConfig::from_env();

    let store = Arc::new(
        chatvault_store::MessageStore::open(&config.store_dir)
            .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?,
    );
    let engine = chatvault_store::QueryEngine::new(store.clone());

    // One consumer task applies all writes; the sender half is handed to
    // route handlers and any in-process producer.
    let (event_tx, _pipeline) = chatvault_ingest::spawn_pipeline(store, config.channel_capacity);

    let port = config.port;
    let state = Arc::new(AppState::new(config, engine, event_tx));

    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("ChatVault server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
