//! Shared application state.

use tokio::sync::mpsc;

use crate::bridge::BridgeClient;
use chatvault_core::ChatVaultConfig;
use chatvault_ingest::ChatEvent;
use chatvault_store::QueryEngine;

/// State shared by all route handlers.
pub struct AppState {
    pub config: ChatVaultConfig,
    pub engine: QueryEngine,
    pub bridge: BridgeClient,
    pub event_tx: mpsc::Sender<ChatEvent>,
}

impl AppState {
    pub fn new(
        config: ChatVaultConfig,
        engine: QueryEngine,
        event_tx: mpsc::Sender<ChatEvent>,
    ) -> Self {
        let bridge = BridgeClient::new(&config.bridge_url);
        Self {
            config,
            engine,
            bridge,
            event_tx,
        }
    }
}
