//! Configuration from environment variables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level ChatVault configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatVaultConfig {
    /// HTTP server port.
    pub port: u16,
    /// Directory holding the message database.
    pub store_dir: PathBuf,
    /// Base URL of the protocol bridge API (outbound send path).
    pub bridge_url: String,
    /// Capacity of the producer→consumer event queue.
    pub channel_capacity: usize,
}

impl ChatVaultConfig {
    /// Build configuration from environment and defaults.
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let store_dir = std::env::var("STORE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./store"));

        let bridge_url = std::env::var("BRIDGE_URL")
            .unwrap_or_else(|_| "http://localhost:8080/api".to_string());

        let channel_capacity = std::env::var("EVENT_QUEUE_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&c: &usize| c > 0)
            .unwrap_or(64);

        Self {
            port,
            store_dir,
            bridge_url,
            channel_capacity,
        }
    }
}
