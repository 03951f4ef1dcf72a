//! Outbound send path: one RPC against the protocol bridge API.

use serde::{Deserialize, Serialize};

use chatvault_core::{Error, Result};

#[derive(Debug, Clone, Serialize)]
struct SendRequest<'a> {
    recipient: &'a str,
    message: &'a str,
}

/// Bridge verdict for an outbound send.
#[derive(Debug, Clone, Deserialize)]
pub struct SendOutcome {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// HTTP client for the protocol bridge.
#[derive(Clone)]
pub struct BridgeClient {
    base_url: String,
    http: reqwest::Client,
}

impl BridgeClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// POST `{base}/send`. Transport failures and non-2xx responses surface
    /// as bridge errors; the engine never retries.
    pub async fn send_message(&self, recipient: &str, message: &str) -> Result<SendOutcome> {
        let url = format!("{}/send", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&SendRequest { recipient, message })
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http(format!("bridge returned {}: {}", status, body)));
        }

        resp.json::<SendOutcome>()
            .await
            .map_err(|e| Error::Http(e.to_string()))
    }
}
