use crate::errors::{RelayError, Result};
use ledger_service::models::ProcessRequest;
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info};

/// Status and body exactly as the ledger service returned them
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: Vec<u8>,
}

pub struct LedgerClient {
    base_url: String,
    client: Client,
}

impl LedgerClient {
    pub fn new(base_url: String, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RelayError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(LedgerClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Forward `n` to `POST /process`. Any HTTP status is a reply; only
    /// transport failures are errors.
    pub async fn process(&self, n: i64) -> Result<UpstreamReply> {
        let url = format!("{}/process", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ProcessRequest { n })
            .send()
            .await
            .map_err(|e| {
                error!("Ledger service unavailable: {}", e);
                RelayError::from(e)
            })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| {
            error!("Failed to read ledger service response: {}", e);
            RelayError::from(e)
        })?;

        info!("Forwarded n={} -> {}", n, status);

        Ok(UpstreamReply {
            status,
            body: body.to_vec(),
        })
    }
}
