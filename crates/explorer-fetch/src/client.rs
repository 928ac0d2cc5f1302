//! HTTP implementation of [`FetchApi`] backed by reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use explorer_common::{ExplorerError, ExplorerResult};
use explorer_resolver::ResourceDescriptor;

use crate::api::FetchApi;

/// Client timeouts. The remote services do not model timeouts themselves,
/// so a slot would otherwise stay pending forever on a hung connection.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Whole-request timeout (default 30s).
    pub request_timeout: Duration,
    /// Connection-establishment timeout (default 10s).
    pub connect_timeout: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// reqwest-backed fetcher used by the service binary.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: FetcherConfig) -> ExplorerResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ExplorerError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FetchApi for HttpFetcher {
    async fn fetch_json(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> ExplorerResult<serde_json::Value> {
        let url = descriptor.url()?;
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                ExplorerError::Timeout
            } else {
                ExplorerError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExplorerError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ExplorerError::Decode(e.to_string()))
    }
}
