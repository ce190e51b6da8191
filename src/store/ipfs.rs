/// IPFS API client - fetches immutable content by multihash
use crate::error::{GatewayError, GatewayResult};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// IPFS client configuration
#[derive(Debug, Clone)]
pub struct IpfsClientConfig {
    /// Base URL of the IPFS HTTP API, e.g. `http://127.0.0.1:5001`
    pub api_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// User-Agent header for HTTP requests
    pub user_agent: String,
}

impl Default for IpfsClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:5001".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("chlu-query/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Error body returned by the IPFS API
#[derive(Debug, Deserialize)]
struct IpfsApiError {
    #[serde(rename = "Message")]
    message: String,
}

/// Thin client over the IPFS HTTP API
#[derive(Clone)]
pub struct IpfsClient {
    http_client: reqwest::Client,
    api_url: String,
}

impl IpfsClient {
    pub fn new(config: IpfsClientConfig) -> GatewayResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Check that the IPFS daemon answers
    pub async fn ping(&self) -> GatewayResult<()> {
        let url = format!("{}/api/v0/id", self.api_url);
        let response = self.http_client.post(&url).send().await?;

        if !response.status().is_success() {
            return Err(GatewayError::Storage(format!(
                "IPFS API returned error: {}",
                response.status()
            )));
        }

        Ok(())
    }

    /// Fetch and parse the JSON content stored under `multihash`
    ///
    /// Content the daemon reports as missing is `None`.
    pub async fn get_json(&self, multihash: &str) -> GatewayResult<Option<Value>> {
        let url = format!("{}/api/v0/cat", self.api_url);
        debug!("Fetching {} from IPFS", multihash);

        let response = self
            .http_client
            .post(&url)
            .query(&[("arg", multihash)])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let bytes = response.bytes().await?;
            let value = serde_json::from_slice(&bytes)?;
            return Ok(Some(value));
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<IpfsApiError>(&body)
            .map(|e| e.message)
            .unwrap_or(body);

        if is_missing_content(status, &message) {
            return Ok(None);
        }

        Err(GatewayError::Storage(format!(
            "IPFS API returned {} for {}: {}",
            status, multihash, message
        )))
    }
}

/// The IPFS API signals missing blocks with a 500 and a descriptive message
fn is_missing_content(status: StatusCode, message: &str) -> bool {
    if status == StatusCode::NOT_FOUND {
        return true;
    }

    let message = message.to_lowercase();
    status == StatusCode::INTERNAL_SERVER_ERROR
        && (message.contains("not found") || message.contains("no link named"))
}
