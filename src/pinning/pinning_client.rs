use async_trait::async_trait;
use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::pinning_model::{PinMetadata, PLACEHOLDER_CONTENT_URI};

const DEFAULT_API_URL: &str = "https://api.pinata.cloud/pinning/pinJSONToIPFS";
const DEFAULT_GATEWAY: &str = "gateway.pinata.cloud";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Contract of the content-addressed metadata store.
///
/// Uploads never fail hard: a misconfigured or unreachable pinning backend
/// degrades to the deterministic placeholder URI with a warning.
#[async_trait]
pub trait MetadataPinningTrait: Send + Sync {
    async fn upload_metadata(&self, metadata: &PinMetadata) -> String;

    /// Translates a content URI into a fetchable gateway URL.
    fn http_url(&self, content_uri: &str) -> String;
}

/// Environment-driven pinning configuration
#[derive(Debug, Clone)]
pub struct PinningConfig {
    pub api_url: String,
    pub jwt: Option<String>,
    pub gateway: String,
}

impl PinningConfig {
    pub fn from_env() -> Self {
        PinningConfig {
            api_url: std::env::var("PINNING_API_URL")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            jwt: std::env::var("PINNING_JWT").ok().filter(|v| !v.is_empty()),
            gateway: std::env::var("PINNING_GATEWAY")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_GATEWAY.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

/// HTTP pinning client
pub struct PinningClient {
    client: Client,
    config: PinningConfig,
}

impl PinningClient {
    pub fn new(config: PinningConfig) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build pinning HTTP client");
        PinningClient { client, config }
    }

    async fn try_upload(&self, metadata: &PinMetadata, jwt: &str) -> Result<String, String> {
        let body = json!({
            "pinataContent": metadata,
            "pinataMetadata": { "name": format!("{}.json", metadata.name) },
        });

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(jwt)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(format!("pinning API returned {}: {}", status, text));
        }

        let parsed = response
            .json::<PinResponse>()
            .await
            .map_err(|e| e.to_string())?;
        Ok(format!("ipfs://{}", parsed.ipfs_hash))
    }
}

#[async_trait]
impl MetadataPinningTrait for PinningClient {
    async fn upload_metadata(&self, metadata: &PinMetadata) -> String {
        let jwt = match &self.config.jwt {
            Some(jwt) => jwt.clone(),
            None => {
                warn!(
                    "Pinning credentials not configured, using placeholder URI for {}",
                    metadata.name
                );
                return PLACEHOLDER_CONTENT_URI.to_string();
            }
        };

        match self.try_upload(metadata, &jwt).await {
            Ok(uri) => {
                info!("Pinned metadata for {} at {}", metadata.name, uri);
                uri
            }
            Err(e) => {
                warn!(
                    "Failed to pin metadata for {} ({}), falling back to placeholder URI",
                    metadata.name, e
                );
                PLACEHOLDER_CONTENT_URI.to_string()
            }
        }
    }

    fn http_url(&self, content_uri: &str) -> String {
        match content_uri.strip_prefix("ipfs://") {
            Some(hash) => format!("https://{}/ipfs/{}", self.config.gateway, hash),
            None => content_uri.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pinning::pinning_model::PinAttribute;

    fn client_without_credentials() -> PinningClient {
        PinningClient::new(PinningConfig {
            api_url: DEFAULT_API_URL.to_string(),
            jwt: None,
            gateway: DEFAULT_GATEWAY.to_string(),
        })
    }

    #[tokio::test]
    async fn upload_without_credentials_degrades_to_placeholder() {
        let client = client_without_credentials();
        let metadata = PinMetadata {
            name: "Certificate #1".to_string(),
            description: "test".to_string(),
            image: "ipfs://QmImage".to_string(),
            attributes: vec![PinAttribute::new("Booking ID", "1")],
        };

        let uri = client.upload_metadata(&metadata).await;
        assert_eq!(uri, PLACEHOLDER_CONTENT_URI);
    }

    #[test]
    fn http_url_translates_content_uris() {
        let client = client_without_credentials();
        assert_eq!(
            client.http_url("ipfs://QmAbc123"),
            "https://gateway.pinata.cloud/ipfs/QmAbc123"
        );
        assert_eq!(
            client.http_url("https://example.com/x.json"),
            "https://example.com/x.json"
        );
    }
}
