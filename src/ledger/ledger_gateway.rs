use async_trait::async_trait;
use log::{info, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use super::ledger_errors::LedgerError;
use super::ledger_model::{
    CertificateRecord, CreateAppointmentRequest, LedgerTxReceipt, MintCertificateRequest,
    MintedCertificate,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Contract of the distributed-ledger gateway consumed by this core.
#[async_trait]
pub trait LedgerGatewayTrait: Send + Sync {
    async fn create_appointment(
        &self,
        request: &CreateAppointmentRequest,
    ) -> Result<LedgerTxReceipt, LedgerError>;

    async fn mint_certificate(
        &self,
        request: &MintCertificateRequest,
    ) -> Result<MintedCertificate, LedgerError>;

    async fn verify_certificate(&self, token_id: i64) -> Result<CertificateRecord, LedgerError>;
}

/// Environment-driven gateway configuration
#[derive(Debug, Clone, Default)]
pub struct LedgerConfig {
    pub api_url: Option<String>,
    pub api_token: Option<String>,
}

impl LedgerConfig {
    pub fn from_env() -> Self {
        LedgerConfig {
            api_url: std::env::var("LEDGER_API_URL").ok().filter(|v| !v.is_empty()),
            api_token: std::env::var("LEDGER_API_TOKEN").ok().filter(|v| !v.is_empty()),
        }
    }
}

/// HTTP implementation of the ledger gateway.
pub struct HttpLedgerGateway {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpLedgerGateway {
    /// Builds the gateway from configuration. Returns `None` when no API url
    /// is configured, in which case ledger mirroring and certificate minting
    /// are skipped by the callers.
    pub fn from_config(config: &LedgerConfig) -> Option<Self> {
        let base_url = match &config.api_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                warn!("LEDGER_API_URL not set. Ledger gateway disabled.");
                return None;
            }
        };

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build ledger HTTP client");

        info!("Ledger gateway initialized for {}", base_url);
        Some(HttpLedgerGateway {
            client,
            base_url,
            api_token: config.api_token.clone(),
        })
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, LedgerError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.post(&url).json(body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LedgerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, LedgerError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LedgerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl LedgerGatewayTrait for HttpLedgerGateway {
    async fn create_appointment(
        &self,
        request: &CreateAppointmentRequest,
    ) -> Result<LedgerTxReceipt, LedgerError> {
        self.post_json("/appointments", request).await
    }

    async fn mint_certificate(
        &self,
        request: &MintCertificateRequest,
    ) -> Result<MintedCertificate, LedgerError> {
        self.post_json("/certificates", request).await
    }

    async fn verify_certificate(&self, token_id: i64) -> Result<CertificateRecord, LedgerError> {
        self.get_json(&format!("/certificates/{}", token_id)).await
    }
}
