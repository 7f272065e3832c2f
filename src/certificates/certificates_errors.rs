use thiserror::Error;

/// Custom error type for certificate operations
#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("Ledger gateway not configured, certificates unavailable")]
    GatewayDisabled,

    #[error("Invalid certificate token id: {0}")]
    InvalidTokenId(String),
}
