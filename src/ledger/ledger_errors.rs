use thiserror::Error;

/// Errors raised by the distributed-ledger gateway
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger gateway unreachable: {0}")]
    Unavailable(String),

    #[error("Ledger API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid ledger address: {0}")]
    InvalidAddress(String),

    #[error("Unexpected ledger response: {0}")]
    InvalidResponse(String),
}
