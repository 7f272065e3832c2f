use async_trait::async_trait;

use crate::errors::Result;

use super::certificates_model::IssueOutcome;

/// Single-shot certificate issuance for a completed booking.
///
/// Implementations must be idempotent: at most one certificate is ever
/// minted per booking, and every non-retryable condition is an outcome
/// rather than an error.
#[async_trait]
pub trait CertificateIssuerTrait: Send + Sync {
    async fn issue_for_booking(&self, booking_id: &str) -> Result<IssueOutcome>;
}
