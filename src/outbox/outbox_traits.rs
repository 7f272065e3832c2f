use async_trait::async_trait;

use super::outbox_model::OutboxEvent;
use crate::errors::Result;

/// Trait for outbox delivery bookkeeping
#[async_trait]
pub trait OutboxRepositoryTrait: Send + Sync {
    /// Pending events, oldest first.
    fn due(&self, limit: i64) -> Result<Vec<OutboxEvent>>;

    async fn mark_processed(&self, event_id: &str) -> Result<()>;

    async fn mark_skipped(&self, event_id: &str, reason: &str) -> Result<()>;

    /// Records a failed delivery attempt. When `exhausted` is set the event
    /// is parked as FAILED and never retried again.
    async fn record_failure(&self, event_id: &str, error: &str, exhausted: bool) -> Result<()>;
}
