use log::{debug, error, info, warn};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::bookings::{LedgerMirrorTrait, MirrorOutcome};
use crate::certificates::{CertificateIssuerTrait, IssueOutcome};
use crate::errors::Result;

use super::outbox_model::{EventType, OutboxEvent};
use super::outbox_traits::OutboxRepositoryTrait;

/// Delivery attempts before an event is parked as FAILED.
pub const MAX_DELIVERY_ATTEMPTS: i32 = 5;

const BATCH_SIZE: i64 = 16;

/// Polls the outbox and performs the external side effects committed by
/// booking and appointment transactions: the best-effort ledger mirror for
/// `BOOKING_CREATED` and certificate issuance for `BOOKING_COMPLETED`.
///
/// Retries are bounded; exhausted mirror events fail closed onto the
/// booking's ledger status.
pub struct OutboxConsumer<O, M, I>
where
    O: OutboxRepositoryTrait,
    M: LedgerMirrorTrait,
    I: CertificateIssuerTrait,
{
    outbox: Arc<O>,
    mirror: Arc<M>,
    issuer: Arc<I>,
    poll_interval: Duration,
}

impl<O, M, I> OutboxConsumer<O, M, I>
where
    O: OutboxRepositoryTrait + 'static,
    M: LedgerMirrorTrait + 'static,
    I: CertificateIssuerTrait + 'static,
{
    pub fn new(outbox: Arc<O>, mirror: Arc<M>, issuer: Arc<I>, poll_interval: Duration) -> Self {
        OutboxConsumer {
            outbox,
            mirror,
            issuer,
            poll_interval,
        }
    }

    /// Runs the consumer as a background task until the runtime shuts down.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        info!(
            "Outbox consumer started, polling every {:?}",
            self.poll_interval
        );
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.drain_once().await {
                    error!("Outbox drain failed: {}", e);
                }
            }
        })
    }

    /// Processes one batch of pending events. Exposed for tests and for
    /// hosts that drive delivery themselves.
    pub async fn drain_once(&self) -> Result<usize> {
        let events = self.outbox.due(BATCH_SIZE)?;
        let count = events.len();
        for event in events {
            self.deliver(&event).await?;
        }
        Ok(count)
    }

    async fn deliver(&self, event: &OutboxEvent) -> Result<()> {
        let event_type = match EventType::from_str(&event.event_type) {
            Ok(t) => t,
            Err(e) => {
                warn!("Dropping undeliverable outbox event {}: {}", event.id, e);
                return self.outbox.mark_skipped(&event.id, &e).await;
            }
        };

        match event_type {
            EventType::BookingCreated => {
                match self.mirror.mirror_booking(&event.aggregate_id).await {
                    Ok(MirrorOutcome::Confirmed) => self.outbox.mark_processed(&event.id).await,
                    Ok(MirrorOutcome::Skipped(reason)) => {
                        debug!(
                            "Ledger mirror skipped for booking {}: {}",
                            event.aggregate_id, reason
                        );
                        self.outbox.mark_skipped(&event.id, &reason).await
                    }
                    Err(e) => self.handle_failure(event, &e.to_string(), true).await,
                }
            }
            EventType::BookingCompleted => {
                match self.issuer.issue_for_booking(&event.aggregate_id).await {
                    Ok(IssueOutcome::Minted { token_id, .. }) => {
                        info!(
                            "Certificate token {} issued for booking {}",
                            token_id, event.aggregate_id
                        );
                        self.outbox.mark_processed(&event.id).await
                    }
                    Ok(IssueOutcome::AlreadyIssued) | Ok(IssueOutcome::ClaimHeld) => {
                        self.outbox.mark_processed(&event.id).await
                    }
                    Ok(IssueOutcome::NoLinkedAddress) => {
                        self.outbox
                            .mark_skipped(&event.id, "patient has no linked ledger address")
                            .await
                    }
                    Ok(IssueOutcome::InvalidAddress(raw)) => {
                        self.outbox
                            .mark_skipped(&event.id, &format!("invalid ledger address: {}", raw))
                            .await
                    }
                    Ok(IssueOutcome::GatewayDisabled) => {
                        self.outbox
                            .mark_skipped(&event.id, "ledger gateway not configured")
                            .await
                    }
                    Err(e) => self.handle_failure(event, &e.to_string(), false).await,
                }
            }
        }
    }

    async fn handle_failure(
        &self,
        event: &OutboxEvent,
        error_message: &str,
        is_mirror: bool,
    ) -> Result<()> {
        let attempts = event.attempts + 1;
        let exhausted = attempts >= MAX_DELIVERY_ATTEMPTS;
        warn!(
            "Delivery of {} for booking {} failed (attempt {}/{}): {}",
            event.event_type, event.aggregate_id, attempts, MAX_DELIVERY_ATTEMPTS, error_message
        );

        if exhausted && is_mirror {
            if let Err(e) = self
                .mirror
                .record_mirror_failure(&event.aggregate_id, error_message)
                .await
            {
                error!(
                    "Failed to record mirror failure for booking {}: {}",
                    event.aggregate_id, e
                );
            }
        }

        self.outbox
            .record_failure(&event.id, error_message, exhausted)
            .await
    }
}
