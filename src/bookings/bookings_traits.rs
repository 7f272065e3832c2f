use async_trait::async_trait;

use crate::appointments::AppointmentDB;
use crate::errors::Result;
use crate::models::Paged;
use crate::outbox::NewOutboxEvent;

use super::bookings_model::{
    Booking, BookingDB, BookingSummary, LedgerMirrorUpdate, MirrorOutcome, NewBooking,
};

/// Trait defining the contract for Booking repository operations.
#[async_trait]
pub trait BookingRepositoryTrait: Send + Sync {
    fn get_by_id(&self, booking_id: &str) -> Result<Booking>;

    fn list(&self, page: i64, size: i64) -> Result<Paged<Booking>>;

    fn list_for_patient(&self, patient_id: &str, only_in_progress: bool) -> Result<Vec<Booking>>;

    /// Persists the booking, its full dose set, and the creation event as
    /// one atomic unit.
    async fn create_with_appointments(
        &self,
        booking: BookingDB,
        appointments: Vec<AppointmentDB>,
        event: NewOutboxEvent,
    ) -> Result<Booking>;

    /// Targeted update of the ledger-mirror fields.
    async fn record_ledger_mirror(
        &self,
        booking_id: &str,
        update: LedgerMirrorUpdate,
    ) -> Result<()>;

    /// Compare-and-set claim of the certificate mint. Returns false when the
    /// certificate exists or another claim currently holds the lease.
    async fn claim_certificate(&self, booking_id: &str) -> Result<bool>;

    /// Releases a held claim after a failed mint so a retry can re-claim.
    async fn release_certificate_claim(&self, booking_id: &str) -> Result<()>;

    /// Write-once persistence of the minted certificate fields. Does not
    /// touch the aggregate status.
    async fn record_certificate(
        &self,
        booking_id: &str,
        token_id: i64,
        tx_hash: &str,
    ) -> Result<()>;
}

/// Trait defining the contract for Booking service operations.
#[async_trait]
pub trait BookingServiceTrait: Send + Sync {
    async fn create_booking(&self, new_booking: NewBooking) -> Result<BookingSummary>;
    fn get_booking(&self, booking_id: &str) -> Result<Booking>;
    fn get_booking_summary(&self, booking_id: &str) -> Result<BookingSummary>;
    fn list_bookings(&self, page: i64, size: i64) -> Result<Paged<Booking>>;
    fn bookings_in_progress(&self, patient_key: &str) -> Result<Vec<Booking>>;
    fn booking_history(&self, patient_key: &str) -> Result<Vec<Booking>>;
}

/// Best-effort mirroring of a committed booking onto the external ledger.
/// Driven by the outbox consumer, never by the request path.
#[async_trait]
pub trait LedgerMirrorTrait: Send + Sync {
    /// Attempts the mirror once. Terminal non-error outcomes record their
    /// own ledger status; an `Err` is retryable.
    async fn mirror_booking(&self, booking_id: &str) -> Result<MirrorOutcome>;

    /// Fails the mirror closed once retries are exhausted.
    async fn record_mirror_failure(&self, booking_id: &str, error: &str) -> Result<()>;
}
