use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::sync::Arc;

use crate::appointments::{AppointmentDB, AppointmentRepositoryTrait, AppointmentStatus};
use crate::errors::Result;
use crate::ledger::{CreateAppointmentRequest, LedgerAddress, LedgerGatewayTrait};
use crate::models::Paged;
use crate::outbox::NewOutboxEvent;
use crate::reference::ReferenceLookupTrait;

use super::bookings_aggregate::aggregate_overall_status;
use super::bookings_model::{
    Booking, BookingDB, BookingSummary, LedgerMirrorStatus, LedgerMirrorUpdate, MirrorOutcome,
    NewBooking,
};
use super::bookings_traits::{BookingRepositoryTrait, BookingServiceTrait, LedgerMirrorTrait};

/// Service for creating and querying bookings, and for mirroring committed
/// bookings onto the external ledger.
pub struct BookingService<B, A, L, G>
where
    B: BookingRepositoryTrait,
    A: AppointmentRepositoryTrait,
    L: ReferenceLookupTrait,
    G: LedgerGatewayTrait,
{
    bookings: Arc<B>,
    appointments: Arc<A>,
    reference: Arc<L>,
    ledger: Option<Arc<G>>,
}

impl<B, A, L, G> BookingService<B, A, L, G>
where
    B: BookingRepositoryTrait,
    A: AppointmentRepositoryTrait,
    L: ReferenceLookupTrait,
    G: LedgerGatewayTrait,
{
    pub fn new(
        bookings: Arc<B>,
        appointments: Arc<A>,
        reference: Arc<L>,
        ledger: Option<Arc<G>>,
    ) -> Self {
        BookingService {
            bookings,
            appointments,
            reference,
            ledger,
        }
    }

    fn summarize(&self, booking: &Booking) -> Result<BookingSummary> {
        let appointments = self.appointments.list_by_booking(&booking.id)?;
        Ok(BookingSummary::from_parts(booking, &appointments))
    }

    async fn skip_mirror(&self, booking_id: &str, reason: &str) -> Result<MirrorOutcome> {
        warn!("Ledger mirror skipped for booking {}: {}", booking_id, reason);
        self.bookings
            .record_ledger_mirror(
                booking_id,
                LedgerMirrorUpdate {
                    status: LedgerMirrorStatus::Skipped,
                    tx_hash: None,
                    appointment_id: None,
                },
            )
            .await?;
        Ok(MirrorOutcome::Skipped(reason.to_string()))
    }
}

#[async_trait]
impl<B, A, L, G> BookingServiceTrait for BookingService<B, A, L, G>
where
    B: BookingRepositoryTrait,
    A: AppointmentRepositoryTrait,
    L: ReferenceLookupTrait,
    G: LedgerGatewayTrait,
{
    async fn create_booking(&self, new_booking: NewBooking) -> Result<BookingSummary> {
        new_booking.validate()?;

        let patient = self.reference.get_user(&new_booking.patient_id)?;
        let vaccine = self.reference.get_vaccine(&new_booking.vaccine_id)?;
        let center = self.reference.get_center(&new_booking.center_id)?;
        for schedule in &new_booking.dose_schedules {
            if let Some(center_id) = &schedule.center_id {
                self.reference.get_center(center_id)?;
            }
        }

        let total_doses = new_booking.total_doses();
        debug!(
            "Creating booking: patient {}, vaccine {}, {} doses",
            patient.id, vaccine.name, total_doses
        );

        // Seed the aggregate from the dose set about to be created.
        let seeded = aggregate_overall_status(&vec![
            AppointmentStatus::Scheduled;
            total_doses as usize
        ]);
        let booking_row = BookingDB::pending(&new_booking, &patient.id, seeded);

        let mut appointment_rows = vec![AppointmentDB::scheduled(
            &booking_row.id,
            &booking_row.center_id,
            1,
            &new_booking.first_dose_date,
            &new_booking.first_dose_time,
        )];
        for (i, schedule) in new_booking.dose_schedules.iter().enumerate() {
            let center_id = schedule.center_id.as_deref().unwrap_or(&booking_row.center_id);
            appointment_rows.push(AppointmentDB::scheduled(
                &booking_row.id,
                center_id,
                i as i32 + 2,
                &schedule.date,
                &schedule.time,
            ));
        }

        let event = NewOutboxEvent::booking_created(&booking_row.id);
        let booking = self
            .bookings
            .create_with_appointments(booking_row, appointment_rows, event)
            .await?;

        info!(
            "Created booking {} ({} doses of {} at {})",
            booking.id, total_doses, vaccine.name, center.name
        );
        self.summarize(&booking)
    }

    fn get_booking(&self, booking_id: &str) -> Result<Booking> {
        self.bookings.get_by_id(booking_id)
    }

    fn get_booking_summary(&self, booking_id: &str) -> Result<BookingSummary> {
        let booking = self.bookings.get_by_id(booking_id)?;
        self.summarize(&booking)
    }

    fn list_bookings(&self, page: i64, size: i64) -> Result<Paged<Booking>> {
        self.bookings.list(page, size)
    }

    fn bookings_in_progress(&self, patient_key: &str) -> Result<Vec<Booking>> {
        let patient = self.reference.get_user(patient_key)?;
        self.bookings.list_for_patient(&patient.id, true)
    }

    fn booking_history(&self, patient_key: &str) -> Result<Vec<Booking>> {
        let patient = self.reference.get_user(patient_key)?;
        self.bookings.list_for_patient(&patient.id, false)
    }
}

#[async_trait]
impl<B, A, L, G> LedgerMirrorTrait for BookingService<B, A, L, G>
where
    B: BookingRepositoryTrait,
    A: AppointmentRepositoryTrait,
    L: ReferenceLookupTrait,
    G: LedgerGatewayTrait,
{
    async fn mirror_booking(&self, booking_id: &str) -> Result<MirrorOutcome> {
        let booking = self.bookings.get_by_id(booking_id)?;

        // A previously settled mirror is final; only PENDING and FAILED
        // (a retry) proceed.
        match booking.ledger_status {
            LedgerMirrorStatus::Confirmed => return Ok(MirrorOutcome::Confirmed),
            LedgerMirrorStatus::Skipped => {
                return Ok(MirrorOutcome::Skipped("already skipped".to_string()))
            }
            LedgerMirrorStatus::Pending | LedgerMirrorStatus::Failed => {}
        }

        let gateway = match &self.ledger {
            Some(gateway) => gateway.clone(),
            None => return self.skip_mirror(booking_id, "ledger gateway not configured").await,
        };

        let raw_address = match self.reference.get_linked_address(&booking.patient_id)? {
            Some(raw) => raw,
            None => {
                return self
                    .skip_mirror(booking_id, "patient has no linked ledger address")
                    .await
            }
        };
        let address = match LedgerAddress::parse(&raw_address) {
            Ok(address) => address,
            Err(_) => {
                return self
                    .skip_mirror(
                        booking_id,
                        &format!("invalid linked ledger address '{}'", raw_address),
                    )
                    .await
            }
        };

        let vaccine = self.reference.get_vaccine(&booking.vaccine_id)?;
        let center = self.reference.get_center(&booking.center_id)?;

        let request = CreateAppointmentRequest {
            vaccine_name: vaccine.name,
            center_name: center.name,
            date: booking.first_dose_date.clone(),
            time: booking.first_dose_time.clone(),
            patient_address: address.into_string(),
            price_minor: (booking.total_amount * 100.0).round() as i64,
        };

        match gateway.create_appointment(&request).await {
            Ok(receipt) => {
                info!(
                    "Mirrored booking {} onto the ledger (tx {})",
                    booking_id, receipt.tx_hash
                );
                self.bookings
                    .record_ledger_mirror(
                        booking_id,
                        LedgerMirrorUpdate {
                            status: LedgerMirrorStatus::Confirmed,
                            tx_hash: Some(receipt.tx_hash),
                            appointment_id: receipt.appointment_id,
                        },
                    )
                    .await?;
                Ok(MirrorOutcome::Confirmed)
            }
            Err(e) => {
                warn!("Ledger mirror attempt for booking {} failed: {}", booking_id, e);
                Err(e.into())
            }
        }
    }

    async fn record_mirror_failure(&self, booking_id: &str, error_message: &str) -> Result<()> {
        error!(
            "Ledger mirror for booking {} failed permanently: {}",
            booking_id, error_message
        );
        self.bookings
            .record_ledger_mirror(
                booking_id,
                LedgerMirrorUpdate {
                    status: LedgerMirrorStatus::Failed,
                    tx_hash: None,
                    appointment_id: None,
                },
            )
            .await
    }
}
