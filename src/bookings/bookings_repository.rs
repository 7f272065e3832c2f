use async_trait::async_trait;
use chrono::Duration;
use diesel::prelude::*;
use log::warn;
use std::sync::Arc;

use crate::appointments::AppointmentDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::Result;
use crate::models::{page_window, PageMeta, Paged};
use crate::outbox::NewOutboxEvent;
use crate::outbox::outbox_repository;
use crate::schema::{appointments, bookings};

use super::bookings_errors::BookingError;
use super::bookings_model::{Booking, BookingDB, LedgerMirrorUpdate};
use super::bookings_traits::BookingRepositoryTrait;

/// How long a certificate claim is honored before it is considered orphaned.
const CLAIM_LEASE_MINUTES: i64 = 5;

/// Repository for managing booking data in the database
pub struct BookingRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl BookingRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        BookingRepository { pool, writer }
    }
}

#[async_trait]
impl BookingRepositoryTrait for BookingRepository {
    fn get_by_id(&self, booking_id: &str) -> Result<Booking> {
        let mut conn = get_connection(&self.pool)?;
        let row = bookings::table
            .find(booking_id)
            .first::<BookingDB>(&mut conn)
            .optional()
            .map_err(BookingError::from)?
            .ok_or_else(|| {
                BookingError::NotFound(format!("Booking with id {} not found", booking_id))
            })?;
        Booking::try_from(row)
    }

    fn list(&self, page: i64, size: i64) -> Result<Paged<Booking>> {
        let mut conn = get_connection(&self.pool)?;
        let (offset, limit) = page_window(page, size);

        let total: i64 = bookings::table.count().get_result(&mut conn)?;
        let rows = bookings::table
            .order(bookings::created_at.desc())
            .offset(offset)
            .limit(limit)
            .load::<BookingDB>(&mut conn)?;

        let result = rows
            .into_iter()
            .map(Booking::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Paged {
            result,
            meta: PageMeta::new(page.max(0), limit, total),
        })
    }

    fn list_for_patient(&self, patient_id: &str, only_in_progress: bool) -> Result<Vec<Booking>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = bookings::table
            .filter(bookings::patient_id.eq(patient_id))
            .into_boxed();
        if only_in_progress {
            query = query.filter(bookings::overall_status.ne("COMPLETED"));
        }
        let rows = query
            .order(bookings::created_at.desc())
            .load::<BookingDB>(&mut conn)?;
        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn create_with_appointments(
        &self,
        booking: BookingDB,
        appointment_rows: Vec<AppointmentDB>,
        event: NewOutboxEvent,
    ) -> Result<Booking> {
        self.writer
            .exec(move |conn| {
                diesel::insert_into(bookings::table)
                    .values(&booking)
                    .execute(conn)?;
                diesel::insert_into(appointments::table)
                    .values(&appointment_rows)
                    .execute(conn)?;
                outbox_repository::enqueue(conn, &event)?;
                Booking::try_from(booking)
            })
            .await
    }

    async fn record_ledger_mirror(
        &self,
        booking_id: &str,
        update: LedgerMirrorUpdate,
    ) -> Result<()> {
        let id = booking_id.to_string();
        self.writer
            .exec(move |conn| {
                diesel::update(bookings::table.find(&id))
                    .set((
                        bookings::ledger_status.eq(update.status.as_str()),
                        bookings::ledger_tx_hash.eq(update.tx_hash),
                        bookings::ledger_appointment_id.eq(update.appointment_id),
                        bookings::updated_at.eq(chrono::Utc::now().naive_utc()),
                    ))
                    .execute(conn)?;
                Ok(())
            })
            .await
    }

    async fn claim_certificate(&self, booking_id: &str) -> Result<bool> {
        let id = booking_id.to_string();
        self.writer
            .exec(move |conn| {
                let now = chrono::Utc::now().naive_utc();
                let lease_cutoff = now - Duration::minutes(CLAIM_LEASE_MINUTES);
                let affected = diesel::update(
                    bookings::table
                        .find(&id)
                        .filter(bookings::certificate_token_id.is_null())
                        .filter(
                            bookings::certificate_claimed_at
                                .is_null()
                                .or(bookings::certificate_claimed_at.lt(lease_cutoff)),
                        ),
                )
                .set(bookings::certificate_claimed_at.eq(Some(now)))
                .execute(conn)?;
                Ok(affected > 0)
            })
            .await
    }

    async fn release_certificate_claim(&self, booking_id: &str) -> Result<()> {
        let id = booking_id.to_string();
        self.writer
            .exec(move |conn| {
                diesel::update(
                    bookings::table
                        .find(&id)
                        .filter(bookings::certificate_token_id.is_null()),
                )
                .set(bookings::certificate_claimed_at.eq(None::<chrono::NaiveDateTime>))
                .execute(conn)?;
                Ok(())
            })
            .await
    }

    async fn record_certificate(
        &self,
        booking_id: &str,
        token_id: i64,
        tx_hash: &str,
    ) -> Result<()> {
        let id = booking_id.to_string();
        let tx_hash = tx_hash.to_string();
        self.writer
            .exec(move |conn| {
                let affected = diesel::update(
                    bookings::table
                        .find(&id)
                        .filter(bookings::certificate_token_id.is_null()),
                )
                .set((
                    bookings::certificate_token_id.eq(Some(token_id.to_string())),
                    bookings::certificate_tx_hash.eq(Some(tx_hash)),
                    bookings::updated_at.eq(chrono::Utc::now().naive_utc()),
                ))
                .execute(conn)?;
                if affected == 0 {
                    warn!(
                        "Certificate fields for booking {} were already written, keeping the first record",
                        id
                    );
                }
                Ok(())
            })
            .await
    }
}
