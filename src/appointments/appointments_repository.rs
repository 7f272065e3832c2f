use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::str::FromStr;
use std::sync::Arc;

use crate::bookings::{aggregate_overall_status, OverallStatus};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{Result, ValidationError};
use crate::models::{page_window, PageMeta, Paged};
use crate::outbox::outbox_repository;
use crate::outbox::NewOutboxEvent;
use crate::schema::{appointments, bookings};

use super::appointments_errors::AppointmentError;
use super::appointments_model::{
    Appointment, AppointmentDB, AppointmentStatus, DoctorChange, TransitionCommand,
    TransitionOutcome,
};
use super::appointments_traits::AppointmentRepositoryTrait;

/// Repository for managing appointment data in the database
pub struct AppointmentRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl AppointmentRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        AppointmentRepository { pool, writer }
    }

    fn load_paged(
        &self,
        filter_column: PagedFilter,
        key: &str,
        page: i64,
        size: i64,
    ) -> Result<Paged<Appointment>> {
        let mut conn = get_connection(&self.pool)?;
        let (offset, limit) = page_window(page, size);

        let (total, rows) = match filter_column {
            PagedFilter::Center => {
                let total: i64 = appointments::table
                    .filter(appointments::center_id.eq(key))
                    .count()
                    .get_result(&mut conn)?;
                let rows = appointments::table
                    .filter(appointments::center_id.eq(key))
                    .order((
                        appointments::appointment_date.asc(),
                        appointments::appointment_time.asc(),
                    ))
                    .offset(offset)
                    .limit(limit)
                    .load::<AppointmentDB>(&mut conn)?;
                (total, rows)
            }
            PagedFilter::Doctor => {
                let total: i64 = appointments::table
                    .filter(appointments::doctor_id.eq(key))
                    .count()
                    .get_result(&mut conn)?;
                let rows = appointments::table
                    .filter(appointments::doctor_id.eq(key))
                    .order((
                        appointments::appointment_date.asc(),
                        appointments::appointment_time.asc(),
                    ))
                    .offset(offset)
                    .limit(limit)
                    .load::<AppointmentDB>(&mut conn)?;
                (total, rows)
            }
        };

        let result = rows
            .into_iter()
            .map(Appointment::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Paged {
            result,
            meta: PageMeta::new(page.max(0), limit, total),
        })
    }
}

enum PagedFilter {
    Center,
    Doctor,
}

#[async_trait]
impl AppointmentRepositoryTrait for AppointmentRepository {
    fn get_by_id(&self, appointment_id: &str) -> Result<Appointment> {
        let mut conn = get_connection(&self.pool)?;
        let row = appointments::table
            .find(appointment_id)
            .first::<AppointmentDB>(&mut conn)
            .optional()
            .map_err(AppointmentError::from)?
            .ok_or_else(|| {
                AppointmentError::NotFound(format!(
                    "Appointment with id {} not found",
                    appointment_id
                ))
            })?;
        Appointment::try_from(row)
    }

    fn list_by_booking(&self, booking_id: &str) -> Result<Vec<Appointment>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = appointments::table
            .filter(appointments::booking_id.eq(booking_id))
            .order(appointments::dose_number.asc())
            .load::<AppointmentDB>(&mut conn)?;
        rows.into_iter().map(Appointment::try_from).collect()
    }

    fn list_by_center(&self, center_id: &str, page: i64, size: i64) -> Result<Paged<Appointment>> {
        self.load_paged(PagedFilter::Center, center_id, page, size)
    }

    fn list_by_doctor(&self, doctor_id: &str, page: i64, size: i64) -> Result<Paged<Appointment>> {
        self.load_paged(PagedFilter::Doctor, doctor_id, page, size)
    }

    async fn apply_transition(
        &self,
        appointment_id: &str,
        command: TransitionCommand,
    ) -> Result<TransitionOutcome> {
        let id = appointment_id.to_string();
        self.writer
            .exec(move |conn| transition_in_tx(conn, &id, &command))
            .await
    }
}

/// Runs one lifecycle transition inside the writer's transaction: guard the
/// status change, maintain the booking's doctor flag, re-aggregate the
/// overall status, and emit the completion event when the booking newly
/// becomes COMPLETED.
fn transition_in_tx(
    conn: &mut SqliteConnection,
    appointment_id: &str,
    command: &TransitionCommand,
) -> Result<TransitionOutcome> {
    let row = appointments::table
        .find(appointment_id)
        .first::<AppointmentDB>(conn)
        .optional()?
        .ok_or_else(|| {
            AppointmentError::NotFound(format!(
                "Appointment with id {} not found",
                appointment_id
            ))
        })?;
    let appointment = Appointment::try_from(row)?;
    let plan = appointment.plan_transition(command)?;

    let now = chrono::Utc::now().naive_utc();

    // Guarded on the observed status so a cross-process race loses cleanly.
    let affected = diesel::update(
        appointments::table
            .find(appointment_id)
            .filter(appointments::status.eq(appointment.status.as_str())),
    )
    .set((
        appointments::status.eq(plan.new_status.as_str()),
        appointments::updated_at.eq(now),
    ))
    .execute(conn)?;

    if affected == 0 {
        let fresh = appointments::table
            .find(appointment_id)
            .first::<AppointmentDB>(conn)?;
        let fresh = Appointment::try_from(fresh)?;
        return match fresh.plan_transition(command) {
            Err(e) => Err(e.into()),
            Ok(_) => Err(AppointmentError::InvalidTransition(format!(
                "Appointment {} was modified concurrently",
                appointment_id
            ))
            .into()),
        };
    }

    match &plan.doctor_change {
        DoctorChange::Set(doctor) => {
            diesel::update(appointments::table.find(appointment_id))
                .set(appointments::doctor_id.eq(Some(doctor.clone())))
                .execute(conn)?;
        }
        DoctorChange::Clear => {
            diesel::update(appointments::table.find(appointment_id))
                .set(appointments::doctor_id.eq(None::<String>))
                .execute(conn)?;
        }
        DoctorChange::Keep => {}
    }

    // Booking-level bookkeeping: doctor flag and aggregate status.
    let doctors_present: i64 = appointments::table
        .filter(appointments::booking_id.eq(&appointment.booking_id))
        .filter(appointments::doctor_id.is_not_null())
        .count()
        .get_result(conn)?;

    let status_strings: Vec<String> = appointments::table
        .filter(appointments::booking_id.eq(&appointment.booking_id))
        .select(appointments::status)
        .load(conn)?;
    let statuses = status_strings
        .iter()
        .map(|s| AppointmentStatus::from_str(s))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(ValidationError::InvalidInput)?;
    let new_overall = aggregate_overall_status(&statuses);

    diesel::update(bookings::table.find(&appointment.booking_id))
        .set((
            bookings::doctor_assigned.eq(doctors_present > 0),
            bookings::updated_at.eq(now),
        ))
        .execute(conn)?;

    // Conditional write: only an actual change counts as a transition, which
    // is what keeps recomputation idempotent.
    let overall_changed = diesel::update(
        bookings::table
            .find(&appointment.booking_id)
            .filter(bookings::overall_status.ne(new_overall.as_str())),
    )
    .set(bookings::overall_status.eq(new_overall.as_str()))
    .execute(conn)?;

    let newly_completed = overall_changed > 0 && new_overall == OverallStatus::Completed;
    if newly_completed {
        outbox_repository::enqueue(
            conn,
            &NewOutboxEvent::booking_completed(&appointment.booking_id),
        )?;
    }

    let updated_row = appointments::table
        .find(appointment_id)
        .first::<AppointmentDB>(conn)?;
    Ok(TransitionOutcome {
        appointment: Appointment::try_from(updated_row)?,
        overall_status: new_overall,
        newly_completed,
    })
}
