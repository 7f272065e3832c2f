use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::appointments::{Appointment, AppointmentStatus};
use crate::errors::{Error, Result, ValidationError};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// Administrative/payment state of a booking, opaque to this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            _ => Err(format!("Unknown booking status: {}", s)),
        }
    }
}

/// Booking-level status derived from the appointment status multiset.
/// Written exclusively by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    Pending,
    Assigned,
    Progress,
    Completed,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Pending => "PENDING",
            OverallStatus::Assigned => "ASSIGNED",
            OverallStatus::Progress => "PROGRESS",
            OverallStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverallStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OverallStatus::Pending),
            "ASSIGNED" => Ok(OverallStatus::Assigned),
            "PROGRESS" => Ok(OverallStatus::Progress),
            "COMPLETED" => Ok(OverallStatus::Completed),
            _ => Err(format!("Unknown overall status: {}", s)),
        }
    }
}

/// Outcome of the best-effort ledger mirror of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerMirrorStatus {
    Pending,
    Confirmed,
    Skipped,
    Failed,
}

impl LedgerMirrorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerMirrorStatus::Pending => "PENDING",
            LedgerMirrorStatus::Confirmed => "CONFIRMED",
            LedgerMirrorStatus::Skipped => "SKIPPED",
            LedgerMirrorStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for LedgerMirrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedgerMirrorStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(LedgerMirrorStatus::Pending),
            "CONFIRMED" => Ok(LedgerMirrorStatus::Confirmed),
            "SKIPPED" => Ok(LedgerMirrorStatus::Skipped),
            "FAILED" => Ok(LedgerMirrorStatus::Failed),
            _ => Err(format!("Unknown ledger status: {}", s)),
        }
    }
}

/// Domain model for a multi-dose vaccination booking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub patient_id: String,
    pub vaccine_id: String,
    pub center_id: String,
    pub first_dose_date: String,
    pub first_dose_time: String,
    pub total_doses: i32,
    pub total_amount: f64,
    pub status: BookingStatus,
    pub overall_status: OverallStatus,
    pub doctor_assigned: bool,
    pub ledger_tx_hash: Option<String>,
    pub ledger_appointment_id: Option<String>,
    pub ledger_status: LedgerMirrorStatus,
    pub certificate_token_id: Option<String>,
    pub certificate_tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_claimed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Schedule entry for one follow-up dose
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseSchedule {
    pub date: String,
    pub time: String,
    /// Overrides the booking's center for this dose when set.
    pub center_id: Option<String>,
}

/// Input model for creating a booking with its full dose set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub patient_id: String,
    pub vaccine_id: String,
    pub center_id: String,
    pub first_dose_date: String,
    pub first_dose_time: String,
    #[serde(default)]
    pub dose_schedules: Vec<DoseSchedule>,
    pub amount: f64,
}

fn validate_date(value: &str, field: &str) -> Result<()> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
        Error::Validation(ValidationError::InvalidInput(format!(
            "{} must be a {} date, got '{}'",
            field, DATE_FORMAT, value
        )))
    })?;
    Ok(())
}

fn validate_time(value: &str, field: &str) -> Result<()> {
    NaiveTime::parse_from_str(value, TIME_FORMAT).map_err(|_| {
        Error::Validation(ValidationError::InvalidInput(format!(
            "{} must be a {} time, got '{}'",
            field, TIME_FORMAT, value
        )))
    })?;
    Ok(())
}

impl NewBooking {
    /// Validates the new booking data
    pub fn validate(&self) -> Result<()> {
        if self.patient_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "patientId".to_string(),
            )));
        }
        if self.vaccine_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "vaccineId".to_string(),
            )));
        }
        if self.center_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "centerId".to_string(),
            )));
        }
        if self.amount < 0.0 || !self.amount.is_finite() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Amount must be a non-negative number".to_string(),
            )));
        }
        validate_date(&self.first_dose_date, "firstDoseDate")?;
        validate_time(&self.first_dose_time, "firstDoseTime")?;
        for (i, schedule) in self.dose_schedules.iter().enumerate() {
            let dose = i + 2;
            validate_date(&schedule.date, &format!("doseSchedules[{}].date", dose))?;
            validate_time(&schedule.time, &format!("doseSchedules[{}].time", dose))?;
        }
        Ok(())
    }

    pub fn total_doses(&self) -> i32 {
        self.dose_schedules.len() as i32 + 1
    }
}

/// Targeted update of the ledger-mirror fields
#[derive(Debug, Clone)]
pub struct LedgerMirrorUpdate {
    pub status: LedgerMirrorStatus,
    pub tx_hash: Option<String>,
    pub appointment_id: Option<String>,
}

/// Terminal outcome of one mirror attempt
#[derive(Debug, Clone, PartialEq)]
pub enum MirrorOutcome {
    Confirmed,
    Skipped(String),
}

/// Database model for bookings
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::bookings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BookingDB {
    pub id: String,
    pub patient_id: String,
    pub vaccine_id: String,
    pub center_id: String,
    pub first_dose_date: String,
    pub first_dose_time: String,
    pub total_doses: i32,
    pub total_amount: f64,
    pub status: String,
    pub overall_status: String,
    pub doctor_assigned: bool,
    pub ledger_tx_hash: Option<String>,
    pub ledger_appointment_id: Option<String>,
    pub ledger_status: String,
    pub certificate_token_id: Option<String>,
    pub certificate_tx_hash: Option<String>,
    pub certificate_claimed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl BookingDB {
    /// Builds a fresh PENDING booking row for creation.
    pub fn pending(new_booking: &NewBooking, patient_id: &str, overall: OverallStatus) -> Self {
        let now = chrono::Utc::now().naive_utc();
        BookingDB {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id: patient_id.to_string(),
            vaccine_id: new_booking.vaccine_id.clone(),
            center_id: new_booking.center_id.clone(),
            first_dose_date: new_booking.first_dose_date.clone(),
            first_dose_time: new_booking.first_dose_time.clone(),
            total_doses: new_booking.total_doses(),
            total_amount: new_booking.amount,
            status: BookingStatus::Pending.as_str().to_string(),
            overall_status: overall.as_str().to_string(),
            doctor_assigned: false,
            ledger_tx_hash: None,
            ledger_appointment_id: None,
            ledger_status: LedgerMirrorStatus::Pending.as_str().to_string(),
            certificate_token_id: None,
            certificate_tx_hash: None,
            certificate_claimed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl TryFrom<BookingDB> for Booking {
    type Error = Error;

    fn try_from(db: BookingDB) -> std::result::Result<Self, Self::Error> {
        let status =
            BookingStatus::from_str(&db.status).map_err(ValidationError::InvalidInput)?;
        let overall_status =
            OverallStatus::from_str(&db.overall_status).map_err(ValidationError::InvalidInput)?;
        let ledger_status =
            LedgerMirrorStatus::from_str(&db.ledger_status).map_err(ValidationError::InvalidInput)?;
        Ok(Booking {
            id: db.id,
            patient_id: db.patient_id,
            vaccine_id: db.vaccine_id,
            center_id: db.center_id,
            first_dose_date: db.first_dose_date,
            first_dose_time: db.first_dose_time,
            total_doses: db.total_doses,
            total_amount: db.total_amount,
            status,
            overall_status,
            doctor_assigned: db.doctor_assigned,
            ledger_tx_hash: db.ledger_tx_hash,
            ledger_appointment_id: db.ledger_appointment_id,
            ledger_status,
            certificate_token_id: db.certificate_token_id,
            certificate_tx_hash: db.certificate_tx_hash,
            certificate_claimed_at: db.certificate_claimed_at,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

/// Per-dose progress block of the booking summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingProgress {
    pub total_doses: i32,
    pub completed_doses: i32,
    pub percent_complete: i32,
    pub next_dose: Option<i32>,
}

/// Condensed appointment view embedded in the booking summary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentBrief {
    pub id: String,
    pub dose_number: i32,
    pub date: String,
    pub time: String,
    pub status: AppointmentStatus,
    pub doctor_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerMirrorView {
    pub tx_hash: Option<String>,
    pub appointment_id: Option<String>,
    pub status: LedgerMirrorStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateView {
    pub token_id: Option<String>,
    pub tx_hash: Option<String>,
}

/// The booking payload returned to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    pub booking_id: String,
    pub total_doses: i32,
    pub overall_status: OverallStatus,
    pub progress: BookingProgress,
    pub appointments: Vec<AppointmentBrief>,
    pub ledger: LedgerMirrorView,
    pub certificate: CertificateView,
}

impl BookingSummary {
    /// Assembles the caller-facing summary from a booking and its doses.
    pub fn from_parts(booking: &Booking, appointments: &[Appointment]) -> Self {
        let mut doses: Vec<&Appointment> = appointments.iter().collect();
        doses.sort_by_key(|a| a.dose_number);

        let completed_doses = doses
            .iter()
            .filter(|a| a.status == AppointmentStatus::Completed)
            .count() as i32;
        let percent_complete = if booking.total_doses > 0 {
            completed_doses * 100 / booking.total_doses
        } else {
            0
        };
        let next_dose = doses
            .iter()
            .filter(|a| !a.status.is_terminal())
            .map(|a| a.dose_number)
            .min();

        BookingSummary {
            booking_id: booking.id.clone(),
            total_doses: booking.total_doses,
            overall_status: booking.overall_status,
            progress: BookingProgress {
                total_doses: booking.total_doses,
                completed_doses,
                percent_complete,
                next_dose,
            },
            appointments: doses
                .into_iter()
                .map(|a| AppointmentBrief {
                    id: a.id.clone(),
                    dose_number: a.dose_number,
                    date: a.appointment_date.clone(),
                    time: a.appointment_time.clone(),
                    status: a.status,
                    doctor_id: a.doctor_id.clone(),
                })
                .collect(),
            ledger: LedgerMirrorView {
                tx_hash: booking.ledger_tx_hash.clone(),
                appointment_id: booking.ledger_appointment_id.clone(),
                status: booking.ledger_status,
            },
            certificate: CertificateView {
                token_id: booking.certificate_token_id.clone(),
                tx_hash: booking.certificate_tx_hash.clone(),
            },
        }
    }
}
