use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::bookings::OverallStatus;
use crate::errors::{Error, ValidationError};

use super::appointments_errors::AppointmentError;

/// Lifecycle states of a single dose appointment.
///
/// SCHEDULED is the initial state; COMPLETED and CANCELLED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    Assigned,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "SCHEDULED",
            AppointmentStatus::Assigned => "ASSIGNED",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled
        )
    }

    /// Whether an appointment in this state may carry a doctor reference.
    pub fn holds_doctor(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Assigned
                | AppointmentStatus::Confirmed
                | AppointmentStatus::Completed
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SCHEDULED" => Ok(AppointmentStatus::Scheduled),
            "ASSIGNED" => Ok(AppointmentStatus::Assigned),
            "CONFIRMED" => Ok(AppointmentStatus::Confirmed),
            "COMPLETED" => Ok(AppointmentStatus::Completed),
            "CANCELLED" => Ok(AppointmentStatus::Cancelled),
            _ => Err(format!("Unknown appointment status: {}", s)),
        }
    }
}

/// Domain model for one dose appointment within a booking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub booking_id: String,
    pub center_id: String,
    pub dose_number: i32,
    pub appointment_date: String,
    pub appointment_time: String,
    pub status: AppointmentStatus,
    pub doctor_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Lifecycle operations requested against an appointment
#[derive(Debug, Clone)]
pub enum TransitionCommand {
    Assign { doctor_id: String },
    ConfirmAcceptance { caller_doctor_id: String },
    Unassign,
    Complete,
    Cancel,
}

/// Doctor-reference change carried by a planned transition
#[derive(Debug, Clone, PartialEq)]
pub enum DoctorChange {
    Keep,
    Set(String),
    Clear,
}

/// The effect of a legal transition, ready to be applied
#[derive(Debug, Clone)]
pub struct PlannedTransition {
    pub new_status: AppointmentStatus,
    pub doctor_change: DoctorChange,
}

/// Result of an applied transition, including the booking-level outcome
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub appointment: Appointment,
    pub overall_status: OverallStatus,
    pub newly_completed: bool,
}

impl Appointment {
    /// Decides whether `command` is legal from the current state and what it
    /// changes. Pure; the repository applies the result inside a transaction.
    pub fn plan_transition(
        &self,
        command: &TransitionCommand,
    ) -> Result<PlannedTransition, AppointmentError> {
        match command {
            TransitionCommand::Assign { doctor_id } => match self.status {
                AppointmentStatus::Scheduled => Ok(PlannedTransition {
                    new_status: AppointmentStatus::Assigned,
                    doctor_change: DoctorChange::Set(doctor_id.clone()),
                }),
                AppointmentStatus::Assigned | AppointmentStatus::Confirmed => {
                    Err(AppointmentError::InvalidTransition(format!(
                        "Appointment {} is already assigned to doctor {}",
                        self.id,
                        self.doctor_id.as_deref().unwrap_or("unknown")
                    )))
                }
                AppointmentStatus::Completed | AppointmentStatus::Cancelled => {
                    Err(AppointmentError::InvalidTransition(format!(
                        "Cannot assign a doctor to a {} appointment",
                        self.status
                    )))
                }
            },
            TransitionCommand::ConfirmAcceptance { caller_doctor_id } => {
                if self.status != AppointmentStatus::Assigned {
                    return Err(AppointmentError::InvalidTransition(format!(
                        "Appointment {} must be ASSIGNED before acceptance, current status is {}",
                        self.id, self.status
                    )));
                }
                if self.doctor_id.as_deref() != Some(caller_doctor_id.as_str()) {
                    return Err(AppointmentError::Unauthorized(format!(
                        "Doctor {} is not assigned to appointment {}",
                        caller_doctor_id, self.id
                    )));
                }
                Ok(PlannedTransition {
                    new_status: AppointmentStatus::Confirmed,
                    doctor_change: DoctorChange::Keep,
                })
            }
            TransitionCommand::Unassign => match self.status {
                AppointmentStatus::Assigned => Ok(PlannedTransition {
                    new_status: AppointmentStatus::Scheduled,
                    doctor_change: DoctorChange::Clear,
                }),
                AppointmentStatus::Scheduled => Err(AppointmentError::InvalidTransition(format!(
                    "Appointment {} has no doctor assigned",
                    self.id
                ))),
                _ => Err(AppointmentError::InvalidTransition(format!(
                    "Cannot unassign a {} appointment",
                    self.status
                ))),
            },
            TransitionCommand::Complete => match self.status {
                AppointmentStatus::Confirmed => Ok(PlannedTransition {
                    new_status: AppointmentStatus::Completed,
                    doctor_change: DoctorChange::Keep,
                }),
                _ => Err(AppointmentError::InvalidTransition(format!(
                    "Appointment {} must be CONFIRMED first, current status is {}",
                    self.id, self.status
                ))),
            },
            TransitionCommand::Cancel => {
                if self.status.is_terminal() {
                    return Err(AppointmentError::InvalidTransition(format!(
                        "Appointment {} is already {}",
                        self.id, self.status
                    )));
                }
                Ok(PlannedTransition {
                    new_status: AppointmentStatus::Cancelled,
                    doctor_change: DoctorChange::Clear,
                })
            }
        }
    }
}

/// Database model for appointments
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
#[diesel(table_name = crate::schema::appointments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AppointmentDB {
    pub id: String,
    pub booking_id: String,
    pub center_id: String,
    pub dose_number: i32,
    pub appointment_date: String,
    pub appointment_time: String,
    pub status: String,
    pub doctor_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl AppointmentDB {
    /// Builds a fresh SCHEDULED dose row for booking creation.
    pub fn scheduled(
        booking_id: &str,
        center_id: &str,
        dose_number: i32,
        date: &str,
        time: &str,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        AppointmentDB {
            id: uuid::Uuid::new_v4().to_string(),
            booking_id: booking_id.to_string(),
            center_id: center_id.to_string(),
            dose_number,
            appointment_date: date.to_string(),
            appointment_time: time.to_string(),
            status: AppointmentStatus::Scheduled.as_str().to_string(),
            doctor_id: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl TryFrom<AppointmentDB> for Appointment {
    type Error = Error;

    fn try_from(db: AppointmentDB) -> Result<Self, Self::Error> {
        let status = AppointmentStatus::from_str(&db.status)
            .map_err(ValidationError::InvalidInput)?;
        Ok(Appointment {
            id: db.id,
            booking_id: db.booking_id,
            center_id: db.center_id,
            dose_number: db.dose_number,
            appointment_date: db.appointment_date,
            appointment_time: db.appointment_time,
            status,
            doctor_id: db.doctor_id,
            notes: db.notes,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}
