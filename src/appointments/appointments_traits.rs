use async_trait::async_trait;

use crate::errors::Result;
use crate::models::Paged;

use super::appointments_model::{Appointment, TransitionCommand, TransitionOutcome};

/// Trait defining the contract for Appointment repository operations.
#[async_trait]
pub trait AppointmentRepositoryTrait: Send + Sync {
    fn get_by_id(&self, appointment_id: &str) -> Result<Appointment>;

    /// A booking's doses ordered by dose number.
    fn list_by_booking(&self, booking_id: &str) -> Result<Vec<Appointment>>;

    fn list_by_center(&self, center_id: &str, page: i64, size: i64) -> Result<Paged<Appointment>>;

    fn list_by_doctor(&self, doctor_id: &str, page: i64, size: i64) -> Result<Paged<Appointment>>;

    /// Applies a lifecycle transition and the booking-level bookkeeping it
    /// entails (doctor flag, aggregate status, completion event) as one
    /// atomic unit.
    async fn apply_transition(
        &self,
        appointment_id: &str,
        command: TransitionCommand,
    ) -> Result<TransitionOutcome>;
}

/// Trait defining the contract for Appointment lifecycle operations.
#[async_trait]
pub trait AppointmentServiceTrait: Send + Sync {
    async fn assign(&self, appointment_id: &str, doctor_key: &str) -> Result<Appointment>;

    async fn confirm_acceptance(
        &self,
        appointment_id: &str,
        caller_doctor_key: &str,
    ) -> Result<Appointment>;

    async fn unassign(&self, appointment_id: &str) -> Result<Appointment>;

    async fn complete(&self, appointment_id: &str) -> Result<Appointment>;

    async fn cancel(&self, appointment_id: &str) -> Result<Appointment>;

    fn get_appointment(&self, appointment_id: &str) -> Result<Appointment>;

    fn list_by_booking(&self, booking_id: &str) -> Result<Vec<Appointment>>;

    fn center_schedule(&self, center_id: &str, page: i64, size: i64)
        -> Result<Paged<Appointment>>;

    fn doctor_schedule(
        &self,
        doctor_key: &str,
        page: i64,
        size: i64,
    ) -> Result<Paged<Appointment>>;
}
