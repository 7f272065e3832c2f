use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;

use crate::errors::Result;
use crate::models::Paged;
use crate::reference::ReferenceLookupTrait;

use super::appointments_model::{Appointment, TransitionCommand};
use super::appointments_traits::{AppointmentRepositoryTrait, AppointmentServiceTrait};

/// Service driving the appointment lifecycle state machine.
pub struct AppointmentService<R, L>
where
    R: AppointmentRepositoryTrait,
    L: ReferenceLookupTrait,
{
    repo: Arc<R>,
    reference: Arc<L>,
}

impl<R, L> AppointmentService<R, L>
where
    R: AppointmentRepositoryTrait,
    L: ReferenceLookupTrait,
{
    pub fn new(repo: Arc<R>, reference: Arc<L>) -> Self {
        AppointmentService { repo, reference }
    }
}

#[async_trait]
impl<R, L> AppointmentServiceTrait for AppointmentService<R, L>
where
    R: AppointmentRepositoryTrait,
    L: ReferenceLookupTrait,
{
    async fn assign(&self, appointment_id: &str, doctor_key: &str) -> Result<Appointment> {
        let doctor = self.reference.get_user(doctor_key)?;
        debug!(
            "Assigning doctor {} to appointment {}",
            doctor.id, appointment_id
        );
        let outcome = self
            .repo
            .apply_transition(
                appointment_id,
                TransitionCommand::Assign {
                    doctor_id: doctor.id,
                },
            )
            .await?;
        Ok(outcome.appointment)
    }

    async fn confirm_acceptance(
        &self,
        appointment_id: &str,
        caller_doctor_key: &str,
    ) -> Result<Appointment> {
        let caller = self.reference.get_user(caller_doctor_key)?;
        let outcome = self
            .repo
            .apply_transition(
                appointment_id,
                TransitionCommand::ConfirmAcceptance {
                    caller_doctor_id: caller.id,
                },
            )
            .await?;
        Ok(outcome.appointment)
    }

    async fn unassign(&self, appointment_id: &str) -> Result<Appointment> {
        let outcome = self
            .repo
            .apply_transition(appointment_id, TransitionCommand::Unassign)
            .await?;
        Ok(outcome.appointment)
    }

    async fn complete(&self, appointment_id: &str) -> Result<Appointment> {
        let outcome = self
            .repo
            .apply_transition(appointment_id, TransitionCommand::Complete)
            .await?;
        if outcome.newly_completed {
            info!(
                "Booking {} completed its final dose, certificate issuance queued",
                outcome.appointment.booking_id
            );
        }
        Ok(outcome.appointment)
    }

    async fn cancel(&self, appointment_id: &str) -> Result<Appointment> {
        let outcome = self
            .repo
            .apply_transition(appointment_id, TransitionCommand::Cancel)
            .await?;
        Ok(outcome.appointment)
    }

    fn get_appointment(&self, appointment_id: &str) -> Result<Appointment> {
        self.repo.get_by_id(appointment_id)
    }

    fn list_by_booking(&self, booking_id: &str) -> Result<Vec<Appointment>> {
        self.repo.list_by_booking(booking_id)
    }

    fn center_schedule(
        &self,
        center_id: &str,
        page: i64,
        size: i64,
    ) -> Result<Paged<Appointment>> {
        self.repo.list_by_center(center_id, page, size)
    }

    fn doctor_schedule(
        &self,
        doctor_key: &str,
        page: i64,
        size: i64,
    ) -> Result<Paged<Appointment>> {
        let doctor = self.reference.get_user(doctor_key)?;
        self.repo.list_by_doctor(&doctor.id, page, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointments::appointments_errors::AppointmentError;
    use crate::appointments::appointments_model::{
        AppointmentStatus, DoctorChange, TransitionOutcome,
    };
    use crate::bookings::{aggregate_overall_status, OverallStatus};
    use crate::errors::Error;
    use crate::models::{PageMeta, Paged};
    use crate::reference::{Center, ReferenceError, User, Vaccine};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct InMemoryState {
        appointments: HashMap<String, Appointment>,
        overall: HashMap<String, OverallStatus>,
        completion_events: Vec<String>,
    }

    struct MockAppointmentRepository {
        state: Mutex<InMemoryState>,
    }

    impl MockAppointmentRepository {
        fn with_booking(booking_id: &str, doses: i32) -> Self {
            let now = chrono::Utc::now().naive_utc();
            let mut appointments = HashMap::new();
            for dose in 1..=doses {
                let id = format!("appt-{}", dose);
                appointments.insert(
                    id.clone(),
                    Appointment {
                        id,
                        booking_id: booking_id.to_string(),
                        center_id: "center-1".to_string(),
                        dose_number: dose,
                        appointment_date: "2026-03-01".to_string(),
                        appointment_time: "09:00".to_string(),
                        status: AppointmentStatus::Scheduled,
                        doctor_id: None,
                        notes: None,
                        created_at: now,
                        updated_at: now,
                    },
                );
            }
            let mut overall = HashMap::new();
            overall.insert(booking_id.to_string(), OverallStatus::Pending);
            MockAppointmentRepository {
                state: Mutex::new(InMemoryState {
                    appointments,
                    overall,
                    completion_events: Vec::new(),
                }),
            }
        }

        fn status_of(&self, id: &str) -> AppointmentStatus {
            self.state.lock().unwrap().appointments[id].status
        }

        fn doctor_of(&self, id: &str) -> Option<String> {
            self.state.lock().unwrap().appointments[id].doctor_id.clone()
        }

        fn overall_of(&self, booking_id: &str) -> OverallStatus {
            self.state.lock().unwrap().overall[booking_id]
        }

        fn completion_events(&self) -> Vec<String> {
            self.state.lock().unwrap().completion_events.clone()
        }
    }

    #[async_trait]
    impl AppointmentRepositoryTrait for MockAppointmentRepository {
        fn get_by_id(&self, appointment_id: &str) -> Result<Appointment> {
            self.state
                .lock()
                .unwrap()
                .appointments
                .get(appointment_id)
                .cloned()
                .ok_or_else(|| {
                    Error::Appointment(AppointmentError::NotFound(format!(
                        "Appointment with id {} not found",
                        appointment_id
                    )))
                })
        }

        fn list_by_booking(&self, booking_id: &str) -> Result<Vec<Appointment>> {
            let mut doses: Vec<Appointment> = self
                .state
                .lock()
                .unwrap()
                .appointments
                .values()
                .filter(|a| a.booking_id == booking_id)
                .cloned()
                .collect();
            doses.sort_by_key(|a| a.dose_number);
            Ok(doses)
        }

        fn list_by_center(
            &self,
            center_id: &str,
            page: i64,
            size: i64,
        ) -> Result<Paged<Appointment>> {
            let result: Vec<Appointment> = self
                .state
                .lock()
                .unwrap()
                .appointments
                .values()
                .filter(|a| a.center_id == center_id)
                .cloned()
                .collect();
            let total = result.len() as i64;
            Ok(Paged {
                result,
                meta: PageMeta::new(page, size, total),
            })
        }

        fn list_by_doctor(
            &self,
            doctor_id: &str,
            page: i64,
            size: i64,
        ) -> Result<Paged<Appointment>> {
            let result: Vec<Appointment> = self
                .state
                .lock()
                .unwrap()
                .appointments
                .values()
                .filter(|a| a.doctor_id.as_deref() == Some(doctor_id))
                .cloned()
                .collect();
            let total = result.len() as i64;
            Ok(Paged {
                result,
                meta: PageMeta::new(page, size, total),
            })
        }

        async fn apply_transition(
            &self,
            appointment_id: &str,
            command: TransitionCommand,
        ) -> Result<TransitionOutcome> {
            let mut state = self.state.lock().unwrap();
            let appointment = state
                .appointments
                .get(appointment_id)
                .cloned()
                .ok_or_else(|| {
                    Error::Appointment(AppointmentError::NotFound(format!(
                        "Appointment with id {} not found",
                        appointment_id
                    )))
                })?;

            let plan = appointment.plan_transition(&command)?;
            let mut updated = appointment.clone();
            updated.status = plan.new_status;
            match plan.doctor_change {
                DoctorChange::Set(doctor) => updated.doctor_id = Some(doctor),
                DoctorChange::Clear => updated.doctor_id = None,
                DoctorChange::Keep => {}
            }
            state
                .appointments
                .insert(appointment_id.to_string(), updated.clone());

            let statuses: Vec<AppointmentStatus> = state
                .appointments
                .values()
                .filter(|a| a.booking_id == appointment.booking_id)
                .map(|a| a.status)
                .collect();
            let new_overall = aggregate_overall_status(&statuses);
            let old_overall = state
                .overall
                .insert(appointment.booking_id.clone(), new_overall)
                .unwrap_or(OverallStatus::Pending);
            let newly_completed =
                new_overall == OverallStatus::Completed && old_overall != OverallStatus::Completed;
            if newly_completed {
                state.completion_events.push(appointment.booking_id.clone());
            }

            Ok(TransitionOutcome {
                appointment: updated,
                overall_status: new_overall,
                newly_completed,
            })
        }
    }

    struct MockReference {
        users: HashMap<String, User>,
    }

    impl MockReference {
        fn with_doctors(ids: &[&str]) -> Self {
            let now = chrono::Utc::now().naive_utc();
            let users = ids
                .iter()
                .map(|id| {
                    (
                        id.to_string(),
                        User {
                            id: id.to_string(),
                            full_name: format!("Dr. {}", id),
                            email: Some(format!("{}@clinic.test", id)),
                            wallet_address: None,
                            created_at: now,
                        },
                    )
                })
                .collect();
            MockReference { users }
        }
    }

    impl ReferenceLookupTrait for MockReference {
        fn get_vaccine(&self, vaccine_id: &str) -> Result<Vaccine> {
            Err(ReferenceError::NotFound(format!("Vaccine {}", vaccine_id)).into())
        }

        fn get_center(&self, center_id: &str) -> Result<Center> {
            Err(ReferenceError::NotFound(format!("Center {}", center_id)).into())
        }

        fn get_user(&self, key: &str) -> Result<User> {
            self.users
                .get(key)
                .cloned()
                .ok_or_else(|| ReferenceError::NotFound(format!("User {} not found", key)).into())
        }

        fn get_linked_address(&self, _user_id: &str) -> Result<Option<String>> {
            Ok(None)
        }
    }

    fn service(
        repo: Arc<MockAppointmentRepository>,
    ) -> AppointmentService<MockAppointmentRepository, MockReference> {
        AppointmentService::new(repo, Arc::new(MockReference::with_doctors(&["doc-a", "doc-b"])))
    }

    #[tokio::test]
    async fn two_dose_course_completes_booking_and_emits_one_event() {
        let repo = Arc::new(MockAppointmentRepository::with_booking("booking-1", 2));
        let service = service(repo.clone());

        service.assign("appt-1", "doc-a").await.unwrap();
        service.confirm_acceptance("appt-1", "doc-a").await.unwrap();
        service.complete("appt-1").await.unwrap();

        // second dose still scheduled, so the booking is in progress
        assert_eq!(repo.overall_of("booking-1"), OverallStatus::Progress);
        assert_eq!(repo.status_of("appt-2"), AppointmentStatus::Scheduled);
        assert!(repo.completion_events().is_empty());

        service.assign("appt-2", "doc-b").await.unwrap();
        service.confirm_acceptance("appt-2", "doc-b").await.unwrap();
        service.complete("appt-2").await.unwrap();

        assert_eq!(repo.overall_of("booking-1"), OverallStatus::Completed);
        assert_eq!(repo.completion_events(), vec!["booking-1".to_string()]);

        // completing again cannot re-emit
        let err = service.complete("appt-2").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Appointment(AppointmentError::InvalidTransition(_))
        ));
        assert_eq!(repo.completion_events().len(), 1);
    }

    #[tokio::test]
    async fn assign_on_already_assigned_appointment_changes_nothing() {
        let repo = Arc::new(MockAppointmentRepository::with_booking("booking-1", 1));
        let service = service(repo.clone());

        service.assign("appt-1", "doc-b").await.unwrap();
        let err = service.assign("appt-1", "doc-a").await.unwrap_err();
        match err {
            Error::Appointment(AppointmentError::InvalidTransition(msg)) => {
                assert!(msg.contains("doc-b"))
            }
            other => panic!("expected InvalidTransition, got {:?}", other),
        }

        assert_eq!(repo.doctor_of("appt-1"), Some("doc-b".to_string()));
        assert_eq!(repo.status_of("appt-1"), AppointmentStatus::Assigned);
    }

    #[tokio::test]
    async fn confirm_by_other_doctor_is_unauthorized() {
        let repo = Arc::new(MockAppointmentRepository::with_booking("booking-1", 1));
        let service = service(repo.clone());

        service.assign("appt-1", "doc-b").await.unwrap();
        let err = service
            .confirm_acceptance("appt-1", "doc-a")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Appointment(AppointmentError::Unauthorized(_))
        ));
        assert_eq!(repo.status_of("appt-1"), AppointmentStatus::Assigned);
    }

    #[tokio::test]
    async fn unassign_returns_to_scheduled_and_leaves_siblings_alone() {
        let repo = Arc::new(MockAppointmentRepository::with_booking("booking-1", 2));
        let service = service(repo.clone());

        service.assign("appt-1", "doc-a").await.unwrap();
        service.assign("appt-2", "doc-b").await.unwrap();
        let appointment = service.unassign("appt-1").await.unwrap();

        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        assert_eq!(appointment.doctor_id, None);
        assert_eq!(repo.status_of("appt-2"), AppointmentStatus::Assigned);
        assert_eq!(repo.doctor_of("appt-2"), Some("doc-b".to_string()));
        assert_eq!(repo.overall_of("booking-1"), OverallStatus::Assigned);
    }

    #[tokio::test]
    async fn cancelled_dose_does_not_block_completion() {
        let repo = Arc::new(MockAppointmentRepository::with_booking("booking-1", 2));
        let service = service(repo.clone());

        service.cancel("appt-2").await.unwrap();
        service.assign("appt-1", "doc-a").await.unwrap();
        service.confirm_acceptance("appt-1", "doc-a").await.unwrap();
        service.complete("appt-1").await.unwrap();

        assert_eq!(repo.overall_of("booking-1"), OverallStatus::Completed);
        assert_eq!(repo.completion_events().len(), 1);
    }

    #[tokio::test]
    async fn assign_with_unknown_doctor_fails_not_found() {
        let repo = Arc::new(MockAppointmentRepository::with_booking("booking-1", 1));
        let service = service(repo.clone());

        let err = service.assign("appt-1", "doc-x").await.unwrap_err();
        assert!(matches!(err, Error::Reference(ReferenceError::NotFound(_))));
        assert_eq!(repo.status_of("appt-1"), AppointmentStatus::Scheduled);
    }
}
