pub(crate) mod appointments_errors;
pub(crate) mod appointments_model;
pub(crate) mod appointments_repository;
pub(crate) mod appointments_service;
pub(crate) mod appointments_traits;

pub use appointments_errors::AppointmentError;
pub use appointments_model::{
    Appointment, AppointmentDB, AppointmentStatus, DoctorChange, PlannedTransition,
    TransitionCommand, TransitionOutcome,
};
pub use appointments_repository::AppointmentRepository;
pub use appointments_service::AppointmentService;
pub use appointments_traits::{AppointmentRepositoryTrait, AppointmentServiceTrait};
