pub(crate) mod bookings_aggregate;
pub(crate) mod bookings_errors;
pub(crate) mod bookings_model;
pub(crate) mod bookings_repository;
pub(crate) mod bookings_service;
pub(crate) mod bookings_traits;

pub use bookings_aggregate::aggregate_overall_status;
pub use bookings_errors::BookingError;
pub use bookings_model::{
    AppointmentBrief, Booking, BookingDB, BookingProgress, BookingStatus, BookingSummary,
    CertificateView, DoseSchedule, LedgerMirrorStatus, LedgerMirrorUpdate, LedgerMirrorView,
    MirrorOutcome, NewBooking, OverallStatus,
};
pub use bookings_repository::BookingRepository;
pub use bookings_service::BookingService;
pub use bookings_traits::{BookingRepositoryTrait, BookingServiceTrait, LedgerMirrorTrait};
