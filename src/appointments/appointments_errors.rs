use diesel::result::Error as DieselError;
use thiserror::Error;

/// Custom error type for appointment lifecycle operations
#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DieselError> for AppointmentError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => AppointmentError::NotFound("Record not found".to_string()),
            _ => AppointmentError::DatabaseError(err.to_string()),
        }
    }
}
