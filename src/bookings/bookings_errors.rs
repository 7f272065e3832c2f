use diesel::result::Error as DieselError;
use thiserror::Error;

/// Custom error type for booking operations
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DieselError> for BookingError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => BookingError::NotFound("Record not found".to_string()),
            _ => BookingError::DatabaseError(err.to_string()),
        }
    }
}
