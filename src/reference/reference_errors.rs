use diesel::result::Error as DieselError;
use thiserror::Error;

/// Errors raised while resolving reference data (vaccines, centers, users)
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DieselError> for ReferenceError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => ReferenceError::NotFound("Record not found".to_string()),
            _ => ReferenceError::DatabaseError(err.to_string()),
        }
    }
}
