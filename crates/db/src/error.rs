use std::time::Duration;

use bookings_core::error::CoreError;
use bookings_core::types::DbId;

/// PostgreSQL SQLSTATE for an exclusion constraint violation.
const EXCLUSION_VIOLATION: &str = "23P01";
/// PostgreSQL SQLSTATE for a foreign key violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";
/// PostgreSQL SQLSTATE for a unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Failure of a single store call.
///
/// `NotFound` is a domain outcome ("no such room"); `Timeout` and `Database`
/// are transport failures. Callers never retry any of them.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store call exceeded its {0:?} deadline")]
    Timeout(Duration),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Reclassify constraint violations as conflicts.
    pub fn classify(err: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some(EXCLUSION_VIOLATION) => {
                    return StoreError::Conflict(
                        "room is not available for these dates".into(),
                    );
                }
                Some(UNIQUE_VIOLATION) => {
                    let constraint = db_err.constraint().unwrap_or("unknown");
                    return StoreError::Conflict(format!("duplicate value ({constraint})"));
                }
                Some(FOREIGN_KEY_VIOLATION) => {
                    let constraint = db_err.constraint().unwrap_or("unknown");
                    return StoreError::Conflict(format!(
                        "referenced row does not exist ({constraint})"
                    ));
                }
                _ => {}
            }
        }
        StoreError::Database(err)
    }

    /// Whether the error came from the transport rather than the domain.
    pub fn is_transport(&self) -> bool {
        matches!(self, StoreError::Timeout(_) | StoreError::Database(_))
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            StoreError::Conflict(msg) => CoreError::Conflict(msg),
            other => CoreError::Internal(other.to_string()),
        }
    }
}
