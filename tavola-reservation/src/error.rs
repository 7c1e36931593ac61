use tavola_core::{CoreError, RepoError};

/// Failures of reservation operations, one variant per HTTP outcome.
#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    /// Missing or malformed input; nothing was read or written.
    #[error("{0}")]
    Validation(String),

    /// Seat or slot already taken.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Reservation storage failed: {0}")]
    Unexpected(#[source] RepoError),
}

impl From<CoreError> for ReservationError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(msg) => ReservationError::Validation(msg),
        }
    }
}

impl From<RepoError> for ReservationError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Conflict(msg) => ReservationError::Conflict(msg),
            RepoError::NotFound(msg) => ReservationError::NotFound(msg),
            other => ReservationError::Unexpected(other),
        }
    }
}
