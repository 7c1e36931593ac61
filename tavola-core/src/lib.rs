pub mod availability;
pub mod calendar;
pub mod clock;
pub mod repository;
pub mod reservation;
pub mod validation;

pub use availability::SeatClaim;
pub use clock::{Clock, FixedClock, SystemClock};
pub use repository::{RepoError, RepoResult, ReservationRepository};
pub use reservation::{Reservation, ReservationStatus, Schedule};
pub use validation::CustomerDetails;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
