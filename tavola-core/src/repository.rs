use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::availability::SeatClaim;
use crate::reservation::{Reservation, ReservationStatus, Schedule};

/// Storage failures, with the shapes the service knows how to map.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// The write would overlap an active reservation (conflict check or
    /// uniqueness constraint).
    #[error("Seat already taken: {0}")]
    Conflict(String),
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository trait for reservation data access.
///
/// Implementations must make `insert_unless_conflict` atomic per seat: the
/// conflict check and the insert cannot interleave with another write on the
/// same `seat_id`.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Active reservations on `seat_id` with `reserved_until > now`.
    async fn find_active_for_seat(
        &self,
        seat_id: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<Vec<Reservation>>;

    /// Active, unexpired reservations matching both seat and phone.
    async fn find_active_by_phone(
        &self,
        seat_id: &str,
        phone: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<Vec<Reservation>>;

    /// Every active, unexpired reservation, all seats.
    async fn list_active(&self, now: DateTime<Utc>) -> RepoResult<Vec<Reservation>>;

    /// Non-canceled scheduled reservations whose date is in `dates`.
    async fn list_by_dates(&self, dates: &[NaiveDate]) -> RepoResult<Vec<Reservation>>;

    /// Non-canceled scheduled reservations on `seat_id` for the schedule's
    /// date whose time window overlaps it.
    async fn find_slot_conflicts(
        &self,
        seat_id: &str,
        schedule: &Schedule,
    ) -> RepoResult<Vec<Reservation>>;

    /// Inserts `reservation` unless something on its seat blocks `claim`,
    /// in which case `RepoError::Conflict` is returned and nothing is written.
    async fn insert_unless_conflict(
        &self,
        reservation: &Reservation,
        claim: &SeatClaim,
    ) -> RepoResult<()>;

    /// Compare-and-set on status: only applies when the current status is in
    /// `expected`. Returns whether the row changed.
    async fn update_status(
        &self,
        id: Uuid,
        expected: &[ReservationStatus],
        next: ReservationStatus,
        now: DateTime<Utc>,
    ) -> RepoResult<bool>;
}
