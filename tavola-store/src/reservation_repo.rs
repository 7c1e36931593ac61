use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use tavola_core::availability::find_conflict;
use tavola_core::{RepoError, RepoResult, Reservation, ReservationRepository, ReservationStatus, Schedule, SeatClaim};

const COLUMNS: &str = "id, seat_id, first_name, last_name, phone, email, reserved_until, \
                       date, start_time, end_time, status, created_at, updated_at";

/// SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

pub struct PgReservationRepository {
    pool: PgPool,
}

impl PgReservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    seat_id: String,
    first_name: String,
    last_name: String,
    phone: String,
    email: Option<String>,
    reserved_until: DateTime<Utc>,
    date: Option<NaiveDate>,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = RepoError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<ReservationStatus>().map_err(backend)?;
        let schedule = match (row.date, row.start_time, row.end_time) {
            (Some(date), Some(start_time), Some(end_time)) => Some(Schedule {
                date,
                start_time,
                end_time,
            }),
            _ => None,
        };

        Ok(Reservation {
            id: row.id,
            seat_id: row.seat_id,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            email: row.email,
            reserved_until: row.reserved_until,
            schedule,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn backend<E>(err: E) -> RepoError
where
    E: std::error::Error + Send + Sync + 'static,
{
    RepoError::Backend(Box::new(err))
}

fn map_sqlx(err: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return RepoError::Conflict(db.message().to_string());
        }
    }
    backend(err)
}

fn into_reservations(rows: Vec<ReservationRow>) -> RepoResult<Vec<Reservation>> {
    rows.into_iter().map(Reservation::try_from).collect()
}

fn status_strings(statuses: &[ReservationStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

#[async_trait]
impl ReservationRepository for PgReservationRepository {
    async fn find_active_for_seat(&self, seat_id: &str, now: DateTime<Utc>) -> RepoResult<Vec<Reservation>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM reservations \
             WHERE seat_id = $1 AND status = ANY($2) AND reserved_until > $3"
        );
        let rows = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(seat_id)
            .bind(status_strings(&ReservationStatus::ACTIVE))
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        into_reservations(rows)
    }

    async fn find_active_by_phone(
        &self,
        seat_id: &str,
        phone: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<Vec<Reservation>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM reservations \
             WHERE seat_id = $1 AND phone = $2 AND status = ANY($3) AND reserved_until > $4 \
             ORDER BY reserved_until ASC"
        );
        let rows = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(seat_id)
            .bind(phone)
            .bind(status_strings(&ReservationStatus::ACTIVE))
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        into_reservations(rows)
    }

    async fn list_active(&self, now: DateTime<Utc>) -> RepoResult<Vec<Reservation>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM reservations \
             WHERE status = ANY($1) AND reserved_until > $2 ORDER BY seat_id"
        );
        let rows = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(status_strings(&ReservationStatus::ACTIVE))
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        into_reservations(rows)
    }

    async fn list_by_dates(&self, dates: &[NaiveDate]) -> RepoResult<Vec<Reservation>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM reservations \
             WHERE date = ANY($1) AND status = ANY($2) \
             ORDER BY date, start_time, seat_id"
        );
        let rows = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(dates.to_vec())
            .bind(status_strings(&ReservationStatus::ACTIVE))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        into_reservations(rows)
    }

    async fn find_slot_conflicts(&self, seat_id: &str, schedule: &Schedule) -> RepoResult<Vec<Reservation>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM reservations \
             WHERE seat_id = $1 AND date = $2 AND status = ANY($3) \
             AND start_time < $5 AND $4 < end_time"
        );
        let rows = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(seat_id)
            .bind(schedule.date)
            .bind(status_strings(&ReservationStatus::ACTIVE))
            .bind(schedule.start_time)
            .bind(schedule.end_time)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        into_reservations(rows)
    }

    async fn insert_unless_conflict(&self, reservation: &Reservation, claim: &SeatClaim) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        // Serializes writers on the same seat until commit/rollback.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&reservation.seat_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;

        let sql = format!(
            "SELECT {COLUMNS} FROM reservations \
             WHERE seat_id = $1 AND status = ANY($2) AND reserved_until > $3"
        );
        let candidates = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(&reservation.seat_id)
            .bind(status_strings(&ReservationStatus::ACTIVE))
            .bind(claim.horizon())
            .fetch_all(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        let candidates = into_reservations(candidates)?;

        if let Some(existing) = find_conflict(claim, &reservation.seat_id, candidates.iter()) {
            return Err(RepoError::Conflict(format!(
                "{} overlaps reservation {}",
                reservation.seat_id, existing.id
            )));
        }

        let schedule = reservation.schedule.as_ref();
        sqlx::query(
            r#"
            INSERT INTO reservations
                (id, seat_id, first_name, last_name, phone, email, reserved_until,
                 date, start_time, end_time, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(reservation.id)
        .bind(&reservation.seat_id)
        .bind(&reservation.first_name)
        .bind(&reservation.last_name)
        .bind(&reservation.phone)
        .bind(&reservation.email)
        .bind(reservation.reserved_until)
        .bind(schedule.map(|s| s.date))
        .bind(schedule.map(|s| s.start_time))
        .bind(schedule.map(|s| s.end_time))
        .bind(reservation.status.as_str())
        .bind(reservation.created_at)
        .bind(reservation.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        tx.commit().await.map_err(map_sqlx)?;
        Ok(())
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: &[ReservationStatus],
        next: ReservationStatus,
        now: DateTime<Utc>,
    ) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE reservations SET status = $1, updated_at = $2 WHERE id = $3 AND status = ANY($4)",
        )
        .bind(next.as_str())
        .bind(now)
        .bind(id)
        .bind(status_strings(expected))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        match exists {
            Some(_) => Ok(false),
            None => Err(RepoError::NotFound(id.to_string())),
        }
    }
}
