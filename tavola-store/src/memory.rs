use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use tavola_core::availability::find_conflict;
use tavola_core::{RepoError, RepoResult, Reservation, ReservationRepository, ReservationStatus, Schedule, SeatClaim};
use tavola_core::calendar::overlaps;
use tavola_order::recommend::{rank_combos, ComboCount};
use tavola_order::{Order, OrderRepository};

/// Process-local reservation store, used when no database is configured and
/// in tests. A single write lock covers the conflict check and the insert.
#[derive(Default)]
pub struct MemoryReservationRepository {
    rows: RwLock<Vec<Reservation>>,
}

impl MemoryReservationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReservationRepository for MemoryReservationRepository {
    async fn find_active_for_seat(&self, seat_id: &str, now: DateTime<Utc>) -> RepoResult<Vec<Reservation>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|r| r.seat_id == seat_id && r.is_active_at(now))
            .cloned()
            .collect())
    }

    async fn find_active_by_phone(
        &self,
        seat_id: &str,
        phone: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<Vec<Reservation>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|r| r.seat_id == seat_id && r.phone == phone && r.is_active_at(now))
            .cloned()
            .collect())
    }

    async fn list_active(&self, now: DateTime<Utc>) -> RepoResult<Vec<Reservation>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().filter(|r| r.is_active_at(now)).cloned().collect())
    }

    async fn list_by_dates(&self, dates: &[NaiveDate]) -> RepoResult<Vec<Reservation>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|r| {
                r.status.is_active() && r.schedule.as_ref().is_some_and(|s| dates.contains(&s.date))
            })
            .cloned()
            .collect())
    }

    async fn find_slot_conflicts(&self, seat_id: &str, schedule: &Schedule) -> RepoResult<Vec<Reservation>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|r| {
                r.seat_id == seat_id
                    && r.status.is_active()
                    && r.schedule.as_ref().is_some_and(|s| {
                        s.date == schedule.date
                            && overlaps(schedule.start_time, schedule.end_time, s.start_time, s.end_time)
                    })
            })
            .cloned()
            .collect())
    }

    async fn insert_unless_conflict(&self, reservation: &Reservation, claim: &SeatClaim) -> RepoResult<()> {
        let mut rows = self.rows.write().await;
        if let Some(existing) = find_conflict(claim, &reservation.seat_id, rows.iter()) {
            return Err(RepoError::Conflict(format!(
                "{} overlaps reservation {}",
                reservation.seat_id, existing.id
            )));
        }
        rows.push(reservation.clone());
        Ok(())
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: &[ReservationStatus],
        next: ReservationStatus,
        now: DateTime<Utc>,
    ) -> RepoResult<bool> {
        let mut rows = self.rows.write().await;
        match rows.iter_mut().find(|r| r.id == id) {
            Some(row) if expected.contains(&row.status) => {
                row.status = next;
                row.updated_at = now;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(RepoError::NotFound(id.to_string())),
        }
    }
}

/// Process-local order store.
#[derive(Default)]
pub struct MemoryOrderRepository {
    orders: RwLock<Vec<Order>>,
}

impl MemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn create_order(&self, order: &Order) -> RepoResult<()> {
        self.orders.write().await.push(order.clone());
        Ok(())
    }

    async fn combo_counts(&self, dish_id: &str, limit: usize) -> RepoResult<Vec<ComboCount>> {
        let orders = self.orders.read().await;
        Ok(rank_combos(orders.iter(), dish_id, limit))
    }
}
