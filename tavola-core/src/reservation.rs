use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::calendar::{hhmm, local_instant};
use crate::validation::CustomerDetails;
use crate::{CoreError, CoreResult};

/// Reservation status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Created by both hold-now and book.
    Held,
    /// Reachable only through an external confirmation step; no operation
    /// assigns it yet.
    Confirmed,
    Canceled,
}

impl ReservationStatus {
    pub const ALL: [ReservationStatus; 3] = [
        ReservationStatus::Held,
        ReservationStatus::Confirmed,
        ReservationStatus::Canceled,
    ];

    /// Statuses that occupy a seat.
    pub const ACTIVE: [ReservationStatus; 2] = [ReservationStatus::Held, ReservationStatus::Confirmed];

    pub fn is_active(self) -> bool {
        matches!(self, ReservationStatus::Held | ReservationStatus::Confirmed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Held => "held",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Canceled => "canceled",
        }
    }

    /// `canceled` is terminal.
    pub fn can_transition_to(self, next: ReservationStatus) -> bool {
        matches!(
            (self, next),
            (ReservationStatus::Held, ReservationStatus::Confirmed)
                | (ReservationStatus::Held, ReservationStatus::Canceled)
                | (ReservationStatus::Confirmed, ReservationStatus::Canceled)
        )
    }

    /// Every status allowed to move to `next`; the expected set for a
    /// compare-and-set update.
    pub fn sources_of(next: ReservationStatus) -> Vec<ReservationStatus> {
        Self::ALL
            .into_iter()
            .filter(|status| status.can_transition_to(next))
            .collect()
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "held" => Ok(ReservationStatus::Held),
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "canceled" => Ok(ReservationStatus::Canceled),
            other => Err(CoreError::ValidationError(format!("Unknown reservation status: {}", other))),
        }
    }
}

/// Calendar slot of a scheduled booking, in venue wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

impl Schedule {
    pub fn starts_at(&self, offset: FixedOffset) -> CoreResult<DateTime<Utc>> {
        local_instant(self.date, self.start_time, offset)
    }

    pub fn ends_at(&self, offset: FixedOffset) -> CoreResult<DateTime<Utc>> {
        local_instant(self.date, self.end_time, offset)
    }
}

/// A seat reservation, either a live hold (`schedule` is `None`) or a
/// scheduled booking.
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub id: Uuid,
    pub seat_id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
    /// End of the effective window for both modes.
    pub reserved_until: DateTime<Utc>,
    pub schedule: Option<Schedule>,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// A hold anchored at `now` lasting `hold`.
    pub fn live_hold(seat_id: String, customer: CustomerDetails, now: DateTime<Utc>, hold: Duration) -> Self {
        Self::build(seat_id, customer, now + hold, None, now)
    }

    pub fn scheduled(
        seat_id: String,
        customer: CustomerDetails,
        schedule: Schedule,
        offset: FixedOffset,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        let reserved_until = schedule.ends_at(offset)?;
        Ok(Self::build(seat_id, customer, reserved_until, Some(schedule), now))
    }

    fn build(
        seat_id: String,
        customer: CustomerDetails,
        reserved_until: DateTime<Utc>,
        schedule: Option<Schedule>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            seat_id,
            first_name: customer.first_name,
            last_name: customer.last_name,
            phone: customer.phone,
            email: customer.email,
            reserved_until,
            schedule,
            status: ReservationStatus::Held,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_live_hold(&self) -> bool {
        self.schedule.is_none()
    }

    /// Occupies its seat at `now`. Expiry is decided here, at read time.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status.is_active() && self.reserved_until > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn customer() -> CustomerDetails {
        CustomerDetails {
            first_name: "Marco".to_string(),
            last_name: "P".to_string(),
            phone: "1234567890".to_string(),
            email: None,
        }
    }

    #[test]
    fn test_live_hold_window_is_one_hour() {
        let now = Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap();
        let r = Reservation::live_hold("A1".into(), customer(), now, Duration::hours(1));

        assert!(r.is_live_hold());
        assert_eq!(r.status, ReservationStatus::Held);
        assert_eq!(r.created_at, now);
        assert_eq!(r.reserved_until, now + Duration::hours(1));
        assert!(r.is_active_at(now + Duration::minutes(59)));
        assert!(!r.is_active_at(now + Duration::hours(1)));
    }

    #[test]
    fn test_scheduled_reserved_until_is_slot_end() {
        let now = Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap();
        let schedule = Schedule {
            date: NaiveDate::from_ymd_opt(2024, 6, 5).unwrap(),
            start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
        };
        let offset = FixedOffset::east_opt(0).unwrap();
        let r = Reservation::scheduled("A1".into(), customer(), schedule, offset, now).unwrap();

        assert_eq!(r.reserved_until, Utc.with_ymd_and_hms(2024, 6, 5, 15, 0, 0).unwrap());
        assert_eq!(
            r.schedule.as_ref().unwrap().starts_at(offset).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 5, 14, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_status_transitions() {
        use ReservationStatus::*;
        assert!(Held.can_transition_to(Canceled));
        assert!(Held.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Canceled));
        assert!(!Canceled.can_transition_to(Held));
        assert!(!Canceled.can_transition_to(Confirmed));
        assert!(!Held.can_transition_to(Held));

        assert_eq!(ReservationStatus::sources_of(Canceled), vec![Held, Confirmed]);
        assert_eq!(ReservationStatus::sources_of(Confirmed), vec![Held]);
        assert!(ReservationStatus::sources_of(Held).is_empty());
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [ReservationStatus::Held, ReservationStatus::Confirmed, ReservationStatus::Canceled] {
            assert_eq!(status.as_str().parse::<ReservationStatus>().unwrap(), status);
        }
        assert!("cancelled".parse::<ReservationStatus>().is_err());
    }
}
