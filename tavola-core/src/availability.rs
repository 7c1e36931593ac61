use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::calendar::{overlaps, HourSlot};
use crate::reservation::{Reservation, Schedule};
use crate::CoreResult;

/// What a new reservation wants to occupy on its seat.
#[derive(Debug, Clone, PartialEq)]
pub enum SeatClaim {
    /// Hold starting now; blocked by anything on the seat that has not ended.
    Live { now: DateTime<Utc> },
    /// Calendar slot; blocked by overlapping slots on the same date and by
    /// live holds whose window reaches into the slot.
    Scheduled {
        schedule: Schedule,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    },
}

impl SeatClaim {
    pub fn live(now: DateTime<Utc>) -> Self {
        SeatClaim::Live { now }
    }

    pub fn scheduled(schedule: Schedule, offset: FixedOffset) -> CoreResult<Self> {
        let starts_at = schedule.starts_at(offset)?;
        let ends_at = schedule.ends_at(offset)?;
        Ok(SeatClaim::Scheduled {
            schedule,
            starts_at,
            ends_at,
        })
    }

    /// Existing reservations ending at or before this instant can never block
    /// the claim.
    pub fn horizon(&self) -> DateTime<Utc> {
        match self {
            SeatClaim::Live { now } => *now,
            SeatClaim::Scheduled { starts_at, .. } => *starts_at,
        }
    }

    /// Does `existing` (on the same seat) prevent this claim?
    pub fn is_blocked_by(&self, existing: &Reservation) -> bool {
        if !existing.status.is_active() {
            return false;
        }

        match self {
            SeatClaim::Live { now } => existing.reserved_until > *now,
            SeatClaim::Scheduled {
                schedule,
                starts_at,
                ends_at,
            } => match &existing.schedule {
                Some(other) => {
                    other.date == schedule.date
                        && overlaps(schedule.start_time, schedule.end_time, other.start_time, other.end_time)
                }
                None => overlaps(*starts_at, *ends_at, existing.created_at, existing.reserved_until),
            },
        }
    }
}

/// First reservation on `seat_id` that blocks `claim`.
pub fn find_conflict<'a, I>(claim: &SeatClaim, seat_id: &str, existing: I) -> Option<&'a Reservation>
where
    I: IntoIterator<Item = &'a Reservation>,
{
    existing
        .into_iter()
        .find(|r| r.seat_id == seat_id && claim.is_blocked_by(r))
}

/// Venue-wide occupancy of one slot: any active scheduled booking on `date`
/// overlapping it, regardless of seat.
pub fn is_slot_reserved(slot: &HourSlot, date: NaiveDate, reservations: &[Reservation]) -> bool {
    reservations.iter().any(|r| {
        r.status.is_active()
            && r.schedule.as_ref().is_some_and(|s| {
                s.date == date && overlaps(slot.start_time, slot.end_time, s.start_time, s.end_time)
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reservation::ReservationStatus;
    use crate::validation::CustomerDetails;
    use chrono::{Duration, NaiveTime, TimeZone};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn customer() -> CustomerDetails {
        CustomerDetails {
            first_name: "Giulia".to_string(),
            last_name: "R".to_string(),
            phone: "5551234567".to_string(),
            email: None,
        }
    }

    fn booking(seat: &str, date: &str, start: &str, end: &str) -> Reservation {
        let schedule = Schedule {
            date: day(date),
            start_time: t(start),
            end_time: t(end),
        };
        let created = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        Reservation::scheduled(seat.to_string(), customer(), schedule, utc(), created).unwrap()
    }

    fn claim(date: &str, start: &str, end: &str) -> SeatClaim {
        SeatClaim::scheduled(
            Schedule {
                date: day(date),
                start_time: t(start),
                end_time: t(end),
            },
            utc(),
        )
        .unwrap()
    }

    #[test]
    fn test_scheduled_overlap_same_date() {
        let existing = booking("A1", "2024-06-05", "14:00", "15:00");
        assert!(claim("2024-06-05", "14:30", "15:30").is_blocked_by(&existing));
        assert!(!claim("2024-06-05", "15:00", "16:00").is_blocked_by(&existing));
        assert!(!claim("2024-06-06", "14:00", "15:00").is_blocked_by(&existing));
    }

    #[test]
    fn test_canceled_never_blocks() {
        let mut existing = booking("A1", "2024-06-05", "14:00", "15:00");
        existing.status = ReservationStatus::Canceled;
        assert!(!claim("2024-06-05", "14:00", "15:00").is_blocked_by(&existing));
        assert!(!SeatClaim::live(Utc.with_ymd_and_hms(2024, 6, 5, 14, 0, 0).unwrap()).is_blocked_by(&existing));
    }

    #[test]
    fn test_live_claim_blocked_by_unexpired() {
        let now = Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap();
        let hold = Reservation::live_hold("A1".into(), customer(), now, Duration::hours(1));

        assert!(SeatClaim::live(now + Duration::minutes(30)).is_blocked_by(&hold));
        assert!(!SeatClaim::live(now + Duration::hours(1)).is_blocked_by(&hold));
    }

    #[test]
    fn test_live_claim_blocked_by_future_booking() {
        let now = Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap();
        let future = booking("A1", "2024-06-05", "14:00", "15:00");
        assert!(SeatClaim::live(now).is_blocked_by(&future));
    }

    #[test]
    fn test_slot_claim_blocked_by_running_hold() {
        let now = Utc.with_ymd_and_hms(2024, 6, 5, 13, 30, 0).unwrap();
        let hold = Reservation::live_hold("A1".into(), customer(), now, Duration::hours(1));

        assert!(claim("2024-06-05", "14:00", "15:00").is_blocked_by(&hold));
        assert!(!claim("2024-06-05", "15:00", "16:00").is_blocked_by(&hold));
        assert!(!claim("2024-06-05", "12:00", "13:00").is_blocked_by(&hold));
    }

    #[test]
    fn test_horizon() {
        let now = Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap();
        assert_eq!(SeatClaim::live(now).horizon(), now);
        assert_eq!(
            claim("2024-06-05", "14:00", "15:00").horizon(),
            Utc.with_ymd_and_hms(2024, 6, 5, 14, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_find_conflict_is_seat_scoped() {
        let existing = vec![
            booking("A2", "2024-06-05", "14:00", "15:00"),
            booking("A1", "2024-06-05", "10:00", "11:00"),
        ];
        let c = claim("2024-06-05", "14:00", "15:00");
        assert!(find_conflict(&c, "A1", &existing).is_none());
        assert_eq!(find_conflict(&c, "A2", &existing).unwrap().seat_id, "A2");
    }

    #[test]
    fn test_slot_reserved_across_seats() {
        let reservations = vec![booking("C4", "2024-06-05", "14:00", "15:00")];
        let slot = HourSlot {
            start_time: t("14:00"),
            end_time: t("15:00"),
        };
        let next = HourSlot {
            start_time: t("15:00"),
            end_time: t("16:00"),
        };
        assert!(is_slot_reserved(&slot, day("2024-06-05"), &reservations));
        assert!(!is_slot_reserved(&next, day("2024-06-05"), &reservations));
        assert!(!is_slot_reserved(&slot, day("2024-06-06"), &reservations));
    }
}
