use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tavola_core::calendar::hhmm;
use tavola_core::{Reservation, ReservationStatus};

// ============================================================================
// Requests
// ============================================================================

// Fields are optional so a missing one becomes a validation message rather
// than a deserialization failure.

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldRequest {
    pub seat_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub seat_id: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub seat_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeekQuery {
    /// `YYYY-MM-DD`, defaults to the venue's today.
    pub start: Option<String>,
    pub days: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub seat_id: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

// ============================================================================
// Read models
// ============================================================================

/// A reservation as returned to clients. `date`/`startTime`/`endTime` are
/// null for live holds.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationView {
    pub id: Uuid,
    pub seat_id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub reserved_until: DateTime<Utc>,
    pub date: Option<NaiveDate>,
    #[serde(serialize_with = "hhmm::option::serialize")]
    pub start_time: Option<NaiveTime>,
    #[serde(serialize_with = "hhmm::option::serialize")]
    pub end_time: Option<NaiveTime>,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Reservation> for ReservationView {
    fn from(r: &Reservation) -> Self {
        Self {
            id: r.id,
            seat_id: r.seat_id.clone(),
            first_name: r.first_name.clone(),
            last_name: r.last_name.clone(),
            phone: r.phone.clone(),
            email: r.email.clone(),
            reserved_until: r.reserved_until,
            date: r.schedule.as_ref().map(|s| s.date),
            start_time: r.schedule.as_ref().map(|s| s.start_time),
            end_time: r.schedule.as_ref().map(|s| s.end_time),
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Live seat map entry: a seat that is occupied right now.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeatStatus {
    pub seat_id: String,
    pub status: ReservationStatus,
    pub reserved_until: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlotStatus {
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub reserved: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DaySlots {
    pub date: NaiveDate,
    pub day_name: String,
    pub slots: Vec<SlotStatus>,
}

/// Minimal projection for client-side per-seat overlap checks.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawReservation {
    pub seat_id: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub status: ReservationStatus,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeatAvailability {
    pub seat_id: String,
    pub available: bool,
    /// Latest end among the reservations in the way.
    pub blocked_until: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tavola_core::CustomerDetails;

    #[test]
    fn test_live_hold_view_has_null_slot_fields() {
        let now = Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap();
        let customer = CustomerDetails::parse("Sofia", "Conti", "0612345678", None).unwrap();
        let hold = Reservation::live_hold("B2".into(), customer, now, Duration::hours(1));

        let json = serde_json::to_value(ReservationView::from(&hold)).unwrap();
        assert_eq!(json["seatId"], "B2");
        assert_eq!(json["status"], "held");
        assert!(json["date"].is_null());
        assert!(json["startTime"].is_null());
        assert!(json["endTime"].is_null());
    }
}
