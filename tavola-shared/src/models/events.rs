use chrono::NaiveDate;
use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeatHeldEvent {
    pub reservation_id: Uuid,
    pub seat_id: String,
    pub reserved_until: i64,
    pub held_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlotBookedEvent {
    pub reservation_id: Uuid,
    pub seat_id: String,
    pub date: NaiveDate,
    pub start_time: String, // HH:mm
    pub end_time: String,
    pub booked_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationCanceledEvent {
    pub reservation_id: Uuid,
    pub seat_id: String,
    pub canceled_at: i64,
}

/// Everything a seat map subscriber needs to refresh itself.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReservationEvent {
    SeatHeld(SeatHeldEvent),
    SlotBooked(SlotBookedEvent),
    ReservationCanceled(ReservationCanceledEvent),
}

impl ReservationEvent {
    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            ReservationEvent::SeatHeld(_) => "seat_held",
            ReservationEvent::SlotBooked(_) => "slot_booked",
            ReservationEvent::ReservationCanceled(_) => "reservation_canceled",
        }
    }

    pub fn seat_id(&self) -> &str {
        match self {
            ReservationEvent::SeatHeld(e) => &e.seat_id,
            ReservationEvent::SlotBooked(e) => &e.seat_id,
            ReservationEvent::ReservationCanceled(e) => &e.seat_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tagging() {
        let event = ReservationEvent::ReservationCanceled(ReservationCanceledEvent {
            reservation_id: Uuid::nil(),
            seat_id: "B3".to_string(),
            canceled_at: 1_700_000_000,
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "reservation_canceled");
        assert_eq!(json["seatId"], "B3");
        assert_eq!(event.name(), "reservation_canceled");
        assert_eq!(event.seat_id(), "B3");
    }
}
