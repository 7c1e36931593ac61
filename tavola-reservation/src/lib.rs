pub mod error;
pub mod models;
pub mod service;

pub use error::ReservationError;
pub use models::{
    AvailabilityQuery, BookingRequest, CancelRequest, DaySlots, HoldRequest, RawReservation,
    ReservationView, SeatAvailability, SeatStatus, SlotStatus, WeekQuery,
};
pub use service::{BookingRules, ReservationService};
