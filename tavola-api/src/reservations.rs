use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::{get, post},
    Json, Router,
};
use futures_util::stream::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;

use tavola_core::Reservation;
use tavola_reservation::{
    AvailabilityQuery, BookingRequest, CancelRequest, HoldRequest, ReservationView, WeekQuery,
};
use tavola_shared::models::events::{
    ReservationCanceledEvent, ReservationEvent, SeatHeldEvent, SlotBookedEvent,
};

use crate::error::AppError;
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/reservations/seats", get(live_seat_map))
        .route("/api/reservations/layout", get(seat_layout))
        .route("/api/reservations/hold", post(hold_now))
        .route("/api/reservations/cancel", post(cancel_by_phone))
        .route("/api/reservations/slots", get(week_slots))
        .route("/api/reservations/rawWeek", get(raw_week))
        .route("/api/reservations/book", post(book_seat_slot))
        .route("/api/reservations/bookSeatSlot", post(book_seat_slot))
        .route("/api/reservations/availability", get(check_availability))
        .route("/api/reservations/stream", get(stream))
}

/// GET /api/reservations/seats
async fn live_seat_map(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let seats = state.reservations.live_seat_map().await?;
    Ok(Json(json!({ "success": true, "seats": seats })))
}

/// GET /api/reservations/layout
async fn seat_layout(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "success": true, "seats": state.reservations.layout().seats() }))
}

/// POST /api/reservations/hold
async fn hold_now(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<HoldRequest>,
) -> Result<impl IntoResponse, AppError> {
    let reservation = state.reservations.hold_now(req).await?;
    state.publish(ReservationEvent::SeatHeld(SeatHeldEvent {
        reservation_id: reservation.id,
        seat_id: reservation.seat_id.clone(),
        reserved_until: reservation.reserved_until.timestamp(),
        held_at: reservation.created_at.timestamp(),
    }));
    Ok(created("Seat held.", &reservation))
}

/// POST /api/reservations/cancel
async fn cancel_by_phone(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CancelRequest>,
) -> Result<impl IntoResponse, AppError> {
    let reservation = state.reservations.cancel_by_phone(req).await?;
    state.publish(ReservationEvent::ReservationCanceled(ReservationCanceledEvent {
        reservation_id: reservation.id,
        seat_id: reservation.seat_id.clone(),
        canceled_at: reservation.updated_at.timestamp(),
    }));
    Ok(Json(json!({
        "success": true,
        "message": "Reservation canceled.",
        "reservation": ReservationView::from(&reservation),
    })))
}

/// GET /api/reservations/slots?start=&days=
async fn week_slots(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<WeekQuery>,
) -> Result<impl IntoResponse, AppError> {
    let week = state.reservations.week(query).await?;
    Ok(Json(json!({ "success": true, "week": week })))
}

/// GET /api/reservations/rawWeek?start=&days=
async fn raw_week(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<WeekQuery>,
) -> Result<impl IntoResponse, AppError> {
    let reservations = state.reservations.raw_week(query).await?;
    Ok(Json(json!({ "success": true, "reservations": reservations })))
}

/// POST /api/reservations/book and /api/reservations/bookSeatSlot
async fn book_seat_slot(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<BookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let reservation = state.reservations.book_seat_slot(req).await?;
    if let Some(schedule) = &reservation.schedule {
        state.publish(ReservationEvent::SlotBooked(SlotBookedEvent {
            reservation_id: reservation.id,
            seat_id: reservation.seat_id.clone(),
            date: schedule.date,
            start_time: schedule.start_time.format("%H:%M").to_string(),
            end_time: schedule.end_time.format("%H:%M").to_string(),
            booked_at: reservation.created_at.timestamp(),
        }));
    }
    Ok(created("Seat slot booked.", &reservation))
}

/// GET /api/reservations/availability?seatId=&date=&startTime=&endTime=
async fn check_availability(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AvailabilityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let availability = state.reservations.check_availability(query).await?;
    Ok(Json(json!({
        "success": true,
        "seatId": availability.seat_id,
        "available": availability.available,
        "blockedUntil": availability.blocked_until,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamQuery {
    seat_id: Option<String>,
}

/// GET /api/reservations/stream?seatId=
async fn stream(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StreamQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let rx = state.events.subscribe();

    let events = BroadcastStream::new(rx).filter_map(move |result| {
        let seat_filter = query.seat_id.clone();
        async move {
            // Lagged receivers skip what they missed.
            let event = result.ok()?;
            if seat_filter.as_deref().is_some_and(|seat| seat != event.seat_id()) {
                return None;
            }
            let data = serde_json::to_string(&event).ok()?;
            Some(Ok(Event::default().event(event.name()).data(data)))
        }
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn created(message: &str, reservation: &Reservation) -> impl IntoResponse {
    (
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": message,
            "reservation": ReservationView::from(reservation),
        })),
    )
}
