use chrono::{Duration, FixedOffset, NaiveDate, Offset, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use tavola_catalog::SeatLayout;
use tavola_core::availability::{is_slot_reserved, SeatClaim};
use tavola_core::calendar::{build_hour_slots, build_week_days, today_in};
use tavola_core::validation::{
    parse_date, parse_slot_time, require_fields, validate_phone, validate_window,
};
use tavola_core::{
    Clock, CustomerDetails, RepoError, Reservation, ReservationRepository, ReservationStatus,
    Schedule,
};
use tavola_shared::pii::Masked;

use crate::error::ReservationError;
use crate::models::{
    AvailabilityQuery, BookingRequest, CancelRequest, DaySlots, HoldRequest, RawReservation,
    SeatAvailability, SeatStatus, SlotStatus, WeekQuery,
};

/// Venue-level knobs for reservations.
#[derive(Debug, Clone)]
pub struct BookingRules {
    pub opening_hour: u32,
    pub closing_hour: u32,
    pub hold: Duration,
    pub offset: FixedOffset,
    pub default_days: u32,
    pub max_days: u32,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            opening_hour: 9,
            closing_hour: 21,
            hold: Duration::hours(1),
            offset: Utc.fix(),
            default_days: 7,
            max_days: 31,
        }
    }
}

/// Owns every write to reservations and the read models built from them.
pub struct ReservationService {
    repo: Arc<dyn ReservationRepository>,
    layout: Arc<SeatLayout>,
    rules: BookingRules,
    clock: Arc<dyn Clock>,
}

impl ReservationService {
    pub fn new(
        repo: Arc<dyn ReservationRepository>,
        layout: Arc<SeatLayout>,
        rules: BookingRules,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            layout,
            rules,
            clock,
        }
    }

    pub fn layout(&self) -> &SeatLayout {
        &self.layout
    }

    pub fn rules(&self) -> &BookingRules {
        &self.rules
    }

    /// Seats occupied right now, one entry per seat (the reservation running
    /// longest wins), ordered by seat id.
    pub async fn live_seat_map(&self) -> Result<Vec<SeatStatus>, ReservationError> {
        let now = self.clock.now();
        let active = self.repo.list_active(now).await?;

        let mut latest: HashMap<String, SeatStatus> = HashMap::new();
        for r in active.into_iter().filter(|r| r.is_active_at(now)) {
            let replace = latest
                .get(&r.seat_id)
                .map_or(true, |current| current.reserved_until < r.reserved_until);
            if replace {
                latest.insert(
                    r.seat_id.clone(),
                    SeatStatus {
                        seat_id: r.seat_id,
                        status: r.status,
                        reserved_until: r.reserved_until,
                    },
                );
            }
        }

        let mut seats: Vec<SeatStatus> = latest.into_values().collect();
        seats.sort_by(|a, b| a.seat_id.cmp(&b.seat_id));
        Ok(seats)
    }

    /// Holds `seat_id` from now for the configured hold duration.
    pub async fn hold_now(&self, req: HoldRequest) -> Result<Reservation, ReservationError> {
        require_fields(
            &[
                req.seat_id.as_deref(),
                req.first_name.as_deref(),
                req.last_name.as_deref(),
                req.phone.as_deref(),
            ],
            "seatId, firstName, lastName, phone are required",
        )?;
        let seat_id = self.known_seat(req.seat_id.as_deref())?;
        let customer = customer(
            req.first_name.as_deref(),
            req.last_name.as_deref(),
            req.phone.as_deref(),
            req.email.as_deref(),
        )?;

        let now = self.clock.now();
        let reservation = Reservation::live_hold(seat_id, customer, now, self.rules.hold);
        let claim = SeatClaim::live(now);

        self.insert(&reservation, &claim, "Seat is already reserved.").await?;

        info!(
            reservation_id = %reservation.id,
            seat_id = %reservation.seat_id,
            reserved_until = %reservation.reserved_until,
            phone = %Masked(&reservation.phone),
            "Seat held"
        );
        Ok(reservation)
    }

    /// Cancels the caller's active reservation on `seat_id`; the phone number
    /// is the shared secret.
    pub async fn cancel_by_phone(&self, req: CancelRequest) -> Result<Reservation, ReservationError> {
        require_fields(
            &[req.seat_id.as_deref(), req.phone.as_deref()],
            "seatId and phone are required",
        )?;
        let phone = validate_phone(req.phone.as_deref().unwrap_or_default())?;
        let seat_id = req.seat_id.as_deref().unwrap_or_default().trim();

        let not_found = || {
            ReservationError::NotFound("No active reservation found for this seat and phone.".to_string())
        };

        let now = self.clock.now();
        let mut target = self
            .repo
            .find_active_by_phone(seat_id, &phone, now)
            .await?
            .into_iter()
            .filter(|r| r.is_active_at(now))
            .min_by_key(|r| r.reserved_until)
            .ok_or_else(not_found)?;

        let changed = self
            .repo
            .update_status(
                target.id,
                &ReservationStatus::sources_of(ReservationStatus::Canceled),
                ReservationStatus::Canceled,
                now,
            )
            .await?;
        if !changed {
            // Lost a race with another cancel.
            return Err(not_found());
        }

        target.status = ReservationStatus::Canceled;
        target.updated_at = now;

        info!(
            reservation_id = %target.id,
            seat_id = %target.seat_id,
            phone = %Masked(&target.phone),
            "Reservation canceled"
        );
        Ok(target)
    }

    /// Day/slot grid with venue-wide occupancy per slot.
    pub async fn week(&self, query: WeekQuery) -> Result<Vec<DaySlots>, ReservationError> {
        let (start, days) = self.window(&query)?;
        let week = build_week_days(start, days);
        let slots = build_hour_slots(self.rules.opening_hour, self.rules.closing_hour);

        let dates: Vec<NaiveDate> = week.iter().map(|d| d.date).collect();
        let existing = self.repo.list_by_dates(&dates).await?;

        let mut by_date: HashMap<NaiveDate, Vec<Reservation>> = HashMap::new();
        for r in existing {
            if let Some(date) = r.schedule.as_ref().map(|s| s.date) {
                by_date.entry(date).or_default().push(r);
            }
        }

        Ok(week
            .into_iter()
            .map(|day| {
                let day_reservations = by_date.get(&day.date).map(Vec::as_slice).unwrap_or(&[]);
                let slots = slots
                    .iter()
                    .map(|slot| SlotStatus {
                        start_time: slot.start_time,
                        end_time: slot.end_time,
                        reserved: is_slot_reserved(slot, day.date, day_reservations),
                    })
                    .collect();
                DaySlots {
                    date: day.date,
                    day_name: day.day_name,
                    slots,
                }
            })
            .collect())
    }

    /// Non-canceled scheduled reservations inside the window, all seats.
    pub async fn raw_week(&self, query: WeekQuery) -> Result<Vec<RawReservation>, ReservationError> {
        let (start, days) = self.window(&query)?;
        let dates: Vec<NaiveDate> = build_week_days(start, days).into_iter().map(|d| d.date).collect();

        let mut raw: Vec<RawReservation> = self
            .repo
            .list_by_dates(&dates)
            .await?
            .into_iter()
            .filter(|r| r.status.is_active())
            .filter_map(|r| {
                let schedule = r.schedule?;
                Some(RawReservation {
                    seat_id: r.seat_id,
                    date: schedule.date,
                    start_time: schedule.start_time,
                    end_time: schedule.end_time,
                    status: r.status,
                })
            })
            .collect();

        raw.sort_by(|a, b| {
            (a.date, a.start_time, &a.seat_id).cmp(&(b.date, b.start_time, &b.seat_id))
        });
        Ok(raw)
    }

    /// Books `seat_id` for a calendar slot. Serves both the `book` and
    /// `bookSeatSlot` routes.
    pub async fn book_seat_slot(&self, req: BookingRequest) -> Result<Reservation, ReservationError> {
        require_fields(
            &[
                req.seat_id.as_deref(),
                req.first_name.as_deref(),
                req.last_name.as_deref(),
                req.phone.as_deref(),
                req.date.as_deref(),
                req.start_time.as_deref(),
                req.end_time.as_deref(),
            ],
            "Missing required fields.",
        )?;
        let seat_id = self.known_seat(req.seat_id.as_deref())?;
        let customer = customer(
            req.first_name.as_deref(),
            req.last_name.as_deref(),
            req.phone.as_deref(),
            req.email.as_deref(),
        )?;
        let schedule = schedule(
            req.date.as_deref(),
            req.start_time.as_deref(),
            req.end_time.as_deref(),
        )?;

        let now = self.clock.now();
        let claim = SeatClaim::scheduled(schedule.clone(), self.rules.offset)?;
        let reservation = Reservation::scheduled(seat_id, customer, schedule, self.rules.offset, now)?;

        self.insert(
            &reservation,
            &claim,
            "This seat is already reserved for the selected slot.",
        )
        .await?;

        info!(
            reservation_id = %reservation.id,
            seat_id = %reservation.seat_id,
            reserved_until = %reservation.reserved_until,
            phone = %Masked(&reservation.phone),
            "Seat slot booked"
        );
        Ok(reservation)
    }

    /// Would a hold (no date) or a booking (date + times) on this seat
    /// succeed right now? Advisory only; the write re-checks atomically.
    pub async fn check_availability(
        &self,
        query: AvailabilityQuery,
    ) -> Result<SeatAvailability, ReservationError> {
        require_fields(&[query.seat_id.as_deref()], "seatId is required")?;
        let seat_id = self.known_seat(query.seat_id.as_deref())?;
        let now = self.clock.now();

        let blockers: Vec<Reservation> = match query.date.as_deref() {
            None => self
                .repo
                .find_active_for_seat(&seat_id, now)
                .await?
                .into_iter()
                .filter(|r| SeatClaim::live(now).is_blocked_by(r))
                .collect(),
            Some(date) => {
                let schedule = schedule(Some(date), query.start_time.as_deref(), query.end_time.as_deref())?;
                let claim = SeatClaim::scheduled(schedule.clone(), self.rules.offset)?;

                // Same candidate set as the write: anything ending after the slot starts.
                let mut blockers = self.repo.find_slot_conflicts(&seat_id, &schedule).await?;
                let holds = self.repo.find_active_for_seat(&seat_id, claim.horizon()).await?;
                blockers.extend(holds.into_iter().filter(|r| r.is_live_hold()));
                blockers.retain(|r| claim.is_blocked_by(r));
                blockers
            }
        };

        Ok(SeatAvailability {
            available: blockers.is_empty(),
            blocked_until: blockers.iter().map(|r| r.reserved_until).max(),
            seat_id,
        })
    }

    async fn insert(
        &self,
        reservation: &Reservation,
        claim: &SeatClaim,
        conflict_message: &str,
    ) -> Result<(), ReservationError> {
        match self.repo.insert_unless_conflict(reservation, claim).await {
            Ok(()) => Ok(()),
            Err(RepoError::Conflict(detail)) => {
                warn!(seat_id = %reservation.seat_id, %detail, "Reservation conflict");
                Err(ReservationError::Conflict(conflict_message.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn known_seat(&self, seat_id: Option<&str>) -> Result<String, ReservationError> {
        let seat_id = seat_id.unwrap_or_default().trim();
        if !self.layout.contains(seat_id) {
            return Err(ReservationError::Validation(format!("Unknown seat: {}", seat_id)));
        }
        Ok(seat_id.to_string())
    }

    fn window(&self, query: &WeekQuery) -> Result<(NaiveDate, u32), ReservationError> {
        let start = match query.start.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_date(raw)?,
            _ => self.today(),
        };
        let days = query.days.unwrap_or(self.rules.default_days);
        if days == 0 || days > self.rules.max_days {
            return Err(ReservationError::Validation(format!(
                "days must be between 1 and {}.",
                self.rules.max_days
            )));
        }
        Ok((start, days))
    }

    fn today(&self) -> NaiveDate {
        today_in(self.rules.offset, self.clock.now())
    }
}

fn customer(
    first_name: Option<&str>,
    last_name: Option<&str>,
    phone: Option<&str>,
    email: Option<&str>,
) -> Result<CustomerDetails, ReservationError> {
    validate_phone(phone.unwrap_or_default())?;
    Ok(CustomerDetails::parse(
        first_name.unwrap_or_default(),
        last_name.unwrap_or_default(),
        phone.unwrap_or_default(),
        email,
    )?)
}

fn schedule(date: Option<&str>, start: Option<&str>, end: Option<&str>) -> Result<Schedule, ReservationError> {
    require_fields(&[date, start, end], "date, startTime and endTime are required")?;
    let date = parse_date(date.unwrap_or_default())?;
    let start_time = parse_slot_time(start.unwrap_or_default())?;
    let end_time = parse_slot_time(end.unwrap_or_default())?;
    validate_window(start_time, end_time)?;
    Ok(Schedule {
        date,
        start_time,
        end_time,
    })
}
