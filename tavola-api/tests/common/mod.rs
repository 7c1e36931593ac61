//! Shared helpers for HTTP tests against the in-memory store.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

use tavola_api::{app, AppState};
use tavola_catalog::{Menu, SeatLayout};
use tavola_core::FixedClock;
use tavola_order::OrderManager;
use tavola_reservation::{BookingRules, ReservationService};
use tavola_store::{MemoryOrderRepository, MemoryReservationRepository};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: Arc<FixedClock>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Monday 2024-06-03 10:00 UTC.
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 10, 0, 0).unwrap()
}

impl TestApp {
    pub fn new() -> Self {
        let clock = Arc::new(FixedClock::new(start_time()));
        let menu = Arc::new(Menu::reference());

        let reservations = Arc::new(ReservationService::new(
            Arc::new(MemoryReservationRepository::new()),
            Arc::new(SeatLayout::reference()),
            BookingRules::default(),
            clock.clone(),
        ));
        let orders = Arc::new(OrderManager::new(
            Arc::new(MemoryOrderRepository::new()),
            menu.clone(),
            clock.clone(),
        ));

        let state = AppState::new(reservations, orders, menu);
        Self {
            router: app(state.clone()),
            state,
            clock,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let req = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(req).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    pub async fn post_raw(&self, path: &str, raw: &str) -> TestResponse {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(raw.to_string()))
            .unwrap();
        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse { status, body }
    }
}
