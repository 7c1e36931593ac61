use anyhow::Context;
use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderValue, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{Duration, FixedOffset};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use tavola_catalog::{Menu, SeatLayout};
use tavola_core::{Clock, ReservationRepository, SystemClock};
use tavola_order::{OrderManager, OrderRepository};
use tavola_reservation::{BookingRules, ReservationService};
use tavola_store::app_config::VenueConfig;
use tavola_store::{
    Config, DbClient, MemoryOrderRepository, MemoryReservationRepository, PgOrderRepository,
    PgReservationRepository, RedisClient,
};

pub mod error;
pub mod extract;
pub mod menu;
pub mod orders;
pub mod reservations;
pub mod state;

pub use error::AppError;
pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let origin = if state.allowed_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = state
            .allowed_origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", o);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE, axum::http::header::ACCEPT]);

    let mut router = Router::new()
        .route("/", get(health))
        .merge(reservations::routes())
        .merge(orders::routes())
        .merge(menu::routes());

    if state.redis.is_some() {
        router = router.layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit_middleware));
    }

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "success": true, "message": "Tavola reservation service is running" }))
}

async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, AppError> {
    let Some(redis) = state.redis.as_ref() else {
        return Ok(next.run(req).await);
    };
    let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>().cloned() else {
        return Ok(next.run(req).await);
    };

    let key = format!("ratelimit:{}", addr.ip());
    let limits = &state.rate_limit;

    match redis.check_rate_limit(&key, limits.requests, limits.window_seconds).await {
        Ok(true) => Ok(next.run(req).await),
        Ok(false) => Err(AppError::RateLimited("Rate limit exceeded".to_string())),
        Err(e) => {
            // Fail open
            warn!("Rate limiter unavailable: {}", e);
            Ok(next.run(req).await)
        }
    }
}

pub fn booking_rules(venue: &VenueConfig) -> anyhow::Result<BookingRules> {
    let offset = FixedOffset::east_opt(venue.utc_offset_minutes * 60)
        .context("venue.utc_offset_minutes is out of range")?;
    Ok(BookingRules {
        opening_hour: venue.opening_hour,
        closing_hour: venue.closing_hour,
        hold: Duration::minutes(venue.hold_minutes),
        offset,
        default_days: venue.default_days,
        max_days: venue.max_days,
    })
}

/// Wires services onto Postgres when `database.url` is set, otherwise onto
/// the in-memory store.
pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let (reservation_repo, order_repo): (Arc<dyn ReservationRepository>, Arc<dyn OrderRepository>) =
        match &config.database.url {
            Some(url) => {
                let db = DbClient::new(url, config.database.max_connections)
                    .await
                    .context("Failed to connect to Postgres")?;
                db.migrate().await.context("Failed to run migrations")?;
                (
                    Arc::new(PgReservationRepository::new(db.pool.clone())),
                    Arc::new(PgOrderRepository::new(db.pool)),
                )
            }
            None => {
                warn!("No database.url configured, using the in-memory store (single instance only)");
                (
                    Arc::new(MemoryReservationRepository::new()),
                    Arc::new(MemoryOrderRepository::new()),
                )
            }
        };

    let menu = match &config.catalog.menu_path {
        Some(path) => Menu::load(path).with_context(|| format!("Failed to load menu from {}", path))?,
        None => Menu::reference(),
    };
    let menu = Arc::new(menu);
    let layout = Arc::new(SeatLayout::new(config.venue.seats.clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let reservations = Arc::new(ReservationService::new(
        reservation_repo,
        layout,
        booking_rules(&config.venue)?,
        clock.clone(),
    ));
    let orders = Arc::new(OrderManager::new(order_repo, menu.clone(), clock));

    let mut state = AppState::new(reservations, orders, menu)
        .with_allowed_origins(config.cors.allowed_origins.clone());

    if let Some(redis) = &config.redis {
        let client = RedisClient::new(&redis.url)
            .await
            .context("Failed to configure Redis")?;
        state = state.with_rate_limit(Arc::new(client), config.rate_limit.clone());
    }

    info!(
        seats = config.venue.seats.len(),
        dishes = state.menu.dishes.len(),
        "Application state ready"
    );
    Ok(state)
}
