use std::sync::Arc;
use tokio::sync::broadcast;

use tavola_catalog::Menu;
use tavola_order::OrderManager;
use tavola_reservation::ReservationService;
use tavola_shared::models::events::ReservationEvent;
use tavola_store::app_config::RateLimitConfig;
use tavola_store::RedisClient;

const EVENT_BUFFER: usize = 100;

#[derive(Clone)]
pub struct AppState {
    pub reservations: Arc<ReservationService>,
    pub orders: Arc<OrderManager>,
    pub menu: Arc<Menu>,
    /// Rate limiting is off when unset.
    pub redis: Option<Arc<RedisClient>>,
    pub rate_limit: RateLimitConfig,
    pub allowed_origins: Vec<String>,
    pub events: broadcast::Sender<ReservationEvent>,
}

impl AppState {
    pub fn new(reservations: Arc<ReservationService>, orders: Arc<OrderManager>, menu: Arc<Menu>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            reservations,
            orders,
            menu,
            redis: None,
            rate_limit: RateLimitConfig::default(),
            allowed_origins: Vec::new(),
            events,
        }
    }

    pub fn with_rate_limit(mut self, redis: Arc<RedisClient>, limits: RateLimitConfig) -> Self {
        self.redis = Some(redis);
        self.rate_limit = limits;
        self
    }

    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    /// Fan out to stream subscribers; dropped when nobody listens.
    pub fn publish(&self, event: ReservationEvent) {
        let _ = self.events.send(event);
    }
}
