pub mod models;
pub mod manager;
pub mod recommend;
pub mod repository;

pub use models::{Order, OrderItem, PlaceOrderRequest, OrderItemRequest};
pub use manager::{OrderError, OrderManager};
pub use recommend::{ComboCount, ComboSuggestion};
pub use repository::OrderRepository;
