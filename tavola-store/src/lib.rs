pub mod app_config;
pub mod database;
pub mod memory;
pub mod order_repo;
pub mod redis_repo;
pub mod reservation_repo;

pub use app_config::Config;
pub use database::DbClient;
pub use memory::{MemoryOrderRepository, MemoryReservationRepository};
pub use order_repo::PgOrderRepository;
pub use redis_repo::RedisClient;
pub use reservation_repo::PgReservationRepository;
