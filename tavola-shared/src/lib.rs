pub mod models;
pub mod pii;
