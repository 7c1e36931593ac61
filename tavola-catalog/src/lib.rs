pub mod floor;
pub mod menu;

pub use floor::SeatLayout;
pub use menu::{Combo, Dish, Menu, MenuError};
