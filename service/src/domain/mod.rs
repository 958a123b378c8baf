//! Domain definitions.

pub mod booking;
pub mod car;
pub mod user;

pub use self::{booking::Booking, car::Car, user::User};
