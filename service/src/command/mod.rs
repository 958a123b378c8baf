//! [`Command`] definition.

pub mod authorize_user_session;
pub mod cancel_booking;
pub mod create_booking;
pub mod create_car;
pub mod create_user;
pub mod create_user_session;
pub mod delete_car;
pub mod ensure_admin_user;
pub mod pay_booking;
pub mod update_car;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_user_session::AuthorizeUserSession,
    cancel_booking::CancelBooking, create_booking::CreateBooking,
    create_car::CreateCar, create_user::CreateUser,
    create_user_session::CreateUserSession, delete_car::DeleteCar,
    ensure_admin_user::EnsureAdminUser, pay_booking::PayBooking,
    update_car::UpdateCar,
};
