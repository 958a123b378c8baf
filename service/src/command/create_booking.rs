//! [`Command`] for creating a new [`Booking`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    Date, DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{booking, car, user, Booking, Car, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Booking`].
///
/// The created [`Booking`] awaits payment: both its payment method and
/// status are `Pending`. The [`Car`]'s availability is left untouched and is
/// only revoked when a payment completes (see [`PayBooking`]), so until then
/// the same [`Car`] can accumulate several pending [`Booking`]s.
///
/// [`PayBooking`]: super::PayBooking
#[derive(Clone, Copy, Debug)]
pub struct CreateBooking {
    /// ID of the [`User`] placing the [`Booking`].
    ///
    /// Must be a [`user::Role::Customer`].
    pub customer_id: user::Id,

    /// ID of the [`Car`] to book.
    pub car_id: car::Id,

    /// [`Date`] the [`Car`] is picked up.
    pub pickup: Date,

    /// [`Date`] the [`Car`] is returned.
    pub return_date: Date,
}

impl<Db> Command<CreateBooking> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Car>, car::Id>>,
            Ok = Option<Car>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Booking>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateBooking,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateBooking {
            customer_id,
            car_id,
            pickup,
            return_date,
        } = cmd;

        let customer = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(customer_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(customer_id))
            .map_err(tracerr::wrap!())?;
        if customer.role != user::Role::Customer {
            return Err(tracerr::new!(E::UserNotCustomer(customer_id)));
        }

        let period = booking::Period::new(pickup, return_date)
            .ok_or(E::ReturnNotAfterPickup)
            .map_err(tracerr::wrap!())?;
        if pickup < Date::today() {
            return Err(tracerr::new!(E::PickupInPast));
        }

        let car = self
            .database()
            .execute(Select(By::<Option<Car>, _>::new(car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::CarNotExists(car_id))
            .map_err(tracerr::wrap!())?;
        if !car.is_available {
            return Err(tracerr::new!(E::CarUnavailable(car_id)));
        }

        let booking = Booking {
            id: booking::Id::new(),
            customer_id: customer.id,
            car_id: car.id,
            period,
            // Fixed at the current daily rate; later rate changes do not
            // affect this `Booking`.
            total_cost: period.cost(car.daily_rate),
            payment_method: booking::PaymentMethod::Pending,
            payment_status: booking::PaymentStatus::Pending,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(booking.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(booking)
    }
}

/// Error of [`CreateBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Car`] with the provided ID does not exist.
    #[display("`Car(id: {_0})` does not exist")]
    CarNotExists(#[error(not(source))] car::Id),

    /// [`Car`] is not available for booking.
    #[display("`Car(id: {_0})` is not available for booking")]
    CarUnavailable(#[error(not(source))] car::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Pickup date is in the past.
    #[display("Pickup date cannot be in the past")]
    PickupInPast,

    /// Return date is not after the pickup date.
    #[display("Return date must be after the pickup date")]
    ReturnNotAfterPickup,

    /// [`User`] is not a customer.
    #[display("`User(id: {_0})` is not a customer")]
    UserNotCustomer(#[error(not(source))] user::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}
