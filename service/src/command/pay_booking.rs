//! [`Command`] for paying a [`Booking`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        booking::{self, Payment},
        car, user, Booking, Car,
    },
    infra::{database, Database},
    read,
    Service,
};

use super::Command;

/// [`Command`] for paying a [`Booking`].
///
/// The payment is simulated: the chosen [`Payment`] is recorded and the
/// [`Booking`] is confirmed. This is the only point revoking the [`Car`]'s
/// availability, and the revocation is conditional: if another payment
/// already reserved the [`Car`], this [`Booking`]'s payment is recorded as
/// failed instead.
#[derive(Clone, Debug)]
pub struct PayBooking {
    /// ID of the [`Booking`] to pay.
    pub booking_id: booking::Id,

    /// ID of the [`User`] paying the [`Booking`].
    ///
    /// Must be the [`User`] the [`Booking`] belongs to.
    pub customer_id: user::Id,

    /// [`Payment`] chosen for the [`Booking`].
    pub payment: Payment,
}

impl<Db> Command<PayBooking> for Service<Db>
where
    Db: Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Booking, booking::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<Lock<By<Car, car::Id>>, Err = Traced<database::Error>>
        + Database<
            Update<read::car::Reserve>,
            Ok = bool,
            Err = Traced<database::Error>,
        > + Database<Update<Booking>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: PayBooking) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let PayBooking {
            booking_id,
            customer_id,
            payment,
        } = cmd;

        let booking = self
            .database()
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::BookingNotExists(booking_id))
            .map_err(tracerr::wrap!())?;
        if booking.customer_id != customer_id {
            return Err(tracerr::new!(E::NotBookingOwner(customer_id)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent payments and cancellations of the same `Booking`.
        tx.execute(Lock(By::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut booking = tx
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::BookingNotExists(booking_id))
            .map_err(tracerr::wrap!())?;
        match booking.payment_status {
            booking::PaymentStatus::Pending => {}
            booking::PaymentStatus::Completed => {
                return Err(tracerr::new!(E::BookingAlreadyPaid(booking_id)));
            }
            booking::PaymentStatus::Failed => {
                return Err(tracerr::new!(E::BookingPaymentFailed(booking_id)));
            }
        }

        // Avoid concurrent actions upon the same `Car`.
        tx.execute(Lock(By::new(booking.car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let reserved = tx
            .execute(Update(read::car::Reserve(booking.car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        booking.payment_method = payment.method();
        if !reserved {
            // Another payment won the `Car` between the creation of this
            // `Booking` and now.
            booking.payment_status = booking::PaymentStatus::Failed;
            tx.execute(Update(booking.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
            tx.execute(Commit)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;

            tracing::warn!(
                booking_id = %booking_id,
                car_id = %booking.car_id,
                "payment failed: `Car` is no longer available",
            );
            return Err(tracerr::new!(E::CarUnavailable(booking.car_id)));
        }

        booking.payment_status = booking::PaymentStatus::Completed;
        tx.execute(Update(booking.clone()))
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

/// Error of [`PayBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Booking`] is already paid.
    #[display("`Booking(id: {_0})` is already paid")]
    BookingAlreadyPaid(#[error(not(source))] booking::Id),

    /// [`Booking`] with the provided ID does not exist.
    #[display("`Booking(id: {_0})` does not exist")]
    BookingNotExists(#[error(not(source))] booking::Id),

    /// [`Booking`]'s payment has failed already.
    #[display("`Booking(id: {_0})` payment has failed already")]
    BookingPaymentFailed(#[error(not(source))] booking::Id),

    /// [`Car`] was reserved by a concurrent payment.
    #[display("`Car(id: {_0})` is not available anymore")]
    CarUnavailable(#[error(not(source))] car::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] does not own the [`Booking`].
    #[display("`User(id: {_0})` does not own the `Booking`")]
    NotBookingOwner(#[error(not(source))] user::Id),
}
