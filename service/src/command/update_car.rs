//! [`Command`] for updating an existing [`Car`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::car::{Brand, Image, Model, Name, Seats};
use crate::{
    domain::{car, user, Car, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating an existing [`Car`].
#[derive(Clone, Debug)]
pub struct UpdateCar {
    /// ID of the [`User`] updating the [`Car`].
    ///
    /// Must be an [`user::Role::Admin`].
    pub initiator_id: user::Id,

    /// ID of the [`Car`] to update.
    pub car_id: car::Id,

    /// New [`Name`] of the [`Car`].
    pub name: car::Name,

    /// New [`Brand`] of the [`Car`].
    pub brand: car::Brand,

    /// New [`Model`] of the [`Car`].
    pub model: car::Model,

    /// New number of [`Seats`] in the [`Car`].
    pub seats: car::Seats,

    /// New daily rental rate of the [`Car`].
    ///
    /// Does not affect the total cost of already existing bookings.
    pub daily_rate: Money,

    /// New [`Image`] of the [`Car`].
    ///
    /// [`None`] keeps the current [`Image`].
    pub image: Option<car::Image>,

    /// New availability of the [`Car`].
    pub is_available: bool,
}

/// Output of [`UpdateCar`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Updated [`Car`].
    pub car: Car,

    /// Previously uploaded image file no longer referenced by the [`Car`].
    ///
    /// The caller is responsible for removing it from the file storage.
    pub replaced_upload: Option<car::ImageFile>,
}

impl<Db> Command<UpdateCar> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Car, car::Id>>,
            Err = Traced<database::Error>,
        >
        + Database<
            Select<By<Option<Car>, car::Id>>,
            Ok = Option<Car>,
            Err = Traced<database::Error>,
        > + Database<Update<Car>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateCar) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateCar {
            initiator_id,
            car_id,
            name,
            brand,
            model,
            seats,
            daily_rate,
            image,
            is_available,
        } = cmd;

        let initiator = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(initiator_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(initiator_id))
            .map_err(tracerr::wrap!())?;
        if initiator.role != user::Role::Admin {
            return Err(tracerr::new!(E::UserNotAdmin(initiator_id)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Car`.
        tx.execute(Lock(By::new(car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut car = tx
            .execute(Select(By::<Option<Car>, _>::new(car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::CarNotExists(car_id))
            .map_err(tracerr::wrap!())?;

        let replaced_upload = match (&car.image, &image) {
            (car::Image::Upload(old), Some(new))
                if new.upload() != Some(old) =>
            {
                Some(old.clone())
            }
            (car::Image::Upload(_) | car::Image::Url(_), _) => None,
        };

        car.name = name;
        car.brand = brand;
        car.model = model;
        car.seats = seats;
        car.daily_rate = daily_rate;
        if let Some(image) = image {
            car.image = image;
        }
        car.is_available = is_available;

        tx.execute(Update(car.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(Output {
            car,
            replaced_upload,
        })
    }
}

/// Error of [`UpdateCar`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Car`] with the provided ID does not exist.
    #[display("`Car(id: {_0})` does not exist")]
    CarNotExists(#[error(not(source))] car::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] is not an administrator.
    #[display("`User(id: {_0})` is not an administrator")]
    UserNotAdmin(#[error(not(source))] user::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}
