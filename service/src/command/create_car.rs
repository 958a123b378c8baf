//! [`Command`] for creating a new [`Car`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime, Money,
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

/// [`Command`] for creating a new [`Car`].
#[derive(Clone, Debug)]
pub struct CreateCar {
    /// ID of the [`User`] creating the [`Car`].
    ///
    /// Must be an [`user::Role::Admin`].
    pub initiator_id: user::Id,

    /// [`Name`] of a new [`Car`].
    pub name: car::Name,

    /// [`Brand`] of a new [`Car`].
    pub brand: car::Brand,

    /// [`Model`] of a new [`Car`].
    pub model: car::Model,

    /// Number of [`Seats`] in a new [`Car`].
    pub seats: car::Seats,

    /// Daily rental rate of a new [`Car`].
    pub daily_rate: Money,

    /// [`Image`] of a new [`Car`].
    pub image: car::Image,

    /// Whether a new [`Car`] is available for booking right away.
    pub is_available: bool,
}

impl<Db> Command<CreateCar> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Car>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Car;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateCar) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateCar {
            initiator_id,
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

        let car = Car {
            id: car::Id::new(),
            name,
            brand,
            model,
            seats,
            daily_rate,
            image,
            is_available,
            created_at: DateTime::now().coerce(),
            deleted_at: None,
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(car.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(car)
    }
}

/// Error of [`CreateCar`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
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
