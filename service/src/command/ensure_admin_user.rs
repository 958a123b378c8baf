//! [`Command`] for ensuring the administrator [`User`] exists.

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Email, Name, Password, Username};
use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for ensuring the administrator [`User`] exists.
///
/// Administrators cannot register themselves, so the application bootstraps
/// one on startup from its configuration. If a [`User`] with the provided
/// [`Username`] already exists, it is returned untouched.
#[derive(Clone, Debug)]
pub struct EnsureAdminUser {
    /// [`Name`] of the administrator [`User`].
    pub name: user::Name,

    /// [`Username`] of the administrator [`User`].
    pub username: user::Username,

    /// [`Password`] of the administrator [`User`].
    pub password: SecretBox<user::Password>,

    /// [`Email`] of the administrator [`User`].
    pub email: user::Email,
}

impl<Db> Command<EnsureAdminUser> for Service<Db>
where
    Db: for<'u> Database<
            Select<By<Option<User>, &'u user::Username>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<User>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: EnsureAdminUser,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let EnsureAdminUser {
            name,
            username,
            password,
            email,
        } = cmd;

        let existing = self
            .database()
            .execute(Select(By::new(&username)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(user) = existing {
            return Ok(user);
        }

        let password_hash = user::PasswordHash::new(password.expose_secret())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let user = User {
            id: user::Id::new(),
            name,
            username,
            password_hash,
            email,
            phone: None,
            address: None,
            role: user::Role::Admin,
            created_at: DateTime::now().coerce(),
            deleted_at: None,
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(user.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(user)
    }
}

/// Error of [`EnsureAdminUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Failed to hash the provided [`user::Password`].
    #[display("Failed to hash `Password`: {_0}")]
    #[from]
    PasswordHash(#[error(not(source))] argon2::password_hash::Error),
}
