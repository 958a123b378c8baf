//! GraphQL API definitions.

pub mod booking;
pub mod car;
mod mutation;
mod query;
pub mod report;
pub mod scalar;
pub mod user;

use crate::{define_error, Context};

pub use self::{
    booking::Booking, car::Car, mutation::Mutation, query::Query, user::User,
};

/// GraphQL schema.
pub type Schema = juniper::RootNode<
    'static,
    Query,
    Mutation,
    juniper::EmptySubscription<Context>,
>;

define_error! {
    enum PrivilegeError {
        #[code = "NOT_ADMIN"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must be an administrator"]
        Admin,

        #[code = "NOT_CUSTOMER"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must be a customer"]
        Customer,
    }
}

define_error! {
    enum PaginationError {
        #[code = "AMBIGUOUS_PAGINATION_ARGUMENTS"]
        #[status = BAD_REQUEST]
        #[message = "Ambiguous pagination arguments"]
        Ambiguous,
    }
}
