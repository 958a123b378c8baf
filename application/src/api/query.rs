//! GraphQL [`Query`]s definitions.

use common::DateTime;
use juniper::graphql_object;
use service::{domain, query, read, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";

    /// Default number of items in a list page.
    const DEFAULT_PAGE_SIZE: i32 = 10;
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the currently authenticated `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myUser",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_user(ctx: &Context) -> Result<api::User, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(query::user::ById::by(my_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| UserError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `User` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `USER_NOT_EXISTS` - the `User` with the specified ID does not exist;
    /// - `NOT_ADMIN` - the current `User` is not an administrator and tries
    ///                 to access another `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "user",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn user(
        id: api::user::Id,
        ctx: &Context,
    ) -> Result<api::User, Error> {
        let my = ctx.current_session().await?;
        if my.role != domain::user::Role::Admin && my.user_id != id {
            return Err(api::PrivilegeError::Admin.into())
                .map_err(ctx.error());
        }

        ctx.service()
            .execute(query::user::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| UserError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Fetches the page of `User`s.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - the pagination arguments are
    ///                                      ambiguous;
    /// - `NOT_ADMIN` - the current `User` is not an administrator.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            first = ?first,
            gql.name = "users",
            last = ?last,
            name = ?name.as_ref().map(ToString::to_string),
            otel.name = Self::SPAN_NAME,
            role = ?role,
        ),
    )]
    pub async fn users(
        first: Option<i32>,
        after: Option<api::user::list::Cursor>,
        last: Option<i32>,
        before: Option<api::user::list::Cursor>,
        name: Option<api::user::Name>,
        role: Option<api::user::Role>,
        ctx: &Context,
    ) -> Result<api::user::list::Connection, Error> {
        let my = ctx.current_session().await?;
        if my.role != domain::user::Role::Admin {
            return Err(api::PrivilegeError::Admin.into())
                .map_err(ctx.error());
        }

        let arguments = read::user::list::Arguments::new(
            first,
            after.map(Into::into),
            last,
            before.map(Into::into),
            Self::DEFAULT_PAGE_SIZE,
        )
        .ok_or_else(|| api::PaginationError::Ambiguous.into())
        .map_err(ctx.error())?;

        let filter = read::user::list::Filter {
            name: name.map(Into::into),
            role: role.map(Into::into),
        };
        ctx.service()
            .execute(query::users::List::by(read::user::list::Selector {
                arguments,
                filter: filter.clone(),
            }))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|conn| api::user::list::Connection::new(conn, filter))
    }

    /// Returns the `Car` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CAR_NOT_EXISTS` - the `Car` with the specified ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "car",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn car(
        id: api::car::Id,
        ctx: &Context,
    ) -> Result<api::Car, Error> {
        ctx.service()
            .execute(query::car::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| CarError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Fetches the page of `Car`s.
    ///
    /// Unless an `availability` filter is given, only the `Car`s currently
    /// available for booking are listed, like the public catalog shows.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - the pagination arguments are
    ///                                      ambiguous;
    /// - `INVALID_SEATS_FILTER` - the `seats` filter value is out of range.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            availability = ?availability,
            before = ?before,
            first = ?first,
            gql.name = "cars",
            last = ?last,
            otel.name = Self::SPAN_NAME,
            search = ?search.as_ref().map(ToString::to_string),
            seats = ?seats,
        ),
    )]
    pub async fn cars(
        first: Option<i32>,
        after: Option<api::car::list::Cursor>,
        last: Option<i32>,
        before: Option<api::car::list::Cursor>,
        search: Option<api::car::SearchTerm>,
        seats: Option<i32>,
        availability: Option<api::car::Availability>,
        ctx: &Context,
    ) -> Result<api::car::list::Connection, Error> {
        let arguments = read::car::list::Arguments::new(
            first,
            after.map(Into::into),
            last,
            before.map(Into::into),
            Self::DEFAULT_PAGE_SIZE,
        )
        .ok_or_else(|| api::PaginationError::Ambiguous.into())
        .map_err(ctx.error())?;

        let seats = seats
            .map(|num| {
                u8::try_from(num)
                    .ok()
                    .and_then(read::car::list::SeatsFilter::new)
                    .ok_or_else(|| SeatsError::Invalid.into())
                    .map_err(ctx.error())
            })
            .transpose()?;

        let filter = read::car::list::Filter {
            search: search.map(Into::into),
            seats,
            availability: availability
                .map(Into::into)
                .unwrap_or_default(),
        };
        ctx.service()
            .execute(query::cars::List::by(read::car::list::Selector {
                arguments,
                filter: filter.clone(),
            }))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|conn| api::car::list::Connection::new(conn, filter))
    }

    /// Returns the `Booking` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `BOOKING_NOT_EXISTS` - the `Booking` with the specified ID does not
    ///                          exist;
    /// - `NOT_BOOKING_OWNER` - the current `User` neither owns the `Booking`
    ///                         nor is an administrator.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "booking",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn booking(
        id: api::booking::Id,
        ctx: &Context,
    ) -> Result<api::Booking, Error> {
        let my = ctx.current_session().await?;

        let booking = ctx
            .service()
            .execute(query::booking::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| BookingError::NotExists.into())
            .map_err(ctx.error())?;
        if my.role != domain::user::Role::Admin
            && api::user::Id::from(booking.customer_id) != my.user_id
        {
            return Err(BookingError::NotOwner.into()).map_err(ctx.error());
        }

        Ok(booking.into())
    }

    /// Fetches the page of the current `User`'s `Booking`s, newest first.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - the pagination arguments are
    ///                                      ambiguous.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            first = ?first,
            gql.name = "myBookings",
            last = ?last,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_bookings(
        first: Option<i32>,
        after: Option<api::booking::list::Cursor>,
        last: Option<i32>,
        before: Option<api::booking::list::Cursor>,
        ctx: &Context,
    ) -> Result<api::booking::list::Connection, Error> {
        let my_id = ctx.current_session().await?.user_id;

        let filter = read::booking::list::Filter {
            customer: Some(my_id.into()),
        };
        Self::bookings_page(first, after, last, before, filter, ctx).await
    }

    /// Fetches the page of all `Booking`s, newest first.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - the pagination arguments are
    ///                                      ambiguous;
    /// - `NOT_ADMIN` - the current `User` is not an administrator.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            customer_id = ?customer_id,
            first = ?first,
            gql.name = "bookings",
            last = ?last,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn bookings(
        first: Option<i32>,
        after: Option<api::booking::list::Cursor>,
        last: Option<i32>,
        before: Option<api::booking::list::Cursor>,
        customer_id: Option<api::user::Id>,
        ctx: &Context,
    ) -> Result<api::booking::list::Connection, Error> {
        let my = ctx.current_session().await?;
        if my.role != domain::user::Role::Admin {
            return Err(api::PrivilegeError::Admin.into())
                .map_err(ctx.error());
        }

        let filter = read::booking::list::Filter {
            customer: customer_id.map(Into::into),
        };
        Self::bookings_page(first, after, last, before, filter, ctx).await
    }

    /// Calculates the `SpendingReport` for the specified period.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_ADMIN` - the current `User` is not an administrator.
    #[tracing::instrument(
        skip_all,
        fields(
            end_at = ?end_at,
            gql.name = "spendingReport",
            otel.name = Self::SPAN_NAME,
            start_at = ?start_at,
        ),
    )]
    pub async fn spending_report(
        start_at: DateTime,
        end_at: DateTime,
        ctx: &Context,
    ) -> Result<api::report::Spending, Error> {
        let my = ctx.current_session().await?;
        if my.role != domain::user::Role::Admin {
            return Err(api::PrivilegeError::Admin.into())
                .map_err(ctx.error());
        }

        ctx.service()
            .execute(query::report::Spending {
                start: start_at,
                end: end_at,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

impl Query {
    /// Selects a page of `Booking`s with the provided `filter`.
    ///
    /// With no explicit pagination arguments the latest `Booking`s are
    /// returned: `Booking` IDs are creation-time-ordered, so backward
    /// pagination means newest-first.
    async fn bookings_page(
        first: Option<i32>,
        after: Option<api::booking::list::Cursor>,
        last: Option<i32>,
        before: Option<api::booking::list::Cursor>,
        filter: read::booking::list::Filter,
        ctx: &Context,
    ) -> Result<api::booking::list::Connection, Error> {
        let arguments = if first.is_none()
            && after.is_none()
            && last.is_none()
            && before.is_none()
        {
            read::booking::list::Arguments::Backward {
                last: usize::try_from(Self::DEFAULT_PAGE_SIZE)
                    .unwrap_or_default(),
                before: None,
                including: false,
            }
        } else {
            read::booking::list::Arguments::new(
                first,
                after.map(Into::into),
                last,
                before.map(Into::into),
                Self::DEFAULT_PAGE_SIZE,
            )
            .ok_or_else(|| api::PaginationError::Ambiguous.into())
            .map_err(ctx.error())?
        };

        ctx.service()
            .execute(query::bookings::List::by(
                read::booking::list::Selector { arguments, filter },
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|conn| api::booking::list::Connection::new(conn, filter))
    }
}

define_error! {
    enum BookingError {
        #[code = "BOOKING_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Booking` with the specified ID does not exist"]
        NotExists,

        #[code = "NOT_BOOKING_OWNER"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` does not own the `Booking`"]
        NotOwner,
    }
}

define_error! {
    enum CarError {
        #[code = "CAR_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Car` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum SeatsError {
        #[code = "INVALID_SEATS_FILTER"]
        #[status = BAD_REQUEST]
        #[message = "Seats filter value is out of the supported range"]
        Invalid,
    }
}

define_error! {
    enum UserError {
        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`User` with the specified ID does not exist"]
        NotExists,
    }
}
