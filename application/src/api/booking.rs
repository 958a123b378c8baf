//! [`Booking`]-related definitions.

use common::{Date, DateTime, Money};
use derive_more::{Display, From, Into};
use futures::{future, TryFutureExt as _};
use juniper::{graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLScalar};
use service::{domain, query, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{api, AsError, Context, Error};

/// A reservation of a `Car` by a `User` over a date period.
#[derive(Clone, Debug, From)]
pub struct Booking {
    /// ID of this [`Booking`].
    id: Id,

    /// Underlying [`domain::Booking`].
    booking: OnceCell<domain::Booking>,
}

impl From<domain::Booking> for Booking {
    fn from(booking: domain::Booking) -> Self {
        Self {
            id: booking.id.into(),
            booking: OnceCell::new_with(Some(booking)),
        }
    }
}

impl Booking {
    /// Creates a new [`Booking`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Booking`] with the provided ID exists,
    /// otherwise accessing this [`Booking`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            booking: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Booking`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Booking`] doesn't exist.
    async fn booking(&self, ctx: &Context) -> Result<&domain::Booking, Error> {
        let id = self.id.into();
        self.booking
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::booking::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|b| {
                        future::ready(b.ok_or_else(|| {
                            api::query::BookingError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// A reservation of a `Car` by a `User` over a date period.
#[graphql_object(context = Context)]
impl Booking {
    /// Unique identifier of this `Booking`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// `User` who placed this `Booking`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.customer",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn customer(&self, ctx: &Context) -> Result<api::User, Error> {
        let customer_id = self.booking(ctx).await?.customer_id;
        #[expect(
            unsafe_code,
            reason = "`Booking` existence guarantees `User` existence"
        )]
        let customer = unsafe { api::User::new_unchecked(customer_id) };
        Ok(customer)
    }

    /// `Car` this `Booking` reserves.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.car",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn car(&self, ctx: &Context) -> Result<api::Car, Error> {
        let car_id = self.booking(ctx).await?.car_id;
        #[expect(
            unsafe_code,
            reason = "`Booking` existence guarantees `Car` existence"
        )]
        let car = unsafe { api::Car::new_unchecked(car_id) };
        Ok(car)
    }

    /// `Date` this `Booking`'s `Car` is picked up.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.pickupDate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn pickup_date(&self, ctx: &Context) -> Result<Date, Error> {
        Ok(self.booking(ctx).await?.period.pickup())
    }

    /// `Date` this `Booking`'s `Car` is returned.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.returnDate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn return_date(&self, ctx: &Context) -> Result<Date, Error> {
        Ok(self.booking(ctx).await?.period.return_date())
    }

    /// Number of whole days this `Booking` spans.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.days",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn days(&self, ctx: &Context) -> Result<i32, Error> {
        let days = self.booking(ctx).await?.period.days();
        i32::try_from(days).map_err(AsError::into_error)
    }

    /// Total cost of this `Booking`, fixed at its creation.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.totalCost",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn total_cost(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.booking(ctx).await?.total_cost)
    }

    /// Payment method of this `Booking`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.paymentMethod",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn payment_method(
        &self,
        ctx: &Context,
    ) -> Result<PaymentMethod, Error> {
        Ok(self.booking(ctx).await?.payment_method.into())
    }

    /// Payment status of this `Booking`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.paymentStatus",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn payment_status(
        &self,
        ctx: &Context,
    ) -> Result<PaymentStatus, Error> {
        Ok(self.booking(ctx).await?.payment_status.into())
    }

    /// `DateTime` when this `Booking` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.booking(ctx).await?.created_at.coerce())
    }
}

/// Unique identifier of a `Booking`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::booking::Id)]
#[into(domain::booking::Id)]
#[graphql(name = "BookingId", transparent)]
pub struct Id(Uuid);

/// Payment method of a `Booking`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "PaymentMethod")]
pub enum PaymentMethod {
    /// No method chosen yet.
    Pending,

    /// Payment in cash on pickup.
    Cash,

    /// Payment by card.
    Card,
}

impl From<domain::booking::PaymentMethod> for PaymentMethod {
    fn from(method: domain::booking::PaymentMethod) -> Self {
        use domain::booking::PaymentMethod as M;
        match method {
            M::Pending => Self::Pending,
            M::Cash => Self::Cash,
            M::Card => Self::Card,
        }
    }
}

/// Payment status of a `Booking`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "PaymentStatus")]
pub enum PaymentStatus {
    /// Payment has not happened yet.
    Pending,

    /// Payment completed, the booking is confirmed.
    Completed,

    /// Payment failed, the booking is retained for the record.
    Failed,
}

impl From<domain::booking::PaymentStatus> for PaymentStatus {
    fn from(status: domain::booking::PaymentStatus) -> Self {
        use domain::booking::PaymentStatus as S;
        match status {
            S::Pending => Self::Pending,
            S::Completed => Self::Completed,
            S::Failed => Self::Failed,
        }
    }
}

/// Payment method chosen when paying a `Booking`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "PaymentChoice")]
pub enum PaymentChoice {
    /// Payment in cash on pickup.
    Cash,

    /// Payment by card.
    Card,
}

/// Card details of a `Card` payment.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "CardDetails")]
pub struct CardDetails {
    /// Number of the card.
    pub number: String,

    /// Name of the card holder.
    pub holder_name: String,

    /// Expiry date of the card.
    pub expiry: String,

    /// CVV code of the card.
    pub cvv: String,
}

pub mod list {
    //! Definitions related to the [`Booking`] list.

    use derive_more::{AsRef, From, Into};
    use juniper::{graphql_object, GraphQLScalar};
    use service::{query, read, Query as _};

    use super::{Booking, Id};
    use crate::{api::scalar, AsError, Context, Error};

    /// Cursor for the `Booking` list.
    #[derive(AsRef, Clone, Copy, Debug, From, GraphQLScalar, Into)]
    #[from(Id, read::booking::list::Cursor)]
    #[graphql(
        name = "BookingListCursor",
        with = scalar::Via::<read::booking::list::Cursor>,
    )]
    pub struct Cursor(pub read::booking::list::Cursor);

    /// Edge in the [`Booking`] list.
    #[derive(Clone, Copy, Debug, From, Into)]
    pub struct Edge(read::booking::list::Edge);

    /// Edge in the `Booking` list.
    #[graphql_object(name = "BookingListEdge", context = Context)]
    impl Edge {
        /// Cursor of this `BookingListEdge`.
        #[must_use]
        pub fn cursor(&self) -> Cursor {
            self.0.cursor.into()
        }

        /// Node of this `BookingListEdge`.
        #[must_use]
        pub fn node(&self) -> Booking {
            #[expect(
                unsafe_code,
                reason = "`Edge` loaded from repository guarantees `Booking` \
                          existence"
            )]
            unsafe {
                Booking::new_unchecked(self.0.node)
            }
        }
    }

    /// Connection of the [`Booking`] list.
    #[derive(Clone, Debug)]
    pub struct Connection {
        /// Underlying [`read::booking::list::Connection`].
        conn: read::booking::list::Connection,

        /// Filter the [`Connection`] was selected with.
        filter: read::booking::list::Filter,
    }

    impl Connection {
        /// Creates a new [`Connection`] out of the selected page and the
        /// filter it was selected with.
        #[must_use]
        pub fn new(
            conn: read::booking::list::Connection,
            filter: read::booking::list::Filter,
        ) -> Self {
            Self { conn, filter }
        }
    }

    /// Connection of the `Booking` list.
    #[graphql_object(name = "BookingListConnection", context = Context)]
    impl Connection {
        /// Edges of this `BookingListConnection`.
        #[must_use]
        pub fn edges(&self) -> Vec<Edge> {
            self.conn.edges.iter().copied().map(Into::into).collect()
        }

        /// Information about the page.
        #[must_use]
        pub fn page_info(&self) -> PageInfo {
            PageInfo {
                info: self.conn.page_info(),
                start_cursor: self.conn.edges.first().map(|e| e.cursor.into()),
                end_cursor: self.conn.edges.last().map(|e| e.cursor.into()),
                filter: self.filter,
            }
        }
    }

    /// Information about a [`Connection`] page.
    #[derive(Clone, Copy, Debug)]
    pub struct PageInfo {
        /// Underlying [`read::booking::list::PageInfo`].
        info: read::booking::list::PageInfo,

        /// Start cursor of the page.
        start_cursor: Option<Cursor>,

        /// End cursor of the page.
        end_cursor: Option<Cursor>,

        /// Filter the page was selected with.
        filter: read::booking::list::Filter,
    }

    /// Information about a `BookingListConnection` page.
    #[graphql_object(name = "BookingListPageInfo", context = Context)]
    impl PageInfo {
        /// Indicator whether there is a next page.
        #[must_use]
        pub fn has_next_page(&self) -> bool {
            self.info.has_next_page
        }

        /// Indicator whether there is a previous page.
        #[must_use]
        pub fn has_previous_page(&self) -> bool {
            self.info.has_previous_page
        }

        /// Start cursor of the page.
        #[must_use]
        pub fn start_cursor(&self) -> &Option<Cursor> {
            &self.start_cursor
        }

        /// End cursor of the page.
        #[must_use]
        pub fn end_cursor(&self) -> &Option<Cursor> {
            &self.end_cursor
        }

        /// Total count of `Booking`s matching the filter of this page.
        pub async fn total_count(&self, ctx: &Context) -> Result<i32, Error> {
            ctx.service()
                .execute(query::bookings::TotalCount::by(self.filter))
                .await
                .map_err(AsError::into_error)
                .map_err(ctx.error())
                .map(Into::into)
        }
    }
}
