//! [`Car`]-related definitions.

use common::{DateTime, Money};
use derive_more::{AsRef, Display, From, Into};
use futures::{future, TryFutureExt as _};
use juniper::{graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLScalar};
use service::{domain, query, read, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// A rentable car.
#[derive(Clone, Debug, From)]
pub struct Car {
    /// ID of this [`Car`].
    id: Id,

    /// Underlying [`domain::Car`].
    car: OnceCell<domain::Car>,
}

impl From<domain::Car> for Car {
    fn from(car: domain::Car) -> Self {
        Self {
            id: car.id.into(),
            car: OnceCell::new_with(Some(car)),
        }
    }
}

impl Car {
    /// Creates a new [`Car`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Car`] with the provided ID exists,
    /// otherwise accessing this [`Car`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            car: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Car`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Car`] doesn't exist.
    async fn car(&self, ctx: &Context) -> Result<&domain::Car, Error> {
        let id = self.id.into();
        self.car
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::car::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|c| {
                        future::ready(c.ok_or_else(|| {
                            api::query::CarError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// A rentable car.
#[graphql_object(context = Context)]
impl Car {
    /// Unique identifier of this `Car`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Car.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Name of this `Car`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Car.name",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn name(&self, ctx: &Context) -> Result<Name, Error> {
        Ok(self.car(ctx).await?.name.clone().into())
    }

    /// Brand of this `Car`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Car.brand",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn brand(&self, ctx: &Context) -> Result<Brand, Error> {
        Ok(self.car(ctx).await?.brand.clone().into())
    }

    /// Model-year label of this `Car`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Car.model",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn model(&self, ctx: &Context) -> Result<Model, Error> {
        Ok(self.car(ctx).await?.model.clone().into())
    }

    /// Number of seats in this `Car`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Car.seats",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn seats(&self, ctx: &Context) -> Result<i32, Error> {
        Ok(i32::from(self.car(ctx).await?.seats.get()))
    }

    /// Daily rental rate of this `Car`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Car.dailyRate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn daily_rate(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.car(ctx).await?.daily_rate)
    }

    /// Remote image URL of this `Car`, if its image is one.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Car.imageUrl",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn image_url(
        &self,
        ctx: &Context,
    ) -> Result<Option<ImageUrl>, Error> {
        Ok(self.car(ctx).await?.image.url().cloned().map(Into::into))
    }

    /// Uploaded image file reference of this `Car`, if its image is one.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Car.imageFile",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn image_file(
        &self,
        ctx: &Context,
    ) -> Result<Option<ImageFile>, Error> {
        Ok(self.car(ctx).await?.image.upload().cloned().map(Into::into))
    }

    /// Indicator whether this `Car` may be booked right now.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Car.isAvailable",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn is_available(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(self.car(ctx).await?.is_available)
    }

    /// `DateTime` when this `Car` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Car.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.car(ctx).await?.created_at.coerce())
    }
}

/// Unique identifier of a `Car`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::car::Id)]
#[into(domain::car::Id)]
#[graphql(name = "CarId", transparent)]
pub struct Id(Uuid);

/// Name of a `Car`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "CarName",
    with = scalar::Via::<domain::car::Name>,
)]
pub struct Name(domain::car::Name);

/// Brand of a `Car`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "CarBrand",
    with = scalar::Via::<domain::car::Brand>,
)]
pub struct Brand(domain::car::Brand);

/// Model-year label of a `Car`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "CarModel",
    with = scalar::Via::<domain::car::Model>,
)]
pub struct Model(domain::car::Model);

/// Remote image URL of a `Car`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "CarImageUrl",
    with = scalar::Via::<domain::car::ImageUrl>,
)]
pub struct ImageUrl(domain::car::ImageUrl);

/// Uploaded image file reference of a `Car`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "CarImageFile",
    with = scalar::Via::<domain::car::ImageFile>,
)]
pub struct ImageFile(domain::car::ImageFile);

/// Search term matched against a `Car`'s name, brand and model.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "CarSearchTerm",
    with = scalar::Via::<read::car::list::SearchTerm>,
)]
pub struct SearchTerm(read::car::list::SearchTerm);

/// Availability filter of a `Car` list.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "CarAvailability")]
pub enum Availability {
    /// Only `Car`s currently available for booking.
    Available,

    /// Only `Car`s currently booked.
    Unavailable,

    /// All `Car`s regardless of availability.
    All,
}

impl From<Availability> for read::car::list::Availability {
    fn from(availability: Availability) -> Self {
        use Availability as A;
        match availability {
            A::Available => Self::Available,
            A::Unavailable => Self::Unavailable,
            A::All => Self::All,
        }
    }
}

/// Uploaded image of a `Car`.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "CarImageUpload")]
pub struct ImageUpload {
    /// Original name of the uploaded file.
    pub file_name: String,

    /// Base64-encoded content of the uploaded file.
    pub content: String,
}

pub mod list {
    //! Definitions related to the [`Car`] list.

    use derive_more::{AsRef, From, Into};
    use juniper::{graphql_object, GraphQLScalar};
    use service::{query, read, Query as _};

    use super::{Car, Id};
    use crate::{api::scalar, AsError, Context, Error};

    /// Cursor for the `Car` list.
    #[derive(AsRef, Clone, Copy, Debug, From, GraphQLScalar, Into)]
    #[from(Id, read::car::list::Cursor)]
    #[graphql(
        name = "CarListCursor",
        with = scalar::Via::<read::car::list::Cursor>,
    )]
    pub struct Cursor(pub read::car::list::Cursor);

    /// Edge in the [`Car`] list.
    #[derive(Clone, Copy, Debug, From, Into)]
    pub struct Edge(read::car::list::Edge);

    /// Edge in the `Car` list.
    #[graphql_object(name = "CarListEdge", context = Context)]
    impl Edge {
        /// Cursor of this `CarListEdge`.
        #[must_use]
        pub fn cursor(&self) -> Cursor {
            self.0.cursor.into()
        }

        /// Node of this `CarListEdge`.
        #[must_use]
        pub fn node(&self) -> Car {
            #[expect(
                unsafe_code,
                reason = "`Edge` loaded from repository guarantees `Car` \
                          existence"
            )]
            unsafe {
                Car::new_unchecked(self.0.node)
            }
        }
    }

    /// Connection of the [`Car`] list.
    #[derive(Clone, Debug)]
    pub struct Connection {
        /// Underlying [`read::car::list::Connection`].
        conn: read::car::list::Connection,

        /// Filter the [`Connection`] was selected with.
        filter: read::car::list::Filter,
    }

    impl Connection {
        /// Creates a new [`Connection`] out of the selected page and the
        /// filter it was selected with.
        #[must_use]
        pub fn new(
            conn: read::car::list::Connection,
            filter: read::car::list::Filter,
        ) -> Self {
            Self { conn, filter }
        }
    }

    /// Connection of the `Car` list.
    #[graphql_object(name = "CarListConnection", context = Context)]
    impl Connection {
        /// Edges of this `CarListConnection`.
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
                filter: self.filter.clone(),
            }
        }
    }

    /// Information about a [`Connection`] page.
    #[derive(Clone, Debug)]
    pub struct PageInfo {
        /// Underlying [`read::car::list::PageInfo`].
        info: read::car::list::PageInfo,

        /// Start cursor of the page.
        start_cursor: Option<Cursor>,

        /// End cursor of the page.
        end_cursor: Option<Cursor>,

        /// Filter the page was selected with.
        filter: read::car::list::Filter,
    }

    /// Information about a `CarListConnection` page.
    #[graphql_object(name = "CarListPageInfo", context = Context)]
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

        /// Total count of `Car`s matching the filter of this page.
        pub async fn total_count(&self, ctx: &Context) -> Result<i32, Error> {
            ctx.service()
                .execute(query::cars::TotalCount::by(self.filter.clone()))
                .await
                .map_err(AsError::into_error)
                .map_err(ctx.error())
                .map(Into::into)
        }
    }
}
