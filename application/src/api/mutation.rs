//! GraphQL [`Mutation`]s definitions.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use common::{Date, Money};
use juniper::graphql_object;
use service::{
    command,
    domain::{
        booking::{payment, Payment},
        car,
    },
    Command as _,
};

use crate::{api, define_error, AsError, Context, Error, Session};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Creates a new `User` with the provided credentials and contact info,
    /// and signs them in right away.
    ///
    /// Every registered `User` is a customer.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `USERNAME_OCCUPIED` - provided `Username` is occupied by another
    ///                         `User`;
    /// - `EMAIL_OCCUPIED` - provided `UserEmail` is occupied by another
    ///                      `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            email = %email,
            gql.name = "createUser",
            name = %name,
            otel.name = Self::SPAN_NAME,
            phone = ?phone,
            username = %username,
        ),
    )]
    pub async fn create_user(
        name: api::user::Name,
        username: api::user::Username,
        password: api::user::Password,
        email: api::user::Email,
        phone: Option<api::user::Phone>,
        address: Option<api::user::Address>,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let user = ctx
            .service()
            .execute(command::CreateUser {
                name: name.into(),
                username: username.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
                email: email.into(),
                phone: phone.map(Into::into),
                address: address.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByUserId(user.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.set_current_session(Session {
            user_id: output.user.id.into(),
            role: output.user.role,
            token: output.token.clone(),
            expires_at: output.expires_at.coerce(),
        })
        .await;

        Ok(output.into())
    }

    /// Creates a new `UserSession` with the provided credentials.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `WRONG_CREDENTIALS` - provided credentials does not match any
    ///                         `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createUserSession",
            otel.name = Self::SPAN_NAME,
            username = %username,
        ),
    )]
    pub async fn create_user_session(
        username: api::user::Username,
        password: api::user::Password,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByCredentials {
                username: username.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.set_current_session(Session {
            user_id: output.user.id.into(),
            role: output.user.role,
            token: output.token.clone(),
            expires_at: output.expires_at.coerce(),
        })
        .await;

        Ok(output.into())
    }

    /// Creates a new `Car` with the provided details.
    ///
    /// Exactly one of `imageUrl` and `imageUpload` must be provided.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_ADMIN` - the current `User` is not an administrator;
    /// - `IMAGE_SOURCE_REQUIRED` - neither an image URL nor an upload is
    ///                             provided;
    /// - `AMBIGUOUS_IMAGE_SOURCE` - both an image URL and an upload are
    ///                              provided;
    /// - `INVALID_IMAGE_CONTENT` - the upload content is not valid Base64;
    /// - `INVALID_SEATS` - the number of seats is out of the supported range.
    #[tracing::instrument(
        skip_all,
        fields(
            brand = %brand,
            daily_rate = %daily_rate,
            gql.name = "createCar",
            model = %model,
            name = %name,
            otel.name = Self::SPAN_NAME,
            seats = %seats,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    pub async fn create_car(
        name: api::car::Name,
        brand: api::car::Brand,
        model: api::car::Model,
        seats: i32,
        daily_rate: Money,
        image_url: Option<api::car::ImageUrl>,
        image_upload: Option<api::car::ImageUpload>,
        is_available: Option<bool>,
        ctx: &Context,
    ) -> Result<api::Car, Error> {
        let my_id = ctx.current_session().await?.user_id;

        let seats = convert_seats(seats).map_err(ctx.error())?;
        let image = resolve_image(image_url, image_upload, ctx)
            .await?
            .ok_or_else(|| ImageError::SourceRequired.into())
            .map_err(ctx.error())?;

        ctx.service()
            .execute(command::CreateCar {
                initiator_id: my_id.into(),
                name: name.into(),
                brand: brand.into(),
                model: model.into(),
                seats,
                daily_rate,
                image,
                is_available: is_available.unwrap_or(true),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Updates the `Car` with the provided ID.
    ///
    /// Omitting both `imageUrl` and `imageUpload` keeps the current image;
    /// providing one of them replaces it (a previously uploaded file is
    /// removed from the storage).
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_ADMIN` - the current `User` is not an administrator;
    /// - `CAR_NOT_EXISTS` - the `Car` with the provided ID does not exist;
    /// - `AMBIGUOUS_IMAGE_SOURCE` - both an image URL and an upload are
    ///                              provided;
    /// - `INVALID_IMAGE_CONTENT` - the upload content is not valid Base64;
    /// - `INVALID_SEATS` - the number of seats is out of the supported range.
    #[tracing::instrument(
        skip_all,
        fields(
            brand = %brand,
            daily_rate = %daily_rate,
            gql.name = "updateCar",
            id = %id,
            model = %model,
            name = %name,
            otel.name = Self::SPAN_NAME,
            seats = %seats,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    pub async fn update_car(
        id: api::car::Id,
        name: api::car::Name,
        brand: api::car::Brand,
        model: api::car::Model,
        seats: i32,
        daily_rate: Money,
        image_url: Option<api::car::ImageUrl>,
        image_upload: Option<api::car::ImageUpload>,
        is_available: bool,
        ctx: &Context,
    ) -> Result<api::Car, Error> {
        let my_id = ctx.current_session().await?.user_id;

        let seats = convert_seats(seats).map_err(ctx.error())?;
        let image = resolve_image(image_url, image_upload, ctx).await?;

        let output = ctx
            .service()
            .execute(command::UpdateCar {
                initiator_id: my_id.into(),
                car_id: id.into(),
                name: name.into(),
                brand: brand.into(),
                model: model.into(),
                seats,
                daily_rate,
                image,
                is_available,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        if let Some(file) = output.replaced_upload {
            if let Err(e) = ctx.storage().delete(&file).await {
                tracing::warn!("failed to remove replaced upload: {e}");
            }
        }

        Ok(output.car.into())
    }

    /// Deletes the `Car` with the provided ID, along with its uploaded
    /// image, if any.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_ADMIN` - the current `User` is not an administrator;
    /// - `CAR_NOT_EXISTS` - the `Car` with the provided ID does not exist;
    /// - `CAR_HAS_BOOKINGS` - the `Car` is referenced by existing
    ///                        `Booking`s.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteCar",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_car(
        id: api::car::Id,
        ctx: &Context,
    ) -> Result<api::car::Id, Error> {
        let my_id = ctx.current_session().await?.user_id;

        let car = ctx
            .service()
            .execute(command::DeleteCar {
                initiator_id: my_id.into(),
                car_id: id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        if let Some(file) = car.image.upload() {
            if let Err(e) = ctx.storage().delete(file).await {
                tracing::warn!("failed to remove image of a deleted car: {e}");
            }
        }

        Ok(car.id.into())
    }

    /// Creates a new `Booking` of the specified `Car` over the specified
    /// period.
    ///
    /// The created `Booking` awaits payment via `payBooking`; the `Car` stays
    /// available for others until some payment completes.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_CUSTOMER` - the current `User` is not a customer;
    /// - `CAR_NOT_EXISTS` - the `Car` with the provided ID does not exist;
    /// - `CAR_UNAVAILABLE` - the `Car` is not available for booking;
    /// - `PICKUP_IN_PAST` - the pickup date is in the past;
    /// - `INVALID_PERIOD` - the return date is not after the pickup date.
    #[tracing::instrument(
        skip_all,
        fields(
            car_id = %car_id,
            gql.name = "createBooking",
            otel.name = Self::SPAN_NAME,
            pickup_date = %pickup_date.to_iso8601(),
            return_date = %return_date.to_iso8601(),
        ),
    )]
    pub async fn create_booking(
        car_id: api::car::Id,
        pickup_date: Date,
        return_date: Date,
        ctx: &Context,
    ) -> Result<api::Booking, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::CreateBooking {
                customer_id: my_id.into(),
                car_id: car_id.into(),
                pickup: pickup_date,
                return_date,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Pays the `Booking` with the provided ID, confirming it.
    ///
    /// The payment is simulated: the chosen method is recorded and no real
    /// charge is made. Card payments require all `CardDetails` fields to be
    /// non-empty, nothing more.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `BOOKING_NOT_EXISTS` - the `Booking` with the provided ID does not
    ///                          exist;
    /// - `NOT_BOOKING_OWNER` - the `Booking` belongs to another `User`;
    /// - `BOOKING_ALREADY_PAID` - the `Booking` is paid already;
    /// - `BOOKING_PAYMENT_FAILED` - the `Booking`'s payment failed before;
    /// - `CARD_DETAILS_REQUIRED` - the `Card` method is chosen, but some
    ///                             card details are missing or empty;
    /// - `CAR_UNAVAILABLE` - another payment reserved the `Car` first; this
    ///                       `Booking`'s payment is recorded as failed.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "payBooking",
            id = %id,
            method = ?method,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn pay_booking(
        id: api::booking::Id,
        method: api::booking::PaymentChoice,
        card: Option<api::booking::CardDetails>,
        ctx: &Context,
    ) -> Result<api::Booking, Error> {
        let my_id = ctx.current_session().await?.user_id;

        let payment = match method {
            api::booking::PaymentChoice::Cash => Payment::Cash,
            api::booking::PaymentChoice::Card => {
                let api::booking::CardDetails {
                    number,
                    holder_name,
                    expiry,
                    cvv,
                } = card
                    .ok_or_else(|| CardError::DetailsRequired.into())
                    .map_err(ctx.error())?;
                match (
                    payment::CardField::new(number),
                    payment::CardField::new(holder_name),
                    payment::CardField::new(expiry),
                    payment::CardField::new(cvv),
                ) {
                    (
                        Some(number),
                        Some(holder),
                        Some(expiry),
                        Some(cvv),
                    ) => Payment::Card(payment::Card {
                        number,
                        holder,
                        expiry,
                        cvv,
                    }),
                    _ => {
                        return Err(CardError::DetailsRequired.into())
                            .map_err(ctx.error());
                    }
                }
            }
        };

        ctx.service()
            .execute(command::PayBooking {
                booking_id: id.into(),
                customer_id: my_id.into(),
                payment,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Cancels the `Booking` with the provided ID, removing it and making
    /// its `Car` available again.
    ///
    /// Permitted for the owning customer and for administrators.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `BOOKING_NOT_EXISTS` - the `Booking` with the provided ID does not
    ///                          exist;
    /// - `NOT_BOOKING_OWNER` - the `Booking` belongs to another `User` and
    ///                         the current `User` is not an administrator.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "cancelBooking",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn cancel_booking(
        id: api::booking::Id,
        ctx: &Context,
    ) -> Result<api::booking::Id, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::CancelBooking {
                booking_id: id.into(),
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|booking| booking.id.into())
    }
}

/// Converts the raw number of seats into a [`car::Seats`].
fn convert_seats(num: i32) -> Result<car::Seats, Error> {
    u8::try_from(num)
        .ok()
        .and_then(car::Seats::new)
        .ok_or_else(|| SeatsError::Invalid.into())
}

/// Resolves the provided image arguments into a [`car::Image`], storing an
/// upload when one is given.
///
/// [`None`] is returned if neither source is provided.
async fn resolve_image(
    url: Option<api::car::ImageUrl>,
    upload: Option<api::car::ImageUpload>,
    ctx: &Context,
) -> Result<Option<car::Image>, Error> {
    match (url, upload) {
        (Some(_), Some(_)) => {
            Err(ImageError::AmbiguousSource.into()).map_err(ctx.error())
        }
        (Some(url), None) => Ok(Some(car::Image::Url(url.into()))),
        (None, Some(upload)) => {
            let content = BASE64
                .decode(&upload.content)
                .map_err(|_| ImageError::InvalidContent.into())
                .map_err(ctx.error())?;
            ctx.storage()
                .save(&upload.file_name, &content)
                .await
                .map(|file| Some(car::Image::Upload(file)))
                .map_err(|e| Error::internal(&e))
                .map_err(ctx.error())
        }
        (None, None) => Ok(None),
    }
}

define_error! {
    enum CardError {
        #[code = "CARD_DETAILS_REQUIRED"]
        #[status = BAD_REQUEST]
        #[message = "All card details are required for a card payment"]
        DetailsRequired,
    }
}

define_error! {
    enum ImageError {
        #[code = "IMAGE_SOURCE_REQUIRED"]
        #[status = BAD_REQUEST]
        #[message = "Either an image URL or an uploaded image must be \
                     provided"]
        SourceRequired,

        #[code = "AMBIGUOUS_IMAGE_SOURCE"]
        #[status = BAD_REQUEST]
        #[message = "An image URL and an uploaded image are mutually \
                     exclusive"]
        AmbiguousSource,

        #[code = "INVALID_IMAGE_CONTENT"]
        #[status = BAD_REQUEST]
        #[message = "Uploaded image content is not a valid Base64 string"]
        InvalidContent,
    }
}

define_error! {
    enum SeatsError {
        #[code = "INVALID_SEATS"]
        #[status = BAD_REQUEST]
        #[message = "Number of seats is out of the supported range"]
        Invalid,
    }
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "USERNAME_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`Username` is occupied by another `User`"]
                UsernameOccupied,

                #[code = "EMAIL_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`UserEmail` is occupied by another `User`"]
                EmailOccupied,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::EmailOccupied(_) => Some(Error::EmailOccupied.into()),
            Self::PasswordHash(_) => None,
            Self::UsernameOccupied(_) => Some(Error::UsernameOccupied.into()),
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "WRONG_CREDENTIALS"]
                #[status = FORBIDDEN]
                #[message = "Provided credentials does not match any `User`"]
                WrongCredentials,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenEncodeError(_) => None,
            Self::UserNotExists(_) | Self::WrongCredentials => {
                Some(Error::WrongCredentials.into())
            }
        }
    }
}

impl AsError for command::create_car::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::UserNotAdmin(_) => Some(api::PrivilegeError::Admin.into()),
            Self::UserNotExists(_) => None,
        }
    }
}

impl AsError for command::update_car::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "CAR_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Car` with the provided ID does not exist"]
                CarNotExists,
            }
        }

        match self {
            Self::CarNotExists(_) => Some(Error::CarNotExists.into()),
            Self::Db(e) => e.try_as_error(),
            Self::UserNotAdmin(_) => Some(api::PrivilegeError::Admin.into()),
            Self::UserNotExists(_) => None,
        }
    }
}

impl AsError for command::delete_car::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "CAR_HAS_BOOKINGS"]
                #[status = CONFLICT]
                #[message = "`Car` with the provided ID is referenced by \
                             existing `Booking`s"]
                CarHasBookings,

                #[code = "CAR_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Car` with the provided ID does not exist"]
                CarNotExists,
            }
        }

        Some(match self {
            Self::CarHasBookings(_) => Error::CarHasBookings.into(),
            Self::CarNotExists(_) => Error::CarNotExists.into(),
            Self::Db(e) => return e.try_as_error(),
            Self::UserNotAdmin(_) => api::PrivilegeError::Admin.into(),
            Self::UserNotExists(_) => return None,
        })
    }
}

impl AsError for command::create_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "CAR_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Car` with the provided ID does not exist"]
                CarNotExists,

                #[code = "CAR_UNAVAILABLE"]
                #[status = CONFLICT]
                #[message = "`Car` with the provided ID is not available \
                             for booking"]
                CarUnavailable,

                #[code = "PICKUP_IN_PAST"]
                #[status = BAD_REQUEST]
                #[message = "Pickup date cannot be in the past"]
                PickupInPast,

                #[code = "INVALID_PERIOD"]
                #[status = BAD_REQUEST]
                #[message = "Return date must be after the pickup date"]
                InvalidPeriod,
            }
        }

        Some(match self {
            Self::CarNotExists(_) => Error::CarNotExists.into(),
            Self::CarUnavailable(_) => Error::CarUnavailable.into(),
            Self::Db(e) => return e.try_as_error(),
            Self::PickupInPast => Error::PickupInPast.into(),
            Self::ReturnNotAfterPickup => Error::InvalidPeriod.into(),
            Self::UserNotCustomer(_) => api::PrivilegeError::Customer.into(),
            Self::UserNotExists(_) => return None,
        })
    }
}

impl AsError for command::pay_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "BOOKING_ALREADY_PAID"]
                #[status = CONFLICT]
                #[message = "`Booking` with the provided ID is paid already"]
                BookingAlreadyPaid,

                #[code = "BOOKING_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Booking` with the provided ID does not exist"]
                BookingNotExists,

                #[code = "BOOKING_PAYMENT_FAILED"]
                #[status = CONFLICT]
                #[message = "`Booking` with the provided ID has a failed \
                             payment"]
                BookingPaymentFailed,

                #[code = "CAR_UNAVAILABLE"]
                #[status = CONFLICT]
                #[message = "`Car` of the `Booking` is not available \
                             anymore"]
                CarUnavailable,

                #[code = "NOT_BOOKING_OWNER"]
                #[status = FORBIDDEN]
                #[message = "Authenticated `User` does not own the `Booking`"]
                NotBookingOwner,
            }
        }

        Some(match self {
            Self::BookingAlreadyPaid(_) => Error::BookingAlreadyPaid.into(),
            Self::BookingNotExists(_) => Error::BookingNotExists.into(),
            Self::BookingPaymentFailed(_) => {
                Error::BookingPaymentFailed.into()
            }
            Self::CarUnavailable(_) => Error::CarUnavailable.into(),
            Self::Db(e) => return e.try_as_error(),
            Self::NotBookingOwner(_) => Error::NotBookingOwner.into(),
        })
    }
}

impl AsError for command::cancel_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "BOOKING_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Booking` with the provided ID does not exist"]
                BookingNotExists,

                #[code = "NOT_BOOKING_OWNER"]
                #[status = FORBIDDEN]
                #[message = "Authenticated `User` is not allowed to cancel \
                             the `Booking`"]
                NotBookingOwner,
            }
        }

        Some(match self {
            Self::BookingNotExists(_) => Error::BookingNotExists.into(),
            Self::Db(e) => return e.try_as_error(),
            Self::NotBookingOwner(_) => Error::NotBookingOwner.into(),
            Self::UserNotExists(_) => return None,
        })
    }
}
