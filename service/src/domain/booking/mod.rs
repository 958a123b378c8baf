//! [`Booking`] definitions.

pub mod payment;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, Date, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::{Car, User};
use crate::domain::{car, user};

pub use self::payment::Payment;

/// Reservation of a [`Car`] by a [`User`] over a [`Period`].
#[derive(Clone, Debug)]
pub struct Booking {
    /// ID of this [`Booking`].
    pub id: Id,

    /// ID of the [`User`] who placed this [`Booking`].
    pub customer_id: user::Id,

    /// ID of the [`Car`] this [`Booking`] reserves.
    pub car_id: car::Id,

    /// [`Period`] this [`Booking`] spans.
    pub period: Period,

    /// Total cost of this [`Booking`].
    ///
    /// Computed once at creation time from the [`Car`]'s daily rate of that
    /// moment, and never re-derived afterwards.
    pub total_cost: Money,

    /// [`PaymentMethod`] chosen for this [`Booking`].
    pub payment_method: PaymentMethod,

    /// [`PaymentStatus`] of this [`Booking`].
    pub payment_status: PaymentStatus,

    /// [`DateTime`] when this [`Booking`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Booking`].
///
/// Unlike other entity IDs, [`Booking`] IDs are UUID version 7, so their
/// ordering follows creation order.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new creation-time-ordered [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

/// Half-open calendar-day interval `[pickup, return)` of a [`Booking`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Period {
    /// [`Date`] the [`Car`] is picked up.
    pickup: Date,

    /// [`Date`] the [`Car`] is returned.
    return_date: Date,
}

impl Period {
    /// Creates a new [`Period`] if `return_date` is after `pickup`.
    #[must_use]
    pub fn new(pickup: Date, return_date: Date) -> Option<Self> {
        (return_date > pickup).then_some(Self {
            pickup,
            return_date,
        })
    }

    /// Returns the pickup [`Date`] of this [`Period`].
    #[must_use]
    pub fn pickup(&self) -> Date {
        self.pickup
    }

    /// Returns the return [`Date`] of this [`Period`].
    #[must_use]
    pub fn return_date(&self) -> Date {
        self.return_date
    }

    /// Returns the number of whole days this [`Period`] spans.
    ///
    /// Always at least 1.
    #[expect(clippy::missing_panics_doc, reason = "invariant")]
    #[must_use]
    pub fn days(&self) -> u32 {
        u32::try_from(self.return_date - self.pickup)
            .expect("positive by construction")
    }

    /// Returns the total cost of renting over this [`Period`] at the given
    /// `daily_rate`.
    #[must_use]
    pub fn cost(&self, daily_rate: Money) -> Money {
        daily_rate * self.days()
    }
}

define_kind! {
    #[doc = "Payment method of a [`Booking`]."]
    enum PaymentMethod {
        #[doc = "No method chosen yet."]
        Pending = 1,

        #[doc = "Payment in cash on pickup."]
        Cash = 2,

        #[doc = "Payment by card."]
        Card = 3,
    }
}

define_kind! {
    #[doc = "Payment status of a [`Booking`]."]
    enum PaymentStatus {
        #[doc = "Payment has not happened yet."]
        Pending = 1,

        #[doc = "Payment completed, the booking is confirmed."]
        Completed = 2,

        #[doc = "Payment failed, the booking is retained for the record."]
        Failed = 3,
    }
}

/// [`DateTime`] when a [`Booking`] was created.
pub type CreationDateTime = DateTimeOf<(Booking, unit::Creation)>;

#[cfg(test)]
mod spec {
    use common::{money::Currency, Date, Money};
    use rust_decimal::Decimal;

    use super::Period;

    fn date(s: &str) -> Date {
        Date::from_iso8601(s).unwrap()
    }

    fn money(s: &str) -> Money {
        Money {
            amount: s.parse::<Decimal>().unwrap(),
            currency: Currency::Usd,
        }
    }

    #[test]
    fn rejects_return_not_after_pickup() {
        let day = date("2024-01-01");
        let next = date("2024-01-02");

        assert!(Period::new(day, day).is_none());
        assert!(Period::new(next, day).is_none());
        assert!(Period::new(day, next).is_some());
    }

    #[test]
    fn counts_whole_days() {
        let period =
            Period::new(date("2024-01-01"), date("2024-01-04")).unwrap();
        assert_eq!(period.days(), 3);

        let one_day =
            Period::new(date("2024-01-01"), date("2024-01-02")).unwrap();
        assert_eq!(one_day.days(), 1);
    }

    #[test]
    fn costs_days_times_daily_rate() {
        let period =
            Period::new(date("2024-01-01"), date("2024-01-04")).unwrap();

        assert_eq!(period.cost(money("45.00")), money("135.00"));
    }
}
