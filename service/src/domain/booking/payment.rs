//! [`Payment`] definitions.

use std::str::FromStr;

use derive_more::{AsRef, Display};

#[cfg(doc)]
use crate::domain::Booking;

use super::PaymentMethod;

/// Payment chosen for a [`Booking`].
///
/// The payment is simulated: no charge is ever made, the chosen method is
/// only recorded on the [`Booking`].
#[derive(Clone, Debug)]
pub enum Payment {
    /// Payment in cash on pickup.
    Cash,

    /// Payment by [`Card`].
    Card(Card),
}

impl Payment {
    /// Returns the [`PaymentMethod`] of this [`Payment`].
    #[must_use]
    pub fn method(&self) -> PaymentMethod {
        match self {
            Self::Cash => PaymentMethod::Cash,
            Self::Card(_) => PaymentMethod::Card,
        }
    }
}

/// Card details of a [`Payment`].
///
/// All four fields must be non-empty, but are not validated for format or
/// checksummed in any way, since no real charge is made with them.
#[derive(Clone, Debug)]
pub struct Card {
    /// Number of the card.
    pub number: CardField,

    /// Name of the card holder.
    pub holder: CardField,

    /// Expiry date of the card.
    pub expiry: CardField,

    /// CVV code of the card.
    pub cvv: CardField,
}

/// Single non-empty field of a [`Card`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
pub struct CardField(String);

impl CardField {
    /// Creates a new [`CardField`] if the given `value` is non-empty.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        Self::check(&value).then_some(Self(value))
    }

    /// Checks whether the given `value` is a valid [`CardField`].
    fn check(value: impl AsRef<str>) -> bool {
        let value = value.as_ref();
        !value.trim().is_empty() && value.len() <= 64
    }
}

impl FromStr for CardField {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `CardField`")
    }
}

#[cfg(test)]
mod spec {
    use super::{Card, CardField, Payment, PaymentMethod};

    #[test]
    fn card_fields_must_be_non_empty() {
        assert!(CardField::new("4111111111111111").is_some());
        assert!(CardField::new("J. Doe").is_some());

        assert!(CardField::new("").is_none());
        assert!(CardField::new("   ").is_none());
        assert!(CardField::new("x".repeat(65)).is_none());
    }

    #[test]
    fn method_follows_payment_variant() {
        assert_eq!(Payment::Cash.method(), PaymentMethod::Cash);

        let card = Payment::Card(Card {
            number: CardField::new("4111111111111111").unwrap(),
            holder: CardField::new("J. Doe").unwrap(),
            expiry: CardField::new("12/30").unwrap(),
            cvv: CardField::new("123").unwrap(),
        });
        assert_eq!(card.method(), PaymentMethod::Card);
    }
}
