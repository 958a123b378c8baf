//! [`Car`]-related read definitions.

use derive_more::Deref;

#[cfg(doc)]
use crate::domain::{Booking, Car};
use crate::domain::car;

/// Indicator whether any [`Booking`] references a [`Car`].
///
/// A [`Car`] cannot be removed while this holds.
#[derive(Clone, Copy, Debug, Deref, Eq, Hash, PartialEq)]
pub struct IsBooked(pub bool);

impl PartialEq<bool> for IsBooked {
    fn eq(&self, other: &bool) -> bool {
        self.0 == *other
    }
}

/// Conditional revocation of a [`Car`]'s availability.
///
/// Succeeds only if the [`Car`] is currently available, flipping the flag in
/// the same statement, so two concurrent payments cannot both reserve it.
#[derive(Clone, Copy, Debug)]
pub struct Reserve(pub car::Id);

/// Unconditional restoration of a [`Car`]'s availability.
#[derive(Clone, Copy, Debug)]
pub struct Release(pub car::Id);

pub mod list {
    //! [`Car`] list definitions.

    use std::str::FromStr;

    use common::define_pagination;
    use derive_more::{AsRef, Display, From, Into};

    use crate::domain::car;
    #[cfg(doc)]
    use crate::domain::Car;

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = car::Id;

    /// Cursor pointing to a specific [`Car`] in a list.
    pub type Cursor = car::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// [`SearchTerm`] to fuzzy match against name, brand and model.
        pub search: Option<SearchTerm>,

        /// [`SeatsFilter`] to restrict the list by seat count.
        pub seats: Option<SeatsFilter>,

        /// [`Availability`] to restrict the list by.
        pub availability: Availability,
    }

    /// Case-insensitive substring matched against a [`Car`]'s name, brand
    /// and model.
    #[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
    #[as_ref(str, String)]
    pub struct SearchTerm(String);

    impl SearchTerm {
        /// Creates a new [`SearchTerm`] if the given `term` is valid.
        #[must_use]
        pub fn new(term: impl Into<String>) -> Option<Self> {
            let term = term.into();
            Self::check(&term).then_some(Self(term))
        }

        /// Checks whether the given `term` is a valid [`SearchTerm`].
        fn check(term: impl AsRef<str>) -> bool {
            let term = term.as_ref();
            term.trim() == term && !term.is_empty() && term.len() <= 100
        }
    }

    impl FromStr for SearchTerm {
        type Err = &'static str;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            Self::new(s).ok_or("invalid `SearchTerm`")
        }
    }

    /// Seat count filter of a [`Car`] list.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub enum SeatsFilter {
        /// Exact seat count match.
        Exact(car::Seats),

        /// Eight seats or more.
        EightOrMore,
    }

    impl SeatsFilter {
        /// Sentinel seat count meaning "8 or more".
        const EIGHT_PLUS: u8 = 8;

        /// Creates a new [`SeatsFilter`] from the given raw seat count.
        ///
        /// The value `8` is a sentinel matching any [`Car`] with 8 seats or
        /// more; every other value matches exactly.
        #[must_use]
        pub fn new(num: u8) -> Option<Self> {
            if num == Self::EIGHT_PLUS {
                Some(Self::EightOrMore)
            } else {
                car::Seats::new(num).map(Self::Exact)
            }
        }

        /// Checks whether the given [`car::Seats`] matches this
        /// [`SeatsFilter`].
        #[must_use]
        pub fn matches(&self, seats: car::Seats) -> bool {
            match self {
                Self::Exact(exact) => seats == *exact,
                Self::EightOrMore => seats.get() >= Self::EIGHT_PLUS,
            }
        }
    }

    /// Availability filter of a [`Car`] list.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub enum Availability {
        /// Only [`Car`]s currently available for booking.
        ///
        /// This is what the public catalog shows.
        #[default]
        Available,

        /// Only [`Car`]s currently booked.
        Unavailable,

        /// All [`Car`]s regardless of availability.
        All,
    }

    /// Total count of [`Car`] list items.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);

    #[cfg(test)]
    mod spec {
        use crate::domain::car;

        use super::SeatsFilter;

        fn seats(num: u8) -> car::Seats {
            car::Seats::new(num).unwrap()
        }

        #[test]
        fn eight_is_a_sentinel_for_eight_or_more() {
            let filter = SeatsFilter::new(8).unwrap();

            assert_eq!(filter, SeatsFilter::EightOrMore);
            assert!(filter.matches(seats(8)));
            assert!(filter.matches(seats(9)));
            assert!(filter.matches(seats(10)));
            assert!(!filter.matches(seats(7)));
        }

        #[test]
        fn other_values_match_exactly() {
            let filter = SeatsFilter::new(4).unwrap();

            assert!(filter.matches(seats(4)));
            assert!(!filter.matches(seats(5)));
            assert!(!filter.matches(seats(3)));

            let nine = SeatsFilter::new(9).unwrap();
            assert!(nine.matches(seats(9)));
            assert!(!nine.matches(seats(10)));
        }

        #[test]
        fn rejects_out_of_range_counts() {
            assert!(SeatsFilter::new(0).is_none());
            assert!(SeatsFilter::new(51).is_none());
            assert!(SeatsFilter::new(1).is_some());
            assert!(SeatsFilter::new(50).is_some());
        }
    }
}
