//! [`Booking`] read model definition.
//!
//! [`Booking`]: crate::domain::Booking

pub mod list {
    //! [`Booking`]s list definitions.

    use common::define_pagination;
    use derive_more::{From, Into};

    use crate::domain::{booking, user};
    #[cfg(doc)]
    use crate::domain::Booking;

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = booking::Id;

    /// Cursor pointing to a specific [`Booking`] in a list.
    ///
    /// [`Booking`] IDs are UUID version 7, so cursor order is creation order
    /// and backward pagination yields newest-first listings.
    pub type Cursor = booking::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// ID of the customer to restrict the list to.
        pub customer: Option<user::Id>,
    }

    /// Total count of [`Booking`]s.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);
}
