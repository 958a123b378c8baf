//! Report-related definitions.

use common::Money;
use juniper::graphql_object;
use service::query::report;

use crate::{api, Context};

/// Per-customer spending report over a period.
#[derive(Clone, Debug)]
pub struct Spending(report::spending::Output);

impl From<report::spending::Output> for Spending {
    fn from(output: report::spending::Output) -> Self {
        Self(output)
    }
}

/// Per-customer spending report over a period.
#[graphql_object(name = "SpendingReport", context = Context)]
impl Spending {
    /// Total count of `Booking`s created in the period.
    #[must_use]
    pub fn total_bookings(&self) -> i32 {
        self.0.total_bookings.into()
    }

    /// Rows of this `SpendingReport`, one per customer and currency.
    #[must_use]
    pub fn rows(&self) -> Vec<Row> {
        self.0.rows.iter().copied().map(Row).collect()
    }
}

/// Row of a `SpendingReport`.
#[derive(Clone, Copy, Debug)]
pub struct Row(report::spending::Row);

/// Row of a `SpendingReport`.
#[graphql_object(name = "SpendingReportRow", context = Context)]
impl Row {
    /// Customer the spending is aggregated for.
    #[must_use]
    pub fn customer(&self) -> api::User {
        #[expect(
            unsafe_code,
            reason = "report rows reference existing `User`s"
        )]
        unsafe {
            api::User::new_unchecked(self.0.customer_id)
        }
    }

    /// Number of `Booking`s the customer made in the period.
    #[must_use]
    pub fn bookings(&self) -> i32 {
        self.0.bookings.into()
    }

    /// Summed cost of those `Booking`s.
    #[must_use]
    pub fn spent(&self) -> Money {
        self.0.spent
    }
}
