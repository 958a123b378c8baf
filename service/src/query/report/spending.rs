//! [`Spending`] report definition.

use std::ops::RangeInclusive;

use common::{
    operations::{By, Select},
    DateTime, Money,
};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::{Booking, User};
use crate::{
    domain::{booking, user},
    infra::{database, Database},
    read, Query, Service,
};

/// [`Query`] aggregating per-customer spending for a given period.
///
/// Backs the administrator reports: how many [`Booking`]s each customer made
/// and how much they spent in total. Rendering the rows to a document is the
/// caller's business.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Spending {
    /// Start of the period.
    pub start: DateTime,

    /// End of the period.
    pub end: DateTime,
}

/// Output of the [`Spending`] [`Query`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Output {
    /// Total count of [`Booking`]s created in the period.
    pub total_bookings: read::booking::list::TotalCount,

    /// Rows of the report.
    pub rows: Vec<Row>,
}

/// Row in the [`Output`] of the [`Spending`] [`Query`].
///
/// One row per customer and currency.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Row {
    /// ID of the [`User`] the spending is aggregated for.
    pub customer_id: user::Id,

    /// Number of [`Booking`]s the [`User`] made in the period.
    pub bookings: read::booking::list::TotalCount,

    /// Summed cost of those [`Booking`]s.
    pub spent: Money,
}

impl<Db> Query<Spending> for Service<Db>
where
    Db: Database<
            Select<
                By<
                    read::booking::list::TotalCount,
                    RangeInclusive<booking::CreationDateTime>,
                >,
            >,
            Ok = read::booking::list::TotalCount,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Row>, RangeInclusive<booking::CreationDateTime>>>,
            Ok = Vec<Row>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Output;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Spending { start, end }: Spending,
    ) -> Result<Self::Ok, Self::Err> {
        let range = RangeInclusive::new(start.coerce(), end.coerce());

        let total_bookings = self
            .database()
            .execute(Select(By::<read::booking::list::TotalCount, _>::new(
                range.clone(),
            )))
            .await
            .map_err(tracerr::wrap!())?;
        if i32::from(total_bookings) == 0 {
            return Ok(Output {
                total_bookings,
                rows: vec![],
            });
        }

        let rows = self
            .database()
            .execute(Select(By::<Vec<Row>, _>::new(range)))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(Output {
            total_bookings,
            rows,
        })
    }
}
