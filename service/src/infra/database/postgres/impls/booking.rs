//! [`Booking`]-related [`Database`] implementations.

use std::{collections::HashMap, ops::RangeInclusive};

use common::{
    operations::{By, Delete, Insert, Lock, Select, Update},
    Money,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use rust_decimal::Decimal;
use tracerr::Traced;

use crate::{
    domain::{booking, Booking},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    query::report,
    read,
};

impl<C, IDs> Database<Select<By<HashMap<booking::Id, Booking>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[booking::Id]>,
{
    type Ok = HashMap<booking::Id, Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<booking::Id, Booking>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[booking::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap();

        const SQL: &str = "\
            SELECT id, customer_id, car_id, \
                   pickup_date, return_date, \
                   total_cost, total_cost_currency, \
                   payment_method, payment_status, \
                   created_at \
            FROM bookings \
            WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
            LIMIT $2::INT4";
        Ok(self
            .query(SQL, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let id = row.get("id");
                (
                    id,
                    Booking {
                        id,
                        customer_id: row.get("customer_id"),
                        car_id: row.get("car_id"),
                        period: booking::Period::new(
                            row.get("pickup_date"),
                            row.get("return_date"),
                        )
                        .expect("enforced by `bookings_period_check`"),
                        total_cost: Money {
                            amount: row.get("total_cost"),
                            currency: row.get("total_cost_currency"),
                        },
                        payment_method: row.get("payment_method"),
                        payment_status: row.get("payment_status"),
                        created_at: row.get("created_at"),
                    },
                )
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Booking>, booking::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<booking::Id, Booking>, [booking::Id; 1]>>,
        Ok = HashMap<booking::Id, Booking>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Booking>, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Insert<Booking>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Booking>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(booking): Insert<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(booking))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Booking>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(booking): Update<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        let Booking {
            id,
            customer_id,
            car_id,
            period,
            total_cost,
            payment_method,
            payment_status,
            created_at,
        } = booking;

        let pickup_date = period.pickup();
        let return_date = period.return_date();

        const SQL: &str = "\
            INSERT INTO bookings (\
                id, customer_id, car_id, \
                pickup_date, return_date, \
                total_cost, total_cost_currency, \
                payment_method, payment_status, \
                created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, \
                $4::DATE, $5::DATE, \
                $6::NUMERIC, $7::INT2, \
                $8::INT2, $9::INT2, \
                $10::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET customer_id = EXCLUDED.customer_id, \
                car_id = EXCLUDED.car_id, \
                pickup_date = EXCLUDED.pickup_date, \
                return_date = EXCLUDED.return_date, \
                total_cost = EXCLUDED.total_cost, \
                total_cost_currency = EXCLUDED.total_cost_currency, \
                payment_method = EXCLUDED.payment_method, \
                payment_status = EXCLUDED.payment_status, \
                created_at = EXCLUDED.created_at";
        self.exec(
            SQL,
            &[
                &id,
                &customer_id,
                &car_id,
                &pickup_date,
                &return_date,
                &total_cost.amount,
                &total_cost.currency,
                &payment_method,
                &payment_status,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<Booking>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(booking): Delete<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            DELETE FROM bookings \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&booking.id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Booking, booking::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Booking, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: booking::Id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO bookings_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO NOTHING";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C>
    Database<
        Select<By<read::booking::list::Page, read::booking::list::Selector>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::booking::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::booking::list::Page, read::booking::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::booking::list::Selector {
            arguments,
            filter: read::booking::list::Filter { customer },
        } = by.into_inner();

        let limit = i32::try_from(arguments.limit()).unwrap() + 1;

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];

        let cursor_idx = arguments.cursor().map(|c| {
            ps.push(c);
            ps.len()
        });
        let customer_idx = customer.as_ref().map(|c| {
            ps.push(c);
            ps.len()
        });

        // `Booking` IDs are UUIDv7, so `id` order is creation order.
        let sql = format!(
            "SELECT id \
             FROM bookings \
             WHERE true \
                   {cursor} \
                   {customer_filtering} \
             ORDER BY id {order} \
             LIMIT $1::INT4",
            cursor = cursor_idx.into_iter().format_with("", |idx, f| {
                let op = arguments.kind().operator();
                f(&format_args!("AND id {op} ${idx}::UUID"))
            }),
            order = arguments.kind().order().sql(),
            customer_filtering =
                customer_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND customer_id = ${idx}::UUID"))
                }),
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        let has_more = rows.len() > arguments.limit();
        let edges = rows
            .into_iter()
            .take(arguments.limit())
            .map(|row| {
                let id = row.get("id");
                (id, id)
            })
            .collect::<Vec<_>>();

        Ok(read::booking::list::Page::new(&arguments, edges, has_more))
    }
}

impl<C>
    Database<
        Select<
            By<read::booking::list::TotalCount, read::booking::list::Filter>,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::booking::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::booking::list::TotalCount, read::booking::list::Filter>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::booking::list::Filter { customer } = by.into_inner();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];

        let customer_idx = customer.as_ref().map(|c| {
            ps.push(c);
            ps.len()
        });

        let sql = format!(
            "SELECT COUNT(*)::INT4 \
             FROM bookings \
             WHERE true \
                   {customer_filtering}",
            customer_filtering =
                customer_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND customer_id = ${idx}::UUID"))
                }),
        );
        self.query_opt(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.expect("always exists").get::<_, i32>(0).into())
    }
}

impl<C>
    Database<
        Select<
            By<
                read::booking::list::TotalCount,
                RangeInclusive<booking::CreationDateTime>,
            >,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::booking::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<
                read::booking::list::TotalCount,
                RangeInclusive<booking::CreationDateTime>,
            >,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let range: RangeInclusive<booking::CreationDateTime> = by.into_inner();

        const SQL: &str = "\
            SELECT COUNT(id)::INT4 \
            FROM bookings \
            WHERE created_at >= $1::TIMESTAMPTZ \
              AND created_at <= $2::TIMESTAMPTZ";
        self.query_opt(SQL, &[range.start(), range.end()])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.expect("always exists").get::<_, i32>(0).into())
    }
}

impl<C>
    Database<
        Select<
            By<
                Vec<report::spending::Row>,
                RangeInclusive<booking::CreationDateTime>,
            >,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<report::spending::Row>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<
                Vec<report::spending::Row>,
                RangeInclusive<booking::CreationDateTime>,
            >,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let range: RangeInclusive<booking::CreationDateTime> = by.into_inner();

        const SQL: &str = "\
            SELECT customer_id, \
                   total_cost_currency, \
                   COUNT(id)::INT4 AS bookings, \
                   SUM(total_cost) AS spent \
            FROM bookings \
            WHERE created_at >= $1::TIMESTAMPTZ \
              AND created_at <= $2::TIMESTAMPTZ \
            GROUP BY customer_id, total_cost_currency";
        self.query(SQL, &[range.start(), range.end()])
            .await
            .map_err(tracerr::wrap!())
            .map(|rows| {
                rows.into_iter()
                    .map(|row| report::spending::Row {
                        customer_id: row.get("customer_id"),
                        bookings: row.get::<_, i32>("bookings").into(),
                        spent: Money {
                            amount: row.get::<_, Decimal>("spent"),
                            currency: row.get("total_cost_currency"),
                        },
                    })
                    .collect()
            })
    }
}
