//! [`Car`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::{
    operations::{By, Insert, Lock, Select, Update},
    Money,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tracerr::Traced;

use crate::{
    domain::{car, Car},
    infra::{
        database::{
            self,
            postgres::{Connection, FuzzPattern},
            Postgres,
        },
        Database,
    },
    read,
};

impl<C, IDs> Database<Select<By<HashMap<car::Id, Car>, IDs>>> for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[car::Id]>,
{
    type Ok = HashMap<car::Id, Car>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<car::Id, Car>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[car::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap();

        const SQL: &str = "\
            SELECT id, name, brand, model, \
                   seats, \
                   daily_rate, daily_rate_currency, \
                   image_url, image_file, \
                   is_available, \
                   created_at \
            FROM cars \
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
                    Car {
                        id,
                        name: row.get("name"),
                        brand: row.get("brand"),
                        model: row.get("model"),
                        seats: u8::try_from(row.get::<_, i16>("seats"))
                            .ok()
                            .and_then(car::Seats::new)
                            .expect("`seats` out of range"),
                        daily_rate: Money {
                            amount: row.get("daily_rate"),
                            currency: row.get("daily_rate_currency"),
                        },
                        image: match (
                            row.get::<_, Option<car::ImageUrl>>("image_url"),
                            row.get::<_, Option<car::ImageFile>>("image_file"),
                        ) {
                            (Some(url), None) => car::Image::Url(url),
                            (None, Some(file)) => car::Image::Upload(file),
                            (Some(_), Some(_)) | (None, None) => {
                                unreachable!("enforced by `cars_image_check`")
                            }
                        },
                        is_available: row.get("is_available"),
                        created_at: row.get("created_at"),
                        // OK, because a `Car` is removed from the database
                        // completely once deleted.
                        deleted_at: None,
                    },
                )
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Car>, car::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<car::Id, Car>, [car::Id; 1]>>,
        Ok = HashMap<car::Id, Car>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Car>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Car>, car::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Insert<Car>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Car>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(car): Insert<Car>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(car)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Car>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(car): Update<Car>,
    ) -> Result<Self::Ok, Self::Err> {
        let Car {
            id,
            name,
            brand,
            model,
            seats,
            daily_rate,
            image,
            is_available,
            created_at,
            deleted_at,
        } = car;

        if deleted_at.is_some() {
            const SQL: &str = "\
                DELETE FROM cars \
                WHERE id = $1::UUID";
            return self
                .exec(SQL, &[&id])
                .await
                .map_err(tracerr::wrap!())
                .map(drop);
        }

        let seats = i16::from(seats.get());
        let (image_url, image_file) = match image {
            car::Image::Url(url) => (Some(url), None),
            car::Image::Upload(file) => (None, Some(file)),
        };

        const SQL: &str = "\
            INSERT INTO cars (\
                id, name, brand, model, \
                seats, \
                daily_rate, daily_rate_currency, \
                image_url, image_file, \
                is_available, \
                created_at\
            ) \
            VALUES (\
                $1::UUID, \
                $2::VARCHAR, $3::VARCHAR, $4::VARCHAR, \
                $5::INT2, \
                $6::NUMERIC, $7::INT2, \
                $8::VARCHAR, $9::VARCHAR, \
                $10::BOOL, \
                $11::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                brand = EXCLUDED.brand, \
                model = EXCLUDED.model, \
                seats = EXCLUDED.seats, \
                daily_rate = EXCLUDED.daily_rate, \
                daily_rate_currency = EXCLUDED.daily_rate_currency, \
                image_url = EXCLUDED.image_url, \
                image_file = EXCLUDED.image_file, \
                is_available = EXCLUDED.is_available, \
                created_at = EXCLUDED.created_at";
        self.exec(
            SQL,
            &[
                &id,
                &name,
                &brand,
                &model,
                &seats,
                &daily_rate.amount,
                &daily_rate.currency,
                &image_url,
                &image_file,
                &is_available,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Car, car::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Car, car::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: car::Id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO cars_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO NOTHING";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Update<read::car::Reserve>> for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(read::car::Reserve(id)): Update<read::car::Reserve>,
    ) -> Result<Self::Ok, Self::Err> {
        // Conditional single-statement flip, so concurrent payments cannot
        // both reserve the same `Car`.
        const SQL: &str = "\
            UPDATE cars \
            SET is_available = FALSE \
            WHERE id = $1::UUID \
              AND is_available = TRUE";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(|affected| affected > 0)
    }
}

impl<C> Database<Update<read::car::Release>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(read::car::Release(id)): Update<read::car::Release>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            UPDATE cars \
            SET is_available = TRUE \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<read::car::IsBooked, car::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = read::car::IsBooked;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::car::IsBooked, car::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let car_id: car::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM bookings \
            WHERE car_id = $1::UUID \
            LIMIT 1";
        self.query_opt(SQL, &[&car_id])
            .await
            .map_err(tracerr::wrap!())
            .map(|r| read::car::IsBooked(r.is_some()))
    }
}

impl<C>
    Database<Select<By<read::car::list::Page, read::car::list::Selector>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::car::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::car::list::Page, read::car::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::car::list::Selector {
            arguments,
            filter:
                read::car::list::Filter {
                    search,
                    seats,
                    availability,
                },
        } = by.into_inner();

        let limit = i32::try_from(arguments.limit()).unwrap() + 1;

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];

        let cursor_idx = arguments.cursor().map(|c| {
            ps.push(c);
            ps.len()
        });

        let search_pattern =
            search.as_ref().map(|s| FuzzPattern::new(s.as_ref()));
        let search_pattern_idx = search_pattern.as_ref().map(|s| {
            ps.push(s);
            ps.len()
        });

        let (seats_op, seats_num) = match seats {
            Some(read::car::list::SeatsFilter::Exact(s)) => {
                ("=", Some(i16::from(s.get())))
            }
            Some(read::car::list::SeatsFilter::EightOrMore) => {
                (">=", Some(8))
            }
            None => ("=", None),
        };
        let seats_idx = seats_num.as_ref().map(|n| {
            ps.push(n);
            ps.len()
        });

        let sql = format!(
            "SELECT id \
             FROM cars \
             WHERE true \
                   {cursor} \
                   {search_filtering} \
                   {seats_filtering} \
                   {availability_filtering} \
             ORDER BY id {order} \
             LIMIT $1::INT4",
            cursor = cursor_idx.into_iter().format_with("", |idx, f| {
                let op = arguments.kind().operator();
                f(&format_args!("AND id {op} ${idx}::UUID"))
            }),
            order = arguments.kind().order().sql(),
            search_filtering =
                search_pattern_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!(
                        "AND (LOWER(name) SIMILAR TO LOWER(${idx}::VARCHAR) \
                          OR LOWER(brand) SIMILAR TO LOWER(${idx}::VARCHAR) \
                          OR LOWER(model) SIMILAR TO LOWER(${idx}::VARCHAR))"
                    ))
                }),
            seats_filtering = seats_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND seats {seats_op} ${idx}::INT2"))
            }),
            availability_filtering = match availability {
                read::car::list::Availability::Available => {
                    "AND is_available = TRUE"
                }
                read::car::list::Availability::Unavailable => {
                    "AND is_available = FALSE"
                }
                read::car::list::Availability::All => "",
            },
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

        Ok(read::car::list::Page::new(&arguments, edges, has_more))
    }
}

impl<C>
    Database<Select<By<read::car::list::TotalCount, read::car::list::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::car::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::car::list::TotalCount, read::car::list::Filter>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::car::list::Filter {
            search,
            seats,
            availability,
        } = by.into_inner();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];

        let search_pattern =
            search.as_ref().map(|s| FuzzPattern::new(s.as_ref()));
        let search_pattern_idx = search_pattern.as_ref().map(|s| {
            ps.push(s);
            ps.len()
        });

        let (seats_op, seats_num) = match seats {
            Some(read::car::list::SeatsFilter::Exact(s)) => {
                ("=", Some(i16::from(s.get())))
            }
            Some(read::car::list::SeatsFilter::EightOrMore) => {
                (">=", Some(8))
            }
            None => ("=", None),
        };
        let seats_idx = seats_num.as_ref().map(|n| {
            ps.push(n);
            ps.len()
        });

        let sql = format!(
            "SELECT COUNT(*)::INT4 \
             FROM cars \
             WHERE true \
                   {search_filtering} \
                   {seats_filtering} \
                   {availability_filtering}",
            search_filtering =
                search_pattern_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!(
                        "AND (LOWER(name) SIMILAR TO LOWER(${idx}::VARCHAR) \
                          OR LOWER(brand) SIMILAR TO LOWER(${idx}::VARCHAR) \
                          OR LOWER(model) SIMILAR TO LOWER(${idx}::VARCHAR))"
                    ))
                }),
            seats_filtering = seats_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND seats {seats_op} ${idx}::INT2"))
            }),
            availability_filtering = match availability {
                read::car::list::Availability::Available => {
                    "AND is_available = TRUE"
                }
                read::car::list::Availability::Unavailable => {
                    "AND is_available = FALSE"
                }
                read::car::list::Availability::All => "",
            },
        );
        self.query_opt(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.expect("always exists").get::<_, i32>(0).into())
    }
}
