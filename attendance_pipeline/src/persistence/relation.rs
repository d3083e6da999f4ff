//! Per-table statements, generated for both connection types.

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::{PgConnection, SqliteConnection};

use crate::models::{AttractionRecord, FeatureRow, PopulationRecord, RegistryEntry};

/// A row type stored in one table with a natural key.
pub trait Relation: Clone {
    /// Table name, for logs and table locks.
    const TABLE: &'static str;
    /// Natural key; the table's primary key columns.
    type Key: Ord + Clone + std::fmt::Debug;

    fn key(&self) -> Self::Key;
}

/// Statements every backend can run for a [`Relation`].
pub trait RelationIo<C: Connection>: Relation {
    /// All rows ordered by key.
    fn load_all(conn: &mut C) -> QueryResult<Vec<Self>>;
    fn delete_all(conn: &mut C) -> QueryResult<usize>;
    /// Plain inserts; a duplicate key is a constraint violation.
    fn insert(conn: &mut C, rows: &[Self]) -> QueryResult<usize>;
}

/// `INSERT … ON CONFLICT (key) DO UPDATE` for one row.
pub trait NativeUpsert: RelationIo<PgConnection> {
    fn upsert(conn: &mut PgConnection, row: &Self) -> QueryResult<usize>;
}

/// Row types usable with every [`TableRepo`](super::TableRepo).
pub trait Persisted: RelationIo<SqliteConnection> + NativeUpsert {}

impl<T> Persisted for T where T: RelationIo<SqliteConnection> + NativeUpsert {}

/// Registry statements. The registry is append-only, so there is no delete.
pub trait RegistryIo<C: Connection>: Sized {
    fn max_version(conn: &mut C) -> QueryResult<Option<i64>>;
    fn append(conn: &mut C, entry: &Self) -> QueryResult<usize>;
    fn latest(conn: &mut C) -> QueryResult<Option<Self>>;
    fn history(conn: &mut C) -> QueryResult<Vec<Self>>;
}

macro_rules! relation_io {
    (@impl $row:ty, $table:ident, [$($key:ident),+], $conn:ty) => {
        impl RelationIo<$conn> for $row {
            fn load_all(conn: &mut $conn) -> QueryResult<Vec<Self>> {
                use crate::schema::$table::dsl;
                dsl::$table
                    .order(($(dsl::$key,)+))
                    .select(<$row>::as_select())
                    .load(conn)
            }

            fn delete_all(conn: &mut $conn) -> QueryResult<usize> {
                diesel::delete(crate::schema::$table::table).execute(conn)
            }

            fn insert(conn: &mut $conn, rows: &[Self]) -> QueryResult<usize> {
                let mut inserted = 0;
                for row in rows {
                    inserted += diesel::insert_into(crate::schema::$table::table)
                        .values(row)
                        .execute(conn)?;
                }
                Ok(inserted)
            }
        }
    };
    ($row:ty, $table:ident, [$($key:ident: $kty:ty),+]) => {
        impl Relation for $row {
            const TABLE: &'static str = stringify!($table);
            type Key = ($($kty,)+);

            fn key(&self) -> Self::Key {
                ($(self.$key.clone(),)+)
            }
        }

        relation_io!(@impl $row, $table, [$($key),+], SqliteConnection);
        relation_io!(@impl $row, $table, [$($key),+], PgConnection);

        impl NativeUpsert for $row {
            fn upsert(conn: &mut PgConnection, row: &Self) -> QueryResult<usize> {
                use crate::schema::$table::dsl;
                diesel::insert_into(dsl::$table)
                    .values(row)
                    .on_conflict(($(dsl::$key,)+))
                    .do_update()
                    .set(row)
                    .execute(conn)
            }
        }
    };
}

macro_rules! registry_io {
    ($conn:ty) => {
        impl RegistryIo<$conn> for RegistryEntry {
            fn max_version(conn: &mut $conn) -> QueryResult<Option<i64>> {
                use crate::schema::model_registry::dsl;
                dsl::model_registry
                    .select(diesel::dsl::max(dsl::version))
                    .first(conn)
            }

            fn append(conn: &mut $conn, entry: &Self) -> QueryResult<usize> {
                diesel::insert_into(crate::schema::model_registry::table)
                    .values(entry)
                    .execute(conn)
            }

            fn latest(conn: &mut $conn) -> QueryResult<Option<Self>> {
                use crate::schema::model_registry::dsl;
                dsl::model_registry
                    .order(dsl::version.desc())
                    .select(RegistryEntry::as_select())
                    .first(conn)
                    .optional()
            }

            fn history(conn: &mut $conn) -> QueryResult<Vec<Self>> {
                use crate::schema::model_registry::dsl;
                dsl::model_registry
                    .order(dsl::version.asc())
                    .select(RegistryEntry::as_select())
                    .load(conn)
            }
        }
    };
}

relation_io!(AttractionRecord, attraction_raw, [name: String, city: String]);
relation_io!(PopulationRecord, population_raw, [city: String, as_of: NaiveDate]);
relation_io!(
    FeatureRow,
    attraction_features,
    [attraction_name: String, city: String]
);

registry_io!(SqliteConnection);
registry_io!(PgConnection);
