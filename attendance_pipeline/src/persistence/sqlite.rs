use std::collections::BTreeMap;

use diesel::{Connection, SqliteConnection};
use tracing::debug;

use crate::db::connection::connect_sqlite;
use crate::error::{PersistResult, PipelineResult};
use crate::models::RegistryEntry;
use crate::persistence::{Persisted, RegistryIo, Relation, RelationIo, TableRepo, dedupe_by_key};

/// SQLite-backed [`TableRepo`] emulating upserts with a full reload.
///
/// Every write runs in `BEGIN IMMEDIATE`, which takes the database write lock
/// up front; with WAL, readers keep seeing the last committed state until
/// commit. One writer process is assumed.
pub struct SqliteRepo {
    conn: SqliteConnection,
}

impl SqliteRepo {
    /// Wraps an open connection (see [`connect_sqlite`]).
    pub fn new(conn: SqliteConnection) -> Self {
        Self { conn }
    }

    /// Opens `database_url` with the standard PRAGMAs.
    pub fn connect(database_url: &str) -> PersistResult<Self> {
        Ok(Self::new(connect_sqlite(database_url)?))
    }

    /// Raw connection, for ad-hoc queries in tools and tests.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }
}

impl TableRepo for SqliteRepo {
    fn upsert_batch<R: Persisted>(&mut self, rows: &[R]) -> PersistResult<usize> {
        let incoming = dedupe_by_key(rows);
        let written = incoming.len();

        self.conn.immediate_transaction(|c| {
            let mut merged: BTreeMap<R::Key, R> =
                <R as RelationIo<SqliteConnection>>::load_all(c)?
                    .into_iter()
                    .map(|row| (row.key(), row))
                    .collect();
            let existing = merged.len();
            for row in incoming {
                merged.insert(row.key(), row);
            }
            let merged: Vec<R> = merged.into_values().collect();

            <R as RelationIo<SqliteConnection>>::delete_all(c)?;
            <R as RelationIo<SqliteConnection>>::insert(c, &merged)?;
            debug!(
                table = R::TABLE,
                existing,
                total = merged.len(),
                "sqlite upsert via reload"
            );
            diesel::QueryResult::Ok(())
        })?;
        Ok(written)
    }

    fn replace_all<R: Persisted>(&mut self, rows: &[R]) -> PersistResult<usize> {
        let rows = dedupe_by_key(rows);
        let written = self.conn.immediate_transaction(|c| {
            let removed = <R as RelationIo<SqliteConnection>>::delete_all(c)?;
            let inserted = <R as RelationIo<SqliteConnection>>::insert(c, &rows)?;
            debug!(table = R::TABLE, removed, inserted, "sqlite reload");
            diesel::QueryResult::Ok(inserted)
        })?;
        Ok(written)
    }

    fn load_all<R: Persisted>(&mut self) -> PersistResult<Vec<R>> {
        Ok(<R as RelationIo<SqliteConnection>>::load_all(&mut self.conn)?)
    }

    fn append_registry<F>(&mut self, build: F) -> PipelineResult<RegistryEntry>
    where
        F: FnOnce(i64) -> PipelineResult<RegistryEntry>,
    {
        self.conn.immediate_transaction(|c| {
            let next = <RegistryEntry as RegistryIo<SqliteConnection>>::max_version(c)?
                .unwrap_or(0)
                + 1;
            let entry = build(next)?;
            <RegistryEntry as RegistryIo<SqliteConnection>>::append(c, &entry)?;
            Ok(entry)
        })
    }

    fn registry_latest(&mut self) -> PersistResult<Option<RegistryEntry>> {
        Ok(<RegistryEntry as RegistryIo<SqliteConnection>>::latest(
            &mut self.conn,
        )?)
    }

    fn registry_entries(&mut self) -> PersistResult<Vec<RegistryEntry>> {
        Ok(<RegistryEntry as RegistryIo<SqliteConnection>>::history(
            &mut self.conn,
        )?)
    }
}
