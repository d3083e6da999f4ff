use diesel::{Connection, PgConnection, RunQueryDsl, sql_query};
use tracing::debug;

use crate::db::connection::connect_pg;
use crate::error::{PersistResult, PipelineResult};
use crate::models::RegistryEntry;
use crate::persistence::{
    NativeUpsert, Persisted, RegistryIo, RelationIo, TableRepo, dedupe_by_key,
};

/// PostgreSQL-backed [`TableRepo`] using native upserts.
pub struct PgRepo {
    conn: PgConnection,
}

impl PgRepo {
    pub fn new(conn: PgConnection) -> Self {
        Self { conn }
    }

    /// Opens `database_url`.
    pub fn connect(database_url: &str) -> PersistResult<Self> {
        Ok(Self::new(connect_pg(database_url)?))
    }

    /// Raw connection, for ad-hoc queries in tools and tests.
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.conn
    }
}

/// Blocks other writers (readers are unaffected) until the transaction ends.
fn lock_exclusive(conn: &mut PgConnection, table: &'static str) -> diesel::QueryResult<()> {
    sql_query(format!("LOCK TABLE {table} IN EXCLUSIVE MODE")).execute(conn)?;
    Ok(())
}

impl TableRepo for PgRepo {
    fn upsert_batch<R: Persisted>(&mut self, rows: &[R]) -> PersistResult<usize> {
        let rows = dedupe_by_key(rows);
        let written = self.conn.transaction(|c| {
            lock_exclusive(c, R::TABLE)?;
            let mut affected = 0;
            for row in &rows {
                affected += <R as NativeUpsert>::upsert(c, row)?;
            }
            debug!(table = R::TABLE, affected, "postgres upsert");
            diesel::QueryResult::Ok(rows.len())
        })?;
        Ok(written)
    }

    fn replace_all<R: Persisted>(&mut self, rows: &[R]) -> PersistResult<usize> {
        let rows = dedupe_by_key(rows);
        let written = self.conn.transaction(|c| {
            lock_exclusive(c, R::TABLE)?;
            let removed = <R as RelationIo<PgConnection>>::delete_all(c)?;
            let inserted = <R as RelationIo<PgConnection>>::insert(c, &rows)?;
            debug!(table = R::TABLE, removed, inserted, "postgres reload");
            diesel::QueryResult::Ok(inserted)
        })?;
        Ok(written)
    }

    fn load_all<R: Persisted>(&mut self) -> PersistResult<Vec<R>> {
        Ok(<R as RelationIo<PgConnection>>::load_all(&mut self.conn)?)
    }

    fn append_registry<F>(&mut self, build: F) -> PipelineResult<RegistryEntry>
    where
        F: FnOnce(i64) -> PipelineResult<RegistryEntry>,
    {
        self.conn.transaction(|c| {
            lock_exclusive(c, "model_registry")?;
            let next = <RegistryEntry as RegistryIo<PgConnection>>::max_version(c)?
                .unwrap_or(0)
                + 1;
            let entry = build(next)?;
            <RegistryEntry as RegistryIo<PgConnection>>::append(c, &entry)?;
            Ok(entry)
        })
    }

    fn registry_latest(&mut self) -> PersistResult<Option<RegistryEntry>> {
        Ok(<RegistryEntry as RegistryIo<PgConnection>>::latest(
            &mut self.conn,
        )?)
    }

    fn registry_entries(&mut self) -> PersistResult<Vec<RegistryEntry>> {
        Ok(<RegistryEntry as RegistryIo<PgConnection>>::history(
            &mut self.conn,
        )?)
    }
}
