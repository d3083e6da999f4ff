//! Embedded migrations, one set per backend.

use diesel::connection::SimpleConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use crate::db::BackendKind;
use crate::db::connection::{connect_pg, connect_sqlite};
use crate::error::{PersistResult, PersistenceError};

/// SQLite flavour of the schema (TEXT dates, trigger-enforced append-only registry).
pub const SQLITE_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/sqlite");

/// PostgreSQL flavour of the schema.
pub const POSTGRES_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/postgres");

/// Runs pending migrations on a SQLite database; returns how many were applied.
pub fn run_sqlite(url: &str) -> PersistResult<usize> {
    let mut conn = connect_sqlite(url)?;
    conn.batch_execute("PRAGMA journal_mode=WAL;")?;
    let applied = conn
        .run_pending_migrations(SQLITE_MIGRATIONS)
        .map_err(|e| PersistenceError::Migration(e.to_string()))?;
    info!(applied = applied.len(), "sqlite migrations");
    Ok(applied.len())
}

/// Runs pending migrations on a PostgreSQL database; returns how many were applied.
pub fn run_postgres(url: &str) -> PersistResult<usize> {
    let mut conn = connect_pg(url)?;
    let applied = conn
        .run_pending_migrations(POSTGRES_MIGRATIONS)
        .map_err(|e| PersistenceError::Migration(e.to_string()))?;
    info!(applied = applied.len(), "postgres migrations");
    Ok(applied.len())
}

/// Runs pending migrations for whichever backend `database_url` names.
pub fn run_all(database_url: &str) -> PersistResult<usize> {
    match BackendKind::from_url(database_url) {
        BackendKind::Postgres => run_postgres(database_url),
        BackendKind::Sqlite => run_sqlite(database_url),
    }
}

#[cfg(test)]
mod test {
    use diesel::{Connection, SqliteConnection};

    use super::*;

    #[test]
    fn migrations_apply_on_temp_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let path = temp.path().to_string_lossy().to_string();

        assert_eq!(run_sqlite(&path).expect("migration run"), 1);
        assert_eq!(run_all(&path).expect("second run"), 0);

        let mut conn = SqliteConnection::establish(&path).unwrap();
        conn.batch_execute(
            "INSERT INTO attraction_raw (name, city, annual_visitors, provenance) \
             VALUES ('Louvre', 'Paris', 8900000, 'live')",
        )
        .unwrap();
    }
}
