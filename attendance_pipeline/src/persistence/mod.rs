//! Dual-backend table persistence.
//!
//! [`TableRepo`] is the portable surface every stage writes through. Two
//! implementations exist and one is chosen at startup from the database URL:
//!
//! - [`PgRepo`]: PostgreSQL, native `INSERT … ON CONFLICT DO UPDATE` inside a
//!   transaction holding `LOCK TABLE … IN EXCLUSIVE MODE`.
//! - [`SqliteRepo`]: SQLite, which this crate drives without conflict
//!   clauses. Upserts are emulated by loading the table, merging by key,
//!   truncating and reloading, all in one `BEGIN IMMEDIATE` transaction. This
//!   assumes a single writer process; there is no inter-process coordination
//!   beyond SQLite's own write lock.
//!
//! Either way a reader sees the table before or after the call, never an
//! empty or half-written one, and after a successful call there is exactly
//! one row per key.

mod relation;
mod pg;
mod sqlite;

use std::collections::BTreeMap;

pub use pg::PgRepo;
pub use relation::{NativeUpsert, Persisted, RegistryIo, Relation, RelationIo};
pub use sqlite::SqliteRepo;

use crate::error::{PersistResult, PipelineResult};
use crate::models::RegistryEntry;

/// Portable persistence surface.
///
/// The table and its key columns come from the row type's [`Relation`] impl.
pub trait TableRepo {
    /// Inserts new keys and overwrites existing ones; other rows are kept.
    /// Returns the number of rows in `rows` after deduplication.
    fn upsert_batch<R: Persisted>(&mut self, rows: &[R]) -> PersistResult<usize>;

    /// Replaces the whole table with `rows` (truncate-and-reload).
    fn replace_all<R: Persisted>(&mut self, rows: &[R]) -> PersistResult<usize>;

    /// Every row of the table, ordered by key.
    fn load_all<R: Persisted>(&mut self) -> PersistResult<Vec<R>>;

    /// Appends one registry entry under the next version number.
    ///
    /// `build` receives that version and runs inside the registry transaction,
    /// so it may write the artifact first; if it fails nothing is recorded.
    fn append_registry<F>(&mut self, build: F) -> PipelineResult<RegistryEntry>
    where
        F: FnOnce(i64) -> PipelineResult<RegistryEntry>;

    /// Entry with the highest version, if any.
    fn registry_latest(&mut self) -> PersistResult<Option<RegistryEntry>>;

    /// All entries, oldest first.
    fn registry_entries(&mut self) -> PersistResult<Vec<RegistryEntry>>;
}

/// Keeps the last row for every key, in key order.
pub fn dedupe_by_key<R: Relation>(rows: &[R]) -> Vec<R> {
    let mut by_key = BTreeMap::new();
    for row in rows {
        by_key.insert(row.key(), row.clone());
    }
    by_key.into_values().collect()
}
