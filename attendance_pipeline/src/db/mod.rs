//! Database utilities for connections and schema migrations.
//!
//! This module provides:
//! - Connection helpers: [`connection::connect_sqlite`] applies WAL, foreign_keys=ON and a
//!   5000ms busy_timeout; [`connection::connect_pg`] opens a PostgreSQL connection.
//! - Embedded Diesel migrations per backend and runners: [`migrate::run_sqlite`],
//!   [`migrate::run_postgres`] and [`migrate::run_all`], which dispatches on [`BackendKind`].
//!
//! Example:
//! ```no_run
//! use attendance_pipeline::db::{connection, migrate};
//!
//! // Bare paths and sqlite:// URLs are SQLite
//! let db_path = std::env::temp_dir().join("attendance_example.db");
//! migrate::run_all(db_path.to_str().unwrap()).expect("migrations");
//!
//! let _conn = connection::connect_sqlite(db_path.to_str().unwrap()).expect("connect");
//! ```
//!
//! Note: Building with PostgreSQL support requires the system libpq (e.g., libpq-dev on Debian/Ubuntu).

pub mod connection;
pub mod migrate;

/// Storage engine behind a `DATABASE_URL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Native `INSERT … ON CONFLICT DO UPDATE`.
    Postgres,
    /// Upsert emulated by an immediate-transaction reload.
    Sqlite,
}

impl BackendKind {
    /// `postgres://` and `postgresql://` are PostgreSQL; everything else is a SQLite path.
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            BackendKind::Postgres
        } else {
            BackendKind::Sqlite
        }
    }
}
