//! Medallion pipeline relating museum attendance to city population.
//!
//! - bronze: [`raw_store`] reloads the raw attraction and population tables
//!   from the source adapters, live or bundled.
//! - silver: [`features`] joins attractions to the latest population of their
//!   city and keeps those above two million visitors.
//! - gold: [`trainer`] fits `visitors ≈ exp(intercept) · population^coefficient`
//!   and appends a version to the model registry.
//!
//! Every table goes through [`persistence::TableRepo`], implemented for
//! PostgreSQL and SQLite. [`query`] is the read-only side for serving.

pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod models;
pub mod persistence;
pub mod pipeline;
pub mod query;
pub mod raw_store;
pub mod registry;
pub mod regression;
pub mod schema;
pub mod trainer;
