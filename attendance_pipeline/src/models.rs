//! Diesel row types for the four pipeline tables.
//!
//! - [`AttractionRecord`] and [`PopulationRecord`]: bronze rows, adapter output
//!   verbatim plus the provenance of the batch they came in.
//! - [`FeatureRow`]: silver rows produced by the feature builder.
//! - [`RegistryEntry`]: one trained model; append-only.
//!
//! Counts are `i64` because both engines store them as 64-bit integers.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::Serialize;

use crate::schema::{attraction_features, attraction_raw, model_registry, population_raw};

/// One attraction as fetched; key `(name, city)`.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Queryable, Selectable, Insertable, AsChangeset,
)]
#[diesel(
    table_name = attraction_raw,
    primary_key(name, city),
    treat_none_as_null = true,
    check_for_backend(diesel::sqlite::Sqlite, diesel::pg::Pg)
)]
pub struct AttractionRecord {
    pub name: String,
    pub city: String,
    pub country: Option<String>,
    pub annual_visitors: i64,
    pub observation_year: Option<i32>,
    /// `live` or `fallback`.
    pub provenance: String,
}

/// One dated population figure; key `(city, as_of)`.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Queryable, Selectable, Insertable, AsChangeset,
)]
#[diesel(
    table_name = population_raw,
    primary_key(city, as_of),
    check_for_backend(diesel::sqlite::Sqlite, diesel::pg::Pg)
)]
pub struct PopulationRecord {
    pub city: String,
    pub population: i64,
    pub as_of: NaiveDate,
    /// `live` or `fallback`.
    pub provenance: String,
}

/// Joined attraction and host-city population; key `(attraction_name, city)`.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Queryable,
    Selectable,
    Insertable,
    AsChangeset,
)]
#[diesel(
    table_name = attraction_features,
    primary_key(attraction_name, city),
    treat_none_as_null = true,
    check_for_backend(diesel::sqlite::Sqlite, diesel::pg::Pg)
)]
pub struct FeatureRow {
    pub attraction_name: String,
    /// City as spelled by the attraction source.
    pub city: String,
    pub country: Option<String>,
    pub annual_visitors: i64,
    pub population: i64,
}

/// Metadata of one trained model. Rows are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable, Insertable)]
#[diesel(
    table_name = model_registry,
    check_for_backend(diesel::sqlite::Sqlite, diesel::pg::Pg)
)]
pub struct RegistryEntry {
    /// Starts at 1 and grows by exactly 1 per successful training run.
    pub version: i64,
    /// UTC, microsecond precision.
    pub trained_at: NaiveDateTime,
    pub model_kind: String,
    pub coefficient: f64,
    pub intercept: f64,
    pub r2: f64,
    pub rmse: f64,
    pub mae: f64,
    pub n_samples: i64,
    /// Location of the JSON artifact for this version.
    pub artifact_path: String,
}

impl RegistryEntry {
    /// `exp(intercept) * population^coefficient`.
    pub fn predict(&self, population: f64) -> f64 {
        self.intercept.exp() * population.powf(self.coefficient)
    }
}
