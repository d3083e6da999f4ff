//! Canonical in-memory representation of one attraction's attendance figure.
//!
//! Every [`Source`](crate::providers::Source) producing attractions returns this
//! shape, whether it parsed a live page or loaded the bundled snapshot.

use serde::{Deserialize, Serialize};

/// One attraction and its reported annual visitor count.
///
/// The natural key is `(name, city)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attraction {
    /// Display name, e.g. "Louvre".
    pub name: String,
    /// Host city as written by the source, e.g. "Paris".
    pub city: String,
    /// Country, when the source names one.
    #[serde(default)]
    pub country: Option<String>,
    /// Annual visitors for `observation_year`.
    pub annual_visitors: u64,
    /// Year the count refers to, when the source gives one.
    #[serde(default)]
    pub observation_year: Option<i32>,
}
