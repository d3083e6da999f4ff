use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A population figure for a city at a point in time.
///
/// A city may appear several times with different `as_of` dates; consumers
/// pick the most recent one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityPopulation {
    /// City name as used by the attraction list.
    pub city: String,
    /// Number of inhabitants.
    pub population: u64,
    /// Date the figure refers to.
    pub as_of: NaiveDate,
}
