//! Silver layer: attractions joined to the population of their host city.
//!
//! The join key is the city name trimmed and lowercased; there is no alias
//! table, so spellings that differ beyond case and surrounding whitespace do
//! not match and the attraction is counted as skipped.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::PipelineResult;
use crate::models::{AttractionRecord, FeatureRow, PopulationRecord};
use crate::persistence::TableRepo;

/// Attractions must exceed this many annual visitors (strictly).
pub const VISITOR_THRESHOLD: i64 = 2_000_000;

/// Result of [`build_features`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureSummary {
    pub rows_written: usize,
    /// Attractions whose city has no population record.
    pub rows_skipped: usize,
    /// Matched attractions at or below [`VISITOR_THRESHOLD`].
    pub rows_below_threshold: usize,
}

/// Join key for city names.
pub fn normalize_city(city: &str) -> String {
    city.trim().to_lowercase()
}

/// Rows plus counts, before anything is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derived {
    /// Sorted by key, exact duplicates removed.
    pub rows: Vec<FeatureRow>,
    pub skipped: usize,
    pub below_threshold: usize,
    /// Distinct cities (as written) with no population.
    pub unmatched_cities: BTreeSet<String>,
}

/// Picks, for every normalized city, the record with the latest `as_of`.
///
/// Ties on `as_of` go to the greater `(city, population)` so the result does
/// not depend on input order.
pub fn latest_populations(
    populations: &[PopulationRecord],
) -> BTreeMap<String, &PopulationRecord> {
    let mut latest: BTreeMap<String, &PopulationRecord> = BTreeMap::new();
    for p in populations {
        let rank = |r: &PopulationRecord| (r.as_of, r.city.clone(), r.population);
        latest
            .entry(normalize_city(&p.city))
            .and_modify(|cur| {
                if rank(p) > rank(*cur) {
                    *cur = p;
                }
            })
            .or_insert(p);
    }
    latest
}

/// Pure join and filter over the two raw tables.
pub fn derive_features(
    attractions: &[AttractionRecord],
    populations: &[PopulationRecord],
) -> Derived {
    let latest = latest_populations(populations);

    let mut rows = Vec::new();
    let mut skipped = 0;
    let mut below_threshold = 0;
    let mut unmatched_cities = BTreeSet::new();

    for a in attractions {
        let Some(pop) = latest.get(&normalize_city(&a.city)) else {
            skipped += 1;
            unmatched_cities.insert(a.city.clone());
            continue;
        };
        if a.annual_visitors <= VISITOR_THRESHOLD {
            below_threshold += 1;
            continue;
        }
        rows.push(FeatureRow {
            attraction_name: a.name.clone(),
            city: a.city.clone(),
            country: a.country.clone(),
            annual_visitors: a.annual_visitors,
            population: pop.population,
        });
    }

    rows.sort();
    rows.dedup();

    Derived {
        rows,
        skipped,
        below_threshold,
        unmatched_cities,
    }
}

/// Rebuilds the feature table from the current raw tables.
#[instrument(skip_all)]
pub fn build_features<S: TableRepo>(repo: &mut S) -> PipelineResult<FeatureSummary> {
    let attractions = repo.load_all::<AttractionRecord>()?;
    let populations = repo.load_all::<PopulationRecord>()?;
    if attractions.is_empty() {
        warn!("attraction_raw is empty; feature table will be emptied");
    }

    let derived = derive_features(&attractions, &populations);
    if !derived.unmatched_cities.is_empty() {
        warn!(
            cities = ?derived.unmatched_cities,
            attractions = derived.skipped,
            "attractions without a population record"
        );
    }

    let rows_written = repo.replace_all(&derived.rows)?;
    let summary = FeatureSummary {
        rows_written,
        rows_skipped: derived.skipped,
        rows_below_threshold: derived.below_threshold,
    };
    info!(
        written = summary.rows_written,
        skipped = summary.rows_skipped,
        below_threshold = summary.rows_below_threshold,
        "feature table rebuilt"
    );
    Ok(summary)
}
