//! Static snapshots compiled into the crate, used when a live source fails.

use async_trait::async_trait;
use snafu::{ResultExt, ensure};

use crate::models::{Attraction, CityPopulation};
use crate::providers::{EmptySnafu, SnapshotSnafu, Source, SourceError};

const ATTRACTIONS_JSON: &str = include_str!("../../data/attractions.json");
const POPULATIONS_JSON: &str = include_str!("../../data/populations.json");

/// Decodes the bundled attraction list (2024 figures).
pub fn snapshot_attractions() -> Result<Vec<Attraction>, SourceError> {
    decode(BundledAttractions.name(), ATTRACTIONS_JSON)
}

/// Decodes the bundled population table.
pub fn snapshot_populations() -> Result<Vec<CityPopulation>, SourceError> {
    decode(BundledPopulations.name(), POPULATIONS_JSON)
}

fn decode<R: serde::de::DeserializeOwned>(
    source_name: &'static str,
    json: &str,
) -> Result<Vec<R>, SourceError> {
    let records: Vec<R> = serde_json::from_str(json).context(SnapshotSnafu { source_name })?;
    ensure!(!records.is_empty(), EmptySnafu { source_name });
    Ok(records)
}

/// Bundled attraction snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledAttractions;

#[async_trait]
impl Source for BundledAttractions {
    type Query = ();
    type Record = Attraction;

    fn name(&self) -> &'static str {
        "bundled-attractions"
    }

    async fn fetch(&self, _query: &()) -> Result<Vec<Attraction>, SourceError> {
        snapshot_attractions()
    }
}

/// Bundled population snapshot.
///
/// The whole table is returned whatever cities are asked for; cities the
/// attraction list does not mention are harmless to the join.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledPopulations;

#[async_trait]
impl Source for BundledPopulations {
    type Query = [String];
    type Record = CityPopulation;

    fn name(&self) -> &'static str {
        "bundled-populations"
    }

    async fn fetch(&self, _cities: &[String]) -> Result<Vec<CityPopulation>, SourceError> {
        snapshot_populations()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn snapshots_decode() {
        let attractions = snapshot_attractions().unwrap();
        assert_eq!(attractions.len(), 33);
        assert!(attractions.iter().all(|a| a.annual_visitors > 2_000_000));
        assert_eq!(attractions[0].name, "Louvre");

        let populations = snapshot_populations().unwrap();
        assert!(populations.iter().any(|p| p.city == "Vatican City" && p.population == 825));
    }

    #[test]
    fn every_snapshot_city_has_a_population() {
        let cities: HashSet<String> = snapshot_populations()
            .unwrap()
            .into_iter()
            .map(|p| p.city)
            .collect();
        for a in snapshot_attractions().unwrap() {
            assert!(cities.contains(&a.city), "no population for {}", a.city);
        }
    }
}
