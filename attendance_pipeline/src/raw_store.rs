//! Bronze layer: adapter output stored verbatim, one table per source.

use attendance_ingestor::models::{Attraction, CityPopulation, Fetched, Provenance};
use serde::Serialize;
use tracing::info;

use crate::error::{PipelineError, PipelineResult};
use crate::models::{AttractionRecord, PopulationRecord};
use crate::persistence::TableRepo;

/// What one source contributed to an ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    /// Rows stored after key deduplication.
    pub rows: usize,
    pub provenance: Provenance,
}

/// Result of [`ingest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub attractions: SourceSummary,
    pub populations: SourceSummary,
}

/// Truncates and reloads both raw tables, each in its own transaction.
///
/// If the population reload fails the attraction table already holds the new
/// batch; both tables are always internally consistent and the next run
/// converges.
pub fn ingest<S: TableRepo>(
    repo: &mut S,
    attractions: &Fetched<Attraction>,
    populations: &Fetched<CityPopulation>,
) -> PipelineResult<IngestSummary> {
    let attraction_rows = attraction_records(attractions)?;
    let population_rows = population_records(populations)?;

    let stored_attractions = repo.replace_all(&attraction_rows)?;
    let stored_populations = repo.replace_all(&population_rows)?;

    let summary = IngestSummary {
        attractions: SourceSummary {
            rows: stored_attractions,
            provenance: attractions.provenance,
        },
        populations: SourceSummary {
            rows: stored_populations,
            provenance: populations.provenance,
        },
    };
    info!(
        attractions = summary.attractions.rows,
        attractions_provenance = %summary.attractions.provenance,
        populations = summary.populations.rows,
        populations_provenance = %summary.populations.provenance,
        "raw tables reloaded"
    );
    Ok(summary)
}

/// Converts adapter output to rows, tagging each with the batch provenance.
pub fn attraction_records(batch: &Fetched<Attraction>) -> PipelineResult<Vec<AttractionRecord>> {
    batch
        .records
        .iter()
        .map(|a| {
            Ok(AttractionRecord {
                name: a.name.clone(),
                city: a.city.clone(),
                country: a.country.clone(),
                annual_visitors: to_i64(a.annual_visitors, "annual_visitors")?,
                observation_year: a.observation_year,
                provenance: batch.provenance.as_str().to_string(),
            })
        })
        .collect()
}

/// Converts adapter output to rows, tagging each with the batch provenance.
pub fn population_records(
    batch: &Fetched<CityPopulation>,
) -> PipelineResult<Vec<PopulationRecord>> {
    batch
        .records
        .iter()
        .map(|p| {
            Ok(PopulationRecord {
                city: p.city.clone(),
                population: to_i64(p.population, "population")?,
                as_of: p.as_of,
                provenance: batch.provenance.as_str().to_string(),
            })
        })
        .collect()
}

fn to_i64(value: u64, field: &str) -> PipelineResult<i64> {
    i64::try_from(value)
        .map_err(|_| PipelineError::Validation(format!("{field} {value} does not fit in 64 bits")))
}
