//! Read-only surface for the serving layer. Nothing here writes.

use serde::Serialize;

use crate::error::{PipelineError, PipelineResult};
use crate::models::{FeatureRow, RegistryEntry};
use crate::persistence::TableRepo;

/// Answer of [`predict`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    /// Registry version that produced the estimate.
    pub version: i64,
    pub population: f64,
    pub visitors: f64,
}

/// Feature rows, most visited first; ties by attraction name.
pub fn list_features<S: TableRepo>(repo: &mut S) -> PipelineResult<Vec<FeatureRow>> {
    let mut rows = repo.load_all::<FeatureRow>()?;
    rows.sort_by(|a, b| {
        b.annual_visitors
            .cmp(&a.annual_visitors)
            .then_with(|| a.attraction_name.cmp(&b.attraction_name))
            .then_with(|| a.city.cmp(&b.city))
    });
    Ok(rows)
}

pub fn latest_entry<S: TableRepo>(repo: &mut S) -> PipelineResult<RegistryEntry> {
    repo.registry_latest()?
        .ok_or_else(|| PipelineError::NotFound("no model has been trained".to_string()))
}

/// Every registry entry, oldest first.
pub fn registry_history<S: TableRepo>(repo: &mut S) -> PipelineResult<Vec<RegistryEntry>> {
    Ok(repo.registry_entries()?)
}

/// Estimated annual visitors for a city of `population` under the latest model.
pub fn predict<S: TableRepo>(repo: &mut S, population: f64) -> PipelineResult<Prediction> {
    if !population.is_finite() || population <= 0.0 {
        return Err(PipelineError::Validation(format!(
            "population must be a positive number, got {population}"
        )));
    }
    let entry = latest_entry(repo)?;
    Ok(Prediction {
        version: entry.version,
        population,
        visitors: entry.predict(population),
    })
}
