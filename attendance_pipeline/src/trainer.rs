//! Gold layer: fits the power-law model over the feature table and records it.

use chrono::{SubsecRound, Utc};
use tracing::{info, instrument, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::models::{FeatureRow, RegistryEntry};
use crate::persistence::TableRepo;
use crate::registry::{ArtifactStore, ModelArtifact};
use crate::regression::PowerLaw;

/// Recorded in every registry entry and artifact.
pub const MODEL_KIND: &str = "log_log_ols";

/// Usable rows required before fitting.
pub const MIN_SAMPLES: usize = 2;

/// `(population, visitors)` pairs from rows where both are positive.
pub fn training_samples(rows: &[FeatureRow]) -> Vec<(f64, f64)> {
    rows.iter()
        .filter(|r| r.population > 0 && r.annual_visitors > 0)
        .map(|r| (r.population as f64, r.annual_visitors as f64))
        .collect()
}

/// Trains on the current feature table and appends the next registry version.
///
/// Nothing is written when fewer than [`MIN_SAMPLES`] usable rows exist.
#[instrument(skip_all)]
pub fn train<S: TableRepo>(repo: &mut S, store: &ArtifactStore) -> PipelineResult<RegistryEntry> {
    let rows = repo.load_all::<FeatureRow>()?;
    let samples = training_samples(&rows);
    let excluded = rows.len() - samples.len();
    if excluded > 0 {
        warn!(excluded, "feature rows with non-positive values left out of training");
    }
    if samples.len() < MIN_SAMPLES {
        return Err(PipelineError::Validation(format!(
            "training needs at least {MIN_SAMPLES} rows with positive population and visitors, found {}",
            samples.len()
        )));
    }

    let model = PowerLaw::fit(&samples)?;
    let metrics = model.evaluate(&samples);
    let n_samples = samples.len() as i64;
    let trained_at = Utc::now().naive_utc().trunc_subsecs(6);

    let entry = repo.append_registry(|version| {
        let artifact = ModelArtifact {
            version,
            model_kind: MODEL_KIND.to_string(),
            coefficient: model.coefficient,
            intercept: model.intercept,
            n_samples,
            trained_at,
        };
        let path = store.write(&artifact)?;
        Ok(RegistryEntry {
            version,
            trained_at,
            model_kind: artifact.model_kind,
            coefficient: model.coefficient,
            intercept: model.intercept,
            r2: metrics.r2,
            rmse: metrics.rmse,
            mae: metrics.mae,
            n_samples,
            artifact_path: path.to_string_lossy().into_owned(),
        })
    })?;

    info!(
        version = entry.version,
        n_samples,
        coefficient = entry.coefficient,
        intercept = entry.intercept,
        r2 = entry.r2,
        "model trained"
    );
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, population: i64, visitors: i64) -> FeatureRow {
        FeatureRow {
            attraction_name: name.into(),
            city: "X".into(),
            country: None,
            annual_visitors: visitors,
            population,
        }
    }

    #[test]
    fn non_positive_rows_are_excluded() {
        let rows = [
            row("a", 1_000_000, 3_000_000),
            row("b", 0, 3_000_000),
            row("c", 2_000_000, -1),
        ];
        assert_eq!(training_samples(&rows), vec![(1_000_000.0, 3_000_000.0)]);
    }
}
