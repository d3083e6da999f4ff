//! Sequential orchestration of the three stages.
//!
//! Each stage commits on its own. A failed stage stops the run and leaves
//! every table as the last successful commit left it, so re-running is safe.

use std::collections::BTreeSet;
use std::fmt;

use attendance_ingestor::models::{Attraction, CityPopulation, Fetched};
use attendance_ingestor::providers::bundled::{BundledAttractions, BundledPopulations};
use attendance_ingestor::providers::fallback::WithFallback;
use attendance_ingestor::providers::wikidata::WikidataPopulations;
use attendance_ingestor::providers::wikipedia::WikipediaAttractions;
use attendance_ingestor::providers::{AttractionSource, PopulationSource};
use serde::Serialize;
use tracing::{info, instrument};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::features::{self, FeatureSummary};
use crate::models::RegistryEntry;
use crate::persistence::TableRepo;
use crate::raw_store::{self, IngestSummary};
use crate::registry::ArtifactStore;
use crate::trainer;

/// One step of [`Pipeline::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Ingest,
    Features,
    Train,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Ingest => "ingest",
            Stage::Features => "features",
            Stage::Train => "train",
        })
    }
}

/// What a full run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub ingest: IngestSummary,
    pub features: FeatureSummary,
    pub model: RegistryEntry,
}

/// Sources, repository and artifact store wired together.
pub struct Pipeline<S> {
    repo: S,
    artifacts: ArtifactStore,
    attractions: WithFallback<AttractionSource, AttractionSource>,
    populations: WithFallback<PopulationSource, PopulationSource>,
}

impl<S: TableRepo> Pipeline<S> {
    /// Wires arbitrary live sources; each falls back to its bundled snapshot.
    pub fn new(
        repo: S,
        artifacts: ArtifactStore,
        attractions: AttractionSource,
        populations: PopulationSource,
    ) -> Self {
        Self {
            repo,
            artifacts,
            attractions: WithFallback::new(attractions, Box::new(BundledAttractions)),
            populations: WithFallback::new(populations, Box::new(BundledPopulations)),
        }
    }

    /// Wikipedia and Wikidata adapters configured from `cfg`.
    pub fn from_config(repo: S, cfg: &PipelineConfig) -> PipelineResult<Self> {
        let attractions = WikipediaAttractions::new(&cfg.sources)?;
        let populations = WikidataPopulations::new(&cfg.sources)?;
        Ok(Self::new(
            repo,
            ArtifactStore::new(&cfg.artifacts_dir),
            Box::new(attractions),
            Box::new(populations),
        ))
    }

    pub fn repo_mut(&mut self) -> &mut S {
        &mut self.repo
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Fetches both sources and reloads the raw tables.
    ///
    /// Populations are looked up for the cities of the fetched attractions.
    #[instrument(skip_all)]
    pub async fn ingest(&mut self) -> PipelineResult<IngestSummary> {
        let attractions: Fetched<Attraction> = self.attractions.fetch(&()).await?;
        let cities: Vec<String> = attractions
            .records
            .iter()
            .map(|a| a.city.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let populations: Fetched<CityPopulation> = self.populations.fetch(&cities[..]).await?;

        raw_store::ingest(&mut self.repo, &attractions, &populations)
    }

    pub fn build_features(&mut self) -> PipelineResult<FeatureSummary> {
        features::build_features(&mut self.repo)
    }

    pub fn train(&mut self) -> PipelineResult<RegistryEntry> {
        trainer::train(&mut self.repo, &self.artifacts)
    }

    /// Ingest, features and train, in order; stops at the first failure.
    #[instrument(skip_all)]
    pub async fn run(&mut self) -> PipelineResult<RunSummary> {
        let ingest = self.ingest().await.map_err(in_stage(Stage::Ingest))?;
        let features = self.build_features().map_err(in_stage(Stage::Features))?;
        let model = self.train().map_err(in_stage(Stage::Train))?;

        info!(version = model.version, "pipeline run complete");
        Ok(RunSummary {
            ingest,
            features,
            model,
        })
    }
}

fn in_stage(stage: Stage) -> impl FnOnce(PipelineError) -> PipelineError {
    move |source| PipelineError::Stage {
        stage,
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_are_lowercase() {
        assert_eq!(Stage::Features.to_string(), "features");
        assert_eq!(
            serde_json::to_string(&Stage::Ingest).unwrap(),
            "\"ingest\""
        );
    }
}
