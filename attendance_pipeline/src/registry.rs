//! Versioned model artifacts and the latest-model lookup.
//!
//! Each registry version owns exactly one JSON file,
//! `<artifacts_dir>/model-v000007.json`. The file is written before the
//! registry row is inserted and inside the same transaction, so a committed
//! entry always points at a complete artifact. A crash between the two
//! leaves an orphan file that the next successful run for that version
//! overwrites.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::models::RegistryEntry;
use crate::persistence::TableRepo;

/// Fitted parameters as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: i64,
    pub model_kind: String,
    pub coefficient: f64,
    pub intercept: f64,
    pub n_samples: i64,
    pub trained_at: NaiveDateTime,
}

/// Directory of model artifacts addressed by registry version.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, version: i64) -> PathBuf {
        self.dir.join(format!("model-v{version:06}.json"))
    }

    /// Writes `artifact` atomically (temp file, then rename) and returns its path.
    pub fn write(&self, artifact: &ModelArtifact) -> PipelineResult<PathBuf> {
        let path = self.path_for(artifact.version);
        let tmp = path.with_extension("json.tmp");
        let io_err = |source| PipelineError::Artifact {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let body = serde_json::to_vec_pretty(artifact)
            .map_err(|e| io_err(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        fs::write(&tmp, body).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)?;

        debug!(path = %path.display(), version = artifact.version, "artifact written");
        Ok(path)
    }

    /// Reads the artifact stored at `path`.
    pub fn read(&self, path: &Path) -> PipelineResult<ModelArtifact> {
        let io_err = |source| PipelineError::Artifact {
            path: path.to_path_buf(),
            source,
        };
        let raw = fs::read(path).map_err(io_err)?;
        serde_json::from_slice(&raw)
            .map_err(|e| io_err(io::Error::new(io::ErrorKind::InvalidData, e)))
    }
}

/// The highest-versioned registry entry and its artifact.
///
/// Fails with [`PipelineError::NotFound`] when nothing has been trained, and
/// with [`PipelineError::Artifact`] when the file is missing or belongs to a
/// different version.
pub fn load_latest<S: TableRepo>(
    repo: &mut S,
    store: &ArtifactStore,
) -> PipelineResult<(RegistryEntry, ModelArtifact)> {
    let entry = repo
        .registry_latest()?
        .ok_or_else(|| PipelineError::NotFound("model registry is empty".to_string()))?;

    let path = PathBuf::from(&entry.artifact_path);
    let artifact = store.read(&path)?;
    if artifact.version != entry.version {
        return Err(PipelineError::Artifact {
            path,
            source: io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "artifact holds version {}, registry expects {}",
                    artifact.version, entry.version
                ),
            ),
        });
    }
    Ok((entry, artifact))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn artifact(version: i64) -> ModelArtifact {
        ModelArtifact {
            version,
            model_kind: "log_log_ols".into(),
            coefficient: 0.4,
            intercept: 9.5,
            n_samples: 12,
            trained_at: NaiveDate::from_ymd_opt(2025, 9, 1)
                .unwrap()
                .and_hms_micro_opt(12, 30, 0, 123_456)
                .unwrap(),
        }
    }

    #[test]
    fn paths_are_zero_padded_by_version() {
        let store = ArtifactStore::new("models");
        assert_eq!(store.path_for(7), PathBuf::from("models/model-v000007.json"));
    }

    #[test]
    fn write_then_read_and_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("nested"));

        let path = store.write(&artifact(1)).unwrap();
        assert_eq!(store.read(&path).unwrap(), artifact(1));

        let mut again = artifact(1);
        again.coefficient = 0.7;
        store.write(&again).unwrap();
        assert_eq!(store.read(&path).unwrap().coefficient, 0.7);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn unreadable_artifact_is_an_artifact_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let path = dir.path().join("garbage.json");
        fs::write(&path, b"{not json").unwrap();

        let err = store.read(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Artifact { .. }));
    }
}
