mod common;
use common::{attraction, population, seed_raw, setup_repo};

use attendance_pipeline::error::{ErrorKind, PipelineError};
use attendance_pipeline::features::build_features;
use attendance_pipeline::query;
use attendance_pipeline::registry::{ArtifactStore, load_latest};
use attendance_pipeline::trainer::{MODEL_KIND, train};

fn seed_four_cities(repo: &mut attendance_pipeline::persistence::SqliteRepo) {
    seed_raw(
        repo,
        vec![
            attraction("Louvre", "Paris", 8_700_000),
            attraction("British Museum", "London", 5_800_000),
            attraction("Prado", "Madrid", 3_400_000),
            attraction("Vatican Museums", "Vatican City", 6_800_000),
        ],
        vec![
            population("Paris", 2_102_650),
            population("London", 8_866_180),
            population("Madrid", 3_332_035),
            population("Vatican City", 764),
        ],
    );
    build_features(repo).unwrap();
}

#[test]
fn successive_runs_get_consecutive_versions() {
    let (db, mut repo) = setup_repo();
    let store = ArtifactStore::new(db.artifacts_dir());
    seed_four_cities(&mut repo);

    let first = train(&mut repo, &store).unwrap();
    let second = train(&mut repo, &store).unwrap();
    assert_eq!(first.version, 1);
    assert_eq!(second.version, 2);
    assert_eq!(first.n_samples, 4);
    assert_eq!(first.model_kind, MODEL_KIND);

    let history = query::registry_history(&mut repo).unwrap();
    let versions: Vec<i64> = history.iter().map(|e| e.version).collect();
    assert_eq!(versions, vec![1, 2]);

    let (entry, artifact) = load_latest(&mut repo, &store).unwrap();
    assert_eq!(entry, second);
    assert_eq!(artifact.version, 2);
    assert_eq!(artifact.coefficient, entry.coefficient);
    assert_eq!(artifact.trained_at, entry.trained_at);
    assert!(store.path_for(1).exists());
}

#[test]
fn too_few_rows_fail_validation_and_register_nothing() {
    let (db, mut repo) = setup_repo();
    let store = ArtifactStore::new(db.artifacts_dir());
    seed_raw(
        &mut repo,
        vec![attraction("Louvre", "Paris", 8_700_000)],
        vec![population("Paris", 2_102_650)],
    );
    build_features(&mut repo).unwrap();

    let err = train(&mut repo, &store).unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert!(query::registry_history(&mut repo).unwrap().is_empty());
    assert!(!store.path_for(1).exists());
}

#[test]
fn prediction_applies_latest_model() {
    let (db, mut repo) = setup_repo();
    let store = ArtifactStore::new(db.artifacts_dir());

    let err = query::predict(&mut repo, 2_161_000.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = load_latest(&mut repo, &store).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    seed_four_cities(&mut repo);
    let entry = train(&mut repo, &store).unwrap();

    for p in [764.0, 2_161_000.0, 8_866_180.0] {
        let got = query::predict(&mut repo, p).unwrap();
        let expected = entry.intercept.exp() * p.powf(entry.coefficient);
        assert_eq!(got.version, entry.version);
        assert!(((got.visitors - expected) / expected).abs() <= 1e-9);
    }

    let err = query::predict(&mut repo, -1.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let err = query::predict(&mut repo, f64::NAN).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}
