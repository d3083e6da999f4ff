mod common;
use common::{attraction, population, seed_raw, setup_repo};

use attendance_ingestor::models::{Fetched, Provenance};
use attendance_pipeline::models::{AttractionRecord, FeatureRow, PopulationRecord};
use attendance_pipeline::persistence::TableRepo;
use attendance_pipeline::raw_store;

fn dump(repo: &mut impl TableRepo) -> String {
    let a = repo.load_all::<AttractionRecord>().unwrap();
    let p = repo.load_all::<PopulationRecord>().unwrap();
    serde_json::to_string(&(a, p)).unwrap()
}

#[test]
fn ingest_twice_yields_identical_tables() {
    let (_db, mut repo) = setup_repo();
    let attractions = vec![
        attraction("Louvre", "Paris", 8_700_000),
        attraction("Prado", "Madrid", 3_400_000),
    ];
    let populations = vec![population("Paris", 2_102_650), population("Madrid", 3_332_035)];

    seed_raw(&mut repo, attractions.clone(), populations.clone());
    let first = dump(&mut repo);
    seed_raw(&mut repo, attractions, populations);
    let second = dump(&mut repo);

    assert_eq!(first, second);
}

#[test]
fn reload_replaces_previous_batch_and_dedupes_keys() {
    let (_db, mut repo) = setup_repo();
    seed_raw(
        &mut repo,
        vec![attraction("Old", "Rome", 5_000_000)],
        vec![population("Rome", 2_700_000)],
    );

    let summary = raw_store::ingest(
        &mut repo,
        &Fetched::fallback(vec![
            attraction("Louvre", "Paris", 1),
            attraction("Louvre", "Paris", 8_700_000),
        ]),
        &Fetched::live(vec![population("Paris", 2_102_650)]),
    )
    .unwrap();

    assert_eq!(summary.attractions.rows, 1);
    assert_eq!(summary.attractions.provenance, Provenance::Fallback);
    assert_eq!(summary.populations.provenance, Provenance::Live);

    let rows = repo.load_all::<AttractionRecord>().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Louvre");
    assert_eq!(rows[0].annual_visitors, 8_700_000);
    assert_eq!(rows[0].provenance, "fallback");
}

fn feature(name: &str, visitors: i64) -> FeatureRow {
    FeatureRow {
        attraction_name: name.into(),
        city: "Paris".into(),
        country: None,
        annual_visitors: visitors,
        population: 2_102_650,
    }
}

fn bad_raw_row() -> AttractionRecord {
    AttractionRecord {
        name: "Negative".into(),
        city: "Paris".into(),
        country: None,
        annual_visitors: -1,
        observation_year: None,
        provenance: "live".into(),
    }
}

#[test]
fn failed_raw_reload_keeps_committed_rows() {
    let (_db, mut repo) = setup_repo();
    seed_raw(
        &mut repo,
        vec![attraction("Louvre", "Paris", 8_700_000)],
        vec![population("Paris", 2_102_650)],
    );
    let before = dump(&mut repo);

    let mut rows = repo.load_all::<AttractionRecord>().unwrap();
    rows[0].name = "Orsay".into();
    rows.push(bad_raw_row());
    assert!(repo.replace_all(&rows).is_err());

    assert_eq!(dump(&mut repo), before);
}

#[test]
fn failed_feature_reload_keeps_committed_rows() {
    let (_db, mut repo) = setup_repo();
    repo.replace_all(&[feature("Louvre", 8_700_000)]).unwrap();

    let err = repo.replace_all(&[feature("Orsay", 3_800_000), feature("Tiny", 5)]);
    assert!(err.is_err());

    assert_eq!(
        repo.load_all::<FeatureRow>().unwrap(),
        vec![feature("Louvre", 8_700_000)]
    );
}

#[test]
fn failed_upsert_keeps_committed_rows() {
    let (_db, mut repo) = setup_repo();
    seed_raw(
        &mut repo,
        vec![
            attraction("Louvre", "Paris", 8_700_000),
            attraction("Prado", "Madrid", 3_400_000),
        ],
        vec![population("Paris", 2_102_650)],
    );
    let before = repo.load_all::<AttractionRecord>().unwrap();

    let mut changed = before[0].clone();
    changed.annual_visitors = 9_000_000;
    assert!(repo.upsert_batch(&[changed, bad_raw_row()]).is_err());

    assert_eq!(repo.load_all::<AttractionRecord>().unwrap(), before);
}
