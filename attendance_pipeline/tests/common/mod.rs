#![allow(dead_code)]

use std::path::PathBuf;

use attendance_ingestor::config::SourceConfig;
use attendance_ingestor::models::{Attraction, CityPopulation, Fetched};
use attendance_pipeline::config::PipelineConfig;
use attendance_pipeline::db::{connection, migrate};
use attendance_pipeline::persistence::SqliteRepo;
use attendance_pipeline::raw_store;
use chrono::NaiveDate;
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::{Integer, Text};
use tempfile::TempDir;

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct ForeignKeys {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}
#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}

pub struct TestDb {
    dir: TempDir,     // keep alive for the life of the test
    pub path: String, // <tmpdir>/test.db
}

impl TestDb {
    /// `<tmpdir>/artifacts`, created lazily by the artifact store.
    pub fn artifacts_dir(&self) -> PathBuf {
        self.dir.path().join("artifacts")
    }

    /// Config pointing at this database, with both live APIs unreachable.
    pub fn offline_config(&self) -> PipelineConfig {
        PipelineConfig {
            database_url: self.path.clone(),
            artifacts_dir: self.artifacts_dir(),
            sources: SourceConfig {
                wikipedia_api_url: "http://127.0.0.1:9/w/api.php".into(),
                wikidata_api_url: "http://127.0.0.1:9/w/api.php".into(),
                timeout_secs: 2,
                ..SourceConfig::default()
            },
        }
    }
}

pub fn setup_db() -> (TestDb, SqliteConnection) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("test.db").to_string_lossy().to_string();

    migrate::run_all(&path).expect("migrations");

    let conn = connection::connect_sqlite(&path).expect("connect");
    (TestDb { dir, path }, conn)
}

pub fn setup_repo() -> (TestDb, SqliteRepo) {
    let (db, conn) = setup_db();
    (db, SqliteRepo::new(conn))
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    use diesel::sql_query;

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal"); // WAL is persistent per DB file

    let fk: ForeignKeys = sql_query("PRAGMA foreign_keys;").get_result(conn).unwrap();
    assert_eq!(fk.foreign_keys, 1);

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}

pub fn attraction(name: &str, city: &str, visitors: u64) -> Attraction {
    Attraction {
        name: name.into(),
        city: city.into(),
        country: None,
        annual_visitors: visitors,
        observation_year: Some(2024),
    }
}

pub fn population(city: &str, population: u64) -> CityPopulation {
    CityPopulation {
        city: city.into(),
        population,
        as_of: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
    }
}

/// Loads the raw tables as if both sources answered live.
pub fn seed_raw(
    repo: &mut SqliteRepo,
    attractions: Vec<Attraction>,
    populations: Vec<CityPopulation>,
) {
    raw_store::ingest(repo, &Fetched::live(attractions), &Fetched::live(populations))
        .expect("seed raw tables");
}
