mod common;
use common::{assert_sqlite_pragmas, setup_db};

use attendance_pipeline::db::connection::connect_sqlite;
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::Integer;

#[derive(QueryableByName)]
struct TblCnt {
    #[diesel(sql_type = Integer)]
    cnt: i32,
}

const REGISTRY_ROW: &str = "
    INSERT INTO model_registry (
        version, trained_at, model_kind, coefficient, intercept,
        r2, rmse, mae, n_samples, artifact_path
    ) VALUES (
        1, '2025-09-01 12:00:00', 'log_log_ols', 0.4, 9.5,
        0.3, 1000.0, 800.0, 12, 'artifacts/model-v000001.json'
    );";

#[test]
fn migrations_apply_and_pragmas_are_set() {
    let (db, mut conn) = setup_db();

    // WAL is a persistent property of the .db file; FKs/timeout are per-connection
    assert_sqlite_pragmas(&mut conn);
    let mut second = connect_sqlite(&db.path).expect("connect second");
    assert_sqlite_pragmas(&mut second);

    let tbls: TblCnt = sql_query(
        "SELECT COUNT(*) AS cnt
            FROM sqlite_master
            WHERE type='table'
            AND name IN ('attraction_raw','population_raw','attraction_features','model_registry');",
    )
    .get_result(&mut conn)
    .unwrap();
    assert_eq!(tbls.cnt, 4, "expected four tables to be present");
}

#[test]
fn registry_rejects_update_and_delete() {
    let (_db, mut conn) = setup_db();
    sql_query(REGISTRY_ROW).execute(&mut conn).unwrap();

    let update =
        sql_query("UPDATE model_registry SET r2 = 0.9 WHERE version = 1;").execute(&mut conn);
    assert!(update.is_err(), "UPDATE must be rejected");

    let delete = sql_query("DELETE FROM model_registry;").execute(&mut conn);
    assert!(delete.is_err(), "DELETE must be rejected");

    let left: TblCnt = sql_query("SELECT COUNT(*) AS cnt FROM model_registry;")
        .get_result(&mut conn)
        .unwrap();
    assert_eq!(left.cnt, 1);
}

#[test]
fn check_constraints_guard_counts_and_versions() {
    let (_db, mut conn) = setup_db();

    let below = sql_query(
        "INSERT INTO attraction_features (attraction_name, city, annual_visitors, population)
         VALUES ('Small', 'X', 2000000, 10);",
    )
    .execute(&mut conn);
    assert!(below.is_err(), "feature rows must exceed two million visitors");

    let negative = sql_query(
        "INSERT INTO attraction_raw (name, city, annual_visitors, provenance)
         VALUES ('Neg', 'X', -1, 'live');",
    )
    .execute(&mut conn);
    assert!(negative.is_err());

    let zero_version = sql_query(REGISTRY_ROW.replace("1, '2025", "0, '2025")).execute(&mut conn);
    assert!(zero_version.is_err());
}
