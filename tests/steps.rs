mod common;

use chrono::{Duration, Local, Months};

use common::{
    Permit, TestWorkspace, column_names, count_rows, ingest, open_store, run_ok,
};

#[test]
fn filter_includes_the_boundary_date_and_drops_older_rows() {
    let ws = TestWorkspace::new();
    let today = Local::now().date_naive();
    let cutoff = today.checked_sub_months(Months::new(60)).expect("cutoff");

    let mut boundary = Permit::new(1);
    boundary.issued_date = cutoff.format("%Y-%m-%d").to_string();
    let mut inside = Permit::new(2);
    inside.issued_date = (cutoff + Duration::days(1)).format("%Y-%m-%d").to_string();
    let mut outside = Permit::new(3);
    outside.issued_date = (cutoff - Duration::days(1)).format("%Y-%m-%d").to_string();
    let mut missing_date = Permit::new(4);
    missing_date.issued_date = String::new();

    let csv = ws.write_permits(&[boundary, inside, outside, missing_date]);
    ingest(&ws, &csv);
    run_ok(&[
        "filter",
        "-s",
        ws.store_path().to_str().unwrap(),
        "-t",
        "permits",
        "-y",
        "5",
    ]);

    let conn = open_store(&ws);
    assert_eq!(count_rows(&conn, "permits"), 4);
    assert_eq!(count_rows(&conn, "filtered_permits"), 2);
    let survivors: i64 = conn
        .query_row(
            "SELECT MAX(\"ObjectId\") FROM filtered_permits",
            [],
            |row| row.get(0),
        )
        .expect("max id");
    assert_eq!(survivors, 2);
}

#[test]
fn dedupe_keeps_the_lowest_identifier_per_group() {
    let ws = TestWorkspace::new();
    let mut rows = Vec::new();
    for object_id in 1..=3 {
        let mut p = Permit::new(object_id);
        p.issued_date = "2024-02-03".to_string();
        p.project_name = "Riverside Remodel".to_string();
        p.description = "Kitchen remodel".to_string();
        p.original_address = "12 Oak St".to_string();
        rows.push(p);
    }
    rows.push(Permit::new(9));

    let csv = ws.write_permits(&rows);
    ingest(&ws, &csv);
    run_ok(&[
        "dedupe",
        "-s",
        ws.store_path().to_str().unwrap(),
        "-t",
        "permits",
    ]);

    let conn = open_store(&ws);
    assert_eq!(count_rows(&conn, "permits_deduplicated"), 2);
    let survivor: i64 = conn
        .query_row(
            "SELECT \"ObjectId\" FROM permits_deduplicated WHERE \"ProjectName\" = 'Riverside Remodel'",
            [],
            |row| row.get(0),
        )
        .expect("survivor id");
    assert_eq!(survivor, 1);

    // The transient ranking column must not leak into the output schema.
    let columns = column_names(&conn, "permits_deduplicated");
    assert!(!columns.iter().any(|c| c == "rn"), "columns: {columns:?}");
    assert_eq!(columns.len(), 13);
}

#[test]
fn rename_changes_labels_without_touching_rows() {
    let ws = TestWorkspace::new();
    let rows: Vec<Permit> = (1..=3).map(Permit::new).collect();
    let expected: Vec<String> = rows.iter().map(|p| p.cobpin.clone()).collect();

    let csv = ws.write_permits(&rows);
    ingest(&ws, &csv);
    run_ok(&[
        "rename",
        "-s",
        ws.store_path().to_str().unwrap(),
        "-t",
        "permits",
        "-r",
        "COBPIN=UniqueParcelIdentificationNumber",
    ]);

    let conn = open_store(&ws);
    assert_eq!(count_rows(&conn, "permits"), 3);
    let columns = column_names(&conn, "permits");
    assert!(columns.iter().any(|c| c == "UniqueParcelIdentificationNumber"));
    assert!(!columns.iter().any(|c| c == "COBPIN"));

    let mut stmt = conn
        .prepare(
            "SELECT \"UniqueParcelIdentificationNumber\" FROM permits ORDER BY \"ObjectId\"",
        )
        .expect("prepare");
    let mut rows_iter = stmt.query([]).expect("query");
    let mut values = Vec::new();
    while let Some(row) = rows_iter.next().expect("next") {
        values.push(row.get::<_, String>(0).expect("value"));
    }
    assert_eq!(values, expected);
}

#[test]
fn aggregate_counts_by_year_and_permit_type() {
    let ws = TestWorkspace::new();
    let mut rows = Vec::new();
    for (object_id, issued, permit_type) in [
        (1, "2023-03-01", "Residential"),
        (2, "2023-07-15", "Residential"),
        (3, "2023-11-30", "Commercial"),
        (4, "2024-01-20", "Residential"),
    ] {
        let mut p = Permit::new(object_id);
        p.issued_date = issued.to_string();
        p.permit_type = permit_type.to_string();
        rows.push(p);
    }

    let csv = ws.write_permits(&rows);
    ingest(&ws, &csv);
    run_ok(&[
        "aggregate",
        "-s",
        ws.store_path().to_str().unwrap(),
        "-t",
        "permits",
    ]);

    let conn = open_store(&ws);
    assert_eq!(count_rows(&conn, "permits_agg"), 3);
    let residential_2023: i64 = conn
        .query_row(
            "SELECT permit_count FROM permits_agg \
             WHERE issue_year = 2023 AND \"PermitType\" = 'Residential'",
            [],
            |row| row.get(0),
        )
        .expect("group count");
    assert_eq!(residential_2023, 2);
}
