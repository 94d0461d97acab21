mod common;

use assert_cmd::Command;
use predicates::str::contains;

use common::{Permit, TestWorkspace, ingest};

fn bin() -> Command {
    Command::cargo_bin("permits-etl").expect("binary exists")
}

#[test]
fn hostile_table_names_are_rejected_before_any_sql_runs() {
    let ws = TestWorkspace::new();
    let csv = ws.write_permits(&[Permit::new(1)]);
    ingest(&ws, &csv);

    bin()
        .args([
            "stats",
            "-s",
            ws.store_path().to_str().unwrap(),
            "-t",
            "permits; DROP TABLE permits",
        ])
        .assert()
        .failure()
        .stderr(contains("Invalid SQL identifier"));
}

#[test]
fn hostile_column_names_are_rejected_too() {
    let ws = TestWorkspace::new();
    let csv = ws.write_permits(&[Permit::new(1)]);
    ingest(&ws, &csv);

    bin()
        .args([
            "dedupe",
            "-s",
            ws.store_path().to_str().unwrap(),
            "-t",
            "permits",
            "-k",
            "IssuedDate\" --",
        ])
        .assert()
        .failure()
        .stderr(contains("Invalid SQL identifier"));
}

#[test]
fn ingest_reports_a_missing_input_file() {
    let ws = TestWorkspace::new();

    bin()
        .args([
            "ingest",
            "-i",
            ws.path().join("missing.csv").to_str().unwrap(),
            "-s",
            ws.store_path().to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("does not exist"));
}

#[test]
fn rename_requires_at_least_one_mapping() {
    let ws = TestWorkspace::new();

    bin()
        .args([
            "rename",
            "-s",
            ws.store_path().to_str().unwrap(),
            "-t",
            "permits",
        ])
        .assert()
        .failure();
}

#[test]
fn stats_renders_a_profile_table_for_the_key_columns() {
    let ws = TestWorkspace::new();
    let csv = ws.write_permits(&[Permit::new(1), Permit::new(2)]);
    ingest(&ws, &csv);

    bin()
        .args([
            "stats",
            "-s",
            ws.store_path().to_str().unwrap(),
            "-t",
            "permits",
        ])
        .assert()
        .success()
        .stdout(contains("PermitID"))
        .stdout(contains("OriginalAddress"))
        .stdout(contains("duplicate %"));
}
