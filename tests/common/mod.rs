#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Scratch directory holding a run's CSV input and database files, cleaned up
/// on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn store_path(&self) -> PathBuf {
        self.temp_dir.path().join("store.duckdb")
    }

    pub fn sqlite_path(&self) -> PathBuf {
        self.temp_dir.path().join("out.sqlite")
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes `permits` as a CSV fixture named `permits.csv`.
    pub fn write_permits(&self, permits: &[Permit]) -> PathBuf {
        self.write("permits.csv", &permits_csv(permits))
    }
}

pub const PERMITS_HEADER: &str = "PermitID,PermitNum,MasterPermitNum,OriginalAddress,AppliedDate,\
IssuedDate,ProjectName,Description,COBPIN,BOCOPIN,BOCOTAX,PermitType,ObjectId";

/// One fixture row. `new` derives distinct values for every column from the
/// object id; tests overwrite the fields they care about.
#[derive(Debug, Clone)]
pub struct Permit {
    pub permit_id: String,
    pub permit_num: String,
    pub master_permit_num: String,
    pub original_address: String,
    pub applied_date: String,
    pub issued_date: String,
    pub project_name: String,
    pub description: String,
    pub cobpin: String,
    pub bocopin: String,
    pub bocotax: String,
    pub permit_type: String,
    pub object_id: i64,
}

impl Permit {
    pub fn new(object_id: i64) -> Self {
        Self {
            permit_id: format!("P-{object_id:04}"),
            permit_num: format!("PN-{object_id:04}"),
            master_permit_num: format!("MP-{object_id:04}"),
            original_address: format!("{object_id} Oak St"),
            applied_date: "2024-01-02".to_string(),
            issued_date: "2024-02-03".to_string(),
            project_name: format!("Project {object_id}"),
            description: format!("Work order {object_id}"),
            cobpin: format!("COB-{object_id:04}"),
            bocopin: format!("BOCO-{object_id:04}"),
            bocotax: format!("TAX-{object_id:04}"),
            permit_type: "Residential".to_string(),
            object_id,
        }
    }
}

pub fn permits_csv(permits: &[Permit]) -> String {
    let mut csv = String::from(PERMITS_HEADER);
    csv.push('\n');
    for p in permits {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
            p.permit_id,
            p.permit_num,
            p.master_permit_num,
            p.original_address,
            p.applied_date,
            p.issued_date,
            p.project_name,
            p.description,
            p.cobpin,
            p.bocopin,
            p.bocotax,
            p.permit_type,
            p.object_id,
        ));
    }
    csv
}

/// Runs the compiled binary with `args`, asserting success.
pub fn run_ok(args: &[&str]) {
    assert_cmd::Command::cargo_bin("permits-etl")
        .expect("binary exists")
        .args(args)
        .assert()
        .success();
}

/// Ingests `csv` into table `permits` in the workspace store.
pub fn ingest(ws: &TestWorkspace, csv: &Path) {
    run_ok(&[
        "ingest",
        "-i",
        csv.to_str().unwrap(),
        "-s",
        ws.store_path().to_str().unwrap(),
    ]);
}

/// Opens the workspace's analytical store for direct assertions.
pub fn open_store(ws: &TestWorkspace) -> duckdb::Connection {
    duckdb::Connection::open(ws.store_path()).expect("open store")
}

pub fn count_rows(conn: &duckdb::Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| {
        row.get(0)
    })
    .expect("count rows")
}

pub fn column_names(conn: &duckdb::Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(
            "SELECT column_name FROM information_schema.columns \
             WHERE table_name = ? ORDER BY ordinal_position",
        )
        .expect("prepare column lookup");
    let mut rows = stmt.query(duckdb::params![table]).expect("query columns");
    let mut names = Vec::new();
    while let Some(row) = rows.next().expect("next column") {
        names.push(row.get(0).expect("column name"));
    }
    names
}
