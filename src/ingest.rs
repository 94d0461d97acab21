use std::path::Path;

use anyhow::{Context, Result, ensure};
use log::{debug, info};

use crate::{cli::IngestArgs, store};

pub fn execute(args: &IngestArgs) -> Result<()> {
    load_csv(&args.store, &args.input, &args.table)
}

/// Replaces `table` in the store at `store_path` with the full contents of
/// the CSV at `input`, column types inferred by the engine's CSV sniffer.
pub fn load_csv(store_path: &Path, input: &Path, table: &str) -> Result<()> {
    ensure!(input.is_file(), "Input file {input:?} does not exist");
    let headers = csv_headers(input)?;
    debug!("Detected columns: {headers:?}");

    let conn = store::open(store_path)?;
    let sql = format!(
        "CREATE OR REPLACE TABLE {} AS SELECT * FROM read_csv('{}')",
        store::quoted(table)?,
        store::sql_string(&input.to_string_lossy()),
    );
    conn.execute_batch(&sql)
        .with_context(|| format!("Ingesting {input:?} into table '{table}'"))?;

    let rows = store::count_rows(&conn, table)?;
    info!(
        "Ingested {rows} row(s) across {} column(s) into '{table}'",
        headers.len()
    );
    Ok(())
}

fn csv_headers(input: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(input)
        .with_context(|| format!("Opening {input:?}"))?;
    let headers = reader
        .headers()
        .with_context(|| format!("Reading header row of {input:?}"))?;
    Ok(headers.iter().map(|h| h.to_string()).collect())
}
