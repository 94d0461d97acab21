use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::{cli::AggregateArgs, store};

pub fn execute(args: &AggregateArgs) -> Result<()> {
    aggregate(&args.store, &args.table, &args.date_column, &args.type_column)
}

/// Derives `<table>_agg` with one row per (issue year, permit type) and a
/// count of matching rows. Rows with a NULL date or type land in the engine's
/// null group.
pub fn aggregate(
    store_path: &Path,
    table: &str,
    date_column: &str,
    type_column: &str,
) -> Result<()> {
    let conn = store::open(store_path)?;
    let target = format!("{table}_agg");
    let date_q = store::quoted(date_column)?;
    let type_q = store::quoted(type_column)?;
    let sql = format!(
        "CREATE OR REPLACE TABLE {target_q} AS \
         SELECT EXTRACT(YEAR FROM {date_q}) AS issue_year, {type_q}, COUNT(*) AS permit_count \
         FROM {table_q} \
         GROUP BY EXTRACT(YEAR FROM {date_q}), {type_q}",
        target_q = store::quoted(&target)?,
        table_q = store::quoted(table)?,
    );
    conn.execute_batch(&sql)
        .with_context(|| format!("Aggregating '{table}' by year and {type_column}"))?;

    let groups = store::count_rows(&conn, &target)?;
    info!("Aggregated '{table}' into '{target}': {groups} (year, type) group(s)");
    Ok(())
}
