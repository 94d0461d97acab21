use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::{Local, Months, NaiveDate};
use log::info;

use crate::{cli::FilterArgs, store};

pub fn execute(args: &FilterArgs) -> Result<()> {
    let cutoff = window_cutoff(Local::now().date_naive(), args.years)?;
    filter_since(&args.store, &args.table, &args.date_column, cutoff)
}

/// Lower bound of an N-year recency window ending at `today`, inclusive.
/// Calendar-month arithmetic clamps a Feb 29 anniversary to Feb 28.
pub fn window_cutoff(today: NaiveDate, years: u32) -> Result<NaiveDate> {
    today
        .checked_sub_months(Months::new(years.saturating_mul(12)))
        .ok_or_else(|| anyhow!("Window of {years} year(s) underflows the calendar"))
}

/// Derives `filtered_<table>` holding the rows of `table` whose `date_column`
/// is on or after `cutoff`. Rows with a NULL date fall out of the comparison.
pub fn filter_since(
    store_path: &Path,
    table: &str,
    date_column: &str,
    cutoff: NaiveDate,
) -> Result<()> {
    let conn = store::open(store_path)?;
    let target = format!("filtered_{table}");
    let sql = format!(
        "CREATE OR REPLACE TABLE {} AS SELECT * FROM {} WHERE {} >= DATE '{}'",
        store::quoted(&target)?,
        store::quoted(table)?,
        store::quoted(date_column)?,
        cutoff.format("%Y-%m-%d"),
    );
    conn.execute_batch(&sql)
        .with_context(|| format!("Filtering '{table}' to rows on or after {cutoff}"))?;

    let rows = store::count_rows(&conn, &target)?;
    info!("Kept {rows} row(s) of '{table}' issued on or after {cutoff} in '{target}'");
    Ok(())
}
