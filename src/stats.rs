use anyhow::{Context, Result, ensure};
use duckdb::Connection;
use log::info;
use serde::Serialize;

use crate::{cli::StatsArgs, store, table};

/// Columns profiled when the caller does not name any.
pub const KEY_COLUMNS: [&str; 5] = [
    "PermitID",
    "PermitNum",
    "MasterPermitNum",
    "OriginalAddress",
    "AppliedDate",
];

#[derive(Debug, Clone, Serialize)]
pub struct ColumnProfile {
    pub column: String,
    pub distinct: i64,
    pub null_percent: f64,
    pub duplicate_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableProfile {
    pub table: String,
    pub total_rows: i64,
    pub columns: Vec<ColumnProfile>,
}

pub fn execute(args: &StatsArgs) -> Result<()> {
    let columns = if args.columns.is_empty() {
        KEY_COLUMNS.iter().map(|c| c.to_string()).collect()
    } else {
        args.columns.clone()
    };
    let conn = store::open(&args.store)?;
    let profile = profile_table(&conn, &args.table, &columns)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        report(&profile);
    }
    Ok(())
}

/// Read-only profile of `columns` in `table`: distinct counts plus null and
/// duplicate rates, computed in a single aggregate query. Fails on an empty
/// table, where the percentage expressions divide by a zero row count.
pub fn profile_table(conn: &Connection, table: &str, columns: &[String]) -> Result<TableProfile> {
    ensure!(!columns.is_empty(), "No columns to profile");

    let mut selects = vec!["COUNT(*)".to_string()];
    for column in columns {
        let quoted = store::quoted(column)?;
        selects.push(format!("COUNT(DISTINCT {quoted})"));
        selects.push(format!(
            "SUM(CASE WHEN {quoted} IS NULL THEN 1 ELSE 0 END) * 100.0 / COUNT(*)"
        ));
        selects.push(format!(
            "(COUNT(*) - COUNT(DISTINCT {quoted})) * 100.0 / COUNT(*)"
        ));
    }
    let sql = format!(
        "SELECT {} FROM {}",
        selects.join(", "),
        store::quoted(table)?
    );

    conn.query_row(&sql, [], |row| {
        let total_rows: i64 = row.get(0)?;
        let mut profiles = Vec::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            let base = 1 + idx * 3;
            profiles.push(ColumnProfile {
                column: column.clone(),
                distinct: row.get(base)?,
                null_percent: row.get(base + 1)?,
                duplicate_percent: row.get(base + 2)?,
            });
        }
        Ok(TableProfile {
            table: table.to_string(),
            total_rows,
            columns: profiles,
        })
    })
    .with_context(|| format!("Profiling table '{table}'"))
}

/// Prints the profile as an aligned table and logs a one-line summary.
pub fn report(profile: &TableProfile) {
    let headers = vec![
        "column".to_string(),
        "distinct".to_string(),
        "null %".to_string(),
        "duplicate %".to_string(),
    ];
    let rows: Vec<Vec<String>> = profile
        .columns
        .iter()
        .map(|c| {
            vec![
                c.column.clone(),
                c.distinct.to_string(),
                format!("{:.2}", c.null_percent),
                format!("{:.2}", c.duplicate_percent),
            ]
        })
        .collect();
    table::print_table(&headers, &rows);
    info!(
        "Profiled {} column(s) of '{}' over {} row(s)",
        profile.columns.len(),
        profile.table,
        profile.total_rows
    );
}
