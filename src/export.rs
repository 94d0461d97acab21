use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::DateTime;
use duckdb::types::{TimeUnit, Value as DuckValue};
use log::info;
use rusqlite::types::Value as SqliteValue;

use crate::{cli::ExportArgs, store};

/// Tables exported when the caller does not name any.
pub const EXPORT_TABLES: [&str; 2] = [
    "filtered_permits_deduplicated",
    "filtered_permits_deduplicated_agg",
];

pub fn execute(args: &ExportArgs) -> Result<()> {
    let tables = if args.tables.is_empty() {
        EXPORT_TABLES.iter().map(|t| t.to_string()).collect()
    } else {
        args.tables.clone()
    };
    export_tables(&args.store, &args.sqlite, &tables)
}

/// Copies each named table from the analytical store into the SQLite file at
/// `sqlite_path`, dropping and recreating any table of the same name. Rows
/// are written inside one transaction per table.
pub fn export_tables(store_path: &Path, sqlite_path: &Path, tables: &[String]) -> Result<()> {
    let duck = store::open(store_path)?;
    let mut sqlite = rusqlite::Connection::open(sqlite_path)
        .with_context(|| format!("Opening row store {sqlite_path:?}"))?;
    for table in tables {
        copy_table(&duck, &mut sqlite, table)
            .with_context(|| format!("Exporting table '{table}'"))?;
    }
    Ok(())
}

fn copy_table(
    duck: &duckdb::Connection,
    sqlite: &mut rusqlite::Connection,
    table: &str,
) -> Result<()> {
    let columns = store::table_columns(duck, table)?;
    if columns.is_empty() {
        return Err(anyhow!("Table '{table}' not found in the analytical store"));
    }

    let target = sqlite_ident(table);
    let ddl_columns = columns
        .iter()
        .map(|(name, dtype)| format!("{} {}", sqlite_ident(name), sqlite_type(dtype)))
        .collect::<Vec<_>>()
        .join(", ");
    sqlite
        .execute_batch(&format!(
            "DROP TABLE IF EXISTS {target}; CREATE TABLE {target} ({ddl_columns});"
        ))
        .with_context(|| format!("Recreating '{table}' in the row store"))?;

    let mut stmt = duck
        .prepare(&format!("SELECT * FROM {}", store::quoted(table)?))
        .with_context(|| format!("Reading '{table}' from the analytical store"))?;
    let mut rows = stmt.query([])?;

    let tx = sqlite.transaction()?;
    let mut copied = 0usize;
    {
        let placeholders = vec!["?"; columns.len()].join(", ");
        let mut insert = tx
            .prepare(&format!("INSERT INTO {target} VALUES ({placeholders})"))
            .context("Preparing row-store insert")?;
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                let value: DuckValue = row.get(idx)?;
                values.push(sqlite_value(value));
            }
            insert
                .execute(rusqlite::params_from_iter(values))
                .with_context(|| format!("Writing row {} of '{table}'", copied + 1))?;
            copied += 1;
        }
    }
    tx.commit()
        .with_context(|| format!("Committing '{table}' to the row store"))?;

    info!("Exported {copied} row(s) of '{table}' to the row store");
    Ok(())
}

fn sqlite_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Maps an analytical-engine column type onto SQLite's affinity system.
fn sqlite_type(data_type: &str) -> &'static str {
    let upper = data_type.to_ascii_uppercase();
    if upper.contains("INT") || upper == "BOOLEAN" {
        "INTEGER"
    } else if upper.contains("DOUBLE")
        || upper.contains("FLOAT")
        || upper.contains("REAL")
        || upper.contains("DECIMAL")
    {
        "REAL"
    } else {
        "TEXT"
    }
}

/// Converts one analytical-store value into its row-store representation.
/// Temporal values become ISO-8601 text; exotic types fall back to their
/// textual rendering.
fn sqlite_value(value: DuckValue) -> SqliteValue {
    match value {
        DuckValue::Null => SqliteValue::Null,
        DuckValue::Boolean(v) => SqliteValue::Integer(v as i64),
        DuckValue::TinyInt(v) => SqliteValue::Integer(v.into()),
        DuckValue::SmallInt(v) => SqliteValue::Integer(v.into()),
        DuckValue::Int(v) => SqliteValue::Integer(v.into()),
        DuckValue::BigInt(v) => SqliteValue::Integer(v),
        DuckValue::HugeInt(v) => i64::try_from(v)
            .map(SqliteValue::Integer)
            .unwrap_or_else(|_| SqliteValue::Text(v.to_string())),
        DuckValue::UTinyInt(v) => SqliteValue::Integer(v.into()),
        DuckValue::USmallInt(v) => SqliteValue::Integer(v.into()),
        DuckValue::UInt(v) => SqliteValue::Integer(v.into()),
        DuckValue::UBigInt(v) => i64::try_from(v)
            .map(SqliteValue::Integer)
            .unwrap_or_else(|_| SqliteValue::Text(v.to_string())),
        DuckValue::Float(v) => SqliteValue::Real(v.into()),
        DuckValue::Double(v) => SqliteValue::Real(v),
        DuckValue::Decimal(v) => SqliteValue::Text(v.to_string()),
        DuckValue::Text(v) => SqliteValue::Text(v),
        DuckValue::Blob(v) => SqliteValue::Blob(v),
        DuckValue::Date32(days) => SqliteValue::Text(date_text(days)),
        DuckValue::Timestamp(unit, v) => SqliteValue::Text(timestamp_text(unit, v)),
        other => SqliteValue::Text(format!("{other:?}")),
    }
}

fn date_text(days_since_epoch: i32) -> String {
    DateTime::from_timestamp(i64::from(days_since_epoch) * 86_400, 0)
        .map(|dt| dt.date_naive().to_string())
        .unwrap_or_else(|| days_since_epoch.to_string())
}

fn timestamp_text(unit: TimeUnit, value: i64) -> String {
    let micros = match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    };
    DateTime::from_timestamp_micros(micros)
        .map(|dt| dt.naive_utc().to_string())
        .unwrap_or_else(|| value.to_string())
}
