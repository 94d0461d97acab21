use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result, anyhow};
use duckdb::Connection;
use regex::Regex;

static IDENT_RE: OnceLock<Regex> = OnceLock::new();

/// Opens the analytical store at `path`, creating the database file on first
/// use.
pub fn open(path: &Path) -> Result<Connection> {
    Connection::open(path).with_context(|| format!("Opening analytical store {path:?}"))
}

/// Validates a SQL identifier received from the command line or a
/// configuration file. Only `[A-Za-z_][A-Za-z0-9_]*` passes; anything else is
/// rejected before any SQL is assembled from it.
pub fn ident(name: &str) -> Result<&str> {
    let re = IDENT_RE
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern"));
    if re.is_match(name) {
        Ok(name)
    } else {
        Err(anyhow!("Invalid SQL identifier '{name}'"))
    }
}

/// Validates `name` and returns it double-quoted for interpolation into SQL.
pub fn quoted(name: &str) -> Result<String> {
    ident(name).map(|n| format!("\"{n}\""))
}

/// Escapes a string value (typically a file path) for a single-quoted SQL
/// literal.
pub fn sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", quoted(table)?);
    conn.query_row(&sql, [], |row| row.get(0))
        .with_context(|| format!("Counting rows of '{table}'"))
}

/// Column names and engine types of `table`, in schema order. Empty when the
/// table does not exist.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<(String, String)>> {
    let mut stmt = conn
        .prepare(
            "SELECT column_name, data_type FROM information_schema.columns \
             WHERE table_name = ? ORDER BY ordinal_position",
        )
        .context("Preparing column lookup")?;
    let mut rows = stmt
        .query(duckdb::params![table])
        .with_context(|| format!("Reading schema of '{table}'"))?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push((row.get(0)?, row.get(1)?));
    }
    Ok(columns)
}
