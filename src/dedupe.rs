use std::path::Path;

use anyhow::{Context, Result, ensure};
use log::info;

use crate::{cli::DedupeArgs, store};

/// Key tuple used when the caller does not name one.
pub const DEDUPE_KEYS: [&str; 4] = [
    "IssuedDate",
    "ProjectName",
    "Description",
    "OriginalAddress",
];

pub fn execute(args: &DedupeArgs) -> Result<()> {
    let keys = if args.keys.is_empty() {
        DEDUPE_KEYS.iter().map(|c| c.to_string()).collect()
    } else {
        args.keys.clone()
    };
    deduplicate(&args.store, &args.table, &keys, &args.order_by)
}

/// Derives `<table>_deduplicated`, keeping one row per distinct `keys` tuple.
/// Within a group the row with the lowest `order_column` value survives; a
/// non-unique order column leaves the choice to the engine's row numbering.
/// The transient rank column does not appear in the output schema.
pub fn deduplicate(
    store_path: &Path,
    table: &str,
    keys: &[String],
    order_column: &str,
) -> Result<()> {
    ensure!(!keys.is_empty(), "Need at least one key column");
    let key_list = keys
        .iter()
        .map(|k| store::quoted(k))
        .collect::<Result<Vec<_>>>()?
        .join(", ");

    let conn = store::open(store_path)?;
    let target = format!("{table}_deduplicated");
    let sql = format!(
        "CREATE OR REPLACE TABLE {target_q} AS \
         WITH ranked AS ( \
             SELECT *, ROW_NUMBER() OVER (PARTITION BY {key_list} ORDER BY {order_q}) AS rn \
             FROM {table_q} \
         ) \
         SELECT * EXCLUDE (rn) FROM ranked WHERE rn = 1",
        target_q = store::quoted(&target)?,
        order_q = store::quoted(order_column)?,
        table_q = store::quoted(table)?,
    );
    conn.execute_batch(&sql)
        .with_context(|| format!("Deduplicating '{table}' on ({})", keys.join(", ")))?;

    let rows = store::count_rows(&conn, &target)?;
    info!(
        "Deduplicated '{table}' on ({}) into '{target}': {rows} row(s) kept",
        keys.join(", ")
    );
    Ok(())
}
