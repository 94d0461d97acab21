use std::path::Path;

use anyhow::{Context, Result, ensure};
use log::{debug, info};

use crate::{cli::RenameArgs, store};

pub fn execute(args: &RenameArgs) -> Result<()> {
    rename_columns(&args.store, &args.table, &args.renames)
}

/// Applies `renames` to `table` in the order given. Each rename is its own
/// ALTER; a failure part-way leaves the earlier renames in place.
pub fn rename_columns(
    store_path: &Path,
    table: &str,
    renames: &[(String, String)],
) -> Result<()> {
    ensure!(!renames.is_empty(), "No renames given");
    let conn = store::open(store_path)?;
    let table_quoted = store::quoted(table)?;
    for (from, to) in renames {
        let sql = format!(
            "ALTER TABLE {table_quoted} RENAME COLUMN {} TO {}",
            store::quoted(from)?,
            store::quoted(to)?,
        );
        conn.execute_batch(&sql)
            .with_context(|| format!("Renaming column '{from}' to '{to}' in '{table}'"))?;
        debug!("Renamed '{from}' to '{to}' in '{table}'");
    }
    info!("Renamed {} column(s) in '{table}'", renames.len());
    Ok(())
}
