use std::cmp::Ordering;

use anyhow::{Context, Result, bail};
use duckdb::Connection;
use itertools::Itertools;
use log::info;
use serde::Serialize;

use crate::{cli::DupesArgs, store, table};

/// Candidate columns ranked when the caller does not name any. The list
/// repeats `Description` on purpose: repeated names produce their pairs
/// repeatedly, and the ranking reflects that.
pub const CANDIDATE_COLUMNS: [&str; 7] = [
    "Description",
    "OriginalAddress",
    "COBPIN",
    "BOCOPIN",
    "BOCOTAX",
    "ProjectName",
    "Description",
];

#[derive(Debug, Clone, Serialize)]
pub struct PairStats {
    pub left: String,
    pub right: String,
    pub duplicate_count: i64,
    pub duplicate_percent: f64,
}

pub fn execute(args: &DupesArgs) -> Result<()> {
    let columns = if args.columns.is_empty() {
        CANDIDATE_COLUMNS.iter().map(|c| c.to_string()).collect()
    } else {
        args.columns.clone()
    };
    let conn = store::open(&args.store)?;
    let ranked = rank_pairs(&conn, &args.table, &columns)?;
    if args.json {
        print_json(&ranked)?;
    } else {
        report(&args.table, &ranked)?;
    }
    Ok(())
}

/// Every unordered pair of positions in `columns`, in enumeration order.
/// Repeats in the input are not collapsed, so a repeated name yields the same
/// pair more than once.
pub(crate) fn column_pairs(columns: &[String]) -> Vec<(String, String)> {
    columns.iter().cloned().tuple_combinations().collect()
}

/// Measures the duplicate count and percentage of every candidate pair in
/// `table` and returns the statistics in enumeration order. Read-only.
pub fn rank_pairs(conn: &Connection, table: &str, columns: &[String]) -> Result<Vec<PairStats>> {
    let pairs = column_pairs(columns);
    if pairs.is_empty() {
        bail!(
            "Need at least two candidate columns, got {}",
            columns.len()
        );
    }

    let table_quoted = store::quoted(table)?;
    let mut results = Vec::with_capacity(pairs.len());
    for (left, right) in pairs {
        let sql = format!(
            "SELECT COUNT(*) - COUNT(DISTINCT ({l}, {r})), \
             (COUNT(*) - COUNT(DISTINCT ({l}, {r}))) * 100.0 / COUNT(*) \
             FROM {t}",
            l = store::quoted(&left)?,
            r = store::quoted(&right)?,
            t = table_quoted,
        );
        let (duplicate_count, duplicate_percent) = conn
            .query_row(&sql, [], |row| Ok((row.get(0)?, row.get(1)?)))
            .with_context(|| {
                format!("Measuring duplication of ({left}, {right}) in '{table}'")
            })?;
        results.push(PairStats {
            left,
            right,
            duplicate_count,
            duplicate_percent,
        });
    }
    Ok(results)
}

/// The entry with the highest duplicate percentage. On a tie the earliest
/// entry in enumeration order wins.
pub fn most_duplicated(ranked: &[PairStats]) -> Option<&PairStats> {
    let mut best: Option<&PairStats> = None;
    for stats in ranked {
        let better = match best {
            Some(current) => stats.duplicate_percent > current.duplicate_percent,
            None => true,
        };
        if better {
            best = Some(stats);
        }
    }
    best
}

/// Prints every pair's statistics sorted descending by duplicate percentage,
/// then the winning pair.
pub fn report(table_name: &str, ranked: &[PairStats]) -> Result<()> {
    let mut sorted: Vec<&PairStats> = ranked.iter().collect();
    sorted.sort_by(|a, b| {
        b.duplicate_percent
            .partial_cmp(&a.duplicate_percent)
            .unwrap_or(Ordering::Equal)
    });

    let headers = vec![
        "pair".to_string(),
        "duplicate_count".to_string(),
        "duplicate %".to_string(),
    ];
    let rows: Vec<Vec<String>> = sorted
        .iter()
        .map(|p| {
            vec![
                format!("({}, {})", p.left, p.right),
                p.duplicate_count.to_string(),
                format!("{:.2}", p.duplicate_percent),
            ]
        })
        .collect();
    table::print_table(&headers, &rows);

    let Some(winner) = most_duplicated(ranked) else {
        bail!("No column pairs to rank");
    };
    println!(
        "Most duplicated pair: ({}, {}) at {:.2}%",
        winner.left, winner.right, winner.duplicate_percent
    );
    info!(
        "Ranked {} pair(s) in '{}'; worst offender ({}, {})",
        ranked.len(),
        table_name,
        winner.left,
        winner.right
    );
    Ok(())
}

fn print_json(ranked: &[PairStats]) -> Result<()> {
    #[derive(Serialize)]
    struct Report<'a> {
        ranking: &'a [PairStats],
        winner: &'a PairStats,
    }
    let Some(winner) = most_duplicated(ranked) else {
        bail!("No column pairs to rank");
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&Report {
            ranking: ranked,
            winner,
        })?
    );
    Ok(())
}
