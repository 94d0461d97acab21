use std::fmt::Write as _;

use anyhow::{Context, Result};
use chrono::Local;
use log::{info, warn};

use crate::{
    aggregate, config::PipelineConfig, dedupe, dupes, export, filter, ingest, rename, stats, store,
};

/// The pipeline steps in declaration order. Declaration order is a valid
/// topological order of the dependency graph, so both entry points walk this
/// array front to back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Ingest,
    Filter,
    Stats,
    Dupes,
    Dedupe,
    Aggregate,
    Rename,
    Export,
}

impl Step {
    pub const ALL: [Step; 8] = [
        Step::Ingest,
        Step::Filter,
        Step::Stats,
        Step::Dupes,
        Step::Dedupe,
        Step::Aggregate,
        Step::Rename,
        Step::Export,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Step::Ingest => "ingest",
            Step::Filter => "filter",
            Step::Stats => "stats",
            Step::Dupes => "dupes",
            Step::Dedupe => "dedupe",
            Step::Aggregate => "aggregate",
            Step::Rename => "rename",
            Step::Export => "export",
        }
    }

    /// Steps that must complete before this one runs. The profiler and the
    /// pair finder both read the filtered table and both gate deduplication.
    pub fn depends_on(self) -> &'static [Step] {
        match self {
            Step::Ingest => &[],
            Step::Filter => &[Step::Ingest],
            Step::Stats => &[Step::Filter],
            Step::Dupes => &[Step::Filter],
            Step::Dedupe => &[Step::Stats, Step::Dupes],
            Step::Aggregate => &[Step::Dedupe],
            Step::Rename => &[Step::Aggregate],
            Step::Export => &[Step::Rename],
        }
    }
}

/// Fixed-order scripted run: every step once, no task isolation, first
/// failure aborts the remainder.
pub fn run_scripted(config: &PipelineConfig) -> Result<()> {
    for step in Step::ALL {
        run_step(config, step).with_context(|| format!("Step '{}' failed", step.name()))?;
    }
    info!(
        "Pipeline complete: {} -> {}",
        config.input.display(),
        config.sqlite.display()
    );
    Ok(())
}

/// Orchestrated run: walks the dependency graph sequentially in topological
/// order, granting every task the same retry allowance. Retries do not
/// distinguish retryable from fatal conditions.
pub fn run_dag(config: &PipelineConfig, retries: u32) -> Result<()> {
    for step in Step::ALL {
        attempt_with_retries(step.name(), retries, || run_step(config, step))?;
    }
    info!(
        "Pipeline complete: {} -> {}",
        config.input.display(),
        config.sqlite.display()
    );
    Ok(())
}

/// Renders the dependency graph without executing anything.
pub fn plan() -> String {
    let mut output = String::new();
    for step in Step::ALL {
        let deps: Vec<&str> = step.depends_on().iter().map(|d| d.name()).collect();
        if deps.is_empty() {
            let _ = writeln!(output, "{}", step.name());
        } else {
            let _ = writeln!(output, "{} <- {}", step.name(), deps.join(", "));
        }
    }
    output
}

fn run_step(config: &PipelineConfig, step: Step) -> Result<()> {
    match step {
        Step::Ingest => ingest::load_csv(&config.store, &config.input, &config.table),
        Step::Filter => {
            let cutoff = filter::window_cutoff(Local::now().date_naive(), config.years)?;
            filter::filter_since(&config.store, &config.table, &config.date_column, cutoff)
        }
        Step::Stats => {
            let conn = store::open(&config.store)?;
            let profile =
                stats::profile_table(&conn, &config.filtered_table(), &config.stats_columns)?;
            stats::report(&profile);
            Ok(())
        }
        Step::Dupes => {
            let conn = store::open(&config.store)?;
            let filtered = config.filtered_table();
            let ranked = dupes::rank_pairs(&conn, &filtered, &config.candidate_columns)?;
            dupes::report(&filtered, &ranked)
        }
        Step::Dedupe => dedupe::deduplicate(
            &config.store,
            &config.filtered_table(),
            &config.dedupe_keys,
            &config.order_column,
        ),
        Step::Aggregate => aggregate::aggregate(
            &config.store,
            &config.deduplicated_table(),
            &config.date_column,
            &config.type_column,
        ),
        Step::Rename => rename::rename_columns(
            &config.store,
            &config.deduplicated_table(),
            &config.rename_pairs(),
        ),
        Step::Export => export::export_tables(&config.store, &config.sqlite, &config.export_tables),
    }
}

fn attempt_with_retries<F>(name: &str, retries: u32, mut task: F) -> Result<()>
where
    F: FnMut() -> Result<()>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match task() {
            Ok(()) => return Ok(()),
            Err(err) if attempt <= retries => {
                warn!(
                    "Task '{name}' failed on attempt {attempt} of {}: {err:#}",
                    retries + 1
                );
            }
            Err(err) => {
                return Err(err.context(format!(
                    "Task '{name}' failed after {attempt} attempt(s)"
                )));
            }
        }
    }
}
