use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(version, about = "Process construction-permit CSV datasets", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load a permits CSV file into a table in the analytical store
    Ingest(IngestArgs),
    /// Derive a table restricted to permits issued within the last N years
    Filter(FilterArgs),
    /// Profile distinct counts, null rates, and duplicate rates for key columns
    Stats(StatsArgs),
    /// Rank column pairs by duplicate percentage and report the worst offender
    Dupes(DupesArgs),
    /// Collapse rows sharing a key tuple, keeping the lowest identifier per group
    Dedupe(DedupeArgs),
    /// Summarize permit counts by issue year and permit type
    Aggregate(AggregateArgs),
    /// Rename table columns, one ALTER at a time in the order given
    Rename(RenameArgs),
    /// Copy tables from the analytical store into a SQLite file
    Export(ExportArgs),
    /// Run the whole pipeline in fixed order with no task isolation
    Run(RunArgs),
    /// Run the pipeline as a dependency graph with per-task retries
    Dag(DagArgs),
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Input CSV file to load
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Analytical store database file
    #[arg(short = 's', long = "store")]
    pub store: PathBuf,
    /// Target table name
    #[arg(short = 't', long = "table", default_value = "permits")]
    pub table: String,
}

#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Analytical store database file
    #[arg(short = 's', long = "store")]
    pub store: PathBuf,
    /// Source table; the result lands in `filtered_<table>`
    #[arg(short = 't', long = "table", default_value = "permits")]
    pub table: String,
    /// Keep rows issued within this many years of today
    #[arg(short = 'y', long = "years", default_value_t = 5)]
    pub years: u32,
    /// Date column the window applies to
    #[arg(long = "date-column", default_value = "IssuedDate")]
    pub date_column: String,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Analytical store database file
    #[arg(short = 's', long = "store")]
    pub store: PathBuf,
    /// Table to profile
    #[arg(short = 't', long = "table", default_value = "filtered_permits")]
    pub table: String,
    /// Columns to profile (defaults to the permit key columns)
    #[arg(short = 'C', long = "columns", value_delimiter = ',')]
    pub columns: Vec<String>,
    /// Emit the profile as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct DupesArgs {
    /// Analytical store database file
    #[arg(short = 's', long = "store")]
    pub store: PathBuf,
    /// Table to rank column pairs in
    #[arg(short = 't', long = "table", default_value = "filtered_permits")]
    pub table: String,
    /// Candidate columns; repeats are kept and pair up repeatedly
    #[arg(short = 'C', long = "columns", value_delimiter = ',')]
    pub columns: Vec<String>,
    /// Emit the ranking as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct DedupeArgs {
    /// Analytical store database file
    #[arg(short = 's', long = "store")]
    pub store: PathBuf,
    /// Source table; the result lands in `<table>_deduplicated`
    #[arg(short = 't', long = "table", default_value = "filtered_permits")]
    pub table: String,
    /// Key columns whose combined value defines a duplicate group
    #[arg(short = 'k', long = "keys", value_delimiter = ',')]
    pub keys: Vec<String>,
    /// Identifier column that orders rows inside a group; lowest value wins
    #[arg(long = "order-by", default_value = "ObjectId")]
    pub order_by: String,
}

#[derive(Debug, Args)]
pub struct AggregateArgs {
    /// Analytical store database file
    #[arg(short = 's', long = "store")]
    pub store: PathBuf,
    /// Source table; the result lands in `<table>_agg`
    #[arg(short = 't', long = "table", default_value = "filtered_permits_deduplicated")]
    pub table: String,
    /// Date column the year is extracted from
    #[arg(long = "date-column", default_value = "IssuedDate")]
    pub date_column: String,
    /// Category column counted per year
    #[arg(long = "type-column", default_value = "PermitType")]
    pub type_column: String,
}

#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Analytical store database file
    #[arg(short = 's', long = "store")]
    pub store: PathBuf,
    /// Table whose columns are renamed in place
    #[arg(short = 't', long = "table", default_value = "filtered_permits_deduplicated")]
    pub table: String,
    /// Renames of the form `OLD=NEW`, applied in the order given
    #[arg(short = 'r', long = "rename", value_parser = parse_rename, action = clap::ArgAction::Append, required = true)]
    pub renames: Vec<(String, String)>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Analytical store database file
    #[arg(short = 's', long = "store")]
    pub store: PathBuf,
    /// Row-store SQLite file to write
    #[arg(short = 'o', long = "sqlite")]
    pub sqlite: PathBuf,
    /// Tables to copy (defaults to the deduplicated and aggregated tables)
    #[arg(short = 'T', long = "tables", value_delimiter = ',')]
    pub tables: Vec<String>,
}

/// Settings shared by the composite entry points. Flags override values from
/// the configuration file; without a file the canonical permits pipeline is
/// assumed.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Pipeline configuration file (YAML)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Input CSV file to load
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
    /// Analytical store database file
    #[arg(short = 's', long = "store")]
    pub store: Option<PathBuf>,
    /// Row-store SQLite file to write
    #[arg(short = 'o', long = "sqlite")]
    pub sqlite: Option<PathBuf>,
    /// Keep rows issued within this many years of today
    #[arg(short = 'y', long = "years")]
    pub years: Option<u32>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: ConfigArgs,
}

#[derive(Debug, Args)]
pub struct DagArgs {
    #[command(flatten)]
    pub common: ConfigArgs,
    /// Retries granted uniformly to every task
    #[arg(long, default_value_t = 1)]
    pub retries: u32,
    /// Print the dependency graph without executing anything
    #[arg(long)]
    pub plan: bool,
}

pub fn parse_rename(value: &str) -> Result<(String, String), String> {
    let (from, to) = value
        .split_once('=')
        .ok_or_else(|| format!("Expected OLD=NEW, got '{value}'"))?;
    let from = from.trim();
    let to = to.trim();
    if from.is_empty() || to.is_empty() {
        return Err(format!("Expected OLD=NEW, got '{value}'"));
    }
    Ok((from.to_string(), to.to_string()))
}
