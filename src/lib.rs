pub mod aggregate;
pub mod cli;
pub mod config;
pub mod dedupe;
pub mod dupes;
pub mod export;
pub mod filter;
pub mod ingest;
pub mod pipeline;
pub mod rename;
pub mod stats;
pub mod store;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::{
    cli::{Cli, Commands, ConfigArgs},
    config::PipelineConfig,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("permits_etl", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Ingest(args) => ingest::execute(&args),
        Commands::Filter(args) => filter::execute(&args),
        Commands::Stats(args) => stats::execute(&args),
        Commands::Dupes(args) => dupes::execute(&args),
        Commands::Dedupe(args) => dedupe::execute(&args),
        Commands::Aggregate(args) => aggregate::execute(&args),
        Commands::Rename(args) => rename::execute(&args),
        Commands::Export(args) => export::execute(&args),
        Commands::Run(args) => pipeline::run_scripted(&resolve_config(&args.common)?),
        Commands::Dag(args) => handle_dag(&args),
    }
}

fn handle_dag(args: &cli::DagArgs) -> Result<()> {
    if args.plan {
        print!("{}", pipeline::plan());
        return Ok(());
    }
    let config = resolve_config(&args.common)?;
    pipeline::run_dag(&config, args.retries)
}

/// Loads the pipeline configuration (file or canonical defaults) and lays the
/// command-line overrides on top.
fn resolve_config(args: &ConfigArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(input) = &args.input {
        config.input = input.clone();
    }
    if let Some(store) = &args.store {
        config.store = store.clone();
    }
    if let Some(sqlite) = &args.sqlite {
        config.sqlite = sqlite.clone();
    }
    if let Some(years) = args.years {
        config.years = years;
    }
    Ok(config)
}
