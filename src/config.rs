use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{dedupe, dupes, stats};

/// Explicit settings for a full pipeline run. Every path and column list
/// travels through here rather than through module-level constants, so tests
/// can point a run at disposable temporary files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Source CSV file.
    pub input: PathBuf,
    /// Analytical store holding every intermediate table.
    pub store: PathBuf,
    /// Row-store file receiving the exported tables.
    pub sqlite: PathBuf,
    /// Name of the raw ingested table.
    pub table: String,
    /// Recency window in years for the issue-date filter.
    pub years: u32,
    /// Date column driving the window filter and the aggregation.
    pub date_column: String,
    /// Category column for the aggregation.
    pub type_column: String,
    /// Columns profiled by the stats step.
    pub stats_columns: Vec<String>,
    /// Candidate columns ranked by the duplicate-pair finder.
    pub candidate_columns: Vec<String>,
    /// Key tuple whose combined value defines a duplicate group.
    pub dedupe_keys: Vec<String>,
    /// Identifier column that breaks ties inside a duplicate group.
    pub order_column: String,
    /// Old -> new column renames, applied in order.
    pub renames: Vec<RenameSpec>,
    /// Tables copied into the row store.
    pub export_tables: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameSpec {
    pub from: String,
    pub to: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("./Construction_Permits.csv"),
            store: PathBuf::from("./permits.duckdb"),
            sqlite: PathBuf::from("./permits.sqlite"),
            table: "permits".to_string(),
            years: 5,
            date_column: "IssuedDate".to_string(),
            type_column: "PermitType".to_string(),
            stats_columns: stats::KEY_COLUMNS.iter().map(|c| c.to_string()).collect(),
            candidate_columns: dupes::CANDIDATE_COLUMNS
                .iter()
                .map(|c| c.to_string())
                .collect(),
            dedupe_keys: dedupe::DEDUPE_KEYS.iter().map(|c| c.to_string()).collect(),
            order_column: "ObjectId".to_string(),
            renames: vec![
                RenameSpec {
                    from: "COBPIN".to_string(),
                    to: "UniqueParcelIdentificationNumber".to_string(),
                },
                RenameSpec {
                    from: "BOCOPIN".to_string(),
                    to: "AssessorParcelIdentificationNumber".to_string(),
                },
                RenameSpec {
                    from: "BOCOTAX".to_string(),
                    to: "AssessorTaxAccountNumber".to_string(),
                },
            ],
            export_tables: vec![
                "filtered_permits_deduplicated".to_string(),
                "filtered_permits_deduplicated_agg".to_string(),
            ],
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Reading pipeline configuration from {path:?}"))?;
        serde_yaml::from_str(&raw)
            .with_context(|| format!("Parsing pipeline configuration {path:?}"))
    }

    /// Name of the table the window filter derives.
    pub fn filtered_table(&self) -> String {
        format!("filtered_{}", self.table)
    }

    /// Name of the table the deduplicator derives.
    pub fn deduplicated_table(&self) -> String {
        format!("{}_deduplicated", self.filtered_table())
    }

    /// Name of the table the aggregator derives.
    pub fn aggregated_table(&self) -> String {
        format!("{}_agg", self.deduplicated_table())
    }

    pub fn rename_pairs(&self) -> Vec<(String, String)> {
        self.renames
            .iter()
            .map(|r| (r.from.clone(), r.to.clone()))
            .collect()
    }
}
