use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::batch::{BatchSummary, FileStatus};
use crate::config::CropConfig;
use crate::models::CoinLocation;

#[derive(Debug, Serialize)]
pub struct FailureRecord {
    pub file: String,
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessRecord {
    pub file: String,
    pub output: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<CoinLocation>,
}

/// Machine-readable account of one batch run
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub started_at: String,
    pub finished_at: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub config: CropConfig,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub successes: Vec<SuccessRecord>,
    pub failures: Vec<FailureRecord>,
}

impl BatchReport {
    pub fn new(
        summary: &BatchSummary,
        config: &CropConfig,
        input_dir: &Path,
        output_dir: &Path,
        started_at: OffsetDateTime,
        finished_at: OffsetDateTime,
    ) -> Result<Self> {
        let mut successes = Vec::new();
        let mut failures = Vec::new();

        for outcome in &summary.outcomes {
            match &outcome.status {
                FileStatus::Written { output, location } => successes.push(SuccessRecord {
                    file: outcome.file_name.clone(),
                    output: output.clone(),
                    location: location.clone(),
                }),
                FileStatus::Failed(e) => failures.push(FailureRecord {
                    file: outcome.file_name.clone(),
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                }),
                FileStatus::Skipped => {}
            }
        }

        Ok(Self {
            started_at: started_at.format(&Rfc3339)?,
            finished_at: finished_at.format(&Rfc3339)?,
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            config: config.clone(),
            total: summary.total,
            succeeded: summary.succeeded,
            failed: summary.failed,
            skipped: summary.skipped,
            successes,
            failures,
        })
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report {}", path.display()))
    }
}

/// Current time in the local offset, falling back to UTC
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}
