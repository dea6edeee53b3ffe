//! Result persistence.
//!
//! Layout under `experiment/results/<case>/<run-id>/`:
//!
//! ```text
//! summary.json
//! config.toml                   (effective config after case overrides)
//! iterations/<i>/artifact.md
//! iterations/<i>/metrics.json
//! iterations/<i>/score.json
//! generation/call-NNNN/...      (codex call logs)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use drift::core::types::{AtypicalityLevel, StrategyKind, StrategyRunResult};
use drift::experiment::IterationMetrics;
use drift::io::config::DriftConfig;
use drift::io::usage::Usage;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::outcome::Outcome;

/// Per-run summary, persisted to `summary.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub case_id: String,
    pub run_id: String,
    pub strategy: StrategyKind,
    pub atypicality: AtypicalityLevel,
    pub planned_iterations: u32,
    pub completed_iterations: u32,
    /// SHA-256 of the base template file.
    pub template_sha256: String,
    /// SHA-256 of the request list file.
    pub requests_sha256: String,
    pub config: DriftConfig,
    pub outcome: Outcome,
    /// Error chain when the run aborted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub final_drift: Option<u32>,
    pub usage: Usage,
    pub start_time: String,
    pub end_time: String,
    pub duration_secs: f64,
    pub metrics: Vec<IterationMetrics>,
}

impl RunSummary {
    pub fn duration_between(started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> f64 {
        (finished_at - started_at).num_milliseconds() as f64 / 1000.0
    }
}

pub fn run_dir(results_root: &Path, case_id: &str, run_id: &str) -> PathBuf {
    results_root.join(case_id).join(run_id)
}

pub fn iteration_dir(run_dir: &Path, iteration: u32) -> PathBuf {
    run_dir.join("iterations").join(iteration.to_string())
}

/// Persist one iteration's artifact snapshot, metrics and full score.
pub fn write_iteration(
    run_dir: &Path,
    result: &StrategyRunResult,
    metrics: &IterationMetrics,
) -> Result<PathBuf> {
    let dir = iteration_dir(run_dir, metrics.iteration);
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    let artifact_path = dir.join("artifact.md");
    fs::write(&artifact_path, result.artifact.as_str())
        .with_context(|| format!("write {}", artifact_path.display()))?;
    write_json(&dir.join("metrics.json"), metrics)?;
    write_json(&dir.join("score.json"), &result.score)?;
    if let Some(requirements) = &result.reconciled {
        write_json(&dir.join("reconciled.json"), requirements)?;
    }
    debug!(dir = %dir.display(), "iteration persisted");
    Ok(dir)
}

pub fn write_summary(run_dir: &Path, summary: &RunSummary) -> Result<()> {
    write_json(&run_dir.join("summary.json"), summary)
}

pub fn read_summary(run_dir: &Path) -> Result<RunSummary> {
    let path = run_dir.join("summary.json");
    let contents =
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}

pub fn file_sha256(path: &Path) -> Result<String> {
    let contents = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    Ok(hex::encode(Sha256::digest(contents)))
}

/// Serialize `value` to pretty-printed JSON with trailing newline.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut payload = serde_json::to_string_pretty(value).context("serialize json")?;
    payload.push('\n');
    fs::write(path, payload).with_context(|| format!("write {}", path.display()))
}
