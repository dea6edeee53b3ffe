use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::outcome::Outcome;
use crate::results::read_summary;

#[derive(Debug, Default)]
pub struct ReportSummary {
    pub runs: usize,
    pub converged: usize,
    pub drifted: usize,
    pub error: usize,
    pub avg_final_drift: Option<f64>,
    pub avg_duration_secs: Option<f64>,
    /// Mean total drift per iteration number across runs that reached it.
    pub drift_by_iteration: BTreeMap<u32, f64>,
    pub total_calls: u64,
}

pub fn load_run_dirs(case_results_dir: &Path) -> Result<Vec<PathBuf>> {
    if !case_results_dir.exists() {
        return Ok(Vec::new());
    }
    let mut dirs = Vec::new();
    for entry in fs::read_dir(case_results_dir)
        .with_context(|| format!("read {}", case_results_dir.display()))?
    {
        let entry = entry.context("read entry")?;
        if entry.path().is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

pub fn aggregate(case_results_dir: &Path) -> Result<(ReportSummary, Vec<String>)> {
    let mut summary = ReportSummary::default();
    let mut warnings = Vec::new();
    let mut final_drifts = Vec::new();
    let mut durations = Vec::new();
    let mut per_iteration: BTreeMap<u32, Vec<u32>> = BTreeMap::new();

    for run_dir in load_run_dirs(case_results_dir)? {
        let run = match read_summary(&run_dir) {
            Ok(run) => run,
            Err(err) => {
                warnings.push(format!(
                    "skip {}: summary.json invalid ({err:#})",
                    run_dir.display()
                ));
                continue;
            }
        };

        summary.runs += 1;
        match run.outcome {
            Outcome::Converged => summary.converged += 1,
            Outcome::Drifted => summary.drifted += 1,
            Outcome::Error => summary.error += 1,
        }
        if let Some(drift) = run.final_drift {
            final_drifts.push(f64::from(drift));
        }
        durations.push(run.duration_secs);
        summary.total_calls += u64::from(run.usage.total_calls());
        for metrics in &run.metrics {
            per_iteration
                .entry(metrics.iteration)
                .or_default()
                .push(metrics.total_drift);
        }
    }

    summary.avg_final_drift = mean(&final_drifts);
    summary.avg_duration_secs = mean(&durations);
    summary.drift_by_iteration = per_iteration
        .into_iter()
        .filter_map(|(iteration, totals)| {
            let values: Vec<f64> = totals.into_iter().map(f64::from).collect();
            mean(&values).map(|avg| (iteration, avg))
        })
        .collect();

    Ok((summary, warnings))
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
