//! CLI command implementations.
//!
//! Every command is rooted at `<cwd>/experiment/`: cases in `cases/`, results
//! in `results/`, base config in `drift.toml`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::case::{CaseFile, LoadedCase, discover_cases, validate_case_id};
use crate::report::aggregate;
use crate::run::{RunOptions, run_case};

pub fn experiment_root(repo_root: &Path) -> PathBuf {
    repo_root.join("experiment")
}

/// List all available cases.
pub fn list_cases(root: &Path) -> Result<()> {
    for case in discover_cases(&root.join("cases"))? {
        let meta = &case.file.case;
        println!(
            "{} strategy={} iterations={} atypicality={}",
            meta.id, meta.strategy, meta.iterations, meta.atypicality
        );
    }
    Ok(())
}

/// Run a case by id (optionally multiple times).
pub fn run_case_by_id(root: &Path, case_id: &str, options: RunOptions, runs: u32) -> Result<()> {
    let case = load_case(root, case_id)?;
    debug!(case_id, runs, "case loaded");

    info!(case_id, runs, "starting runs");
    for run_num in 1..=runs {
        debug!(case_id, run_num, runs, "starting run");
        let outcome = run_case(root, &case, options).context("run case")?;
        println!(
            "run: case={} run_id={} outcome={:?} results={}",
            case_id,
            outcome.run_id,
            outcome.outcome,
            outcome.results_dir.display()
        );
    }
    Ok(())
}

/// Show aggregated results for a case.
pub fn report_case(root: &Path, case_id: &str) -> Result<()> {
    validate_case_id(case_id)?;
    let (summary, warnings) = aggregate(&root.join("results").join(case_id))?;
    println!("report: case={} runs={}", case_id, summary.runs);
    println!(
        "report: converged={} drifted={} error={}",
        summary.converged, summary.drifted, summary.error
    );
    if let Some(avg) = summary.avg_final_drift {
        println!("report: avg_final_drift={avg:.2}");
    }
    if let Some(avg) = summary.avg_duration_secs {
        println!("report: avg_duration_secs={avg:.2}");
    }
    println!("report: generation_calls={}", summary.total_calls);
    for (iteration, avg) in summary.drift_by_iteration {
        println!("report: iteration {iteration} mean_drift={avg:.2}");
    }
    for warning in warnings {
        eprintln!("warning: {warning}");
    }
    Ok(())
}

/// Remove all results for a case.
pub fn clean_case(root: &Path, case_id: &str) -> Result<()> {
    validate_case_id(case_id)?;
    let case_results = root.join("results").join(case_id);
    if case_results.exists() {
        std::fs::remove_dir_all(&case_results)
            .with_context(|| format!("remove {}", case_results.display()))?;
    }
    println!("clean: case={} results={}", case_id, case_results.display());
    Ok(())
}

fn load_case(root: &Path, case_id: &str) -> Result<LoadedCase> {
    validate_case_id(case_id)?;
    let case_path = root.join("cases").join(format!("{case_id}.toml"));
    if !case_path.exists() {
        bail!("case {} not found at {}", case_id, case_path.display());
    }
    let case = CaseFile::load(&case_path)?;
    if case.id() != case_id {
        bail!(
            "case file {} declares id {}, expected {}",
            case_path.display(),
            case.id(),
            case_id
        );
    }
    Ok(case)
}
