//! Case execution orchestration.
//!
//! Loads inputs, builds the generator stack, drives the experiment runner and
//! persists every iteration plus a run summary.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use drift::core::types::StrategyKind;
use drift::experiment::{ExperimentPlan, IterationMetrics, run_experiment};
use drift::io::codex::CodexGenerator;
use drift::io::config::{DriftConfig, load_config, write_config};
use drift::io::generator::Generator;
use drift::io::inputs::{load_requests, load_template};
use drift::io::retry::RetryingGenerator;
use drift::io::usage::UsageMeter;
use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::{debug, info, instrument, warn};

use crate::case::LoadedCase;
use crate::config::apply_case_config;
use crate::outcome::{Outcome, classify_outcome};
use crate::results::{RunSummary, file_sha256, run_dir, write_iteration, write_summary};

/// Command-line overrides for a single run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub strategy: Option<StrategyKind>,
    pub iterations: Option<u32>,
}

/// Result of running a single case.
#[derive(Debug)]
pub struct RunOutcome {
    pub run_id: String,
    /// Path to the results directory.
    pub results_dir: PathBuf,
    pub outcome: Outcome,
}

/// Run a case against the codex backend.
pub fn run_case(
    experiment_root: &Path,
    case: &LoadedCase,
    options: RunOptions,
) -> Result<RunOutcome> {
    run_case_with(experiment_root, case, options, |config, log_dir| {
        RetryingGenerator::new(
            CodexGenerator::new(config.generation.clone(), log_dir),
            config.retry.policy(),
        )
    })
}

/// Run a case with the generator built by `make_generator`.
///
/// Input and config errors are returned before anything is written. Once the
/// run directory exists, a failing iteration is recorded in `summary.json`
/// with outcome `error` and the run still returns `Ok`.
#[instrument(skip_all, fields(case_id = %case.id()))]
pub fn run_case_with<G, F>(
    experiment_root: &Path,
    case: &LoadedCase,
    options: RunOptions,
    make_generator: F,
) -> Result<RunOutcome>
where
    G: Generator,
    F: FnOnce(&DriftConfig, &Path) -> G,
{
    let meta = &case.file.case;
    let base = load_config(&experiment_root.join("drift.toml"))?;
    let config = apply_case_config(base, &case.file.config)?;

    let template_path = case.template_path();
    let requests_path = case.requests_path();
    let template = load_template(&template_path)?;
    let requests = load_requests(&requests_path)?;
    let template_sha256 = file_sha256(&template_path)?;
    let requests_sha256 = file_sha256(&requests_path)?;

    let strategy = options.strategy.unwrap_or(meta.strategy);
    let iterations = options.iterations.unwrap_or(meta.iterations);
    if iterations == 0 {
        bail!("iterations must be > 0");
    }

    let started_at = Utc::now();
    let run_id = new_run_id(started_at);
    let results_dir = run_dir(&experiment_root.join("results"), case.id(), &run_id);
    fs::create_dir_all(&results_dir)
        .with_context(|| format!("create {}", results_dir.display()))?;
    write_config(&results_dir.join("config.toml"), &config).context("write effective config")?;
    info!(%run_id, %strategy, iterations, "case run started");

    let meter = UsageMeter::new(make_generator(&config, &results_dir.join("generation")));
    let plan = ExperimentPlan {
        strategy,
        base_template: &template,
        requests: &requests,
        iterations,
        level: meta.atypicality,
        temperature: config.generation.temperature,
    };

    let mut completed: Vec<IterationMetrics> = Vec::new();
    let result = run_experiment(&meter, &plan, |result, metrics| {
        write_iteration(&results_dir, result, metrics)?;
        completed.push(metrics.clone());
        Ok(())
    });
    let finished_at = Utc::now();

    let error = match &result {
        Ok(run) => {
            debug!(final_bytes = run.final_artifact.as_str().len(), "experiment finished");
            None
        }
        Err(err) => {
            warn!(error = %format!("{err:#}"), "experiment aborted");
            Some(format!("{err:#}"))
        }
    };
    let outcome = classify_outcome(error.is_some(), &completed);

    let summary = RunSummary {
        case_id: case.id().to_string(),
        run_id: run_id.clone(),
        strategy,
        atypicality: meta.atypicality,
        planned_iterations: plan.planned_iterations(),
        completed_iterations: completed.len() as u32,
        template_sha256,
        requests_sha256,
        config,
        outcome,
        error,
        final_drift: completed.last().map(|metrics| metrics.total_drift),
        usage: meter.usage(),
        start_time: started_at.to_rfc3339(),
        end_time: finished_at.to_rfc3339(),
        duration_secs: RunSummary::duration_between(started_at, finished_at),
        metrics: completed,
    };
    write_summary(&results_dir, &summary).context("write summary")?;

    info!(?outcome, results_dir = %results_dir.display(), "case run complete");
    Ok(RunOutcome {
        run_id,
        results_dir,
        outcome,
    })
}

fn new_run_id(started_at: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect();
    format!("run-{}_{suffix}", started_at.format("%Y%m%d_%H%M%S"))
}
