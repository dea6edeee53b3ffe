//! Multi-iteration runner: one strategy step per change request.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::core::score::SubScores;
use crate::core::types::{
    Artifact, AtypicalityLevel, ChangeRequest, StrategyKind, StrategyRunResult,
};
use crate::io::generator::Generator;
use crate::io::usage::{Usage, UsageMeter};
use crate::strategy::{StepInput, run_strategy};

/// What to run.
#[derive(Debug, Clone, Copy)]
pub struct ExperimentPlan<'a> {
    pub strategy: StrategyKind,
    pub base_template: &'a Artifact,
    pub requests: &'a [ChangeRequest],
    /// Upper bound on iterations; the request count also bounds the run.
    pub iterations: u32,
    pub level: AtypicalityLevel,
    pub temperature: f32,
}

impl ExperimentPlan<'_> {
    /// Iterations that will actually run: `min(iterations, requests.len())`.
    pub fn planned_iterations(&self) -> u32 {
        let available = u32::try_from(self.requests.len()).unwrap_or(u32::MAX);
        self.iterations.min(available)
    }
}

/// Metrics record for one iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationMetrics {
    /// 1-indexed.
    pub iteration: u32,
    pub total_drift: u32,
    pub retries: u32,
    pub converged: bool,
    pub sub_scores: SubScores,
    /// Per-attempt totals; only recorded for retrying strategies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drift_history: Option<Vec<u32>>,
    /// Generation calls made during this iteration.
    pub usage: Usage,
}

impl IterationMetrics {
    fn from_result(
        iteration: u32,
        strategy: StrategyKind,
        result: &StrategyRunResult,
        usage: Usage,
    ) -> Self {
        Self {
            iteration,
            total_drift: result.score.total,
            retries: result.retries,
            converged: result.converged,
            sub_scores: result.score.sub_scores(),
            drift_history: strategy.retries().then(|| result.drift_history.clone()),
            usage,
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct ExperimentOutcome {
    pub final_artifact: Artifact,
    pub metrics: Vec<IterationMetrics>,
    /// Generation calls across the whole run.
    pub usage: Usage,
}

/// Run `plan`, handing every iteration's result and metrics to `on_iteration`.
///
/// Iteration `i` sees requests `[..i]` and the artifact from iteration
/// `i - 1` (the base template for the first). A generator failure or a
/// callback error stops the run; completed iterations stay persisted.
#[instrument(
    skip_all,
    fields(strategy = %plan.strategy, level = %plan.level, planned = plan.planned_iterations())
)]
pub fn run_experiment<G, F>(
    meter: &UsageMeter<G>,
    plan: &ExperimentPlan<'_>,
    mut on_iteration: F,
) -> Result<ExperimentOutcome>
where
    G: Generator,
    F: FnMut(&StrategyRunResult, &IterationMetrics) -> Result<()>,
{
    let start_usage = meter.usage();
    let mut previous = plan.base_template.clone();
    let mut metrics = Vec::new();

    for iteration in 1..=plan.planned_iterations() {
        let before = meter.usage();
        let input = StepInput {
            base_template: plan.base_template,
            previous: &previous,
            history: &plan.requests[..iteration as usize],
            level: plan.level,
            temperature: plan.temperature,
        };
        let result = run_strategy(plan.strategy, meter, &input)
            .with_context(|| format!("iteration {iteration}"))?;
        let usage = meter.usage().since(before);
        let record = IterationMetrics::from_result(iteration, plan.strategy, &result, usage);
        info!(
            iteration,
            total = record.total_drift,
            retries = record.retries,
            calls = record.usage.total_calls(),
            "iteration complete"
        );
        on_iteration(&result, &record)
            .with_context(|| format!("persist iteration {iteration}"))?;

        metrics.push(record);
        previous = result.artifact;
    }

    Ok(ExperimentOutcome {
        final_artifact: previous,
        metrics,
        usage: meter.usage().since(start_usage),
    })
}
