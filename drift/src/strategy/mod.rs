//! Document-evolution strategies.
//!
//! Every strategy turns one iteration's inputs into a [`StrategyRunResult`].
//! They differ in what the writer sees (previous artifact plus the newest
//! request, or the base template plus the whole history) and in whether the
//! drift score gates further attempts:
//!
//! | strategy | basis | attempts |
//! |---|---|---|
//! | `incremental` | previous + newest request | 1 |
//! | `repair` | previous + newest request | 1 + up to [`MAX_RETRIES`], stops on non-improvement |
//! | `regeneration` | template + history | 1 |
//! | `regen-reconcile` | template + reconciled history | 1 |
//! | `regen-full` | template + reconciled history | 1 + up to [`MAX_RETRIES`], keeps the best |
//!
//! A non-zero drift score is never an error. Generator failures propagate
//! unchanged and abort the step.

mod incremental;
pub mod reconcile;
mod regen_full;
mod regeneration;
mod repair;

use anyhow::{Result, anyhow};
use tracing::{debug, info, instrument};

use crate::core::score::{DriftScore, score_artifact};
use crate::core::types::{
    Artifact, AtypicalityLevel, ChangeRequest, StrategyKind, StrategyRunResult,
};
use crate::io::generator::{GenerationRequest, Generator};
use crate::io::prompt::Prompts;

/// Ceiling on repair or regeneration attempts after the first generation.
pub const MAX_RETRIES: u32 = 3;

/// Inputs for one strategy step.
#[derive(Debug, Clone, Copy)]
pub struct StepInput<'a> {
    pub base_template: &'a Artifact,
    /// Artifact produced by the previous iteration (the template on the first).
    pub previous: &'a Artifact,
    /// Requests through the current iteration; the last one is new.
    pub history: &'a [ChangeRequest],
    pub level: AtypicalityLevel,
    /// Sampling temperature for document generation.
    pub temperature: f32,
}

impl StepInput<'_> {
    fn latest_request(&self) -> Result<&ChangeRequest> {
        self.history
            .last()
            .ok_or_else(|| anyhow!("strategy step needs at least one change request"))
    }

    fn score(&self, artifact: &Artifact) -> DriftScore {
        score_artifact(artifact.as_str(), self.level)
    }
}

/// Run one step of `kind`.
#[instrument(
    skip_all,
    fields(strategy = %kind, level = %input.level, requests = input.history.len())
)]
pub fn run_strategy<G: Generator>(
    kind: StrategyKind,
    generator: &G,
    input: &StepInput<'_>,
) -> Result<StrategyRunResult> {
    let writer = Writer::new(generator, input.level, input.temperature)?;
    let result = match kind {
        StrategyKind::Incremental => incremental::run(&writer, input)?,
        StrategyKind::Repair => repair::run(&writer, input)?,
        StrategyKind::Regeneration => regeneration::run(&writer, input)?,
        StrategyKind::RegenReconcile => reconcile::run(&writer, input)?,
        StrategyKind::RegenFull => regen_full::run(&writer, input)?,
    };
    info!(
        total = result.score.total,
        retries = result.retries,
        converged = result.converged,
        "strategy step finished"
    );
    Ok(result)
}

/// Generator plus the rendered writer instruction for one step.
struct Writer<'g, G> {
    generator: &'g G,
    prompts: Prompts,
    system: String,
    temperature: f32,
}

impl<'g, G: Generator> Writer<'g, G> {
    fn new(generator: &'g G, level: AtypicalityLevel, temperature: f32) -> Result<Self> {
        let prompts = Prompts::new()?;
        let system = prompts.system(level)?;
        Ok(Self {
            generator,
            prompts,
            system,
            temperature,
        })
    }

    /// One fast-tier document generation.
    fn write(&self, user: String) -> Result<Artifact> {
        let request =
            GenerationRequest::new(self.system.as_str(), user).with_temperature(self.temperature);
        let text = self.generator.generate(&request)?;
        let body = strip_code_fence(&text);
        debug!(bytes = body.len(), "writer returned document");
        Ok(Artifact::new(format!("{body}\n")))
    }
}

/// Drop a fence wrapped around the whole response, if any.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return trimmed;
    };
    // The opening fence line may carry a language tag.
    inner
        .split_once('\n')
        .map_or("", |(_, body)| body)
        .trim_end()
}

fn requirements_from(history: &[ChangeRequest]) -> Vec<String> {
    history.iter().map(|r| r.as_str().to_string()).collect()
}
