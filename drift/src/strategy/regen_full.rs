//! Reconciliation, then regeneration until conforming or out of retries.
//!
//! Unlike `repair`, a worse attempt does not end the loop. The result is the
//! first attempt with the lowest total, not the last one.

use anyhow::{Result, anyhow};
use tracing::debug;

use crate::core::feedback::violation_report;
use crate::core::score::DriftScore;
use crate::core::types::{Artifact, StrategyRunResult};
use crate::io::generator::Generator;
use crate::strategy::reconcile::reconcile_requirements;
use crate::strategy::{MAX_RETRIES, StepInput, Writer};

/// Lowest-scoring attempt seen so far.
struct Best {
    artifact: Artifact,
    score: DriftScore,
    attempt: u32,
}

impl Best {
    fn offer(best: &mut Option<Best>, artifact: Artifact, score: DriftScore, attempt: u32) {
        if best.as_ref().is_none_or(|b| score.total < b.score.total) {
            *best = Some(Best {
                artifact,
                score,
                attempt,
            });
        }
    }
}

pub(super) fn run<G: Generator>(
    writer: &Writer<'_, G>,
    input: &StepInput<'_>,
) -> Result<StrategyRunResult> {
    let requirements = reconcile_requirements(writer.generator, &writer.prompts, input.history)?;

    let mut best: Option<Best> = None;
    let mut drift_history = Vec::new();
    let mut report: Option<String> = None;
    for attempt in 0..=MAX_RETRIES {
        let user = writer
            .prompts
            .regenerate(input.base_template, &requirements, report.as_deref())?;
        let artifact = writer.write(user)?;
        let score = input.score(&artifact);
        drift_history.push(score.total);
        debug!(attempt, total = score.total, "regeneration attempt scored");

        let conforming = score.is_conforming();
        if !conforming {
            report = Some(violation_report(&score));
        }
        Best::offer(&mut best, artifact, score, attempt);
        if conforming {
            break;
        }
    }

    let best = best.ok_or_else(|| anyhow!("regen-full produced no attempts"))?;
    debug!(attempt = best.attempt, total = best.score.total, "selected best attempt");
    let retries = drift_history.len() as u32 - 1;
    Ok(StrategyRunResult::new(best.artifact, best.score, retries, drift_history)
        .with_reconciled(requirements))
}

#[cfg(test)]
mod tests {
    use crate::core::score::score_artifact;
    use crate::core::types::{
        Artifact, AtypicalityLevel, ChangeRequest, StrategyKind, StrategyRunResult,
    };
    use crate::io::generator::ModelTier;
    use crate::strategy::{StepInput, run_strategy};
    use crate::test_support::{CONFORMING_DOCUMENT, ScriptedGenerator, drifted_document};

    fn run(generator: &ScriptedGenerator) -> anyhow::Result<StrategyRunResult> {
        let template = Artifact::new("# Template\n");
        let history = vec![ChangeRequest::new("Add a TLS section.")];
        let input = StepInput {
            base_template: &template,
            previous: &template,
            history: &history,
            level: AtypicalityLevel::None,
            temperature: 0.0,
        };
        run_strategy(StrategyKind::RegenFull, generator, &input)
    }

    fn script(totals: &[u32]) -> ScriptedGenerator {
        let mut responses = vec!["- Add a TLS section.".to_string()];
        responses.extend(
            totals
                .iter()
                .enumerate()
                .map(|(revision, &total)| drifted_document(total, revision as u32)),
        );
        ScriptedGenerator::new(responses)
    }

    #[test]
    fn returns_first_minimum_not_last_attempt() {
        let generator = script(&[5, 2, 7, 2]);
        let result = run(&generator).expect("run");

        assert_eq!(result.drift_history, vec![5, 2, 7, 2]);
        assert_eq!(result.retries, 3);
        assert_eq!(result.score.total, 2);
        assert!(result.artifact.as_str().contains("Revision 1."));
        assert_eq!(
            score_artifact(result.artifact.as_str(), AtypicalityLevel::None).total,
            *result.drift_history.iter().min().expect("history")
        );
        assert!(!result.converged);
    }

    #[test]
    fn worse_attempt_does_not_stop_the_loop() {
        let generator = script(&[3, 6, 6, 6, 1]);
        let result = run(&generator).expect("run");
        assert_eq!(result.drift_history, vec![3, 6, 6, 6]);
        assert_eq!(result.score.total, 3);
        assert_eq!(generator.remaining(), 1);
    }

    #[test]
    fn stops_at_zero() {
        let generator = ScriptedGenerator::new([
            "- Add a TLS section.".to_string(),
            drifted_document(4, 0),
            CONFORMING_DOCUMENT.to_string(),
            drifted_document(1, 2),
        ]);
        let result = run(&generator).expect("run");
        assert!(result.converged);
        assert_eq!(result.drift_history, vec![4, 0]);
        assert_eq!(result.retries, 1);
        assert_eq!(generator.remaining(), 1);
    }

    #[test]
    fn one_reasoning_call_then_fast_regenerations_with_feedback() {
        let generator = script(&[2, 1, 1, 1]);
        run(&generator).expect("run");

        let requests = generator.requests();
        assert_eq!(requests.len(), 5);
        assert_eq!(requests[0].tier, ModelTier::Reasoning);
        assert!(requests[1..].iter().all(|r| r.tier == ModelTier::Fast));
        assert!(!requests[1].user.contains("## Violations"));
        assert!(requests[2].user.contains("\"PKI\" appears 3 times (expected 1)"));
        assert!(requests[3].user.contains("\"PKI\" appears 2 times (expected 1)"));
    }

    #[test]
    fn generator_failure_propagates() {
        let generator = ScriptedGenerator::from_results(vec![
            Ok("- Add a TLS section.".to_string()),
            Ok(drifted_document(2, 0)),
            Err("quota exhausted".to_string()),
        ]);
        let err = run(&generator).unwrap_err();
        assert!(err.to_string().contains("quota exhausted"));
    }
}
