//! Incremental edit followed by score-gated repair attempts.
//!
//! Stops at total 0, at [`MAX_RETRIES`], or after the first attempt that does
//! not strictly lower the total. That attempt is still the one returned.

use anyhow::Result;
use tracing::debug;

use crate::core::feedback::violation_report;
use crate::core::types::StrategyRunResult;
use crate::io::generator::Generator;
use crate::strategy::{MAX_RETRIES, StepInput, Writer};

pub(super) fn run<G: Generator>(
    writer: &Writer<'_, G>,
    input: &StepInput<'_>,
) -> Result<StrategyRunResult> {
    let request = input.latest_request()?;
    let mut artifact = writer.write(writer.prompts.edit(input.previous, request)?)?;
    let mut score = input.score(&artifact);
    let mut drift_history = vec![score.total];
    let mut retries = 0;

    while score.total > 0 && retries < MAX_RETRIES {
        let report = violation_report(&score);
        let user = writer.prompts.repair(&artifact, request, &report)?;
        let candidate = writer.write(user)?;
        let candidate_score = input.score(&candidate);
        retries += 1;
        drift_history.push(candidate_score.total);

        let improved = candidate_score.total < score.total;
        debug!(
            attempt = retries,
            previous = score.total,
            total = candidate_score.total,
            improved,
            "repair attempt scored"
        );
        artifact = candidate;
        score = candidate_score;
        if !improved {
            break;
        }
    }

    Ok(StrategyRunResult::new(artifact, score, retries, drift_history))
}

#[cfg(test)]
mod tests {
    use crate::core::types::{Artifact, AtypicalityLevel, ChangeRequest, StrategyKind};
    use crate::strategy::{MAX_RETRIES, StepInput, run_strategy};
    use crate::test_support::{
        CONFORMING_DOCUMENT, ScriptedGenerator, document_with_drift, drifted_document,
    };

    fn run(generator: &ScriptedGenerator) -> anyhow::Result<crate::core::types::StrategyRunResult> {
        let template = Artifact::new(CONFORMING_DOCUMENT);
        let history = vec![ChangeRequest::new("Add a rotation schedule.")];
        let input = StepInput {
            base_template: &template,
            previous: &template,
            history: &history,
            level: AtypicalityLevel::None,
            temperature: 0.0,
        };
        run_strategy(StrategyKind::Repair, generator, &input)
    }

    #[test]
    fn fixed_nonzero_output_stops_after_first_non_improving_attempt() {
        let generator = ScriptedGenerator::new(vec![document_with_drift(4); 10]);
        let result = run(&generator).expect("run");
        assert_eq!(result.drift_history, vec![4, 4]);
        assert_eq!(result.retries, 1);
        assert!(result.drift_history.len() <= (MAX_RETRIES + 1) as usize);
        assert_eq!(generator.calls(), 2);
    }

    #[test]
    fn strictly_improving_attempts_stop_at_the_ceiling() {
        let generator = ScriptedGenerator::new([
            drifted_document(9, 0),
            drifted_document(7, 1),
            drifted_document(5, 2),
            drifted_document(3, 3),
            drifted_document(1, 4),
        ]);
        let result = run(&generator).expect("run");
        assert_eq!(result.drift_history, vec![9, 7, 5, 3]);
        assert_eq!(result.retries, MAX_RETRIES);
        assert_eq!(result.score.total, 3);
        assert!(result.artifact.as_str().contains("Revision 3."));
        assert_eq!(generator.remaining(), 1);
    }

    #[test]
    fn worse_attempt_is_kept_and_ends_the_loop() {
        let generator = ScriptedGenerator::new([
            drifted_document(4, 0),
            drifted_document(2, 1),
            drifted_document(6, 2),
            drifted_document(0, 3),
        ]);
        let result = run(&generator).expect("run");
        assert_eq!(result.drift_history, vec![4, 2, 6]);
        assert_eq!(result.score.total, 6);
        assert!(result.artifact.as_str().contains("Revision 2."));
    }

    #[test]
    fn conforming_first_attempt_needs_no_repair() {
        let generator = ScriptedGenerator::new([CONFORMING_DOCUMENT]);
        let result = run(&generator).expect("run");
        assert!(result.converged);
        assert_eq!(result.retries, 0);
        assert_eq!(result.drift_history, vec![0]);
    }

    #[test]
    fn repair_prompt_carries_the_violation_report() {
        let generator =
            ScriptedGenerator::new([drifted_document(2, 0), CONFORMING_DOCUMENT.to_string()]);
        let result = run(&generator).expect("run");
        assert!(result.converged);
        assert_eq!(result.drift_history, vec![2, 0]);

        let repair_prompt = &generator.requests()[1].user;
        assert!(repair_prompt.contains("- vocabulary: \"PKI\" appears 3 times (expected 1)"));
        assert!(repair_prompt.contains("Revision 0."));
    }

    #[test]
    fn generator_failure_aborts_the_step() {
        let generator = ScriptedGenerator::from_results(vec![
            Ok(drifted_document(3, 0)),
            Err("service unavailable".to_string()),
        ]);
        let err = run(&generator).unwrap_err();
        assert!(err.to_string().contains("service unavailable"));
    }
}
