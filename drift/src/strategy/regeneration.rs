//! Single from-scratch generation over the raw request history.

use anyhow::Result;

use crate::core::types::StrategyRunResult;
use crate::io::generator::Generator;
use crate::strategy::{StepInput, Writer, requirements_from};

pub(super) fn run<G: Generator>(
    writer: &Writer<'_, G>,
    input: &StepInput<'_>,
) -> Result<StrategyRunResult> {
    let requirements = requirements_from(input.history);
    let user = writer
        .prompts
        .regenerate(input.base_template, &requirements, None)?;
    let artifact = writer.write(user)?;
    let score = input.score(&artifact);
    let total = score.total;
    Ok(StrategyRunResult::new(artifact, score, 0, vec![total]))
}

#[cfg(test)]
mod tests {
    use crate::core::types::{Artifact, AtypicalityLevel, ChangeRequest, StrategyKind};
    use crate::strategy::{StepInput, run_strategy};
    use crate::test_support::{CONFORMING_DOCUMENT, ScriptedGenerator};

    #[test]
    fn regenerates_from_template_with_full_history() {
        let template = Artifact::new("# Template\n");
        let previous = Artifact::new("# Previous\n");
        let history = vec![ChangeRequest::new("first"), ChangeRequest::new("second")];
        let generator = ScriptedGenerator::new([CONFORMING_DOCUMENT]);
        let input = StepInput {
            base_template: &template,
            previous: &previous,
            history: &history,
            level: AtypicalityLevel::None,
            temperature: 0.0,
        };

        let result = run_strategy(StrategyKind::Regeneration, &generator, &input).expect("run");
        assert!(result.converged);
        assert_eq!(result.drift_history, vec![0]);

        let user = &generator.requests()[0].user;
        assert!(user.contains("1. first\n2. second"));
        assert!(user.contains("# Template"));
        assert!(!user.contains("# Previous"));
    }
}
