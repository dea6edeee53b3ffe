//! Requirement reconciliation and the `regen-reconcile` strategy.

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use tracing::{debug, instrument, warn};

use crate::core::types::{ChangeRequest, StrategyRunResult};
use crate::io::generator::{GenerationRequest, Generator, ModelTier};
use crate::io::prompt::Prompts;
use crate::strategy::{StepInput, Writer, requirements_from};

static LIST_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-*]|\d+[.)])[ \t]+(\S.*)$").expect("list item regex compiles")
});

/// Collapse `history` into a non-conflicting requirement list with one
/// reasoning-tier call.
///
/// Falls back to the raw history when the response holds no requirements.
#[instrument(skip_all, fields(requests = history.len()))]
pub fn reconcile_requirements<G: Generator>(
    generator: &G,
    prompts: &Prompts,
    history: &[ChangeRequest],
) -> Result<Vec<String>> {
    let request = GenerationRequest::new(prompts.reconcile_system()?, prompts.reconcile(history)?)
        .with_tier(ModelTier::Reasoning);
    let response = generator.generate(&request)?;
    let requirements = parse_requirements(&response);
    if requirements.is_empty() {
        warn!("reconciliation returned no requirements, using raw history");
        return Ok(requirements_from(history));
    }
    debug!(
        before = history.len(),
        after = requirements.len(),
        "requirements reconciled"
    );
    Ok(requirements)
}

/// Extract requirements from a reconciliation response.
///
/// List items (`- `, `* `, `1. `, `1) `) win when present; otherwise every
/// non-empty line is a requirement. Fence lines are ignored.
pub fn parse_requirements(response: &str) -> Vec<String> {
    let lines: Vec<&str> = response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("```"))
        .collect();
    let items: Vec<String> = lines
        .iter()
        .filter_map(|line| LIST_ITEM_RE.captures(line))
        .map(|caps| caps[1].trim().to_string())
        .collect();
    if items.is_empty() {
        lines.into_iter().map(str::to_string).collect()
    } else {
        items
    }
}

pub(super) fn run<G: Generator>(
    writer: &Writer<'_, G>,
    input: &StepInput<'_>,
) -> Result<StrategyRunResult> {
    let requirements = reconcile_requirements(writer.generator, &writer.prompts, input.history)?;
    let user = writer
        .prompts
        .regenerate(input.base_template, &requirements, None)?;
    let artifact = writer.write(user)?;
    let score = input.score(&artifact);
    let total = score.total;
    Ok(StrategyRunResult::new(artifact, score, 0, vec![total]).with_reconciled(requirements))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Artifact, AtypicalityLevel, StrategyKind};
    use crate::strategy::run_strategy;
    use crate::test_support::{CONFORMING_DOCUMENT, ScriptedGenerator};

    #[test]
    fn list_items_are_extracted() {
        let response = "Reconciled list:\n- Use TLS 1.3.\n* Rotate keys yearly.\n2. Keep audit logs.\n3) Review access.\n";
        assert_eq!(
            parse_requirements(response),
            vec![
                "Use TLS 1.3.",
                "Rotate keys yearly.",
                "Keep audit logs.",
                "Review access.",
            ]
        );
    }

    #[test]
    fn plain_lines_are_used_without_list_markers() {
        let response = "```\nUse TLS.\n\nRotate keys.\n```\n";
        assert_eq!(parse_requirements(response), vec!["Use TLS.", "Rotate keys."]);
    }

    #[test]
    fn empty_response_falls_back_to_history() {
        let prompts = Prompts::new().expect("prompts");
        let generator = ScriptedGenerator::new(["  \n"]);
        let history = vec![ChangeRequest::new("a"), ChangeRequest::new("b")];
        let requirements =
            reconcile_requirements(&generator, &prompts, &history).expect("reconcile");
        assert_eq!(requirements, vec!["a", "b"]);
    }

    #[test]
    fn reconciliation_uses_reasoning_tier_and_feeds_the_writer() {
        let template = Artifact::new("# Template\n");
        let history = vec![
            ChangeRequest::new("Require TLS."),
            ChangeRequest::new("Require TLS everywhere."),
        ];
        let generator =
            ScriptedGenerator::new(["- Require TLS everywhere.", CONFORMING_DOCUMENT]);
        let input = StepInput {
            base_template: &template,
            previous: &template,
            history: &history,
            level: AtypicalityLevel::None,
            temperature: 0.2,
        };

        let result = run_strategy(StrategyKind::RegenReconcile, &generator, &input).expect("run");
        assert!(result.converged);
        assert_eq!(result.retries, 0);
        assert_eq!(
            result.reconciled,
            Some(vec!["Require TLS everywhere.".to_string()])
        );

        let requests = generator.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tier, ModelTier::Reasoning);
        assert_eq!(requests[0].temperature, 0.0);
        assert!(requests[0].user.contains("1. Require TLS.\n2. Require TLS everywhere."));
        assert_eq!(requests[1].tier, ModelTier::Fast);
        assert_eq!(requests[1].temperature, 0.2);
        assert!(requests[1].user.contains("1. Require TLS everywhere."));
        assert!(!requests[1].user.contains("1. Require TLS.\n"));
    }
}
