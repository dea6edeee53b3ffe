//! Single edit of the previous artifact; the score is reported, never acted on.

use anyhow::Result;

use crate::core::types::StrategyRunResult;
use crate::io::generator::Generator;
use crate::strategy::{StepInput, Writer};

pub(super) fn run<G: Generator>(
    writer: &Writer<'_, G>,
    input: &StepInput<'_>,
) -> Result<StrategyRunResult> {
    let request = input.latest_request()?;
    let artifact = writer.write(writer.prompts.edit(input.previous, request)?)?;
    let score = input.score(&artifact);
    let total = score.total;
    Ok(StrategyRunResult::new(artifact, score, 0, vec![total]))
}
