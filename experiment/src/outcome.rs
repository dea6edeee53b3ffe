use drift::experiment::IterationMetrics;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Every planned iteration ran and the final artifact scores 0.
    Converged,
    /// Every planned iteration ran but the final artifact has drift.
    Drifted,
    /// The run aborted partway (generation or persistence failure).
    Error,
}

pub fn classify_outcome(failed: bool, metrics: &[IterationMetrics]) -> Outcome {
    if failed {
        return Outcome::Error;
    }
    match metrics.last() {
        Some(last) if last.total_drift == 0 => Outcome::Converged,
        Some(_) => Outcome::Drifted,
        None => Outcome::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift::core::score::SubScores;
    use drift::io::usage::Usage;

    fn metrics(totals: &[u32]) -> Vec<IterationMetrics> {
        totals
            .iter()
            .enumerate()
            .map(|(index, &total)| IterationMetrics {
                iteration: index as u32 + 1,
                total_drift: total,
                retries: 0,
                converged: total == 0,
                sub_scores: SubScores::default(),
                drift_history: None,
                usage: Usage::default(),
            })
            .collect()
    }

    #[test]
    fn converged_when_final_iteration_scores_zero() {
        assert_eq!(classify_outcome(false, &metrics(&[4, 0])), Outcome::Converged);
    }

    #[test]
    fn drifted_when_final_iteration_has_drift() {
        assert_eq!(classify_outcome(false, &metrics(&[0, 3])), Outcome::Drifted);
    }

    #[test]
    fn error_when_run_failed_or_empty() {
        assert_eq!(classify_outcome(true, &metrics(&[0])), Outcome::Error);
        assert_eq!(classify_outcome(false, &[]), Outcome::Error);
    }
}
