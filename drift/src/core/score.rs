//! Drift score: unweighted sum of every structural validator.

use serde::{Deserialize, Serialize};

use crate::core::atypicality::{AtypicalityScore, check_atypicality};
use crate::core::cross_ref::{CrossReferenceScore, check_cross_references};
use crate::core::style::{StyleScore, check_style};
use crate::core::template::{TemplateScore, check_template};
use crate::core::types::AtypicalityLevel;
use crate::core::vocabulary::{VocabularyScore, check_vocabulary};

/// Total drift plus the per-validator breakdown it was summed from.
///
/// Always derived from an artifact, never stored on its own. Scoring the
/// same text at the same level yields an equal value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftScore {
    pub total: u32,
    pub vocabulary: VocabularyScore,
    pub template: TemplateScore,
    pub style: StyleScore,
    pub cross_reference: CrossReferenceScore,
    pub atypicality: AtypicalityScore,
}

/// Per-category violation counts, for metrics records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScores {
    pub vocabulary: u32,
    pub template: u32,
    pub style: u32,
    pub cross_reference: u32,
    pub atypicality: u32,
}

impl DriftScore {
    pub fn is_conforming(&self) -> bool {
        self.total == 0
    }

    pub fn sub_scores(&self) -> SubScores {
        SubScores {
            vocabulary: self.vocabulary.violations,
            template: self.template.violations,
            style: self.style.violations,
            cross_reference: self.cross_reference.violations,
            atypicality: self.atypicality.violations,
        }
    }
}

/// Score `text` with every validator and sum the violation counts.
pub fn score_artifact(text: &str, level: AtypicalityLevel) -> DriftScore {
    let vocabulary = check_vocabulary(text);
    let template = check_template(text);
    let style = check_style(text);
    let cross_reference = check_cross_references(text);
    let atypicality = check_atypicality(text, level);
    let total = vocabulary.violations
        + template.violations
        + style.violations
        + cross_reference.violations
        + atypicality.violations;
    DriftScore {
        total,
        vocabulary,
        template,
        style,
        cross_reference,
        atypicality,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CONFORMING_DOCUMENT, document_with_drift};

    #[test]
    fn conforming_fixture_scores_zero() {
        let score = score_artifact(CONFORMING_DOCUMENT, AtypicalityLevel::None);
        assert_eq!(score.total, 0, "{score:#?}");
        assert!(score.is_conforming());
        assert_eq!(score.template.sections_checked, 3);
        assert_eq!(score.cross_reference.references, 2);
    }

    #[test]
    fn crlf_line_endings_score_like_lf() {
        let crlf = CONFORMING_DOCUMENT.replace('\n', "\r\n");
        let score = score_artifact(&crlf, AtypicalityLevel::None);
        assert_eq!(score.total, 0, "{score:#?}");
        assert_eq!(score.template.sections_checked, 3);
        assert_eq!(score.cross_reference.references, 2);
    }

    #[test]
    fn pki_twice_and_mfa_missing_scores_two() {
        let text = CONFORMING_DOCUMENT
            .replace("MFA", "a second factor")
            .replace("Certificates come from our PKI.", "Certificates come from our PKI and PKI.");
        let score = score_artifact(&text, AtypicalityLevel::None);
        assert_eq!(score.vocabulary.violations, 2);
        assert_eq!(score.total, 2);
    }

    #[test]
    fn total_is_the_unweighted_sum() {
        let text = format!(
            "{CONFORMING_DOCUMENT}\nSee Section 9.9 for the rest.\n"
        );
        let score = score_artifact(&text, AtypicalityLevel::WordInitial);
        let subs = score.sub_scores();
        assert_eq!(subs.cross_reference, 1);
        assert!(subs.atypicality > 0);
        assert_eq!(
            score.total,
            subs.vocabulary + subs.template + subs.style + subs.cross_reference + subs.atypicality
        );
    }

    #[test]
    fn drift_builder_hits_requested_total() {
        for target in [0, 1, 2, 5, 7] {
            let score = score_artifact(&document_with_drift(target), AtypicalityLevel::None);
            assert_eq!(score.total, target);
        }
    }

    #[test]
    fn scoring_is_idempotent() {
        let text = document_with_drift(4);
        for level in [
            AtypicalityLevel::None,
            AtypicalityLevel::WordInitial,
            AtypicalityLevel::ThirdCharacter,
        ] {
            assert_eq!(score_artifact(&text, level), score_artifact(&text, level));
        }
    }

    #[test]
    fn malformed_input_still_scores() {
        let score = score_artifact("\u{0}## \n###\n...!?", AtypicalityLevel::ThirdCharacter);
        assert_eq!(score.vocabulary.violations, 20);
    }
}
