//! Violation report handed to the writer when an attempt is corrected.

use crate::core::score::DriftScore;
use crate::core::style::{MAX_SENTENCE_WORDS, SHORT_RATIO_TARGET};
use crate::core::types::AtypicalityLevel;

/// Render one line per non-zero category of `score`.
///
/// Size is bounded by the validators' own detail caps. A conforming score
/// renders an empty string.
pub fn violation_report(score: &DriftScore) -> String {
    let mut lines = Vec::new();

    if score.vocabulary.violations > 0 {
        let terms: Vec<String> = score
            .vocabulary
            .terms
            .iter()
            .map(|term| {
                format!(
                    "\"{}\" appears {} {} (expected {})",
                    term.term,
                    term.count,
                    plural(term.count, "time", "times"),
                    term.expected
                )
            })
            .collect();
        lines.push(format!("- vocabulary: {}", terms.join("; ")));
    }

    if score.template.violations > 0 {
        let sections: Vec<String> = score
            .template
            .sections
            .iter()
            .map(|issue| {
                let mut problems = Vec::new();
                if !issue.missing.is_empty() {
                    problems.push(format!("missing {}", issue.missing.join(", ")));
                }
                if issue.wrong_order {
                    problems.push("subsections out of order".to_string());
                }
                format!(
                    "section {} ({}) {}",
                    issue.number,
                    issue.title,
                    problems.join(" and ")
                )
            })
            .collect();
        lines.push(format!("- template: {}", sections.join("; ")));
    }

    if score.style.violations > 0 {
        let mut parts = Vec::new();
        if score.style.long_sentences > 0 {
            let mut part = format!(
                "{} {} {MAX_SENTENCE_WORDS} words",
                score.style.long_sentences,
                plural(
                    score.style.long_sentences,
                    "sentence exceeds",
                    "sentences exceed"
                )
            );
            if !score.style.examples.is_empty() {
                let previews: Vec<String> = score
                    .style
                    .examples
                    .iter()
                    .map(|long| format!("\"{}\" ({} words)", long.preview, long.words))
                    .collect();
                part.push_str(&format!(", e.g. {}", previews.join(", ")));
            }
            parts.push(part);
        }
        if score.style.ratio_penalty > 0 {
            parts.push(format!(
                "short-sentence ratio {:.2} is below {SHORT_RATIO_TARGET:.2} (+{})",
                score.style.short_ratio, score.style.ratio_penalty
            ));
        }
        lines.push(format!("- style: {}", parts.join("; ")));
    }

    if score.cross_reference.violations > 0 {
        let broken: Vec<String> = score
            .cross_reference
            .broken
            .iter()
            .map(|reference| {
                format!(
                    "\"{}\" points to missing section {}",
                    reference.text, reference.target
                )
            })
            .collect();
        lines.push(format!("- cross-reference: {}", broken.join("; ")));
    }

    if score.atypicality.violations > 0 {
        let examples: Vec<String> = score
            .atypicality
            .examples
            .iter()
            .map(|word| format!("\"{word}\""))
            .collect();
        lines.push(format!(
            "- atypicality ({}): {} {} {}, e.g. {}",
            score.atypicality.level,
            score.atypicality.violations,
            plural(score.atypicality.violations, "word breaks", "words break"),
            casing_rule(score.atypicality.level),
            examples.join(", ")
        ));
    }

    lines.join("\n")
}

fn casing_rule(level: AtypicalityLevel) -> &'static str {
    match level {
        AtypicalityLevel::None => "no casing rule",
        AtypicalityLevel::WordInitial => "the capitalised-first-letter rule",
        AtypicalityLevel::ThirdCharacter => "the capitalised-third-letter rule",
    }
}

fn plural(count: u32, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 { one } else { many }
}
