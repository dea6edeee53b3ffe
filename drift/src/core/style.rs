//! Sentence-length style rules.

use serde::{Deserialize, Serialize};

use crate::core::grammar::is_heading_marker_line;

/// Sentences longer than this many words are violations.
pub const MAX_SENTENCE_WORDS: usize = 25;
/// Sentences at or under this many words count as short.
pub const SHORT_SENTENCE_WORDS: usize = 12;
/// Minimum fraction of short sentences before the ratio penalty applies.
pub const SHORT_RATIO_TARGET: f64 = 0.7;
/// Maximum number of long-sentence previews kept in the detail list.
pub const LONG_SENTENCE_DETAIL_CAP: usize = 5;

const PREVIEW_WORDS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongSentence {
    pub words: u32,
    pub preview: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleScore {
    pub violations: u32,
    pub sentences: u32,
    pub long_sentences: u32,
    pub short_ratio: f64,
    pub ratio_penalty: u32,
    pub examples: Vec<LongSentence>,
}

/// Score sentence lengths.
///
/// Heading lines are dropped, the rest is split on `.`, `!` and `?`, and
/// words are whitespace-delimited tokens. Violations are the long-sentence
/// count plus `ceil((0.7 - short_ratio) * 10)` when the short ratio falls
/// below target. An input with no sentences has a short ratio of 1.0.
pub fn check_style(text: &str) -> StyleScore {
    let body = text
        .lines()
        .filter(|line| !is_heading_marker_line(line))
        .collect::<Vec<_>>()
        .join("\n");

    let mut score = StyleScore::default();
    let mut short = 0u32;
    for sentence in body
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
    {
        let words = sentence.split_whitespace().count();
        score.sentences += 1;
        if words <= SHORT_SENTENCE_WORDS {
            short += 1;
        }
        if words > MAX_SENTENCE_WORDS {
            score.long_sentences += 1;
            if score.examples.len() < LONG_SENTENCE_DETAIL_CAP {
                score.examples.push(LongSentence {
                    words: words as u32,
                    preview: preview(sentence),
                });
            }
        }
    }

    score.short_ratio = if score.sentences == 0 {
        1.0
    } else {
        f64::from(short) / f64::from(score.sentences)
    };
    score.ratio_penalty = ratio_penalty(score.short_ratio);
    score.violations = score.long_sentences + score.ratio_penalty;
    score
}

fn ratio_penalty(short_ratio: f64) -> u32 {
    if short_ratio < SHORT_RATIO_TARGET {
        ((SHORT_RATIO_TARGET - short_ratio) * 10.0).ceil() as u32
    } else {
        0
    }
}

fn preview(sentence: &str) -> String {
    let words: Vec<&str> = sentence.split_whitespace().collect();
    if words.len() <= PREVIEW_WORDS {
        return words.join(" ");
    }
    format!("{} ...", words[..PREVIEW_WORDS].join(" "))
}
