//! Word-level casing constraint selected by [`AtypicalityLevel`].

use serde::{Deserialize, Serialize};

use crate::core::types::AtypicalityLevel;

/// Maximum number of example words kept in the detail list.
pub const ATYPICALITY_DETAIL_CAP: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtypicalityScore {
    pub level: AtypicalityLevel,
    pub violations: u32,
    pub examples: Vec<String>,
}

/// Score word casing at `level`.
///
/// Words are maximal runs of alphanumeric characters. `None` short-circuits
/// without tokenizing.
pub fn check_atypicality(text: &str, level: AtypicalityLevel) -> AtypicalityScore {
    let mut score = AtypicalityScore {
        level,
        ..AtypicalityScore::default()
    };
    if level == AtypicalityLevel::None {
        return score;
    }

    for word in words(text) {
        if !violates(word, level) {
            continue;
        }
        score.violations += 1;
        if score.examples.len() < ATYPICALITY_DETAIL_CAP {
            score.examples.push(word.to_string());
        }
    }
    score
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
}

fn violates(word: &str, level: AtypicalityLevel) -> bool {
    let position = match level {
        AtypicalityLevel::None => return false,
        AtypicalityLevel::WordInitial => 0,
        AtypicalityLevel::ThirdCharacter => 2,
    };
    // Words too short to have the checked character are exempt.
    word.chars().nth(position).is_some_and(char::is_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_level_never_reports() {
        for text in ["", "all lowercase words", "mIxEd CaSe ... 123abc"] {
            let score = check_atypicality(text, AtypicalityLevel::None);
            assert_eq!(score.violations, 0);
            assert!(score.examples.is_empty());
        }
    }

    #[test]
    fn word_initial_flags_lowercase_starts_only() {
        let score = check_atypicality("Keys rotate Daily 42nd run", AtypicalityLevel::WordInitial);
        assert_eq!(score.violations, 2);
        assert_eq!(score.examples, vec!["rotate", "run"]);
    }

    #[test]
    fn third_character_rules() {
        let level = AtypicalityLevel::ThirdCharacter;
        assert_eq!(check_atypicality("test", level).violations, 1);
        assert_eq!(check_atypicality("teSt", level).violations, 0);
        assert_eq!(check_atypicality("an to a", level).violations, 0);
        assert_eq!(check_atypicality("ab1d", level).violations, 0);
    }

    #[test]
    fn punctuation_splits_words() {
        let score = check_atypicality("break-glass", AtypicalityLevel::WordInitial);
        assert_eq!(score.examples, vec!["break", "glass"]);
    }

    #[test]
    fn examples_are_capped_but_counter_is_not() {
        let text = vec!["lower"; 9].join(" ");
        let score = check_atypicality(&text, AtypicalityLevel::WordInitial);
        assert_eq!(score.violations, 9);
        assert_eq!(score.examples.len(), ATYPICALITY_DETAIL_CAP);
    }
}
