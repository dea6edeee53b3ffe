//! Cross-references must resolve to a Section defined in the same document.

use serde::{Deserialize, Serialize};

use crate::core::grammar::{references, section_numbers};

/// Maximum number of broken references kept in the detail list.
pub const BROKEN_REFERENCE_DETAIL_CAP: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenReference {
    pub text: String,
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReferenceScore {
    pub violations: u32,
    pub references: u32,
    pub broken: Vec<BrokenReference>,
}

pub fn check_cross_references(text: &str) -> CrossReferenceScore {
    let defined = section_numbers(text);
    let mut score = CrossReferenceScore::default();
    for reference in references(text) {
        score.references += 1;
        if defined.contains(&reference.target) {
            continue;
        }
        score.violations += 1;
        if score.broken.len() < BROKEN_REFERENCE_DETAIL_CAP {
            score.broken.push(BrokenReference {
                text: reference.text,
                target: reference.target,
            });
        }
    }
    score
}
