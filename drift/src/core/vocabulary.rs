//! Controlled vocabulary: every term must appear exactly once.

use serde::{Deserialize, Serialize};

/// The controlled vocabulary, in reporting order.
pub const TERMS: [&str; 20] = [
    "PKI",
    "MFA",
    "RBAC",
    "TLS",
    "HSM",
    "SIEM",
    "zero trust",
    "least privilege",
    "key rotation",
    "audit trail",
    "incident response",
    "threat model",
    "access review",
    "data classification",
    "service account",
    "break-glass",
    "secrets vault",
    "change freeze",
    "single sign-on",
    "encryption at rest",
];

/// A term whose occurrence count differs from one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCount {
    pub term: String,
    pub count: u32,
    pub expected: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyScore {
    pub violations: u32,
    pub terms: Vec<TermCount>,
}

/// Score `text` against [`TERMS`].
///
/// Matching is case-insensitive substring counting, so a term also matches
/// inside a longer token. Each term contributes `|count - 1|`.
pub fn check_vocabulary(text: &str) -> VocabularyScore {
    let haystack = text.to_lowercase();
    let mut score = VocabularyScore::default();
    for term in TERMS {
        let count = count_occurrences(&haystack, &term.to_lowercase());
        if count != 1 {
            score.violations += count.abs_diff(1);
            score.terms.push(TermCount {
                term: term.to_string(),
                count,
                expected: 1,
            });
        }
    }
    score
}

fn count_occurrences(haystack: &str, needle: &str) -> u32 {
    haystack.matches(needle).count() as u32
}
