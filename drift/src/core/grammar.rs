//! Line grammar for the structural parts of a document.
//!
//! Three productions are recognised:
//!
//! - **heading line**: `## <number>. <title>` where `<number>` is an integer or
//!   dotted integer (`3`, `2.1`). Only `##` opens a Section.
//! - **subsection marker line**: `### <name>` (case-insensitive), `<name>` one
//!   of [`SUBSECTIONS`].
//! - **reference phrase**: `see section <number>` (case-insensitive), anywhere
//!   in running text.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// Required subsections of every Section, in their required order.
pub const SUBSECTIONS: [&str; 5] = ["Purpose", "Scope", "Requirements", "Controls", "Verification"];

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^##[ \t]+(\d+(?:\.\d+)*)\.[ \t]+(\S[^\r\n]*)\r?$").expect("heading regex")
});

static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bsee\s+section\s+(\d+(?:\.\d+)*)").expect("reference regex")
});

static SUBSECTION_RES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    SUBSECTIONS
        .iter()
        .map(|name| {
            let pattern = format!(r"(?im)^###[ \t]+{}\b", regex::escape(name));
            (*name, Regex::new(&pattern).expect("subsection regex"))
        })
        .collect()
});

/// A numbered top-level heading and the byte offset where its line starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub number: String,
    pub title: String,
    pub offset: usize,
}

/// A section reference found in running text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Literal matched text, e.g. `See Section 9.9`.
    pub text: String,
    pub target: String,
    pub offset: usize,
}

/// All heading lines, in document order.
pub fn headings(text: &str) -> Vec<Heading> {
    HEADING_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(Heading {
                number: caps.get(1)?.as_str().to_string(),
                title: caps.get(2)?.as_str().trim_end().to_string(),
                offset: whole.start(),
            })
        })
        .collect()
}

/// The set of Section numbers defined by heading lines.
pub fn section_numbers(text: &str) -> BTreeSet<String> {
    headings(text).into_iter().map(|heading| heading.number).collect()
}

/// All reference phrases, in document order.
pub fn references(text: &str) -> Vec<Reference> {
    REFERENCE_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(Reference {
                text: whole.as_str().to_string(),
                target: caps.get(1)?.as_str().to_string(),
                offset: whole.start(),
            })
        })
        .collect()
}

/// Offset of the first marker line for each required subsection within `span`.
///
/// The result is aligned with [`SUBSECTIONS`].
pub fn subsection_offsets(span: &str) -> Vec<(&'static str, Option<usize>)> {
    SUBSECTION_RES
        .iter()
        .map(|(name, re)| (*name, re.find(span).map(|found| found.start())))
        .collect()
}

/// True for lines that begin with a heading marker (`#`, `##`, `###`, ...).
pub fn is_heading_marker_line(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_accept_integer_and_dotted_numbers() {
        let text = "# Policy\n\n## 1. Overview\nbody\n## 2.1. Keys \n### Purpose\n";
        let found = headings(text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].number, "1");
        assert_eq!(found[0].title, "Overview");
        assert_eq!(found[1].number, "2.1");
        assert_eq!(found[1].title, "Keys");
        assert_eq!(&text[found[1].offset..found[1].offset + 2], "##");
    }

    #[test]
    fn headings_parse_in_crlf_text() {
        let found = headings("## 1. Identity\r\nbody\r\n## 2. Keys\r\n");
        let numbers: Vec<&str> = found.iter().map(|h| h.number.as_str()).collect();
        assert_eq!(numbers, vec!["1", "2"]);
        assert_eq!(found[1].title, "Keys");
    }

    #[test]
    fn headings_require_marker_number_and_period() {
        let text = "### 1. Not a section\n## Overview\n## 3 Missing period\n#4. Tight\n";
        assert!(headings(text).is_empty());
    }

    #[test]
    fn references_are_case_insensitive_and_keep_literal_text() {
        let text = "Rotate keys (see SECTION 2). Also See Section 9.9 for escalation.";
        let found = references(text);
        let targets: Vec<&str> = found.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(targets, vec!["2", "9.9"]);
        assert_eq!(found[0].text, "see SECTION 2");
        assert_eq!(found[1].text, "See Section 9.9");
    }

    #[test]
    fn reference_stops_before_sentence_period() {
        let found = references("Escalate as described. See Section 3.");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].target, "3");
    }

    #[test]
    fn subsection_offsets_match_marker_lines_only() {
        let span = "## 1. A\nThe purpose is clear.\n### purpose\n### Scope of work\n";
        let offsets = subsection_offsets(span);
        assert_eq!(offsets[0].0, "Purpose");
        assert_eq!(offsets[0].1, span.find("### purpose"));
        assert_eq!(offsets[1].1, span.find("### Scope"));
        assert_eq!(offsets[2].1, None);
    }

    #[test]
    fn heading_marker_lines_tolerate_indentation() {
        assert!(is_heading_marker_line("  ## 1. Title"));
        assert!(!is_heading_marker_line("Plain text."));
    }
}
