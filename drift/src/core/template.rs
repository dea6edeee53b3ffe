//! Section template: every numbered Section carries the five required
//! subsections in order.

use serde::{Deserialize, Serialize};

use crate::core::grammar::{headings, subsection_offsets};

/// Maximum number of non-conforming sections kept in the detail list.
pub const SECTION_DETAIL_CAP: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionIssue {
    pub number: String,
    pub title: String,
    pub missing: Vec<String>,
    pub wrong_order: bool,
}

impl SectionIssue {
    pub fn violations(&self) -> u32 {
        self.missing.len() as u32 + u32::from(self.wrong_order)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateScore {
    pub violations: u32,
    pub sections_checked: u32,
    pub sections: Vec<SectionIssue>,
}

/// Score every Section span against the required subsection layout.
///
/// A Section runs from its heading line to the next heading line or the end
/// of the document. Violations per Section are the missing markers plus one
/// when the markers that are present appear out of order.
pub fn check_template(text: &str) -> TemplateScore {
    let found = headings(text);
    let mut score = TemplateScore {
        sections_checked: found.len() as u32,
        ..TemplateScore::default()
    };

    for (index, heading) in found.iter().enumerate() {
        let end = found
            .get(index + 1)
            .map(|next| next.offset)
            .unwrap_or(text.len());
        let span = &text[heading.offset..end];

        let mut missing = Vec::new();
        let mut present = Vec::new();
        for (name, offset) in subsection_offsets(span) {
            match offset {
                Some(offset) => present.push(offset),
                None => missing.push(name.to_string()),
            }
        }
        let wrong_order = present.len() > 1 && !present.windows(2).all(|pair| pair[0] < pair[1]);

        let issue = SectionIssue {
            number: heading.number.clone(),
            title: heading.title.clone(),
            missing,
            wrong_order,
        };
        let violations = issue.violations();
        if violations == 0 {
            continue;
        }
        score.violations += violations;
        if score.sections.len() < SECTION_DETAIL_CAP {
            score.sections.push(issue);
        }
    }

    score
}
