//! Prompt rendering for the writer and the reconciler.

use anyhow::{Context, Result};
use minijinja::{Environment, context};

use crate::core::grammar::SUBSECTIONS;
use crate::core::style::{MAX_SENTENCE_WORDS, SHORT_RATIO_TARGET, SHORT_SENTENCE_WORDS};
use crate::core::types::{Artifact, AtypicalityLevel, ChangeRequest};
use crate::core::vocabulary::TERMS;

const TEMPLATES: [(&str, &str); 6] = [
    ("system", include_str!("prompts/system.md")),
    ("edit", include_str!("prompts/edit.md")),
    ("repair", include_str!("prompts/repair.md")),
    ("regenerate", include_str!("prompts/regenerate.md")),
    ("reconcile_system", include_str!("prompts/reconcile_system.md")),
    ("reconcile", include_str!("prompts/reconcile.md")),
];

/// Compiled prompt templates.
pub struct Prompts {
    env: Environment<'static>,
}

impl Prompts {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(name, source)
                .with_context(|| format!("compile prompt template {name}"))?;
        }
        Ok(Self { env })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        let rendered = self
            .env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .with_context(|| format!("render prompt template {name}"))?;
        Ok(rendered)
    }

    /// Writer instruction naming every invariant, plus the casing rule when
    /// `level` has one.
    pub fn system(&self, level: AtypicalityLevel) -> Result<String> {
        self.render(
            "system",
            context! {
                subsections => SUBSECTIONS,
                terms => TERMS,
                max_sentence_words => MAX_SENTENCE_WORDS,
                short_sentence_words => SHORT_SENTENCE_WORDS,
                short_ratio_percent => (SHORT_RATIO_TARGET * 100.0).round() as u32,
                casing_rule => casing_instruction(level),
            },
        )
    }

    pub fn edit(&self, document: &Artifact, request: &ChangeRequest) -> Result<String> {
        self.render(
            "edit",
            context! {
                document => document.as_str().trim_end(),
                request => request.as_str().trim(),
            },
        )
    }

    pub fn repair(
        &self,
        document: &Artifact,
        request: &ChangeRequest,
        report: &str,
    ) -> Result<String> {
        self.render(
            "repair",
            context! {
                document => document.as_str().trim_end(),
                request => request.as_str().trim(),
                report => report,
            },
        )
    }

    /// From-scratch generation. `report` carries the previous attempt's
    /// violations when this is a regeneration.
    pub fn regenerate(
        &self,
        template: &Artifact,
        requirements: &[String],
        report: Option<&str>,
    ) -> Result<String> {
        self.render(
            "regenerate",
            context! {
                template => template.as_str().trim_end(),
                requirements => requirements,
                report => report.filter(|r| !r.trim().is_empty()),
            },
        )
    }

    pub fn reconcile_system(&self) -> Result<String> {
        self.render(
            "reconcile_system",
            context! {
                subsections => SUBSECTIONS,
                terms => TERMS,
                max_sentence_words => MAX_SENTENCE_WORDS,
            },
        )
    }

    pub fn reconcile(&self, history: &[ChangeRequest]) -> Result<String> {
        let history: Vec<&str> = history.iter().map(|r| r.as_str().trim()).collect();
        self.render("reconcile", context! { history => history })
    }
}

fn casing_instruction(level: AtypicalityLevel) -> Option<&'static str> {
    match level {
        AtypicalityLevel::None => None,
        AtypicalityLevel::WordInitial => {
            Some("Every word must start with an uppercase letter or a digit.")
        }
        AtypicalityLevel::ThirdCharacter => Some(
            "In every word of three or more characters, the third character must not be a lowercase letter.",
        ),
    }
}
