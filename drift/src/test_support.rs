//! Test-only fixtures: documents with a known drift score and a scripted
//! generator.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use anyhow::{Result, anyhow};

use crate::io::generator::{GenerationRequest, Generator};

/// Three-section policy that scores 0 at atypicality level `none`.
pub const CONFORMING_DOCUMENT: &str = include_str!("../fixtures/conforming.md");

/// The conforming fixture plus `total` extra "PKI" mentions, so it scores
/// exactly `total` at level `none`.
pub fn document_with_drift(total: u32) -> String {
    let extra = "Note PKI. ".repeat(total as usize);
    format!("{CONFORMING_DOCUMENT}\n{}\n", extra.trim_end())
}

/// Like [`document_with_drift`] but tagged with `revision` so equal-scoring
/// documents are still distinguishable.
pub fn drifted_document(total: u32, revision: u32) -> String {
    format!("{}Revision {revision}.\n", document_with_drift(total))
}

/// Generator that replays a fixed script and records every request.
///
/// Running past the end of the script is an error.
pub struct ScriptedGenerator {
    script: RefCell<VecDeque<Result<String, String>>>,
    requests: RefCell<Vec<GenerationRequest>>,
    calls: Cell<u32>,
}

impl ScriptedGenerator {
    /// Script of successful responses.
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_results(responses.into_iter().map(|text| Ok(text.into())).collect())
    }

    /// Script mixing responses and failures (`Err` holds the error message).
    pub fn from_results(script: Vec<Result<String, String>>) -> Self {
        Self {
            script: RefCell::new(script.into()),
            requests: RefCell::new(Vec::new()),
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.get()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.borrow().clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.borrow().len()
    }
}

impl Generator for ScriptedGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.calls.set(self.calls.get() + 1);
        self.requests.borrow_mut().push(request.clone());
        match self.script.borrow_mut().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!(
                "scripted generator exhausted after {} calls",
                self.calls.get() - 1
            )),
        }
    }
}
