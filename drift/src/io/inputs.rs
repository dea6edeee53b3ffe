//! Loaders for the base template and the change-request list.
//!
//! Both fail fast: the strategy engine never sees an empty template or an
//! unparsable request list.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use jsonschema::Draft;
use serde::Deserialize;
use serde_json::Value;

use crate::core::types::{Artifact, ChangeRequest};

const REQUESTS_SCHEMA: &str = include_str!("../../schemas/requests.schema.json");

/// Read the base template. Missing or blank files are errors.
pub fn load_template(path: &Path) -> Result<Artifact> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read template {}", path.display()))?;
    if text.trim().is_empty() {
        bail!("template {} is empty", path.display());
    }
    Ok(Artifact::new(text))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RequestEntry {
    Text(String),
    Object { text: String },
}

/// Read a JSON request list and validate it against the embedded schema.
pub fn load_requests(path: &Path) -> Result<Vec<ChangeRequest>> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("read requests {}", path.display()))?;
    parse_requests(&raw).with_context(|| format!("load requests {}", path.display()))
}

/// Parse and validate request-list JSON.
pub fn parse_requests(raw: &str) -> Result<Vec<ChangeRequest>> {
    let value: Value = serde_json::from_str(raw).context("parse request json")?;
    validate_schema(&value)?;
    let entries: Vec<RequestEntry> =
        serde_json::from_value(value).context("deserialize request list")?;
    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            RequestEntry::Text(text) | RequestEntry::Object { text } => {
                ChangeRequest::new(text.trim())
            }
        })
        .collect())
}

fn validate_schema(instance: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(REQUESTS_SCHEMA).context("parse request schema")?;
    let compiled = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .context("compile request schema")?;
    let messages: Vec<String> = compiled
        .iter_errors(instance)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        bail!("request list failed validation:\n- {}", messages.join("\n- "));
    }
    Ok(())
}
