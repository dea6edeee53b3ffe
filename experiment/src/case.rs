//! Case file parsing and validation.
//!
//! Cases are TOML files naming a base template, a request list and the
//! strategy to drive over them. See `experiment/cases/` for examples.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use drift::core::types::{AtypicalityLevel, StrategyKind};
use serde::Deserialize;

/// A parsed case file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CaseFile {
    pub case: CaseMeta,
    #[serde(default)]
    pub config: CaseConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CaseMeta {
    /// Unique identifier (slug format: `[a-z0-9_-]+`).
    pub id: String,
    /// Base template, relative to the case file's directory.
    pub template: PathBuf,
    /// JSON request list, relative to the case file's directory.
    pub requests: PathBuf,
    pub strategy: StrategyKind,
    /// Upper bound on iterations; the request count also bounds the run.
    pub iterations: u32,
    #[serde(default)]
    pub atypicality: AtypicalityLevel,
}

/// Overrides applied on top of `experiment/drift.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CaseConfig {
    #[serde(default)]
    pub generation: GenerationOverride,
    #[serde(default)]
    pub retry: RetryOverride,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GenerationOverride {
    pub fast_model: Option<String>,
    pub reasoning_model: Option<String>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
    pub output_limit_bytes: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RetryOverride {
    pub max_attempts: Option<u32>,
    pub initial_backoff_ms: Option<u64>,
}

/// A case file together with where it was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedCase {
    pub path: PathBuf,
    pub file: CaseFile,
}

impl LoadedCase {
    pub fn id(&self) -> &str {
        &self.file.case.id
    }

    pub fn template_path(&self) -> PathBuf {
        self.resolve(&self.file.case.template)
    }

    pub fn requests_path(&self) -> PathBuf {
        self.resolve(&self.file.case.requests)
    }

    fn resolve(&self, relative: &Path) -> PathBuf {
        match self.path.parent() {
            Some(dir) => dir.join(relative),
            None => relative.to_path_buf(),
        }
    }
}

impl CaseFile {
    /// Load and validate a case file from the given path.
    pub fn load(path: &Path) -> Result<LoadedCase> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("read case {}", path.display()))?;
        let file = Self::parse_str(&contents)
            .with_context(|| format!("load case {}", path.display()))?;
        Ok(LoadedCase {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn parse_str(contents: &str) -> Result<Self> {
        let case: CaseFile = toml::from_str(contents).context("parse case")?;
        case.validate()?;
        Ok(case)
    }

    fn validate(&self) -> Result<()> {
        validate_case_id(&self.case.id)?;
        if self.case.template.as_os_str().is_empty() {
            bail!("case.template must be non-empty");
        }
        if self.case.requests.as_os_str().is_empty() {
            bail!("case.requests must be non-empty");
        }
        if self.case.iterations == 0 {
            bail!("case.iterations must be > 0");
        }
        let generation = &self.config.generation;
        for (key, value) in [
            ("fast_model", &generation.fast_model),
            ("reasoning_model", &generation.reasoning_model),
        ] {
            if value.as_ref().is_some_and(|model| model.trim().is_empty()) {
                bail!("config.generation.{key} must be non-empty");
            }
        }
        if self.config.retry.max_attempts == Some(0) {
            bail!("config.retry.max_attempts must be > 0");
        }
        Ok(())
    }
}

/// Discover and load all case files from a directory.
///
/// Returns cases sorted by id. Errors if duplicate ids are found.
pub fn discover_cases(dir: &Path) -> Result<Vec<LoadedCase>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut cases = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read cases dir {}", dir.display()))? {
        let entry = entry.context("read case entry")?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("toml") {
            continue;
        }
        cases.push(CaseFile::load(&path)?);
    }
    cases.sort_by(|left, right| left.id().cmp(right.id()));
    for pair in cases.windows(2) {
        if pair[0].id() == pair[1].id() {
            return Err(anyhow!("duplicate case.id {}", pair[0].id()));
        }
    }
    Ok(cases)
}

pub fn validate_case_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        bail!("case.id must be non-empty");
    }
    if id.contains('/') || id.contains('\\') {
        bail!("case.id must not contain path separators");
    }
    if id.contains("..") {
        bail!("case.id must not contain '..'");
    }
    if !id
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '_')
    {
        bail!("case.id must use [a-z0-9_-] only");
    }
    Ok(())
}
