//! Generation and retry configuration (TOML).

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::io::generator::ModelTier;
use crate::io::retry::RetryPolicy;

/// Top-level configuration.
///
/// Edited by hand; missing fields take the defaults below.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DriftConfig {
    pub generation: GenerationConfig,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    /// Model used for document generation.
    pub fast_model: String,
    /// Model used for requirement reconciliation.
    pub reasoning_model: String,
    /// Sampling temperature for document generation.
    pub temperature: f32,
    /// Wall-clock budget per generation call, in seconds.
    pub timeout_secs: u64,
    /// Truncate captured backend output beyond this many bytes.
    pub output_limit_bytes: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            fast_model: "gpt-5-mini".to_string(),
            reasoning_model: "gpt-5".to_string(),
            temperature: 0.0,
            timeout_secs: 10 * 60,
            output_limit_bytes: 200_000,
        }
    }
}

impl GenerationConfig {
    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast_model,
            ModelTier::Reasoning => &self.reasoning_model,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per generation call, including the first.
    pub max_attempts: u32,
    /// Delay after the first failure, in milliseconds. Doubles per attempt.
    pub initial_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 1_000,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
        }
    }
}

impl DriftConfig {
    pub fn validate(&self) -> Result<()> {
        let generation = &self.generation;
        if generation.fast_model.trim().is_empty() {
            bail!("generation.fast_model must be non-empty");
        }
        if generation.reasoning_model.trim().is_empty() {
            bail!("generation.reasoning_model must be non-empty");
        }
        if !(0.0..=2.0).contains(&generation.temperature) {
            bail!(
                "generation.temperature must be within 0.0..=2.0 (got {})",
                generation.temperature
            );
        }
        if generation.timeout_secs == 0 {
            bail!("generation.timeout_secs must be > 0");
        }
        if generation.output_limit_bytes == 0 {
            bail!("generation.output_limit_bytes must be > 0");
        }
        if self.retry.max_attempts == 0 {
            bail!("retry.max_attempts must be > 0");
        }
        Ok(())
    }
}

/// Load config from a TOML file, or the validated default if it is missing.
pub fn load_config(path: &Path) -> Result<DriftConfig> {
    let cfg = if path.exists() {
        let contents =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?
    } else {
        DriftConfig::default()
    };
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &DriftConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, buf)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, DriftConfig::default());
        assert_eq!(cfg.retry.policy(), RetryPolicy::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested").join("drift.toml");
        let mut cfg = DriftConfig::default();
        cfg.generation.temperature = 0.5;
        cfg.retry.initial_backoff_ms = 250;
        write_config(&path, &cfg).expect("write");
        assert_eq!(load_config(&path).expect("load"), cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("drift.toml");
        fs::write(&path, "[generation]\nfast_model = \"local\"\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.generation.model_for(ModelTier::Fast), "local");
        assert_eq!(cfg.generation.model_for(ModelTier::Reasoning), "gpt-5");
        assert_eq!(cfg.retry, RetryConfig::default());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("drift.toml");
        fs::write(&path, "[retry]\nmax_attempts = 0\n").expect("write");
        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("retry.max_attempts must be > 0"));

        let mut cfg = DriftConfig::default();
        cfg.generation.temperature = 3.5;
        assert!(cfg.validate().is_err());
    }
}
