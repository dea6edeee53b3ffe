//! Configuration merging.
//!
//! Applies case-specific overrides to the base drift configuration.

use anyhow::{Context, Result};
use drift::io::config::DriftConfig;

use crate::case::CaseConfig;

/// Apply case configuration overrides to the base config.
pub fn apply_case_config(mut base: DriftConfig, overrides: &CaseConfig) -> Result<DriftConfig> {
    let generation = &overrides.generation;
    if let Some(model) = &generation.fast_model {
        base.generation.fast_model = model.clone();
    }
    if let Some(model) = &generation.reasoning_model {
        base.generation.reasoning_model = model.clone();
    }
    if let Some(temperature) = generation.temperature {
        base.generation.temperature = temperature;
    }
    if let Some(timeout_secs) = generation.timeout_secs {
        base.generation.timeout_secs = timeout_secs;
    }
    if let Some(limit) = generation.output_limit_bytes {
        base.generation.output_limit_bytes = limit;
    }
    if let Some(max_attempts) = overrides.retry.max_attempts {
        base.retry.max_attempts = max_attempts;
    }
    if let Some(backoff) = overrides.retry.initial_backoff_ms {
        base.retry.initial_backoff_ms = backoff;
    }
    base.validate().context("merged config invalid")?;
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{GenerationOverride, RetryOverride};

    #[test]
    fn preserves_base_when_no_override() {
        let base = DriftConfig::default();
        let merged = apply_case_config(base.clone(), &CaseConfig::default()).expect("merge");
        assert_eq!(merged, base);
    }

    #[test]
    fn applies_overrides() {
        let overrides = CaseConfig {
            generation: GenerationOverride {
                reasoning_model: Some("o3".to_string()),
                temperature: Some(0.5),
                ..GenerationOverride::default()
            },
            retry: RetryOverride {
                initial_backoff_ms: Some(10),
                ..RetryOverride::default()
            },
        };
        let merged = apply_case_config(DriftConfig::default(), &overrides).expect("merge");
        assert_eq!(merged.generation.reasoning_model, "o3");
        assert_eq!(merged.generation.temperature, 0.5);
        assert_eq!(merged.generation.fast_model, DriftConfig::default().generation.fast_model);
        assert_eq!(merged.retry.initial_backoff_ms, 10);
        assert_eq!(merged.retry.max_attempts, 5);
    }

    #[test]
    fn rejects_invalid_merge() {
        let overrides = CaseConfig {
            generation: GenerationOverride {
                temperature: Some(9.0),
                ..GenerationOverride::default()
            },
            ..CaseConfig::default()
        };
        assert!(apply_case_config(DriftConfig::default(), &overrides).is_err());
    }
}
