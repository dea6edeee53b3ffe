//! Shared deterministic types for the drift core.
//!
//! These types define stable contracts between the scorer, the strategy
//! engine and the experiment runner. They hold no I/O handles and serialize
//! deterministically.

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::score::DriftScore;

/// Full text of the document at one point in its evolution.
///
/// Never mutated in place: every strategy step yields a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Artifact(String);

impl Artifact {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One requested edit, as an opaque instruction string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeRequest(String);

impl ChangeRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChangeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Optional per-word casing constraint layered on the structural invariants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AtypicalityLevel {
    #[default]
    None,
    /// Every word must start with an uppercase letter.
    WordInitial,
    /// Every word of three or more characters must have an uppercase third character.
    ThirdCharacter,
}

impl AtypicalityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::WordInitial => "word-initial",
            Self::ThirdCharacter => "third-character",
        }
    }
}

impl fmt::Display for AtypicalityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AtypicalityLevel {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            "none" => Ok(Self::None),
            "word-initial" => Ok(Self::WordInitial),
            "third-character" => Ok(Self::ThirdCharacter),
            other => Err(anyhow!(
                "unknown atypicality level '{other}' (expected none, word-initial or third-character)"
            )),
        }
    }
}

/// Document-evolution strategy identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    Incremental,
    Repair,
    Regeneration,
    RegenReconcile,
    RegenFull,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        Self::Incremental,
        Self::Repair,
        Self::Regeneration,
        Self::RegenReconcile,
        Self::RegenFull,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Incremental => "incremental",
            Self::Repair => "repair",
            Self::Regeneration => "regeneration",
            Self::RegenReconcile => "regen-reconcile",
            Self::RegenFull => "regen-full",
        }
    }

    /// True for strategies that score-gate additional attempts.
    pub fn retries(self) -> bool {
        matches!(self, Self::Repair | Self::RegenFull)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|kind| kind.as_str()).collect();
                anyhow!(
                    "unknown strategy '{value}' (expected one of: {})",
                    known.join(", ")
                )
            })
    }
}

/// Outcome of one strategy invocation for one iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyRunResult {
    pub artifact: Artifact,
    /// Regeneration or repair attempts consumed beyond the first generation.
    pub retries: u32,
    pub score: DriftScore,
    pub converged: bool,
    /// Total drift observed at each attempt, in order.
    pub drift_history: Vec<u32>,
    /// Requirement list produced by reconciliation, for strategies that run it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconciled: Option<Vec<String>>,
}

impl StrategyRunResult {
    pub fn new(
        artifact: Artifact,
        score: DriftScore,
        retries: u32,
        drift_history: Vec<u32>,
    ) -> Self {
        Self {
            converged: score.total == 0,
            artifact,
            retries,
            score,
            drift_history,
            reconciled: None,
        }
    }

    pub fn with_reconciled(mut self, requirements: Vec<String>) -> Self {
        self.reconciled = Some(requirements);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_kind_parses_every_identifier() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.as_str().parse::<StrategyKind>().expect("parse"), kind);
        }
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let err = "regen-partial".parse::<StrategyKind>().unwrap_err();
        assert!(err.to_string().contains("unknown strategy 'regen-partial'"));
    }

    #[test]
    fn atypicality_level_round_trips_through_serde() {
        let json = serde_json::to_string(&AtypicalityLevel::ThirdCharacter).expect("json");
        assert_eq!(json, "\"third-character\"");
        let level: AtypicalityLevel = serde_json::from_str("\"word-initial\"").expect("parse");
        assert_eq!(level, AtypicalityLevel::WordInitial);
    }

    #[test]
    fn retrying_strategies_are_repair_and_regen_full() {
        let retrying: Vec<StrategyKind> = StrategyKind::ALL
            .into_iter()
            .filter(|kind| kind.retries())
            .collect();
        assert_eq!(retrying, vec![StrategyKind::Repair, StrategyKind::RegenFull]);
    }
}
