//! Text-generation abstraction.
//!
//! The [`Generator`] trait decouples strategies from the actual writer
//! backend (currently `codex exec`, see [`crate::io::codex`]). Tests use
//! scripted generators that return predetermined text without spawning
//! processes.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Capability tier requested from the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// Cheap default tier used for document generation.
    #[default]
    Fast,
    /// Stronger tier, used only for requirement reconciliation.
    Reasoning,
}

/// One generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system: String,
    pub user: String,
    pub tier: ModelTier,
    pub temperature: f32,
}

impl GenerationRequest {
    /// Fast tier at temperature 0.
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            tier: ModelTier::Fast,
            temperature: 0.0,
        }
    }

    pub fn with_tier(mut self, tier: ModelTier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Abstraction over text-generation backends.
///
/// Calls are blocking. An `Err` is fatal to the caller once the backend's own
/// retry budget is spent.
pub trait Generator {
    fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

impl<G: Generator + ?Sized> Generator for &G {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        (**self).generate(request)
    }
}
