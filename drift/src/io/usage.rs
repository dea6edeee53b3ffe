//! Per-tier generation call accounting.

use std::cell::Cell;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::io::generator::{GenerationRequest, Generator, ModelTier};

/// Snapshot of generation calls made through a [`UsageMeter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub fast_calls: u32,
    pub reasoning_calls: u32,
    /// Calls that returned an error (counted in their tier as well).
    pub failed_calls: u32,
}

impl Usage {
    pub fn total_calls(&self) -> u32 {
        self.fast_calls + self.reasoning_calls
    }

    /// Calls made since `earlier` was taken.
    pub fn since(&self, earlier: Usage) -> Usage {
        Usage {
            fast_calls: self.fast_calls.saturating_sub(earlier.fast_calls),
            reasoning_calls: self.reasoning_calls.saturating_sub(earlier.reasoning_calls),
            failed_calls: self.failed_calls.saturating_sub(earlier.failed_calls),
        }
    }
}

/// Generator decorator that counts calls per [`ModelTier`].
///
/// Owned by whoever drives the run; there is no process-wide counter.
pub struct UsageMeter<G> {
    inner: G,
    usage: Cell<Usage>,
}

impl<G: Generator> UsageMeter<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            usage: Cell::new(Usage::default()),
        }
    }

    pub fn usage(&self) -> Usage {
        self.usage.get()
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }
}

impl<G: Generator> Generator for UsageMeter<G> {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let result = self.inner.generate(request);
        let mut usage = self.usage.get();
        match request.tier {
            ModelTier::Fast => usage.fast_calls += 1,
            ModelTier::Reasoning => usage.reasoning_calls += 1,
        }
        if result.is_err() {
            usage.failed_calls += 1;
        }
        self.usage.set(usage);
        result
    }
}
