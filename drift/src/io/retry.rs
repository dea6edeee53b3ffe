//! Transport-level retry with exponential backoff.

use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};

use crate::io::generator::{GenerationRequest, Generator};

/// Backoff schedule for a generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay after the first failure; doubles after each further failure.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after failed attempt number `attempt` (1-indexed).
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial_backoff.saturating_mul(1u32 << exponent)
    }
}

type Sleeper = Box<dyn Fn(Duration)>;

/// Generator wrapper that retries failed calls per [`RetryPolicy`].
///
/// Once every attempt has failed, the last error is returned with the attempt
/// count attached as context.
pub struct RetryingGenerator<G> {
    inner: G,
    policy: RetryPolicy,
    sleep: Sleeper,
}

impl<G: Generator> RetryingGenerator<G> {
    pub fn new(inner: G, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            sleep: Box::new(thread::sleep),
        }
    }

    /// Replace the blocking sleep (tests record delays instead of waiting).
    pub fn with_sleeper(mut self, sleep: impl Fn(Duration) + 'static) -> Self {
        self.sleep = Box::new(sleep);
        self
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }
}

impl<G: Generator> Generator for RetryingGenerator<G> {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.inner.generate(request) {
                Ok(text) => {
                    if attempt > 1 {
                        debug!(attempt, tier = ?request.tier, "generation recovered");
                    }
                    return Ok(text);
                }
                Err(err) if attempt < max_attempts => {
                    let delay = self.policy.backoff_after(attempt);
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        err = %format!("{err:#}"),
                        "generation failed, backing off"
                    );
                    (self.sleep)(delay);
                    attempt += 1;
                }
                Err(err) => {
                    return Err(
                        err.context(format!("generation failed after {max_attempts} attempts"))
                    );
                }
            }
        }
    }
}
