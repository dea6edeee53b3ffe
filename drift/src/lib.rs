//! Drift measurement for automatically evolved documents.
//!
//! A base document is modified request by request by a text generator, and
//! every version is scored against fixed structural invariants. The crate is
//! split by side effects:
//!
//! - **[`core`]**: Pure, deterministic validators, the drift scorer and the
//!   violation report. No I/O.
//! - **[`io`]**: Generation backends, retry and usage accounting, prompts,
//!   configuration and input loading.
//!
//! [`strategy`] implements the five document-evolution strategies on top of
//! both, and [`experiment`] drives one strategy across a request list.

pub mod core;
pub mod exit_codes;
pub mod experiment;
pub mod io;
pub mod logging;
pub mod strategy;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
