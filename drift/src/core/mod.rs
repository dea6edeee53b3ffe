//! Deterministic, pure logic for drift scoring.
//!
//! Core modules must be free of I/O side effects. Validators never fail: any
//! text, however malformed, yields a score.

pub mod atypicality;
pub mod cross_ref;
pub mod feedback;
pub mod grammar;
pub mod score;
pub mod style;
pub mod template;
pub mod types;
pub mod vocabulary;
