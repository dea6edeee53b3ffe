//! Side-effecting boundaries: generation, configuration and input files.

pub mod codex;
pub mod config;
pub mod generator;
pub mod inputs;
pub mod process;
pub mod prompt;
pub mod retry;
pub mod usage;
