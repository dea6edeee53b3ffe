//! Stable exit codes for the `drift` and `experiment` binaries.

/// Command succeeded; for `drift score`, the document conforms.
pub const OK: i32 = 0;
/// Invalid input, configuration or any other error.
pub const INVALID: i32 = 1;
/// `drift score` measured a non-zero drift score.
pub const DRIFT: i32 = 2;
