//! Common utilities for the SOM crates.
//!
//! This crate provides shared infrastructure used by the parsers and the tree:
//! - **Warning System** - colored, deduplicated terminal output for recovered
//!   parse problems and unsupported syntax
//! - **Parse issues** - the same problems as data, returned to the caller

/// Recoverable parse problems as values.
pub mod issue;
/// Deduplicated colored warnings on stderr.
pub mod warning;

pub use issue::{ParseIssue, report};
pub use warning::{Component, clear_warnings, set_quiet, warn_once};
