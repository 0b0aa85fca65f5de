//! Recoverable parse problems, kept alongside the tree they were found in.

use std::fmt;

use crate::warning::{Component, warn_once};

/// Something the parser had to work around, with the byte offset in the
/// input where it noticed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParseIssue {
    /// What was recovered from.
    pub message: String,
    /// Byte offset into the parsed text.
    pub offset: usize,
}

impl ParseIssue {
    /// An issue at `offset`.
    #[must_use]
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }

    /// The same issue moved by `base` bytes, for text parsed out of a
    /// larger document.
    #[must_use]
    pub fn shifted(mut self, base: usize) -> Self {
        self.offset += base;
        self
    }
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at byte {})", self.message, self.offset)
    }
}

/// Record an issue and print it through the warning channel.
pub fn report(component: Component, issues: &mut Vec<ParseIssue>, message: String, offset: usize) {
    warn_once(component, &message);
    issues.push(ParseIssue::new(message, offset));
}
