//! Errors for misuse of the tree API.
//!
//! Malformed markup never produces one of these; the parsers recover on their
//! own. These are raised when a caller asks for something the tree structure
//! cannot support.

use thiserror::Error;

use crate::{NodeId, NodeKind};

/// Result alias for fallible tree operations.
pub type Result<T> = std::result::Result<T, SomError>;

/// A contract violation reported by a tree operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SomError {
    /// The operation needs the node to be attached, but it has no parent.
    #[error("node {0} has no parent")]
    NoParent(NodeId),

    /// The node claims a parent that does not list it as a child, or the id
    /// is not in the arena at all.
    #[error("node {0} was not found in its parent's children")]
    NodeNotFound(NodeId),

    /// `insert_adjacent_html` got an unknown position keyword.
    #[error(
        "invalid position {0:?}; expected one of beforebegin, afterbegin, beforeend, afterend"
    )]
    InvalidPosition(String),

    /// The operation is not valid for this kind of node (for example
    /// inserting content inside a void element).
    #[error("cannot {operation} on a {kind} node")]
    InvalidOperationForElementKind {
        /// What was attempted.
        operation: &'static str,
        /// Kind of the offending node, or `void element` for void tags.
        kind: String,
    },

    /// No parser is attached to the tree, so markup cannot be parsed into it.
    #[error("no parser is attached to this tree")]
    ParserUnavailable,

    /// Moving the node would make it its own ancestor.
    #[error("node {0} cannot be inserted into its own subtree")]
    CyclicInsertion(NodeId),
}

impl SomError {
    pub(crate) fn invalid_kind(operation: &'static str, kind: NodeKind) -> Self {
        Self::InvalidOperationForElementKind {
            operation,
            kind: kind.to_string(),
        }
    }

    pub(crate) fn void_element(operation: &'static str, tag_name: &str) -> Self {
        Self::InvalidOperationForElementKind {
            operation,
            kind: format!("void element <{tag_name}>"),
        }
    }
}
