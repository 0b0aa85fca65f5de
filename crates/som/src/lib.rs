//! High-level API for SOM.
//!
//! # Scope
//!
//! This crate provides:
//! - **Parsing** - HTML documents and standalone CSS into [`DomTree`]s
//! - **Serialization** - any node back to text
//! - **Document Loading** - read a file and keep its parse issues
//!
//! Everything else (queries, mutation, CSS lookups and formatting) lives on
//! [`DomTree`] and is re-exported through [`dom`].

pub use som_css as css;
pub use som_dom as dom;
pub use som_html as html;

use std::fs;
use std::path::{Path, PathBuf};

use som_common::ParseIssue;
use som_css::CssParser;
use som_dom::{DomTree, NodeId};
use som_html::HtmlParser;

/// A parsed HTML document with the source it came from.
#[derive(Debug)]
pub struct Document {
    /// Original HTML source
    pub source: String,

    /// Parsed tree
    pub tree: DomTree,

    /// What the parser recovered from, in input order
    pub parse_issues: Vec<ParseIssue>,
}

impl Document {
    /// The whole document serialized, comments included.
    #[must_use]
    pub fn to_html(&self) -> String {
        self.tree.serialize(self.tree.root(), true)
    }
}

/// Error type for document loading.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Failed to read file
    #[error("failed to read '{}': {source}", .path.display())]
    File {
        /// The path that was read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Parse an HTML document with the default special tags.
#[must_use]
pub fn parse_html(html: &str) -> DomTree {
    HtmlParser::new().parse(html)
}

/// Parse standalone CSS into a tree rooted at a `css-root`.
#[must_use]
pub fn parse_css(css: &str) -> DomTree {
    CssParser::new().parse(css)
}

/// Serialize `id` and its subtree.
#[must_use]
pub fn serialize(tree: &DomTree, id: NodeId, include_comments: bool) -> String {
    tree.serialize(id, include_comments)
}

/// Parse `html` with `parser`, keeping the source and the parse issues.
#[must_use]
pub fn parse_document(html: &str, parser: &HtmlParser) -> Document {
    let (tree, parse_issues) = parser.parse_with_issues(html);
    Document {
        source: html.to_string(),
        tree,
        parse_issues,
    }
}

/// Read and parse an HTML file.
///
/// # Errors
///
/// Returns [`LoadError::File`] if the file cannot be read as UTF-8 text.
pub fn load_document(path: impl AsRef<Path>, parser: &HtmlParser) -> Result<Document, LoadError> {
    let path = path.as_ref();
    let html = fs::read_to_string(path).map_err(|source| LoadError::File {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_document(&html, parser))
}
