//! HTML parser for SOM.
//!
//! # Scope
//!
//! This crate implements:
//! - **HTML scanner / tree builder** ([`HtmlParser`])
//!   - Text, comments, start and end tags with quoted, bare and boolean
//!     attributes
//!   - Self-closing and void elements, which are never descended into
//!   - End tags matched against open ancestors; unmatched ones are kept
//!   - `<style>` content parsed as CSS into the element
//!   - Special tags (default `script`) lexed into code and comment nodes
//! - **Fragment parsing** for [`som_dom::DomTree::insert_adjacent_html`]
//!
//! # Not implemented
//!
//! - Character references (text is kept byte-for-byte)
//! - Implied end tags and insertion modes
//! - DOCTYPE as a node (it is kept as text)

/// HTML scanner and tree builder.
pub mod parser;
/// Comment-aware lexer for special-tag content.
pub mod script;

pub use parser::{DEFAULT_SPECIAL_TAGS, HtmlParser};
pub use script::{ScriptToken, tokenize};
pub use som_common::ParseIssue;
