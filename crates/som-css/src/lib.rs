//! CSS parsing for SOM.
//!
//! [`CssParser`] turns a stylesheet fragment into `css-rule`, `css-at-rule`
//! and `comment` nodes, either in a fresh tree rooted at a `css-root` or
//! appended under any node of an existing tree (which is how the HTML parser
//! fills `<style>` elements).
//!
//! The parser never fails. Anything it cannot make sense of is skipped and
//! reported as a [`ParseIssue`].

/// Recursive-descent scanner and parser.
pub mod parser;

pub use parser::CssParser;
pub use som_common::ParseIssue;
