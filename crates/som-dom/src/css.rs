//! Payloads for comment and CSS nodes.

use serde::Serialize;
use strum_macros::{Display, EnumString};

use crate::ordered_map::Declarations;

/// Which syntax a comment was written in; decides how it is re-emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum CommentKind {
    /// `<!-- ... -->`
    HtmlComment,
    /// `// ...` inside a special (script-like) tag.
    JsSingleLine,
    /// `/* ... */` inside a special (script-like) tag.
    JsMultiLine,
    /// `/* ... */` inside CSS.
    Css,
}

impl CommentKind {
    /// Opening and closing delimiters for this syntax.
    #[must_use]
    pub const fn delimiters(self) -> (&'static str, &'static str) {
        match self {
            Self::HtmlComment => ("<!--", "-->"),
            Self::JsSingleLine => ("//", ""),
            Self::JsMultiLine | Self::Css => ("/*", "*/"),
        }
    }
}

/// A comment's text (without delimiters) and syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentData {
    /// Text between the delimiters, verbatim.
    pub content: String,
    /// Syntax the comment came from.
    pub kind: CommentKind,
}

impl CommentData {
    /// A comment of the given kind.
    #[must_use]
    pub fn new(content: impl Into<String>, kind: CommentKind) -> Self {
        Self {
            content: content.into(),
            kind,
        }
    }

    /// The comment with its delimiters restored.
    #[must_use]
    pub fn to_source(&self) -> String {
        let (open, close) = self.kind.delimiters();
        format!("{open}{}{close}", self.content)
    }
}

/// One CSS rule. Nested rules, at-rules and comments are the node's children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CssRuleData {
    /// Trimmed selector text, possibly a comma-separated list.
    pub selector: String,
    /// Property to value, last write wins.
    pub declarations: Declarations,
}

impl CssRuleData {
    /// A rule with no declarations.
    #[must_use]
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            declarations: Declarations::new(),
        }
    }

    /// The selector list split at top-level commas, each part trimmed.
    #[must_use]
    pub fn selector_parts(&self) -> Vec<&str> {
        split_top_level(&self.selector, b',')
    }
}

/// One CSS at-rule such as `@media screen { ... }` or `@import url(a.css);`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CssAtRuleData {
    /// Name without the `@`.
    pub name: String,
    /// Trimmed text between the name and the `;` or `{`.
    pub params: String,
    /// Declarations written directly in the block (`@font-face`, `@page`).
    pub declarations: Declarations,
    /// `false` for statement forms terminated by `;`.
    pub has_block: bool,
}

impl CssAtRuleData {
    /// A block at-rule with no content.
    #[must_use]
    pub fn new(name: impl Into<String>, params: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: params.into(),
            declarations: Declarations::new(),
            has_block: true,
        }
    }

    /// Whether this at-rule name always takes the statement form.
    #[must_use]
    pub fn is_statement_name(name: &str) -> bool {
        ["import", "charset", "namespace"]
            .iter()
            .any(|n| n.eq_ignore_ascii_case(name))
    }
}

/// Split `text` at `separator` bytes that are outside parentheses, brackets
/// and quoted strings. Parts are trimmed; empty parts are dropped.
#[must_use]
pub fn split_top_level(text: &str, separator: u8) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 1;
            } else if b == q {
                quote = None;
            }
        } else {
            match b {
                b'"' | b'\'' => quote = Some(b),
                b'(' | b'[' => depth += 1,
                b')' | b']' => depth = depth.saturating_sub(1),
                _ if b == separator && depth == 0 => {
                    parts.push(&text[start..i]);
                    start = i + 1;
                }
                _ => {}
            }
        }
        i += 1;
    }
    parts.push(&text[start..]);
    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_kinds_restore_their_delimiters() {
        assert_eq!(
            CommentData::new(" hi ", CommentKind::HtmlComment).to_source(),
            "<!-- hi -->"
        );
        assert_eq!(
            CommentData::new(" note", CommentKind::JsSingleLine).to_source(),
            "// note"
        );
        assert_eq!(CommentData::new("x", CommentKind::Css).to_source(), "/*x*/");
    }

    #[test]
    fn comment_kind_names_are_kebab_case() {
        assert_eq!(CommentKind::JsMultiLine.to_string(), "js-multi-line");
        assert_eq!("html-comment".parse::<CommentKind>(), Ok(CommentKind::HtmlComment));
    }

    #[test]
    fn split_ignores_nested_commas() {
        let parts = split_top_level("a:not(.b, .c), d[x=\"1,2\"] , e", b',');
        assert_eq!(parts, ["a:not(.b, .c)", "d[x=\"1,2\"]", "e"]);
    }
}
