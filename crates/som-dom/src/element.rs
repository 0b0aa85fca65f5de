//! Element payload for `tag-open` nodes.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::ordered_map::AttributesMap;

/// Elements with no content model and no end tag. The parser never
/// synthesizes a `tag-close` for these.
pub const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Whether `name` is a void element (ASCII case-insensitive).
#[must_use]
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS
        .iter()
        .any(|void| void.eq_ignore_ascii_case(name))
}

/// The value of one attribute.
///
/// `Boolean` is the sentinel for a valueless attribute such as `disabled`; it
/// serializes as the bare name and is distinct from `Value(String::new())`,
/// which serializes as `name=""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// Present without a value.
    Boolean,
    /// Present with a (possibly empty) value.
    Value(String),
}

impl AttrValue {
    /// The value as text; boolean attributes read as the empty string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Boolean => "",
            Self::Value(value) => value,
        }
    }

    /// Whether this is the valueless sentinel.
    #[must_use]
    pub const fn is_boolean(&self) -> bool {
        matches!(self, Self::Boolean)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Value(value)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data carried by a `tag-open` node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementData {
    /// The tag name exactly as written in the source.
    pub tag_name: String,
    /// Attributes in source order.
    pub attrs: AttributesMap,
    /// Children are parsed CSS and serialize through the CSS writer.
    pub style_block: bool,
    /// Children came from the comment-aware raw-text lexer.
    pub script_block: bool,
    /// The tag was written as `<name ... />`.
    pub self_closing: bool,
    /// With `self_closing`, no whitespace came before the `/` (`<br/>`).
    pub compact_self_closing: bool,
}

impl ElementData {
    /// An element with no attributes and no flags.
    #[must_use]
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            attrs: AttributesMap::new(),
            style_block: false,
            script_block: false,
            self_closing: false,
            compact_self_closing: false,
        }
    }

    /// Builder-style attribute setter.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        let _ = self.attrs.insert(name.into(), value.into());
        self
    }

    /// Whether the tag name is in [`VOID_ELEMENTS`].
    #[must_use]
    pub fn is_void(&self) -> bool {
        is_void_element(&self.tag_name)
    }

    /// Case-insensitive tag name comparison.
    #[must_use]
    pub fn is(&self, tag_name: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag_name)
    }

    /// Attribute value by name (ASCII case-insensitive). Boolean attributes
    /// read as `""`.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attr_value(name).map(AttrValue::as_str)
    }

    /// Raw attribute value by name (ASCII case-insensitive).
    #[must_use]
    pub fn attr_value(&self, name: &str) -> Option<&AttrValue> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// Returns the element's id attribute value if present.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    /// Returns the set of class names from the class attribute.
    #[must_use]
    pub fn classes(&self) -> HashSet<&str> {
        self.attr("class")
            .map(|list| list.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    /// Whether the class attribute contains `class_name` as a whole token.
    #[must_use]
    pub fn has_class(&self, class_name: &str) -> bool {
        self.attr("class")
            .is_some_and(|list| list.split_ascii_whitespace().any(|c| c == class_name))
    }
}
