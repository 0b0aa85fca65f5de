//! Attribute editing on elements and declaration editing on CSS rules.

use crate::{AttrValue, Declarations, DomTree, ElementData, NodeId, NodeType, Result, SomError};

impl DomTree {
    /// Attribute value of an element (ASCII case-insensitive name). Boolean
    /// attributes read as `""`; non-elements have no attributes.
    #[must_use]
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.as_element(id)?.attr(name)
    }

    /// Whether the element carries attribute `name`.
    #[must_use]
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.as_element(id)
            .is_some_and(|data| data.attr_value(name).is_some())
    }

    /// Set or replace an attribute. An existing attribute keeps its position
    /// (and its original spelling) in the attribute order.
    ///
    /// # Errors
    ///
    /// `InvalidOperationForElementKind` when `id` is not a `tag-open`.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<AttrValue>,
    ) -> Result<()> {
        let data = self.element_mut(id, "set an attribute")?;
        let key = existing_key(data.attrs.keys(), name).unwrap_or_else(|| name.to_string());
        let _ = data.attrs.insert(key, value.into());
        Ok(())
    }

    /// Remove an attribute, returning its old value.
    ///
    /// # Errors
    ///
    /// `InvalidOperationForElementKind` when `id` is not a `tag-open`.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<Option<AttrValue>> {
        let data = self.element_mut(id, "remove an attribute")?;
        Ok(existing_key(data.attrs.keys(), name).and_then(|key| data.attrs.remove(&key)))
    }

    /// Add `value` as a token of a list-valued attribute such as `class`.
    ///
    /// A missing or boolean attribute is set to `value`. Otherwise `value` is
    /// appended after `separator` unless it is already one of the tokens.
    ///
    /// # Errors
    ///
    /// `InvalidOperationForElementKind` when `id` is not a `tag-open`.
    pub fn update_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: &str,
        separator: &str,
    ) -> Result<()> {
        let data = self.element_mut(id, "update an attribute")?;
        let key = existing_key(data.attrs.keys(), name);
        let current = key.as_deref().and_then(|key| data.attrs.get(key));
        let updated = match current {
            Some(AttrValue::Value(old)) if !old.is_empty() => {
                let present = if separator.trim().is_empty() {
                    old.split_whitespace().any(|token| token == value)
                } else {
                    old.split(separator).any(|token| token.trim() == value)
                };
                if present {
                    return Ok(());
                }
                format!("{old}{separator}{value}")
            }
            _ => value.to_string(),
        };
        let _ = data
            .attrs
            .insert(key.unwrap_or_else(|| name.to_string()), AttrValue::Value(updated));
        Ok(())
    }

    /// Value of a declaration on a `css-rule` or `css-at-rule`.
    #[must_use]
    pub fn get_declaration(&self, id: NodeId, property: &str) -> Option<&str> {
        let declarations = match &self.get(id)?.node_type {
            NodeType::CssRule(rule) => &rule.declarations,
            NodeType::CssAtRule(at_rule) => &at_rule.declarations,
            _ => return None,
        };
        declarations.get(property).map(String::as_str)
    }

    /// Set a declaration; an existing property keeps its position.
    ///
    /// # Errors
    ///
    /// `InvalidOperationForElementKind` when `id` is not a CSS rule or
    /// at-rule.
    pub fn set_declaration(
        &mut self,
        id: NodeId,
        property: &str,
        value: impl Into<String>,
    ) -> Result<()> {
        let _ = self
            .declarations_mut(id, "set a declaration")?
            .insert(property, value.into());
        Ok(())
    }

    /// Remove a declaration, returning its old value.
    ///
    /// # Errors
    ///
    /// `InvalidOperationForElementKind` when `id` is not a CSS rule or
    /// at-rule.
    pub fn remove_declaration(&mut self, id: NodeId, property: &str) -> Result<Option<String>> {
        Ok(self
            .declarations_mut(id, "remove a declaration")?
            .remove(property))
    }

    fn element_mut(
        &mut self,
        id: NodeId,
        operation: &'static str,
    ) -> Result<&mut ElementData> {
        let kind = self.node(id)?.kind();
        self.as_element_mut(id)
            .ok_or_else(|| SomError::invalid_kind(operation, kind))
    }

    fn declarations_mut(&mut self, id: NodeId, operation: &'static str) -> Result<&mut Declarations> {
        let kind = self.node(id)?.kind();
        match self.get_mut(id).map(|node| &mut node.node_type) {
            Some(NodeType::CssRule(rule)) => Ok(&mut rule.declarations),
            Some(NodeType::CssAtRule(at_rule)) => Ok(&mut at_rule.declarations),
            _ => Err(SomError::invalid_kind(operation, kind)),
        }
    }
}

/// The stored spelling of an attribute name, matched ASCII case-insensitively.
fn existing_key<'a>(mut keys: impl Iterator<Item = &'a str>, name: &str) -> Option<String> {
    keys.find(|key| key.eq_ignore_ascii_case(name))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use crate::{AttrValue, CssRuleData, DomTree, ElementData, NodeType, SomError};

    #[test]
    fn set_keeps_position_and_spelling() {
        let mut tree = DomTree::new();
        let id = tree.alloc(NodeType::TagOpen(
            ElementData::new("a").with_attr("HREF", "/").with_attr("title", "t"),
        ));
        tree.set_attribute(id, "href", "/home").unwrap();
        let data = tree.as_element(id).unwrap();
        let keys: Vec<&str> = data.attrs.keys().collect();
        assert_eq!(keys, ["HREF", "title"]);
        assert_eq!(tree.get_attribute(id, "href"), Some("/home"));
    }

    #[test]
    fn update_appends_missing_tokens_once() {
        let mut tree = DomTree::new();
        let id = tree.alloc(NodeType::TagOpen(ElementData::new("p").with_attr("class", "a")));
        tree.update_attribute(id, "class", "b", " ").unwrap();
        tree.update_attribute(id, "class", "a", " ").unwrap();
        assert_eq!(tree.get_attribute(id, "class"), Some("a b"));

        tree.update_attribute(id, "style", "color:red", "; ").unwrap();
        tree.update_attribute(id, "style", "margin:0", "; ").unwrap();
        assert_eq!(tree.get_attribute(id, "style"), Some("color:red; margin:0"));
    }

    #[test]
    fn update_replaces_boolean_sentinel() {
        let mut tree = DomTree::new();
        let id = tree.alloc(NodeType::TagOpen(
            ElementData::new("input").with_attr("data-flags", AttrValue::Boolean),
        ));
        tree.update_attribute(id, "data-flags", "x", " ").unwrap();
        assert_eq!(tree.get_attribute(id, "data-flags"), Some("x"));
    }

    #[test]
    fn remove_returns_old_value() {
        let mut tree = DomTree::new();
        let id = tree.alloc(NodeType::TagOpen(
            ElementData::new("input").with_attr("disabled", AttrValue::Boolean),
        ));
        assert_eq!(tree.remove_attribute(id, "DISABLED"), Ok(Some(AttrValue::Boolean)));
        assert!(!tree.has_attribute(id, "disabled"));
        assert_eq!(tree.remove_attribute(id, "disabled"), Ok(None));
    }

    #[test]
    fn attributes_on_text_are_rejected() {
        let mut tree = DomTree::new();
        let id = tree.create_text("x");
        assert!(matches!(
            tree.set_attribute(id, "a", "b"),
            Err(SomError::InvalidOperationForElementKind { .. })
        ));
        assert_eq!(tree.get_attribute(id, "a"), None);
    }

    #[test]
    fn declarations_edit_in_place() {
        let mut tree = DomTree::new();
        let mut rule = CssRuleData::new(".a");
        let _ = rule.declarations.insert("color", "red".to_string());
        let _ = rule.declarations.insert("margin", "0".to_string());
        let id = tree.alloc(NodeType::CssRule(rule));
        tree.set_declaration(id, "color", "blue").unwrap();
        assert_eq!(tree.get_declaration(id, "color"), Some("blue"));
        assert_eq!(tree.remove_declaration(id, "margin"), Ok(Some("0".to_string())));
        assert_eq!(tree.get_declaration(id, "margin"), None);
    }
}
