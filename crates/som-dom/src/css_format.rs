//! CSS-to-text output.
//!
//! The default layout is one declaration per line inside braces:
//!
//! ```text
//! .card {
//!   background: white;
//!   padding: 1rem;
//! }
//! ```
//!
//! [`CssFormat`] switches individual parts of that layout on and off.

use crate::css::split_top_level;
use crate::{Declarations, DomTree, NodeId, NodeKind, NodeType};

/// Options for [`DomTree::css_to_string`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssFormat {
    /// Emit CSS comments. Off by default.
    pub include_comments: bool,
    /// Emit rules and at-rules nested inside other rules. On by default.
    pub include_nested_rules: bool,
    /// Write nested rules after their parent as separate rules with combined
    /// selectors (`&` is replaced by the parent selector, otherwise the two
    /// are joined as descendants). Off by default.
    pub flatten_nested: bool,
    /// Wrap declarations in `{` `}`. On by default.
    pub include_braces: bool,
    /// Write the selector before the block. On by default.
    pub include_selector: bool,
    /// Merge the declarations of every emitted rule into one block (last
    /// write wins) under the comma-joined selector list. Off by default.
    pub combine_declarations: bool,
    /// Join everything with single spaces instead of newlines and
    /// indentation. Off by default.
    pub single_line: bool,
    /// One level of indentation. Two spaces by default.
    pub indent: String,
}

impl Default for CssFormat {
    fn default() -> Self {
        Self {
            include_comments: false,
            include_nested_rules: true,
            flatten_nested: false,
            include_braces: true,
            include_selector: true,
            combine_declarations: false,
            single_line: false,
            indent: "  ".to_string(),
        }
    }
}

impl CssFormat {
    /// Set [`CssFormat::include_comments`].
    #[must_use]
    pub const fn include_comments(mut self, value: bool) -> Self {
        self.include_comments = value;
        self
    }

    /// Set [`CssFormat::include_nested_rules`].
    #[must_use]
    pub const fn include_nested_rules(mut self, value: bool) -> Self {
        self.include_nested_rules = value;
        self
    }

    /// Set [`CssFormat::flatten_nested`].
    #[must_use]
    pub const fn flatten_nested(mut self, value: bool) -> Self {
        self.flatten_nested = value;
        self
    }

    /// Set [`CssFormat::include_braces`].
    #[must_use]
    pub const fn include_braces(mut self, value: bool) -> Self {
        self.include_braces = value;
        self
    }

    /// Set [`CssFormat::include_selector`].
    #[must_use]
    pub const fn include_selector(mut self, value: bool) -> Self {
        self.include_selector = value;
        self
    }

    /// Set [`CssFormat::combine_declarations`].
    #[must_use]
    pub const fn combine_declarations(mut self, value: bool) -> Self {
        self.combine_declarations = value;
        self
    }

    /// Set [`CssFormat::single_line`].
    #[must_use]
    pub const fn single_line(mut self, value: bool) -> Self {
        self.single_line = value;
        self
    }

    /// Set [`CssFormat::indent`].
    #[must_use]
    pub fn indent(mut self, value: impl Into<String>) -> Self {
        self.indent = value.into();
        self
    }
}

/// Join a parent and a nested selector list the way CSS nesting does.
#[must_use]
pub fn combine_selectors(parent: &str, nested: &str) -> String {
    let parents = split_top_level(parent, b',');
    let nested_parts = split_top_level(nested, b',');
    let mut combined = Vec::with_capacity(parents.len() * nested_parts.len());
    for outer in &parents {
        for inner in &nested_parts {
            if inner.contains('&') {
                combined.push(inner.replace('&', outer));
            } else {
                combined.push(format!("{outer} {inner}"));
            }
        }
    }
    combined.join(", ")
}

struct CssWriter<'a> {
    tree: &'a DomTree,
    format: &'a CssFormat,
    lines: Vec<String>,
}

impl CssWriter<'_> {
    fn line(&mut self, depth: usize, text: &str) {
        if self.format.single_line {
            self.lines.push(text.to_string());
        } else {
            self.lines.push(format!("{}{text}", self.format.indent.repeat(depth)));
        }
    }

    fn finish(self) -> String {
        self.lines.join(if self.format.single_line { " " } else { "\n" })
    }

    fn node(&mut self, id: NodeId, depth: usize, context: Option<&str>) {
        let tree = self.tree;
        let Some(node) = tree.get(id) else { return };
        match &node.node_type {
            NodeType::CssRule(rule) => {
                let selector = match context {
                    Some(parent) if self.format.flatten_nested => {
                        combine_selectors(parent, &rule.selector)
                    }
                    _ => rule.selector.clone(),
                };
                self.rule(id, depth, &selector, &rule.declarations);
            }
            NodeType::CssAtRule(at_rule) => {
                let head = if at_rule.params.is_empty() {
                    format!("@{}", at_rule.name)
                } else {
                    format!("@{} {}", at_rule.name, at_rule.params)
                };
                if !at_rule.has_block {
                    self.line(depth, &format!("{head};"));
                    return;
                }
                self.line(depth, &format!("{head} {{"));
                self.declarations(depth + 1, &at_rule.declarations);
                for &child in tree.children(id) {
                    self.node(child, depth + 1, context);
                }
                self.line(depth, "}");
            }
            NodeType::Comment(comment) => {
                if self.format.include_comments {
                    self.line(depth, &comment.to_source());
                }
            }
            _ => {}
        }
    }

    fn rule(&mut self, id: NodeId, depth: usize, selector: &str, declarations: &Declarations) {
        let tree = self.tree;
        let inner = self.open(depth, selector);
        self.declarations(inner, declarations);

        let mut deferred = Vec::new();
        for &child in tree.children(id) {
            let nested = matches!(
                tree.get(child).map(|n| &n.node_type),
                Some(NodeType::CssRule(_) | NodeType::CssAtRule(_))
            );
            if nested && !self.format.include_nested_rules {
                continue;
            }
            if nested && self.format.flatten_nested {
                deferred.push(child);
            } else {
                self.node(child, inner, Some(selector));
            }
        }
        self.close(depth);

        for child in deferred {
            self.node(child, depth, Some(selector));
        }
    }

    /// Writes the selector and brace as configured; returns the depth for
    /// the block's contents.
    fn open(&mut self, depth: usize, selector: &str) -> usize {
        match (self.format.include_selector, self.format.include_braces) {
            (true, true) => self.line(depth, &format!("{selector} {{")),
            (true, false) => self.line(depth, selector),
            (false, true) => self.line(depth, "{"),
            (false, false) => return depth,
        }
        if self.format.include_braces { depth + 1 } else { depth }
    }

    fn close(&mut self, depth: usize) {
        if self.format.include_braces {
            self.line(depth, "}");
        }
    }

    fn declarations(&mut self, depth: usize, declarations: &Declarations) {
        for (property, value) in declarations.iter() {
            self.line(depth, &format!("{property}: {value};"));
        }
    }

    /// Every rule reachable from `id` (nested ones when enabled), in order.
    fn collect_rules(&self, id: NodeId, found: &mut Vec<NodeId>) {
        match self.tree.kind(id) {
            Some(NodeKind::CssRule) => {
                found.push(id);
                if self.format.include_nested_rules {
                    for &child in self.tree.children(id) {
                        self.collect_rules(child, found);
                    }
                }
            }
            Some(NodeKind::CssAtRule) => {
                for &child in self.tree.children(id) {
                    self.collect_rules(child, found);
                }
            }
            _ => {}
        }
    }

    fn combined(&mut self, sources: &[NodeId]) {
        let tree = self.tree;
        let mut rules = Vec::new();
        for &id in sources {
            self.collect_rules(id, &mut rules);
        }
        let mut selectors: Vec<&str> = Vec::new();
        let mut merged = Declarations::new();
        for &id in &rules {
            if let Some(NodeType::CssRule(rule)) = tree.get(id).map(|n| &n.node_type) {
                if !selectors.contains(&rule.selector.as_str()) {
                    selectors.push(&rule.selector);
                }
                merged.extend(
                    rule.declarations
                        .iter()
                        .map(|(property, value)| (property.to_string(), value.clone())),
                );
            }
        }
        if rules.is_empty() {
            return;
        }
        let selector = selectors.join(", ");
        let inner = self.open(0, &selector);
        self.declarations(inner, &merged);
        self.close(0);
    }
}

impl DomTree {
    /// CSS text for `id`.
    ///
    /// A `css-root` or style element writes its rules; a rule, at-rule or
    /// comment writes itself; the HTML root or any other element writes
    /// the contents of every style block below it.
    #[must_use]
    pub fn css_to_string(&self, id: NodeId, format: &CssFormat) -> String {
        self.css_nodes_to_string(&[id], format)
    }

    /// CSS text for several nodes, each expanded as in
    /// [`DomTree::css_to_string`].
    #[must_use]
    pub fn css_nodes_to_string(&self, nodes: &[NodeId], format: &CssFormat) -> String {
        let sources: Vec<NodeId> = nodes.iter().flat_map(|&id| self.css_sources(id)).collect();
        let mut writer = CssWriter {
            tree: self,
            format,
            lines: Vec::new(),
        };
        if format.combine_declarations {
            writer.combined(&sources);
        } else {
            for id in sources {
                writer.node(id, 0, None);
            }
        }
        writer.finish()
    }

    /// The CSS nodes `id` stands for when written as text.
    pub(crate) fn css_sources(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.get(id) else {
            return Vec::new();
        };
        match &node.node_type {
            NodeType::CssRoot => node.children.clone(),
            NodeType::CssRule(_) | NodeType::CssAtRule(_) | NodeType::Comment(_) => vec![id],
            NodeType::TagOpen(data) if data.style_block => node.children.clone(),
            NodeType::Root | NodeType::TagOpen(_) => self
                .style_blocks(id)
                .into_iter()
                .flat_map(|style| self.children(style).to_vec())
                .collect(),
            NodeType::TagClose(_) | NodeType::Text(_) => Vec::new(),
        }
    }

    /// Style elements below `id` in document order.
    pub(crate) fn style_blocks(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&node| self.as_element(node).is_some_and(|data| data.style_block))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CommentData, CommentKind, CssAtRuleData, CssRuleData};

    fn rule(tree: &mut DomTree, parent: NodeId, selector: &str, decls: &[(&str, &str)]) -> NodeId {
        let mut data = CssRuleData::new(selector);
        for (property, value) in decls {
            let _ = data.declarations.insert(*property, (*value).to_string());
        }
        let id = tree.alloc(NodeType::CssRule(data));
        tree.push_child(parent, id);
        id
    }

    /// `.card { color: red; &:hover { color: blue; } .title { margin: 0; } }`
    /// followed by `@import url(a.css);`.
    fn nested() -> DomTree {
        let mut tree = DomTree::with_root(NodeType::CssRoot);
        let root = tree.root();
        let card = rule(&mut tree, root, ".card", &[("color", "red")]);
        let _ = rule(&mut tree, card, "&:hover", &[("color", "blue")]);
        let _ = rule(&mut tree, card, ".title", &[("margin", "0")]);
        let mut import = CssAtRuleData::new("import", "url(a.css)");
        import.has_block = false;
        let import = tree.alloc(NodeType::CssAtRule(import));
        tree.push_child(root, import);
        tree
    }

    #[test]
    fn default_layout_nests_with_indentation() {
        let tree = nested();
        let expected = ".card {\n  color: red;\n  &:hover {\n    color: blue;\n  }\n  .title {\n    margin: 0;\n  }\n}\n@import url(a.css);";
        assert_eq!(tree.css_to_string(tree.root(), &CssFormat::default()), expected);
    }

    #[test]
    fn flatten_hoists_nested_rules() {
        let tree = nested();
        let format = CssFormat::default().flatten_nested(true).single_line(true);
        assert_eq!(
            tree.css_to_string(tree.root(), &format),
            ".card { color: red; } .card:hover { color: blue; } .card .title { margin: 0; } @import url(a.css);"
        );
    }

    #[test]
    fn declarations_only() {
        let tree = nested();
        let format = CssFormat::default()
            .include_selector(false)
            .include_braces(false)
            .include_nested_rules(false)
            .single_line(true);
        let card = tree.children(tree.root())[0];
        assert_eq!(tree.css_to_string(card, &format), "color: red;");
    }

    #[test]
    fn combine_merges_last_write_wins() {
        let tree = nested();
        let format = CssFormat::default().combine_declarations(true).single_line(true);
        assert_eq!(
            tree.css_to_string(tree.root(), &format),
            ".card, &:hover, .title { color: blue; margin: 0; }"
        );
    }

    #[test]
    fn comments_only_when_asked() {
        let mut tree = DomTree::with_root(NodeType::CssRoot);
        let comment = tree.alloc(NodeType::Comment(CommentData::new(" note ", CommentKind::Css)));
        tree.push_child(NodeId::ROOT, comment);
        let _ = rule(&mut tree, NodeId::ROOT, "a", &[]);
        assert_eq!(tree.css_to_string(NodeId::ROOT, &CssFormat::default()), "a {\n}");
        assert_eq!(
            tree.css_to_string(NodeId::ROOT, &CssFormat::default().include_comments(true)),
            "/* note */\na {\n}"
        );
    }

    #[test]
    fn ampersand_and_lists_combine() {
        assert_eq!(combine_selectors("a, b", "&.x"), "a.x, b.x");
        assert_eq!(combine_selectors(".p", "span, em"), ".p span, .p em");
    }
}
