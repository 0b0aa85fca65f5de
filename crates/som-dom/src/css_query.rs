//! Lookups over parsed CSS: rules by selector, custom properties, at-rules.
//!
//! Each lookup starts from a node and searches the CSS that node stands for:
//! a `css-root` or rule searches its own subtree, a style element its
//! contents, and the HTML root or any other element every style block below
//! it.

use serde::Serialize;

use crate::selector::is_ident_byte;
use crate::{DomTree, NodeId, NodeKind, NodeType};

/// Options for [`DomTree::css_find_rules`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CssRuleQuery {
    /// Also match rules whose selector merely contains the query as one of
    /// its compound parts (`.btn` finds `.btn:hover` and `nav .btn`, but not
    /// `.btn-primary`). On by default.
    pub include_compound: bool,
    /// Only look at top-level rules, not at rules nested in other rules or
    /// in at-rules. Off by default.
    pub shallow: bool,
}

impl Default for CssRuleQuery {
    fn default() -> Self {
        Self {
            include_compound: true,
            shallow: false,
        }
    }
}

/// A custom property declaration found by [`DomTree::css_find_variables`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CssVariable {
    /// Property name including the leading `--`.
    pub name: String,
    /// Declared value.
    pub value: String,
    /// The rule that declares it.
    pub rule: NodeId,
    /// That rule's selector.
    pub selector: String,
}

impl DomTree {
    /// Rules whose selector matches `selector`.
    ///
    /// A rule matches exactly when one of its comma-separated selectors
    /// equals the query (after trimming). With
    /// [`CssRuleQuery::include_compound`] it also matches when one of them
    /// contains the query: as a substring for `.`, `#` and `[` queries, as a
    /// whole word for type queries.
    #[must_use]
    pub fn css_find_rules(&self, id: NodeId, selector: &str, query: CssRuleQuery) -> Vec<NodeId> {
        let wanted = selector.trim();
        if wanted.is_empty() {
            return Vec::new();
        }
        let candidates = if query.shallow {
            self.css_sources(id)
                .into_iter()
                .filter(|&node| self.kind(node) == Some(NodeKind::CssRule))
                .collect()
        } else {
            self.css_nodes_of_kind(id, NodeKind::CssRule)
        };
        candidates
            .into_iter()
            .filter(|&rule| {
                let Some(NodeType::CssRule(data)) = self.get(rule).map(|n| &n.node_type) else {
                    return false;
                };
                data.selector_parts().into_iter().any(|part| {
                    part == wanted || (query.include_compound && contains_compound(part, wanted))
                })
            })
            .collect()
    }

    /// Value of the custom property `name` (with or without the leading `--`).
    ///
    /// Looks in `scope` and the rules enclosing it first, then in `:root`
    /// rules, then in any rule. Within the last two steps the later
    /// declaration wins.
    #[must_use]
    pub fn css_find_variable(&self, id: NodeId, name: &str, scope: Option<NodeId>) -> Option<String> {
        let name = custom_property_name(name);

        if let Some(scope) = scope {
            let scoped = std::iter::once(scope)
                .chain(self.ancestors(scope))
                .find_map(|rule| self.get_declaration(rule, &name));
            if let Some(value) = scoped {
                return Some(value.to_string());
            }
        }

        let variables = self.css_find_variables(id, true);
        let named = || variables.iter().filter(|v| v.name == name);
        named()
            .rev()
            .find(|v| is_root_selector(&v.selector))
            .or_else(|| named().next_back())
            .map(|v| v.value.clone())
    }

    /// Every custom property declared in a rule, in document order.
    /// `:root` rules are skipped unless `include_root` is set.
    #[must_use]
    pub fn css_find_variables(&self, id: NodeId, include_root: bool) -> Vec<CssVariable> {
        let mut variables = Vec::new();
        for rule in self.css_nodes_of_kind(id, NodeKind::CssRule) {
            let Some(NodeType::CssRule(data)) = self.get(rule).map(|n| &n.node_type) else {
                continue;
            };
            if !include_root && is_root_selector(&data.selector) {
                continue;
            }
            for (property, value) in data.declarations.iter() {
                if property.starts_with("--") {
                    variables.push(CssVariable {
                        name: property.to_string(),
                        value: value.clone(),
                        rule,
                        selector: data.selector.clone(),
                    });
                }
            }
        }
        variables
    }

    /// At-rules, optionally only those named `name` (ASCII case-insensitive,
    /// with or without the `@`).
    #[must_use]
    pub fn css_find_at_rules(&self, id: NodeId, name: Option<&str>) -> Vec<NodeId> {
        let name = name.map(|n| n.trim_start_matches('@'));
        self.css_nodes_of_kind(id, NodeKind::CssAtRule)
            .into_iter()
            .filter(|&node| match (name, self.get(node).map(|n| &n.node_type)) {
                (None, _) => true,
                (Some(wanted), Some(NodeType::CssAtRule(data))) => data.name.eq_ignore_ascii_case(wanted),
                _ => false,
            })
            .collect()
    }

    fn css_nodes_of_kind(&self, id: NodeId, kind: NodeKind) -> Vec<NodeId> {
        self.css_sources(id)
            .into_iter()
            .flat_map(|source| self.traverse(source))
            .filter(|&node| self.kind(node) == Some(kind))
            .collect()
    }
}

fn custom_property_name(name: &str) -> String {
    if name.starts_with("--") {
        name.to_string()
    } else {
        format!("--{name}")
    }
}

fn is_root_selector(selector: &str) -> bool {
    crate::css::split_top_level(selector, b',')
        .into_iter()
        .any(|part| part == ":root")
}

/// Whether `selector` contains `needle`. `.`, `#` and `[` queries are plain
/// substring lookups, so `.btn` finds `.btn-primary`. A type query must stand
/// alone as a word, so `p` finds `div > p` but not `optgroup` or `div.p`.
fn contains_compound(selector: &str, needle: &str) -> bool {
    let starts_with_ident = needle.as_bytes().first().is_some_and(|&b| is_ident_byte(b));
    if !starts_with_ident {
        return selector.contains(needle);
    }
    let bytes = selector.as_bytes();
    selector.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let after_ok = bytes.get(end).is_none_or(|&b| !is_ident_byte(b));
        let before_ok = start
            .checked_sub(1)
            .and_then(|i| bytes.get(i))
            .is_none_or(|&b| !is_ident_byte(b) && !matches!(b, b'.' | b'#' | b':' | b'[' | b'-'));
        after_ok && before_ok
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CssAtRuleData, CssRuleData};

    fn rule(tree: &mut DomTree, parent: NodeId, selector: &str, decls: &[(&str, &str)]) -> NodeId {
        let mut data = CssRuleData::new(selector);
        for (property, value) in decls {
            let _ = data.declarations.insert(*property, (*value).to_string());
        }
        let id = tree.alloc(NodeType::CssRule(data));
        tree.push_child(parent, id);
        id
    }

    /// `:root { --gap: 4px; --fg: black }`
    /// `.btn, .link { --fg: blue; .icon { color: var(--fg) } }`
    /// `@media print { .btn:hover { --fg: gray } }`
    /// `.btn-primary { }`
    fn sheet() -> (DomTree, Vec<NodeId>) {
        let mut tree = DomTree::with_root(NodeType::CssRoot);
        let root = tree.root();
        let vars = rule(&mut tree, root, ":root", &[("--gap", "4px"), ("--fg", "black")]);
        let btn = rule(&mut tree, root, ".btn, .link", &[("--fg", "blue")]);
        let icon = rule(&mut tree, btn, ".icon", &[("color", "var(--fg)")]);
        let media = tree.alloc(NodeType::CssAtRule(CssAtRuleData::new("media", "print")));
        tree.push_child(root, media);
        let hover = rule(&mut tree, media, ".btn:hover", &[("--fg", "gray")]);
        let primary = rule(&mut tree, root, ".btn-primary", &[]);
        (tree, vec![vars, btn, icon, media, hover, primary])
    }

    #[test]
    fn exact_and_compound_rule_matches() {
        let (tree, ids) = sheet();
        let exact = CssRuleQuery {
            include_compound: false,
            shallow: false,
        };
        assert_eq!(tree.css_find_rules(tree.root(), ".btn", exact), vec![ids[1]]);
        assert_eq!(
            tree.css_find_rules(tree.root(), ".btn", CssRuleQuery::default()),
            vec![ids[1], ids[4], ids[5]]
        );
        let shallow = CssRuleQuery {
            include_compound: true,
            shallow: true,
        };
        assert_eq!(tree.css_find_rules(tree.root(), ".btn", shallow), vec![ids[1], ids[5]]);
    }

    #[test]
    fn compound_boundaries() {
        assert!(contains_compound("nav .btn", ".btn"));
        assert!(contains_compound("a.btn:hover", ".btn"));
        assert!(contains_compound(".btn-primary", ".btn"));
        assert!(contains_compound("[data-x=\"1\"]", "[data-x"));
        assert!(contains_compound("div > p", "p"));
        assert!(!contains_compound("optgroup", "p"));
        assert!(!contains_compound("div.p", "p"));
        assert!(!contains_compound("span", "a"));
    }

    #[test]
    fn variable_lookup_order() {
        let (tree, ids) = sheet();
        assert_eq!(tree.css_find_variable(tree.root(), "--fg", Some(ids[2])).as_deref(), Some("blue"));
        assert_eq!(tree.css_find_variable(tree.root(), "fg", None).as_deref(), Some("black"));
        assert_eq!(tree.css_find_variable(tree.root(), "gap", None).as_deref(), Some("4px"));
        assert_eq!(tree.css_find_variable(tree.root(), "--missing", None), None);
    }

    #[test]
    fn variables_can_skip_root() {
        let (tree, _) = sheet();
        assert_eq!(tree.css_find_variables(tree.root(), true).len(), 4);
        let without_root = tree.css_find_variables(tree.root(), false);
        assert_eq!(without_root.len(), 2);
        assert_eq!(without_root[0].selector, ".btn, .link");
    }

    #[test]
    fn at_rules_by_name() {
        let (tree, ids) = sheet();
        assert_eq!(tree.css_find_at_rules(tree.root(), None), vec![ids[3]]);
        assert_eq!(tree.css_find_at_rules(tree.root(), Some("@MEDIA")), vec![ids[3]]);
        assert!(tree.css_find_at_rules(tree.root(), Some("supports")).is_empty());
    }
}
