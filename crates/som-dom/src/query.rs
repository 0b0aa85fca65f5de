//! Lookups by tag name, attribute and node kind.
//!
//! All of these walk in document (pre-order) order. The `find_all_*` helpers
//! look strictly below the given node; [`DomTree::get_nodes_by_type`] covers
//! the whole tree, root included.

use crate::{DomTree, NodeId, NodeKind};

impl DomTree {
    /// Elements below `id` whose tag name equals `tag_name`, ignoring ASCII case.
    #[must_use]
    pub fn find_all_by_tag(&self, id: NodeId, tag_name: &str) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&node| self.as_element(node).is_some_and(|data| data.is(tag_name)))
            .collect()
    }

    /// Elements below `id` carrying attribute `name`, and when `value` is
    /// given, with exactly that value. Boolean attributes have the value `""`.
    #[must_use]
    pub fn find_all_by_attr(&self, id: NodeId, name: &str, value: Option<&str>) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&node| {
                self.as_element(node)
                    .and_then(|data| data.attr(name))
                    .is_some_and(|found| value.is_none_or(|wanted| wanted == found))
            })
            .collect()
    }

    /// Nodes below `id` of the given kind.
    #[must_use]
    pub fn find_all_by_type(&self, id: NodeId, kind: NodeKind) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&node| self.kind(node) == Some(kind))
            .collect()
    }

    /// Every attached node of the given kind, starting from the tree's root
    /// (which is included when it matches).
    #[must_use]
    pub fn get_nodes_by_type(&self, kind: NodeKind) -> Vec<NodeId> {
        let root = self.root();
        std::iter::once(root)
            .chain(self.descendants(root))
            .filter(|&node| self.kind(node) == Some(kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::{AttrValue, DomTree, ElementData, NodeId, NodeKind, NodeType};

    fn sample() -> DomTree {
        let mut tree = DomTree::new();
        let ul = tree.alloc(NodeType::TagOpen(ElementData::new("ul").with_attr("id", "list")));
        let li = tree.alloc(NodeType::TagOpen(
            ElementData::new("LI").with_attr("hidden", AttrValue::Boolean),
        ));
        let li_close = tree.alloc(NodeType::TagClose("LI".into()));
        let text = tree.alloc(NodeType::Text("\n".into()));
        let ul_close = tree.alloc(NodeType::TagClose("ul".into()));
        tree.push_child(NodeId::ROOT, ul);
        tree.push_child(ul, li);
        tree.push_child(ul, li_close);
        tree.push_child(ul, text);
        tree.push_child(NodeId::ROOT, ul_close);
        tree
    }

    #[test]
    fn tag_lookup_ignores_case() {
        let tree = sample();
        assert_eq!(tree.find_all_by_tag(NodeId::ROOT, "li").len(), 1);
        assert_eq!(tree.find_all_by_tag(NodeId::ROOT, "UL").len(), 1);
    }

    #[test]
    fn attr_lookup_with_and_without_value() {
        let tree = sample();
        assert_eq!(tree.find_all_by_attr(NodeId::ROOT, "id", Some("list")).len(), 1);
        assert!(tree.find_all_by_attr(NodeId::ROOT, "id", Some("other")).is_empty());
        assert_eq!(tree.find_all_by_attr(NodeId::ROOT, "hidden", None).len(), 1);
        assert_eq!(tree.find_all_by_attr(NodeId::ROOT, "hidden", Some("")).len(), 1);
    }

    #[test]
    fn type_lookups() {
        let tree = sample();
        assert_eq!(tree.find_all_by_type(NodeId::ROOT, NodeKind::TagClose).len(), 2);
        assert!(tree.find_all_by_type(NodeId::ROOT, NodeKind::Root).is_empty());
        assert_eq!(tree.get_nodes_by_type(NodeKind::Root), vec![NodeId::ROOT]);
        assert_eq!(tree.get_nodes_by_type(NodeKind::Text).len(), 1);
    }
}
