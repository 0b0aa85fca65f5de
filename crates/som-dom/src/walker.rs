//! Depth-first pre-order traversal.
//!
//! [`TreeWalker`] borrows the tree only for the duration of each step, so the
//! caller may mutate the tree between steps:
//!
//! ```ignore
//! let mut walker = tree.walker(tree.root());
//! while let Some(id) = walker.next_node(&tree) {
//!     if tree.is_whitespace_text(id) {
//!         tree.remove(id)?;
//!     }
//! }
//! ```
//!
//! When the node yielded last has been removed before the next step, the walk
//! resumes at the sibling that followed it in its former parent, or climbs out
//! of that parent when the old position is gone. Only one walker per tree is
//! guaranteed to behave this way; mutation seen by a second walker is not
//! tracked.

use crate::{DomTree, NodeId};

/// Where the yielded node sat when it was handed out.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    node: NodeId,
    parent: Option<NodeId>,
    index: usize,
    /// The next two siblings at yield time. Removing a `tag-open` also takes
    /// its close, so the second one is usually what survives.
    following: [Option<NodeId>; 2],
}

impl Cursor {
    fn capture(tree: &DomTree, node: NodeId) -> Self {
        let parent = tree.parent(node);
        let index = parent
            .and_then(|p| tree.index_in(p, node))
            .unwrap_or_default();
        let next = tree.next_sibling(node);
        Self {
            node,
            parent,
            index,
            following: [next, next.and_then(|n| tree.next_sibling(n))],
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum WalkState {
    Fresh,
    At(Cursor),
    Done,
}

/// A restartable-per-call, mutation-tolerant pre-order walk over one subtree.
///
/// Starting at a root (`root` or `css-root`) yields its descendants; starting
/// anywhere else yields the node itself and then its descendants. The walk
/// never leaves the start node's subtree.
#[derive(Debug, Clone)]
pub struct TreeWalker {
    start: NodeId,
    state: WalkState,
    skip_children: bool,
}

impl TreeWalker {
    /// A walker that has not yielded anything yet.
    #[must_use]
    pub const fn new(start: NodeId) -> Self {
        Self {
            start,
            state: WalkState::Fresh,
            skip_children: false,
        }
    }

    /// The node yielded last.
    #[must_use]
    pub const fn current(&self) -> Option<NodeId> {
        match self.state {
            WalkState::At(cursor) => Some(cursor.node),
            WalkState::Fresh | WalkState::Done => None,
        }
    }

    /// Do not descend into the children of the node yielded last.
    pub const fn skip_children(&mut self) {
        self.skip_children = true;
    }

    /// Advance and return the next node, or `None` once the walk is over.
    pub fn next_node(&mut self, tree: &DomTree) -> Option<NodeId> {
        let next = match self.state {
            WalkState::Fresh => self.first(tree),
            WalkState::At(cursor) => self.after(tree, &cursor),
            WalkState::Done => None,
        };
        self.skip_children = false;
        if let Some(id) = next {
            self.state = WalkState::At(Cursor::capture(tree, id));
        } else {
            self.state = WalkState::Done;
        }
        next
    }

    fn first(&self, tree: &DomTree) -> Option<NodeId> {
        let node = tree.get(self.start)?;
        if node.kind().is_root() {
            node.children.first().copied()
        } else {
            Some(self.start)
        }
    }

    fn after(&self, tree: &DomTree, cursor: &Cursor) -> Option<NodeId> {
        let attached = cursor.node == self.start || tree.parent(cursor.node) == cursor.parent;
        if attached {
            if !self.skip_children
                && let Some(child) = tree.first_child(cursor.node)
            {
                return Some(child);
            }
            return self.climb(tree, cursor.node);
        }

        // The yielded node was removed: resume in its former parent.
        let parent = cursor.parent?;
        if let Some(&id) = cursor
            .following
            .iter()
            .flatten()
            .find(|&&id| tree.parent(id) == Some(parent))
        {
            return Some(id);
        }
        if let Some(&id) = tree.children(parent).get(cursor.index) {
            return Some(id);
        }
        self.climb(tree, parent)
    }

    /// Next sibling of `node`, or of its nearest ancestor that has one,
    /// without leaving the start node's subtree.
    fn climb(&self, tree: &DomTree, node: NodeId) -> Option<NodeId> {
        let mut current = node;
        loop {
            if current == self.start {
                return None;
            }
            if let Some(next) = tree.next_sibling(current) {
                return Some(next);
            }
            current = tree.parent(current)?;
        }
    }
}

/// Read-only pre-order iterator, for when nothing is mutated during the walk.
pub struct Traverse<'a> {
    tree: &'a DomTree,
    walker: TreeWalker,
}

impl Traverse<'_> {
    /// Skip the subtree of the node returned last.
    pub const fn skip_children(&mut self) {
        self.walker.skip_children();
    }
}

impl Iterator for Traverse<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        self.walker.next_node(self.tree)
    }
}

impl DomTree {
    /// A mutation-tolerant walker over `start`'s subtree.
    #[must_use]
    pub const fn walker(&self, start: NodeId) -> TreeWalker {
        TreeWalker::new(start)
    }

    /// Pre-order iterator over `start`'s subtree (see [`TreeWalker`] for the
    /// start-node rules).
    #[must_use]
    pub const fn traverse(&self, start: NodeId) -> Traverse<'_> {
        Traverse {
            tree: self,
            walker: TreeWalker::new(start),
        }
    }

    /// All nodes strictly below `id`, in pre-order.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        self.traverse(id).filter(|&node| node != id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ElementData, NodeType};

    /// root
    ///   div
    ///     "a"
    ///     span
    ///       "b"
    ///     /span
    ///   /div
    ///   "c"
    fn sample() -> (DomTree, Vec<NodeId>) {
        let mut tree = DomTree::new();
        let div = tree.alloc(NodeType::TagOpen(ElementData::new("div")));
        let a = tree.alloc(NodeType::Text("a".into()));
        let span = tree.alloc(NodeType::TagOpen(ElementData::new("span")));
        let b = tree.alloc(NodeType::Text("b".into()));
        let span_close = tree.alloc(NodeType::TagClose("span".into()));
        let div_close = tree.alloc(NodeType::TagClose("div".into()));
        let c = tree.alloc(NodeType::Text("c".into()));
        tree.push_child(NodeId::ROOT, div);
        tree.push_child(div, a);
        tree.push_child(div, span);
        tree.push_child(span, b);
        tree.push_child(div, span_close);
        tree.push_child(NodeId::ROOT, div_close);
        tree.push_child(NodeId::ROOT, c);
        (tree, vec![div, a, span, b, span_close, div_close, c])
    }

    #[test]
    fn visits_in_pre_order_from_root() {
        let (tree, order) = sample();
        let visited: Vec<NodeId> = tree.traverse(NodeId::ROOT).collect();
        assert_eq!(visited, order);
    }

    #[test]
    fn non_root_start_includes_itself_and_stays_inside() {
        let (tree, order) = sample();
        let visited: Vec<NodeId> = tree.traverse(order[2]).collect();
        assert_eq!(visited, vec![order[2], order[3]]);
    }

    #[test]
    fn skip_children_bypasses_subtree() {
        let (tree, order) = sample();
        let mut walker = tree.walker(NodeId::ROOT);
        let mut visited = Vec::new();
        while let Some(id) = walker.next_node(&tree) {
            visited.push(id);
            if id == order[0] {
                walker.skip_children();
            }
        }
        assert_eq!(visited, vec![order[0], order[5], order[6]]);
    }

    #[test]
    fn removing_yielded_element_continues_after_it() {
        let (mut tree, order) = sample();
        let mut walker = tree.walker(NodeId::ROOT);
        let mut visited = Vec::new();
        while let Some(id) = walker.next_node(&tree) {
            visited.push(id);
            if id == order[2] {
                tree.remove(id).unwrap();
            }
        }
        // span, its text and its close are gone; the walk carries on in div.
        assert_eq!(visited, vec![order[0], order[1], order[2], order[5], order[6]]);
    }

    #[test]
    fn removing_last_child_climbs_out() {
        let (mut tree, order) = sample();
        let mut walker = tree.walker(NodeId::ROOT);
        let mut visited = Vec::new();
        while let Some(id) = walker.next_node(&tree) {
            visited.push(id);
            if id == order[3] {
                tree.remove(id).unwrap();
            }
        }
        assert_eq!(visited, order);
    }

    #[test]
    fn exhausted_walker_stays_exhausted() {
        let (tree, _) = sample();
        let mut walker = tree.walker(NodeId::ROOT);
        while walker.next_node(&tree).is_some() {}
        assert_eq!(walker.next_node(&tree), None);
        assert_eq!(walker.current(), None);
    }
}
