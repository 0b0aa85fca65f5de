//! Mutable node tree for the SOM ("simple object model") parser.
//!
//! The tree keeps markup in a lossless, flat-pair shape: an element is a
//! `tag-open` node whose children hold its content, followed by a sibling
//! `tag-close` node. Text nodes keep every byte they were parsed from, so an
//! unmodified tree serializes back to its input.
//!
//! # Design
//!
//! The tree uses arena allocation with [`NodeId`] indices for all relationships.
//! Parents own their children through an ordered list; the parent link on each
//! node is a plain index and never keeps anything alive. Nodes removed from the
//! tree stay in the arena, detached, until the [`DomTree`] is dropped.
//!
//! # Modules
//!
//! - [`mutation`]: append/insert/replace/remove with tag-pair and whitespace handling
//! - [`walker`]: depth-first traversal that survives removal of the yielded node
//! - [`selector`]: the pragmatic CSS selector matcher behind `query_selector`
//! - [`serialize`]: node-to-text output
//! - [`css_query`] and [`css_format`]: lookups and text output for parsed CSS

use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use strum_macros::{Display, EnumString};

/// Attribute and declaration editing on tree nodes.
pub mod attributes;
/// CSS node payloads and comment kinds.
pub mod css;
/// CSS text output with formatting options.
pub mod css_format;
/// Rule, variable and at-rule lookups over parsed CSS.
pub mod css_query;
/// Element payload, attribute values and the void-element set.
pub mod element;
/// Errors raised by contract violations.
pub mod error;
/// Structural mutation algorithms.
pub mod mutation;
/// Insertion-ordered string-keyed map.
pub mod ordered_map;
/// Query helpers by tag, attribute and type.
pub mod query;
/// CSS selector parsing and matching.
pub mod selector;
/// Tree-to-text serialization.
pub mod serialize;
/// Mutation-tolerant depth-first traversal.
pub mod walker;

pub use css::{CommentData, CommentKind, CssAtRuleData, CssRuleData};
pub use css_format::CssFormat;
pub use css_query::{CssRuleQuery, CssVariable};
pub use element::{AttrValue, ElementData, VOID_ELEMENTS, is_void_element};
pub use error::{Result, SomError};
pub use mutation::{AdjacentPosition, CreatedElement, FragmentParser, NodeContent};
pub use ordered_map::{AttributesMap, Declarations, OrderedMap};
pub use selector::SelectorList;
pub use walker::{Traverse, TreeWalker};

/// A type-safe index into the tree arena.
///
/// NodeId provides O(1) access to any node in the tree without borrowing issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root node is always at index 0.
    pub const ROOT: Self = Self(0);
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One entry of the arena.
///
/// Stores the payload plus indices for parent/child/sibling relationships,
/// enabling O(1) traversal in any direction. Structure is only changed through
/// [`DomTree`] methods so that the links stay consistent.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    /// What this node is, with its variant-specific data.
    pub node_type: NodeType,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
    pub(crate) prev_sibling: Option<NodeId>,
}

impl Node {
    fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
        }
    }

    /// The owning parent, or `None` for roots and detached nodes.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in serialization order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Shorthand for `self.node_type.kind()`.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        self.node_type.kind()
    }
}

/// The node variants and the data each one carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeType {
    /// Synthetic top-level container for a parsed HTML fragment.
    Root,
    /// An element start. Its children are the element's content.
    TagOpen(ElementData),
    /// An element end, stored as the sibling after its `TagOpen`.
    TagClose(String),
    /// Literal text, byte-for-byte as parsed.
    Text(String),
    /// A comment of any syntax.
    Comment(CommentData),
    /// Synthetic container for a parsed CSS fragment.
    CssRoot,
    /// A CSS rule: selector, declarations, nested rules in children.
    CssRule(CssRuleData),
    /// A CSS at-rule such as `@media` or `@import`.
    CssAtRule(CssAtRuleData),
}

impl NodeType {
    /// The fieldless discriminant of this variant.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::Root => NodeKind::Root,
            Self::TagOpen(_) => NodeKind::TagOpen,
            Self::TagClose(_) => NodeKind::TagClose,
            Self::Text(_) => NodeKind::Text,
            Self::Comment(_) => NodeKind::Comment,
            Self::CssRoot => NodeKind::CssRoot,
            Self::CssRule(_) => NodeKind::CssRule,
            Self::CssAtRule(_) => NodeKind::CssAtRule,
        }
    }
}

/// Node variant names, as used by type-based queries.
///
/// Parses from and displays as the kebab-case names (`"tag-open"`, `"css-at-rule"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// See [`NodeType::Root`].
    Root,
    /// See [`NodeType::TagOpen`].
    TagOpen,
    /// See [`NodeType::TagClose`].
    TagClose,
    /// See [`NodeType::Text`].
    Text,
    /// See [`NodeType::Comment`].
    Comment,
    /// See [`NodeType::CssRoot`].
    CssRoot,
    /// See [`NodeType::CssRule`].
    CssRule,
    /// See [`NodeType::CssAtRule`].
    CssAtRule,
}

impl NodeKind {
    /// Whether nodes of this kind own children.
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(
            self,
            Self::Root | Self::TagOpen | Self::CssRoot | Self::CssRule | Self::CssAtRule
        )
    }

    /// Whether this is one of the synthetic top-level containers.
    #[must_use]
    pub const fn is_root(self) -> bool {
        matches!(self, Self::Root | Self::CssRoot)
    }
}

/// Arena-based node tree with O(1) node access and traversal.
///
/// All nodes live in one contiguous vector and refer to each other by
/// [`NodeId`]. The tree may also carry the parser that produced it, which is
/// what [`DomTree::insert_adjacent_html`] uses to parse new fragments.
#[derive(Clone)]
pub struct DomTree {
    /// All nodes in the tree, indexed by NodeId.
    /// The root node is always at index 0 (`NodeId::ROOT`).
    nodes: Vec<Node>,
    parser: Option<Rc<dyn FragmentParser>>,
}

impl fmt::Debug for DomTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomTree")
            .field("nodes", &self.nodes)
            .field("parser", &self.parser)
            .finish()
    }
}

impl DomTree {
    /// Create a new tree with just the HTML root node.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root(NodeType::Root)
    }

    /// Create a new tree whose root has the given payload (for example
    /// [`NodeType::CssRoot`] for standalone CSS).
    #[must_use]
    pub fn with_root(root: NodeType) -> Self {
        Self {
            nodes: vec![Node::new(root)],
            parser: None,
        }
    }

    /// Get the root node ID.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by its ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get a mutable reference to a node by its ID.
    ///
    /// Only the payload is reachable this way; structure changes go through
    /// the mutation methods.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Get the number of nodes in the arena, detached ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the arena is empty (it always holds at least the root).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a new node and return its ID.
    /// The node is not yet attached to the tree.
    pub fn alloc(&mut self, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(node_type));
        id
    }

    /// Attach the parser used by [`DomTree::insert_adjacent_html`].
    pub fn set_parser(&mut self, parser: Rc<dyn FragmentParser>) {
        self.parser = Some(parser);
    }

    /// The parser that built this tree, if one was attached.
    #[must_use]
    pub fn parser(&self) -> Option<&Rc<dyn FragmentParser>> {
        self.parser.as_ref()
    }

    /// Low-level append used by tree builders.
    ///
    /// Appends `child` as the last child of `parent`, updating all
    /// relationships. Unlike [`DomTree::append_child`] this does no tag-pair
    /// or whitespace bookkeeping; a child that is still attached elsewhere is
    /// simply unlinked from its old parent first.
    pub fn push_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(old_parent) = self.parent(child)
            && let Some(index) = self.index_in(old_parent, child)
        {
            let _ = self.detach_range(old_parent, index, 1);
        }

        // Get the current last child of parent (if any) to set up sibling links
        let prev_last_child = self.nodes[parent.0].children.last().copied();

        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[child.0].next_sibling = None;
        self.nodes[child.0].prev_sibling = prev_last_child;

        if let Some(prev_id) = prev_last_child {
            self.nodes[prev_id.0].next_sibling = Some(child);
        }
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Get the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.first().copied())
    }

    /// Get the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.last().copied())
    }

    /// Get the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling)
    }

    /// Get the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling)
    }

    /// The node's variant, if the id is valid.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get(id).map(Node::kind)
    }

    /// Check if `descendant` is a descendant of `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, descendant: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(descendant).any(|id| id == ancestor)
    }

    /// The topmost ancestor of a node (the node itself when it has no parent).
    #[must_use]
    pub fn top(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// Iterate over all ancestors of a node, from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Iterate over preceding siblings (from immediately before to first child).
    #[must_use]
    pub fn preceding_siblings(&self, id: NodeId) -> PrecedingSiblingIterator<'_> {
        PrecedingSiblingIterator {
            tree: self,
            current: self.prev_sibling(id),
        }
    }

    /// Get element data if this node is a `tag-open`.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::TagOpen(data) => Some(data),
            _ => None,
        })
    }

    /// Get mutable element data if this node is a `tag-open`.
    pub fn as_element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(|n| match &mut n.node_type {
            NodeType::TagOpen(data) => Some(data),
            _ => None,
        })
    }

    /// Get text content if this node is a text node.
    #[must_use]
    pub fn as_text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Tag name of a `tag-open` or `tag-close` node.
    #[must_use]
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::TagOpen(data) => Some(data.tag_name.as_str()),
            NodeType::TagClose(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// A text node made only of whitespace (the empty string counts).
    #[must_use]
    pub fn is_whitespace_text(&self, id: NodeId) -> bool {
        self.as_text(id)
            .is_some_and(|text| text.chars().all(char::is_whitespace))
    }

    /// The `tag-close` paired with a `tag-open`: the immediately following
    /// sibling when it closes the same name. Void and self-closing elements
    /// have no pair.
    #[must_use]
    pub fn paired_close(&self, open: NodeId) -> Option<NodeId> {
        let data = self.as_element(open)?;
        if data.is_void() || data.self_closing {
            return None;
        }
        let next = self.next_sibling(open)?;
        match &self.get(next)?.node_type {
            NodeType::TagClose(name) if name.eq_ignore_ascii_case(&data.tag_name) => Some(next),
            _ => None,
        }
    }

    /// The `tag-open` paired with a `tag-close`: the immediately preceding
    /// sibling when it opens the same name.
    #[must_use]
    pub fn paired_open(&self, close: NodeId) -> Option<NodeId> {
        let prev = self.prev_sibling(close)?;
        self.paired_close(prev).filter(|&id| id == close).map(|_| prev)
    }

    /// Position of `child` in `parent`'s child list.
    pub(crate) fn index_in(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).iter().position(|&id| id == child)
    }

    /// Parent and index of an attached node.
    pub(crate) fn position(&self, id: NodeId) -> Result<(NodeId, usize)> {
        let parent = self.parent(id).ok_or(SomError::NoParent(id))?;
        let index = self
            .index_in(parent, id)
            .ok_or(SomError::NodeNotFound(id))?;
        Ok((parent, index))
    }

    /// Insert detached nodes into `parent` starting at `index`.
    pub(crate) fn splice_in(&mut self, parent: NodeId, index: usize, nodes: &[NodeId]) {
        let index = index.min(self.nodes[parent.0].children.len());
        for (offset, &id) in nodes.iter().enumerate() {
            self.nodes[parent.0].children.insert(index + offset, id);
            self.nodes[id.0].parent = Some(parent);
        }
        self.relink(parent);
    }

    /// Remove `count` children of `parent` starting at `start`, clearing
    /// their parent and sibling links. Returns the removed ids in order.
    pub(crate) fn detach_range(&mut self, parent: NodeId, start: usize, count: usize) -> Vec<NodeId> {
        let children = &mut self.nodes[parent.0].children;
        let end = (start + count).min(children.len());
        let removed: Vec<NodeId> = children.drain(start.min(end)..end).collect();
        for &id in &removed {
            let node = &mut self.nodes[id.0];
            node.parent = None;
            node.next_sibling = None;
            node.prev_sibling = None;
        }
        self.relink(parent);
        removed
    }

    /// Rebuild sibling links for all children of `parent`.
    fn relink(&mut self, parent: NodeId) {
        let children = self.nodes[parent.0].children.clone();
        for (i, &id) in children.iter().enumerate() {
            let prev = i.checked_sub(1).map(|p| children[p]);
            let next = children.get(i + 1).copied();
            let node = &mut self.nodes[id.0];
            node.prev_sibling = prev;
            node.next_sibling = next;
        }
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over ancestors of a node.
pub struct AncestorIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}

/// Iterator over preceding siblings of a node.
pub struct PrecedingSiblingIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for PrecedingSiblingIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.prev_sibling(id);
        Some(id)
    }
}
