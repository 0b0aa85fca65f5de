//! Structural mutation: append, insert, replace, remove, element creation and
//! fragment insertion.
//!
//! Every operation keeps an element's `tag-close` as the sibling right after
//! its `tag-open`. When an attached node is moved, it is first *extracted*:
//! the node, its paired close, and an immediately preceding whitespace-only
//! text node are lifted out together, so indentation travels with the element.
//! Whitespace after the node stays where it was.

use std::collections::HashSet;
use std::fmt;

use strum_macros::{Display, EnumString};

use crate::css::{CommentData, CommentKind};
use crate::element::{ElementData, is_void_element};
use crate::error::{Result, SomError};
use crate::ordered_map::AttributesMap;
use crate::{DomTree, Node, NodeId, NodeKind, NodeType};

/// Something that can parse markup straight into an existing tree.
///
/// The HTML parser implements this and attaches itself to every tree it
/// builds, which lets [`DomTree::insert_adjacent_html`] parse fragments with
/// the same configuration that produced the document.
pub trait FragmentParser: fmt::Debug {
    /// Parse `markup` and append the resulting top-level nodes to `container`.
    fn parse_into(&self, tree: &mut DomTree, container: NodeId, markup: &str);
}

/// Where [`DomTree::insert_adjacent_html`] places the parsed nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AdjacentPosition {
    /// Before the element's opening tag.
    BeforeBegin,
    /// As the element's first children.
    AfterBegin,
    /// As the element's last children.
    BeforeEnd,
    /// After the element's closing tag.
    AfterEnd,
}

/// Initial content for [`DomTree::create_element`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NodeContent {
    /// No children.
    #[default]
    Empty,
    /// A single text child.
    Text(String),
    /// One node, moved into the new element.
    Node(NodeId),
    /// Several nodes, moved into the new element in order.
    Nodes(Vec<NodeId>),
}

impl From<&str> for NodeContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for NodeContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<NodeId> for NodeContent {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<Vec<NodeId>> for NodeContent {
    fn from(ids: Vec<NodeId>) -> Self {
        Self::Nodes(ids)
    }
}

/// A freshly created, still detached element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedElement {
    /// The `tag-open` node holding the content.
    pub open: NodeId,
    /// The `tag-close` node, absent for void elements.
    pub close: Option<NodeId>,
}

impl CreatedElement {
    /// The nodes to insert, open first.
    #[must_use]
    pub fn nodes(&self) -> Vec<NodeId> {
        std::iter::once(self.open).chain(self.close).collect()
    }
}

impl DomTree {
    /// Append `nodes` to `parent` in argument order.
    ///
    /// Attached nodes are moved: they are extracted together with their
    /// closing tag and leading whitespace, so no duplicate stays behind.
    ///
    /// # Errors
    ///
    /// `InvalidOperationForElementKind` when `parent` cannot hold children,
    /// `CyclicInsertion` when a node would be moved into its own subtree, and
    /// `NodeNotFound` for unknown ids.
    pub fn append_child(&mut self, parent: NodeId, nodes: &[NodeId]) -> Result<()> {
        self.ensure_container(parent, "append children")?;
        let mut placed = HashSet::new();
        for &node in nodes {
            let subject = self.move_subject(node)?;
            if placed.contains(&subject) {
                continue;
            }
            self.ensure_not_ancestor(subject, parent)?;
            let moved = self.extract_for_move(subject, &[])?;
            let end = self.children(parent).len();
            self.splice_in(parent, end, &moved);
            placed.extend(moved);
        }
        Ok(())
    }

    /// Insert `nodes` before `anchor`, keeping their order.
    ///
    /// A paired `tag-close` anchor is resolved to its `tag-open`, so content
    /// never lands between an element's open tag and its close.
    ///
    /// # Errors
    ///
    /// `NoParent` when the anchor is detached, `CyclicInsertion` when a node
    /// is an ancestor of the anchor, `NodeNotFound` for unknown ids.
    pub fn insert_before(&mut self, anchor: NodeId, nodes: &[NodeId]) -> Result<()> {
        let anchor = self.move_subject(anchor)?;
        let parent = self.parent(anchor).ok_or(SomError::NoParent(anchor))?;
        let guard = [Some(anchor), self.paired_close(anchor)];
        let mut placed = HashSet::new();
        for &node in nodes {
            let subject = self.move_subject(node)?;
            if placed.contains(&subject) || guard.contains(&Some(subject)) {
                continue;
            }
            self.ensure_not_ancestor(subject, parent)?;
            let moved = self.extract_for_move(subject, &[anchor])?;
            // Extraction from the same parent may have shifted the anchor.
            let (_, index) = self.position(anchor)?;
            self.splice_in(parent, index, &moved);
            placed.extend(moved);
        }
        Ok(())
    }

    /// Insert `nodes` after `anchor`, keeping their order.
    ///
    /// A `tag-open` anchor with a paired close is resolved to the close, so
    /// the inserted content lands outside the element.
    ///
    /// # Errors
    ///
    /// Same as [`DomTree::insert_before`].
    pub fn insert_after(&mut self, anchor: NodeId, nodes: &[NodeId]) -> Result<()> {
        let _ = self.node(anchor)?;
        let anchor = self.paired_close(anchor).unwrap_or(anchor);
        let parent = self.parent(anchor).ok_or(SomError::NoParent(anchor))?;
        let guard = [Some(anchor), self.paired_open(anchor)];
        let mut placed = HashSet::new();
        let mut last = anchor;
        for &node in nodes {
            let subject = self.move_subject(node)?;
            if placed.contains(&subject) || guard.contains(&Some(subject)) {
                continue;
            }
            self.ensure_not_ancestor(subject, parent)?;
            let moved = self.extract_for_move(subject, &[anchor, last])?;
            let (_, index) = self.position(last)?;
            self.splice_in(parent, index + 1, &moved);
            if let Some(&tail) = moved.last() {
                last = tail;
            }
            placed.extend(moved);
        }
        Ok(())
    }

    /// Replace `target` (with its closing tag and whole subtree) by `nodes`.
    ///
    /// Every replacement is extracted before anything is deleted, so a
    /// replacement taken from inside `target`'s own subtree survives.
    /// Passing `target` itself among the replacements is ignored.
    ///
    /// # Errors
    ///
    /// `NoParent` when `target` is detached, `NodeNotFound` when its parent
    /// does not list it, `CyclicInsertion` when a replacement is an ancestor
    /// of `target`.
    pub fn replace_with(&mut self, target: NodeId, nodes: &[NodeId]) -> Result<()> {
        let target = self.move_subject(target)?;
        let _ = self.position(target)?;

        let mut placed = HashSet::new();
        let mut replacement = Vec::new();
        for &node in nodes {
            let subject = self.move_subject(node)?;
            if subject == target || placed.contains(&subject) {
                continue;
            }
            if self.is_descendant_of(target, subject) {
                return Err(SomError::CyclicInsertion(subject));
            }
            let moved = self.extract_for_move(subject, &[target])?;
            placed.extend(moved.iter().copied());
            replacement.extend(moved);
        }

        let (parent, index) = self.position(target)?;
        let count = if self.paired_close(target).is_some() { 2 } else { 1 };
        let _ = self.detach_range(parent, index, count);
        self.splice_in(parent, index, &replacement);
        Ok(())
    }

    /// Detach `id` from its parent.
    ///
    /// A `tag-open` directly followed by its close (or a `tag-close` directly
    /// preceded by its open) is removed together with its pair. Removing a
    /// detached node does nothing.
    ///
    /// # Errors
    ///
    /// `NodeNotFound` when the node's parent does not list it.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        let _ = self.node(id)?;
        let Some(parent) = self.parent(id) else {
            return Ok(());
        };
        let index = self
            .index_in(parent, id)
            .ok_or(SomError::NodeNotFound(id))?;
        if self.paired_close(id).is_some() {
            let _ = self.detach_range(parent, index, 2);
        } else if self.paired_open(id).is_some() {
            let _ = self.detach_range(parent, index - 1, 2);
        } else {
            let _ = self.detach_range(parent, index, 1);
        }
        Ok(())
    }

    /// Build a detached element: a `tag-open` holding `content`, plus a
    /// `tag-close` unless the tag is void. Insert the pair with
    /// [`CreatedElement::nodes`].
    ///
    /// # Errors
    ///
    /// `InvalidOperationForElementKind` when content is given for a void tag,
    /// plus any error from moving content nodes.
    pub fn create_element(
        &mut self,
        tag_name: &str,
        attrs: AttributesMap,
        content: impl Into<NodeContent>,
    ) -> Result<CreatedElement> {
        let mut data = ElementData::new(tag_name);
        data.attrs = attrs;
        let open = self.alloc(NodeType::TagOpen(data));

        match content.into() {
            NodeContent::Empty => {}
            NodeContent::Text(text) if text.is_empty() => {}
            NodeContent::Text(text) => {
                self.ensure_container(open, "add text")?;
                let child = self.alloc(NodeType::Text(text));
                self.push_child(open, child);
            }
            NodeContent::Node(id) => self.append_child(open, &[id])?,
            NodeContent::Nodes(ids) => self.append_child(open, &ids)?,
        }

        let close =
            (!is_void_element(tag_name)).then(|| self.alloc(NodeType::TagClose(tag_name.to_string())));
        Ok(CreatedElement { open, close })
    }

    /// Allocate a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeType::Text(text.into()))
    }

    /// Allocate a detached comment node.
    pub fn create_comment(&mut self, content: impl Into<String>, kind: CommentKind) -> NodeId {
        self.alloc(NodeType::Comment(CommentData::new(content, kind)))
    }

    /// Parse `markup` with the tree's own parser and insert the result
    /// relative to `anchor`. Returns the inserted top-level nodes.
    ///
    /// # Errors
    ///
    /// - `InvalidPosition` for an unknown position keyword
    /// - `NoParent` for `beforebegin`/`afterend` on a detached anchor
    /// - `InvalidOperationForElementKind` for `afterbegin`/`beforeend` when the
    ///   anchor is not an element or is a void element
    /// - `ParserUnavailable` when no parser is attached to the tree
    pub fn insert_adjacent_html(
        &mut self,
        anchor: NodeId,
        position: &str,
        markup: &str,
    ) -> Result<Vec<NodeId>> {
        let position: AdjacentPosition = position
            .parse()
            .map_err(|_| SomError::InvalidPosition(position.to_string()))?;
        let kind = self.node(anchor)?.kind();

        match position {
            AdjacentPosition::BeforeBegin | AdjacentPosition::AfterEnd => {
                if self.parent(anchor).is_none() {
                    return Err(SomError::NoParent(anchor));
                }
            }
            AdjacentPosition::AfterBegin | AdjacentPosition::BeforeEnd => {
                let data = self
                    .as_element(anchor)
                    .ok_or_else(|| SomError::invalid_kind("insert markup inside", kind))?;
                if data.is_void() || data.self_closing {
                    return Err(SomError::void_element("insert markup inside", &data.tag_name));
                }
            }
        }

        let parser = self.parser.clone().ok_or(SomError::ParserUnavailable)?;
        let container = self.alloc(NodeType::Root);
        parser.parse_into(self, container, markup);
        let count = self.children(container).len();
        let fragment = self.detach_range(container, 0, count);

        match position {
            AdjacentPosition::BeforeBegin => self.insert_before(anchor, &fragment)?,
            AdjacentPosition::AfterBegin => self.splice_in(anchor, 0, &fragment),
            AdjacentPosition::BeforeEnd => {
                let end = self.children(anchor).len();
                self.splice_in(anchor, end, &fragment);
            }
            AdjacentPosition::AfterEnd => self.insert_after(anchor, &fragment)?,
        }
        Ok(fragment)
    }

    /// Look up a node, failing with `NodeNotFound` for ids outside the arena.
    pub(crate) fn node(&self, id: NodeId) -> Result<&Node> {
        self.get(id).ok_or(SomError::NodeNotFound(id))
    }

    /// The node that actually moves when `id` is moved: a paired `tag-close`
    /// stands for its element, so the open tag leads.
    fn move_subject(&self, id: NodeId) -> Result<NodeId> {
        match self.node(id)?.kind() {
            NodeKind::TagClose => Ok(self.paired_open(id).unwrap_or(id)),
            _ => Ok(id),
        }
    }

    /// Lift `id` out of its parent for a move, together with its paired close
    /// and a directly preceding whitespace-only text node (unless that text
    /// node is in `keep`). Returns the lifted nodes in order.
    fn extract_for_move(&mut self, id: NodeId, keep: &[NodeId]) -> Result<Vec<NodeId>> {
        let Some(parent) = self.parent(id) else {
            return Ok(vec![id]);
        };
        let index = self
            .index_in(parent, id)
            .ok_or(SomError::NodeNotFound(id))?;

        let mut start = index;
        let mut count = if self.paired_close(id).is_some() { 2 } else { 1 };
        if let Some(prev) = self.prev_sibling(id)
            && !keep.contains(&prev)
            && self.is_whitespace_text(prev)
        {
            start -= 1;
            count += 1;
        }
        Ok(self.detach_range(parent, start, count))
    }

    fn ensure_container(&self, id: NodeId, operation: &'static str) -> Result<()> {
        match &self.node(id)?.node_type {
            NodeType::TagOpen(data) if data.is_void() || data.self_closing => {
                Err(SomError::void_element(operation, &data.tag_name))
            }
            other if !other.kind().is_container() => Err(SomError::invalid_kind(operation, other.kind())),
            _ => Ok(()),
        }
    }

    fn ensure_not_ancestor(&self, subject: NodeId, destination: NodeId) -> Result<()> {
        if subject == destination || self.is_descendant_of(destination, subject) {
            return Err(SomError::CyclicInsertion(subject));
        }
        Ok(())
    }
}
