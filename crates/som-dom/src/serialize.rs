//! Tree-to-text output.
//!
//! Text nodes are written verbatim and tags are rebuilt from their data, so a
//! tree parsed from markup with double-quoted attributes and no style blocks
//! serializes back to the same bytes. Style block contents go through the
//! CSS writer and come out normalized.

use crate::css_format::CssFormat;
use crate::{AttrValue, DomTree, ElementData, NodeId, NodeType};

impl DomTree {
    /// Serialize `id` and its subtree.
    ///
    /// A `tag-open` writes its start tag and its children but not its
    /// `tag-close`, which is a separate sibling; see [`DomTree::outer_html`].
    /// Comments are dropped unless `include_comments` is set.
    #[must_use]
    pub fn serialize(&self, id: NodeId, include_comments: bool) -> String {
        let mut out = String::new();
        self.write_node(id, include_comments, &mut out);
        out
    }

    /// The element with its content and its paired close tag.
    #[must_use]
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = self.serialize(id, true);
        if let Some(close) = self.paired_close(id) {
            self.write_node(close, true, &mut out);
        }
        out
    }

    /// Serialized children of `id`, comments included.
    #[must_use]
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_children(id, true, &mut out);
        out
    }

    /// Concatenated text of every text node in the subtree.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        self.traverse(id)
            .filter_map(|node| self.as_text(node))
            .collect()
    }

    fn write_node(&self, id: NodeId, include_comments: bool, out: &mut String) {
        let Some(node) = self.get(id) else { return };
        match &node.node_type {
            NodeType::Root => self.write_children(id, include_comments, out),
            NodeType::Text(text) => out.push_str(text),
            NodeType::Comment(comment) => {
                if include_comments {
                    out.push_str(&comment.to_source());
                }
            }
            NodeType::TagOpen(data) => {
                write_start_tag(data, out);
                if data.style_block {
                    let format = CssFormat::default().include_comments(include_comments);
                    out.push_str(&self.css_nodes_to_string(self.children(id), &format));
                } else {
                    self.write_children(id, include_comments, out);
                }
            }
            NodeType::TagClose(name) => {
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            NodeType::CssRoot | NodeType::CssRule(_) | NodeType::CssAtRule(_) => {
                let format = CssFormat::default().include_comments(include_comments);
                out.push_str(&self.css_to_string(id, &format));
            }
        }
    }

    fn write_children(&self, id: NodeId, include_comments: bool, out: &mut String) {
        for &child in self.children(id) {
            self.write_node(child, include_comments, out);
        }
    }
}

fn write_start_tag(data: &ElementData, out: &mut String) {
    out.push('<');
    out.push_str(&data.tag_name);
    for (name, value) in data.attrs.iter() {
        out.push(' ');
        out.push_str(name);
        if let AttrValue::Value(value) = value {
            out.push('=');
            out.push_str(&quote_attribute(value));
        }
    }
    if data.self_closing {
        out.push_str(if data.compact_self_closing { "/" } else { " /" });
    }
    out.push('>');
}

/// Double quotes unless the value contains one; then single quotes, or
/// `&quot;` when both kinds appear.
fn quote_attribute(value: &str) -> String {
    if !value.contains('"') {
        format!("\"{value}\"")
    } else if !value.contains('\'') {
        format!("'{value}'")
    } else {
        format!("\"{}\"", value.replace('"', "&quot;"))
    }
}
