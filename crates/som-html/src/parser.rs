//! The HTML scanner and tree builder.
//!
//! Parsing is a single left-to-right pass with one insertion point. A start
//! tag is appended at the insertion point and, unless it is void or written
//! self-closing, becomes the new insertion point. An end tag looks for the
//! nearest open ancestor with the same name (ASCII case-insensitive); when
//! found, the `tag-close` is appended right after that ancestor and the
//! insertion point moves to the ancestor's parent. Unmatched end tags are
//! kept where they appear.
//!
//! Three content models bypass markup scanning, each running to the literal
//! end tag:
//!
//! - `<style>` content goes to the CSS parser
//! - special tags without attributes go through the [`script`] lexer
//! - `<script>` that is not handled as special becomes one text node
//!
//! Nothing here fails. Whatever is recovered from is reported through the
//! warning channel and returned by [`HtmlParser::parse_with_issues`].
//!
//! [`script`]: crate::script

use std::rc::Rc;

use som_common::{Component, ParseIssue, clear_warnings, report};
use som_css::CssParser;
use som_dom::{
    AttrValue, AttributesMap, CommentData, CommentKind, DomTree, ElementData, FragmentParser,
    NodeId, NodeType,
};
use strum_macros::Display;

use crate::script::{ScriptToken, tokenize};

/// Tags whose content is lexed for comments unless configured otherwise.
pub const DEFAULT_SPECIAL_TAGS: [&str; 1] = ["script"];

/// Parses HTML into SOM trees.
///
/// The parser is cheap to clone; every tree it builds keeps a clone so that
/// [`DomTree::insert_adjacent_html`] parses fragments the same way.
#[derive(Debug, Clone)]
pub struct HtmlParser {
    special_tags: Vec<String>,
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlParser {
    /// A parser with the default special tags.
    #[must_use]
    pub fn new() -> Self {
        Self {
            special_tags: DEFAULT_SPECIAL_TAGS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Replace the special tag list. An empty list turns comment lexing off.
    #[must_use]
    pub fn with_special_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.special_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Tag names whose content is lexed for comments.
    #[must_use]
    pub fn special_tags(&self) -> &[String] {
        &self.special_tags
    }

    fn is_special(&self, tag_name: &str) -> bool {
        self.special_tags
            .iter()
            .any(|tag| tag.eq_ignore_ascii_case(tag_name))
    }

    /// Parse a document into a new tree.
    #[must_use]
    pub fn parse(&self, html: &str) -> DomTree {
        self.parse_with_issues(html).0
    }

    /// Like [`HtmlParser::parse`], also returning what was recovered from.
    #[must_use]
    pub fn parse_with_issues(&self, html: &str) -> (DomTree, Vec<ParseIssue>) {
        clear_warnings();
        let mut tree = DomTree::new();
        tree.set_parser(Rc::new(self.clone()));
        let root = tree.root();
        let issues = self.parse_fragment(&mut tree, root, html);
        (tree, issues)
    }

    /// Parse `html` and append the resulting nodes to `container`. End tags
    /// never close anything outside `container`. Issue offsets are relative
    /// to `html`.
    pub fn parse_fragment(
        &self,
        tree: &mut DomTree,
        container: NodeId,
        html: &str,
    ) -> Vec<ParseIssue> {
        let mut scanner = HtmlScanner {
            input: html,
            position: 0,
            issues: Vec::new(),
            parser: self,
        };
        scanner.run(tree, container);
        scanner.issues
    }
}

impl FragmentParser for HtmlParser {
    fn parse_into(&self, tree: &mut DomTree, container: NodeId, markup: &str) {
        let _ = self.parse_fragment(tree, container, markup);
    }
}

/// How an element's content is read when it is not markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
enum ContentModel {
    #[strum(serialize = "style")]
    Style,
    #[strum(serialize = "special")]
    Special,
    #[strum(serialize = "raw text")]
    RawText,
}

/// How a start tag was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagEnd {
    Open,
    SelfClosing { compact: bool },
}

struct HtmlScanner<'a, 'p> {
    input: &'a str,
    position: usize,
    issues: Vec<ParseIssue>,
    parser: &'p HtmlParser,
}

impl HtmlScanner<'_, '_> {
    fn bytes(&self) -> &[u8] {
        self.input.as_bytes()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes().get(self.position + offset).copied()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.input[self.position..].starts_with(prefix)
    }

    fn issue(&mut self, message: String, offset: usize) {
        report(Component::Html, &mut self.issues, message, offset);
    }

    fn consume_whitespace(&mut self) {
        while self.peek_at(0).is_some_and(|b| b.is_ascii_whitespace()) {
            self.position += 1;
        }
    }

    fn consume_name(&mut self) -> &str {
        let input = self.input;
        let start = self.position;
        while self.peek_at(0).is_some_and(is_tag_name_byte) {
            self.position += 1;
        }
        &input[start..self.position]
    }

    fn run(&mut self, tree: &mut DomTree, container: NodeId) {
        let mut insertion = container;
        while let Some(b) = self.peek_at(0) {
            if b != b'<' {
                self.consume_text(tree, insertion, 0);
            } else if self.starts_with("<!--") {
                self.consume_comment(tree, insertion);
            } else if self.peek_at(1) == Some(b'/')
                && self.peek_at(2).is_some_and(|c| c.is_ascii_alphabetic())
            {
                insertion = self.consume_end_tag(tree, insertion, container);
            } else if self.peek_at(1).is_some_and(|c| c.is_ascii_alphabetic()) {
                insertion = self.consume_start_tag(tree, insertion);
            } else {
                // A '<' that opens nothing is text.
                self.consume_text(tree, insertion, 1);
            }
        }
    }

    /// Text up to the next `<`, starting `skip` bytes in.
    fn consume_text(&mut self, tree: &mut DomTree, parent: NodeId, skip: usize) {
        let input = self.input;
        let start = self.position;
        let from = start + skip;
        let end = input[from..].find('<').map_or(input.len(), |i| from + i);
        self.position = end;
        append_text(tree, parent, &input[start..end]);
    }

    /// `<!-- ... -->`, consuming to the end when unterminated.
    fn consume_comment(&mut self, tree: &mut DomTree, parent: NodeId) {
        let input = self.input;
        let start = self.position;
        let body = start + 4;
        let content = if let Some(end) = input[body..].find("-->") {
            self.position = body + end + 3;
            &input[body..body + end]
        } else {
            self.issue("unterminated comment".to_string(), start);
            self.position = input.len();
            &input[body..]
        };
        let comment = tree.alloc(NodeType::Comment(CommentData::new(
            content,
            CommentKind::HtmlComment,
        )));
        tree.push_child(parent, comment);
    }

    /// `</name ...>`. Returns the new insertion point.
    fn consume_end_tag(&mut self, tree: &mut DomTree, insertion: NodeId, container: NodeId) -> NodeId {
        let start = self.position;
        self.position += 2;
        let name = self.consume_name().to_string();
        match self.input[self.position..].find('>') {
            Some(end) => self.position += end + 1,
            None => {
                self.issue(format!("unterminated end tag </{name}"), start);
                self.position = self.input.len();
            }
        }

        let close = tree.alloc(NodeType::TagClose(name.clone()));
        let mut current = insertion;
        while current != container {
            let parent = tree.parent(current);
            if tree.as_element(current).is_some_and(|data| data.is(&name))
                && let Some(parent) = parent
            {
                tree.push_child(parent, close);
                return parent;
            }
            match parent {
                Some(parent) => current = parent,
                None => break,
            }
        }

        self.issue(format!("unmatched end tag </{name}>"), start);
        tree.push_child(insertion, close);
        insertion
    }

    /// `<name attrs...>` plus, for raw content models, everything up to and
    /// including the end tag. Returns the new insertion point.
    fn consume_start_tag(&mut self, tree: &mut DomTree, insertion: NodeId) -> NodeId {
        let start = self.position;
        self.position += 1;
        let name = self.consume_name().to_string();
        let (attrs, end) = self.consume_attributes(start, &name);
        let self_closing = end != TagEnd::Open;

        let mut data = ElementData::new(name.as_str());
        data.self_closing = self_closing;
        data.compact_self_closing = matches!(end, TagEnd::SelfClosing { compact: true });
        let model = if data.is("style") {
            Some(ContentModel::Style)
        } else if attrs.is_empty() && self.parser.is_special(&name) {
            Some(ContentModel::Special)
        } else if data.is("script") {
            Some(ContentModel::RawText)
        } else {
            None
        };
        data.style_block = model == Some(ContentModel::Style);
        data.script_block = model == Some(ContentModel::Special);
        data.attrs = attrs;

        let descend = !data.is_void() && !self_closing;
        let element = tree.alloc(NodeType::TagOpen(data));
        tree.push_child(insertion, element);

        match model {
            _ if !descend => insertion,
            Some(model) => {
                self.consume_raw_content(tree, element, &name, model);
                insertion
            }
            None => element,
        }
    }

    /// Attributes up to `>` or `/>`. Returns them and how the tag ended.
    fn consume_attributes(&mut self, tag_start: usize, tag_name: &str) -> (AttributesMap, TagEnd) {
        let mut attrs = AttributesMap::new();
        loop {
            self.consume_whitespace();
            match self.peek_at(0) {
                None => {
                    self.issue(format!("unterminated start tag <{tag_name}"), tag_start);
                    return (attrs, TagEnd::Open);
                }
                Some(b'>') => {
                    self.position += 1;
                    return (attrs, TagEnd::Open);
                }
                Some(b'/') if self.peek_at(1) == Some(b'>') => {
                    let compact = !self.bytes()[self.position - 1].is_ascii_whitespace();
                    self.position += 2;
                    return (attrs, TagEnd::SelfClosing { compact });
                }
                Some(b'/' | b'=') => self.position += 1,
                Some(_) => {
                    let attr_start = self.position;
                    let (name, value) = self.consume_attribute();
                    if attrs.keys().any(|key| key.eq_ignore_ascii_case(&name)) {
                        self.issue(format!("duplicate attribute '{name}' on <{tag_name}>"), attr_start);
                    } else {
                        let _ = attrs.insert(name, value);
                    }
                }
            }
        }
    }

    /// `name`, `name=value`, `name="value"` or `name='value'`.
    fn consume_attribute(&mut self) -> (String, AttrValue) {
        let input = self.input;
        let start = self.position;
        while self
            .peek_at(0)
            .is_some_and(|b| !b.is_ascii_whitespace() && !matches!(b, b'>' | b'/' | b'='))
        {
            self.position += 1;
        }
        let name = input[start..self.position].to_string();

        let before_equals = self.position;
        self.consume_whitespace();
        if self.peek_at(0) != Some(b'=') {
            self.position = before_equals;
            return (name, AttrValue::Boolean);
        }
        self.position += 1;
        self.consume_whitespace();

        let value = match self.peek_at(0) {
            Some(quote @ (b'"' | b'\'')) => {
                let body = self.position + 1;
                if let Some(end) = input[body..].find(char::from(quote)) {
                    self.position = body + end + 1;
                    &input[body..body + end]
                } else {
                    self.issue(format!("unterminated value for attribute '{name}'"), start);
                    self.position = input.len();
                    &input[body..]
                }
            }
            _ => {
                let body = self.position;
                while self
                    .peek_at(0)
                    .is_some_and(|b| !b.is_ascii_whitespace() && b != b'>')
                {
                    self.position += 1;
                }
                &input[body..self.position]
            }
        };
        (name, AttrValue::Value(value.to_string()))
    }

    /// Content of `element` up to the literal `</name>`, then that end tag.
    fn consume_raw_content(&mut self, tree: &mut DomTree, element: NodeId, name: &str, model: ContentModel) {
        let input = self.input;
        let start = self.position;
        let end_tag = format!("</{name}>");
        let (end, close_name) = match find_ignore_ascii_case(&input[start..], &end_tag) {
            Some(offset) => {
                let end = start + offset;
                (end, Some(&input[end + 2..end + 2 + name.len()]))
            }
            None => {
                self.issue(format!("unterminated {model} content, missing {end_tag}"), start);
                (input.len(), None)
            }
        };
        let content = &input[start..end];

        match model {
            ContentModel::Style => {
                let issues = CssParser::new().parse_into(tree, element, content);
                self.issues
                    .extend(issues.into_iter().map(|issue| issue.shifted(start)));
            }
            ContentModel::Special => {
                for token in tokenize(content) {
                    let node = match token {
                        ScriptToken::Code(code) => {
                            append_text(tree, element, code);
                            continue;
                        }
                        ScriptToken::LineComment(comment) => {
                            CommentData::new(comment, CommentKind::JsSingleLine)
                        }
                        ScriptToken::BlockComment { content, terminated } => {
                            if !terminated {
                                self.issue(format!("unterminated comment in <{name}>"), start);
                            }
                            CommentData::new(content, CommentKind::JsMultiLine)
                        }
                    };
                    let comment = tree.alloc(NodeType::Comment(node));
                    tree.push_child(element, comment);
                }
            }
            ContentModel::RawText => append_text(tree, element, content),
        }

        self.position = end;
        if let Some(close_name) = close_name {
            self.position += end_tag.len();
            let close = tree.alloc(NodeType::TagClose(close_name.to_string()));
            if let Some(parent) = tree.parent(element) {
                tree.push_child(parent, close);
            }
        }
    }
}

/// Append `text` to `parent`, merging it into a trailing text node.
fn append_text(tree: &mut DomTree, parent: NodeId, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(last) = tree.last_child(parent)
        && let Some(node) = tree.get_mut(last)
        && let NodeType::Text(existing) = &mut node.node_type
    {
        existing.push_str(text);
        return;
    }
    let id = tree.alloc(NodeType::Text(text.to_string()));
    tree.push_child(parent, id);
}

const fn is_tag_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.') || b >= 0x80
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}
