//! A single-pass CSS scanner that builds nodes as it goes.
//!
//! The grammar is handled by three productions:
//!
//! - **list of rules** (top level): comments, at-rules and qualified rules
//! - **block contents** (inside `{ }`): declarations, nested rules, nested
//!   at-rules and comments
//! - **at-rule**: name, raw prelude, then either `;` or a block
//!
//! Inside a block, whether an item is a declaration or a nested rule is
//! decided by looking ahead without consuming: a `{` at nesting depth zero
//! before the next `;` or `}` makes it a rule, otherwise a `:` makes it a
//! declaration. Parentheses, brackets, strings and comments are skipped over
//! by every scan, so `url(a;b)` or `content: "}"` never end an item early.

use som_common::{Component, ParseIssue, report};
use som_dom::{
    CommentData, CommentKind, CssAtRuleData, CssRuleData, DomTree, NodeId, NodeType,
};

/// Parses CSS text into SOM nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssParser;

impl CssParser {
    /// A parser with default behaviour.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Parse `css` into a new tree whose root is a `css-root`.
    #[must_use]
    pub fn parse(&self, css: &str) -> DomTree {
        self.parse_with_issues(css).0
    }

    /// Like [`CssParser::parse`], also returning what was recovered from.
    #[must_use]
    pub fn parse_with_issues(&self, css: &str) -> (DomTree, Vec<ParseIssue>) {
        let mut tree = DomTree::with_root(NodeType::CssRoot);
        let root = tree.root();
        let issues = self.parse_into(&mut tree, root, css);
        (tree, issues)
    }

    /// Parse `css` and append the resulting nodes to `parent`. Issue
    /// offsets are relative to `css`.
    pub fn parse_into(&self, tree: &mut DomTree, parent: NodeId, css: &str) -> Vec<ParseIssue> {
        let mut scanner = CssScanner::new(css);
        scanner.consume_list_of_rules(tree, parent);
        scanner.issues
    }
}

/// How the lookahead classified the next item inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockItem {
    NestedRule,
    Declaration,
    Malformed,
}

/// Why a capture stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    /// At this byte, which is left unconsumed.
    At(u8),
    /// The input ran out.
    Eof,
}

struct CssScanner<'a> {
    input: &'a str,
    position: usize,
    issues: Vec<ParseIssue>,
}

impl<'a> CssScanner<'a> {
    const fn new(input: &'a str) -> Self {
        Self {
            input,
            position: 0,
            issues: Vec::new(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.position + offset).copied()
    }

    fn at_comment(&self) -> bool {
        self.peek() == Some(b'/') && self.peek_at(1) == Some(b'*')
    }

    fn issue(&mut self, message: impl Into<String>) {
        report(Component::Css, &mut self.issues, message.into(), self.position);
    }

    fn consume_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.position += 1;
        }
    }

    /// Top level: rules, at-rules and comments until the input ends.
    fn consume_list_of_rules(&mut self, tree: &mut DomTree, parent: NodeId) {
        loop {
            self.consume_whitespace();
            match self.peek() {
                None => return,
                Some(b'}') => {
                    self.issue("unexpected '}' at top level");
                    self.position += 1;
                }
                Some(b';') => {
                    self.issue("stray ';' at top level");
                    self.position += 1;
                }
                Some(b'@') => self.consume_at_rule(tree, parent),
                Some(_) if self.at_comment() => self.consume_comment(tree, parent),
                Some(_) => self.consume_qualified_rule(tree, parent),
            }
        }
    }

    /// Inside `{ }` of a rule or at-rule. Consumes the closing brace.
    fn consume_block_contents(&mut self, tree: &mut DomTree, owner: NodeId) {
        loop {
            self.consume_whitespace();
            match self.peek() {
                None => {
                    self.issue("unclosed block at end of input");
                    return;
                }
                Some(b'}') => {
                    self.position += 1;
                    return;
                }
                Some(b';') => self.position += 1,
                Some(b'@') => self.consume_at_rule(tree, owner),
                Some(_) if self.at_comment() => self.consume_comment(tree, owner),
                Some(_) => match self.classify() {
                    BlockItem::NestedRule => self.consume_qualified_rule(tree, owner),
                    BlockItem::Declaration => self.consume_declaration(tree, owner),
                    BlockItem::Malformed => {
                        self.issue("skipped malformed declaration");
                        let _ = self.capture_until(&[b';', b'}']);
                        if self.peek() == Some(b';') {
                            self.position += 1;
                        }
                    }
                },
            }
        }
    }

    /// `selector { ... }`
    fn consume_qualified_rule(&mut self, tree: &mut DomTree, parent: NodeId) {
        let (prelude, stop) = self.capture_until(&[b'{', b';', b'}']);
        let selector = prelude.trim();
        match stop {
            Stop::At(b'{') => {
                self.position += 1;
                let rule = tree.alloc(NodeType::CssRule(CssRuleData::new(selector)));
                tree.push_child(parent, rule);
                self.consume_block_contents(tree, rule);
            }
            Stop::At(b';') => {
                self.issue(format!("selector '{selector}' has no block"));
                self.position += 1;
            }
            // The caller deals with the '}'.
            Stop::At(_) => self.issue(format!("selector '{selector}' has no block")),
            Stop::Eof => self.issue(format!("selector '{selector}' runs to end of input")),
        }
    }

    /// `@name prelude;` or `@name prelude { ... }`
    fn consume_at_rule(&mut self, tree: &mut DomTree, parent: NodeId) {
        let input = self.input;
        self.position += 1;
        let start = self.position;
        while self.peek().is_some_and(is_name_byte) {
            self.position += 1;
        }
        let name = &input[start..self.position];
        if name.is_empty() {
            self.issue("'@' without a name");
        }

        let statement_only = CssAtRuleData::is_statement_name(name);
        let stops: &[u8] = if statement_only {
            &[b';', b'}']
        } else {
            &[b'{', b';', b'}']
        };
        let (prelude, stop) = self.capture_until(stops);
        let mut data = CssAtRuleData::new(name, prelude.trim());
        data.has_block = stop == Stop::At(b'{');
        let at_rule = tree.alloc(NodeType::CssAtRule(data));
        tree.push_child(parent, at_rule);

        match stop {
            Stop::At(b'{') => {
                self.position += 1;
                self.consume_block_contents(tree, at_rule);
            }
            Stop::At(b';') => self.position += 1,
            Stop::At(_) => {}
            Stop::Eof => self.issue(format!("'@{name}' is not terminated")),
        }
    }

    /// `property: value` up to `;` (consumed) or `}` (left for the block).
    fn consume_declaration(&mut self, tree: &mut DomTree, owner: NodeId) {
        let (property, stop) = self.capture_until(&[b':', b';', b'}']);
        let property = property.trim();
        if stop != Stop::At(b':') {
            self.issue(format!("declaration '{property}' has no value"));
            if stop == Stop::At(b';') {
                self.position += 1;
            }
            return;
        }
        self.position += 1;
        let (value, stop) = self.capture_until(&[b';', b'}']);
        let value = value.trim();
        if stop == Stop::At(b';') {
            self.position += 1;
        }
        if property.is_empty() || value.is_empty() {
            self.issue(format!("dropped empty declaration '{property}: {value}'"));
            return;
        }
        let _ = tree.set_declaration(owner, property, value);
    }

    /// `/* ... */`, consuming to the end of input when unterminated.
    fn consume_comment(&mut self, tree: &mut DomTree, parent: NodeId) {
        let input = self.input;
        let body_start = self.position + 2;
        let rest = &input[body_start..];
        let content = if let Some(end) = rest.find("*/") {
            self.position = body_start + end + 2;
            &rest[..end]
        } else {
            self.issue("unterminated comment");
            self.position = input.len();
            rest
        };
        let comment = tree.alloc(NodeType::Comment(CommentData::new(content, CommentKind::Css)));
        tree.push_child(parent, comment);
    }

    /// Peek ahead to decide what the next block item is.
    fn classify(&self) -> BlockItem {
        let bytes = self.input.as_bytes();
        let mut depth = 0usize;
        let mut colon = false;
        let mut i = self.position;
        while let Some(&b) = bytes.get(i) {
            match b {
                b'"' | b'\'' => {
                    i = skip_string(bytes, i);
                    continue;
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    i = skip_comment(bytes, i);
                    continue;
                }
                b'(' | b'[' => depth += 1,
                b')' | b']' => depth = depth.saturating_sub(1),
                b'{' if depth == 0 => return BlockItem::NestedRule,
                b';' | b'}' if depth == 0 => break,
                b':' if depth == 0 => {
                    let doubled = bytes.get(i + 1) == Some(&b':')
                        || (i > 0 && bytes.get(i - 1) == Some(&b':'));
                    colon |= !doubled;
                }
                _ => {}
            }
            i += 1;
        }
        if colon {
            BlockItem::Declaration
        } else {
            BlockItem::Malformed
        }
    }

    /// Text from the cursor up to the first depth-zero byte in `stops`,
    /// which is left unconsumed.
    fn capture_until(&mut self, stops: &[u8]) -> (&'a str, Stop) {
        let input = self.input;
        let bytes = input.as_bytes();
        let start = self.position;
        let mut depth = 0usize;
        let mut i = start;
        while let Some(&b) = bytes.get(i) {
            if depth == 0 && stops.contains(&b) {
                self.position = i;
                return (&input[start..i], Stop::At(b));
            }
            match b {
                b'"' | b'\'' => {
                    i = skip_string(bytes, i);
                    continue;
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    i = skip_comment(bytes, i);
                    continue;
                }
                b'(' | b'[' => depth += 1,
                b')' | b']' => depth = depth.saturating_sub(1),
                _ => {}
            }
            i += 1;
        }
        self.position = bytes.len();
        (&input[start..], Stop::Eof)
    }
}

const fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b >= 0x80
}

/// Index just past the string literal opening at `start`.
fn skip_string(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while let Some(&b) = bytes.get(i) {
        if b == b'\\' {
            i += 2;
            continue;
        }
        i += 1;
        if b == quote {
            return i;
        }
    }
    bytes.len()
}

/// Index just past the comment opening at `start`.
fn skip_comment(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 2;
    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            return i + 2;
        }
        i += 1;
    }
    bytes.len()
}
