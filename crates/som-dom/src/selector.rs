//! CSS selector parsing and matching for `query_selector` and friends.
//!
//! Supported: type and `*` selectors, `#id`, `.class` (any number, all must
//! match), attribute selectors with the `= ~= |= ^= $= *=` operators, the
//! descendant and child (`>`) combinators, comma-separated lists and
//! `:not(...)`.
//!
//! Every compound of a query is matched below the search root: in `div p`
//! the `div` must itself be a descendant of the root, never the root or one
//! of its ancestors.
//!
//! `:not(inner)` is applied as a tree-wide subtraction: every element that
//! `inner` matches anywhere in the tree is removed from the result of the
//! selector it appears in, wherever in that selector the `:not` was written.
//! So `p:not(.b)` drops every `.b` element, and so does `div:not(.b) p`.
//!
//! Anything else (other pseudo-classes, pseudo-elements, the sibling
//! combinators) parses but never matches.

use std::collections::{HashSet, VecDeque};

use som_common::{Component, warn_once};

use crate::css::split_top_level;
use crate::{DomTree, ElementData, NodeId};

/// A single condition on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// `div`, compared ASCII case-insensitively.
    Type(String),
    /// `.name`
    Class(String),
    /// `#name`
    Id(String),
    /// `*`
    Universal,
    /// `[attr]`, `[attr=value]`, ...
    Attribute(AttributeSelector),
    /// `:not(list)`. Ignored while matching the compound it sits in; its
    /// list is subtracted from the final result instead.
    Not(SelectorList),
    /// Syntax that parses but cannot match here (`:hover`, `::before`, ...).
    NeverMatch,
}

/// Attribute selectors. Names compare case-insensitively, values exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeSelector {
    /// `[attr]`
    Exists(String),
    /// `[attr=value]`
    Equals(String, String),
    /// `[attr~=value]`: one of the whitespace-separated words is `value`.
    Includes(String, String),
    /// `[attr|=value]`: exactly `value`, or `value` followed by `-`.
    DashMatch(String, String),
    /// `[attr^=value]`
    PrefixMatch(String, String),
    /// `[attr$=value]`
    SuffixMatch(String, String),
    /// `[attr*=value]`
    SubstringMatch(String, String),
}

impl AttributeSelector {
    fn parse(inner: &str) -> Option<Self> {
        let Some(eq) = inner.find('=') else {
            let name = inner.trim();
            return (!name.is_empty()).then(|| Self::Exists(name.to_string()));
        };
        let (head, value) = (&inner[..eq], unquote(inner[eq + 1..].trim()).to_string());
        let (name, op) = match head.as_bytes().last() {
            Some(&op @ (b'~' | b'|' | b'^' | b'$' | b'*')) => (&head[..head.len() - 1], Some(op)),
            _ => (head, None),
        };
        let name = name.trim().to_string();
        if name.is_empty() {
            return None;
        }
        Some(match op {
            None => Self::Equals(name, value),
            Some(b'~') => Self::Includes(name, value),
            Some(b'|') => Self::DashMatch(name, value),
            Some(b'^') => Self::PrefixMatch(name, value),
            Some(b'$') => Self::SuffixMatch(name, value),
            Some(_) => Self::SubstringMatch(name, value),
        })
    }

    fn matches(&self, element: &ElementData) -> bool {
        match self {
            Self::Exists(name) => element.attr_value(name).is_some(),
            Self::Equals(name, value) => element.attr(name) == Some(value.as_str()),
            Self::Includes(name, value) => element
                .attr(name)
                .is_some_and(|v| v.split_ascii_whitespace().any(|word| word == value)),
            Self::DashMatch(name, value) => element.attr(name).is_some_and(|v| {
                v == value || v.strip_prefix(value.as_str()).is_some_and(|rest| rest.starts_with('-'))
            }),
            Self::PrefixMatch(name, value) => {
                !value.is_empty() && element.attr(name).is_some_and(|v| v.starts_with(value.as_str()))
            }
            Self::SuffixMatch(name, value) => {
                !value.is_empty() && element.attr(name).is_some_and(|v| v.ends_with(value.as_str()))
            }
            Self::SubstringMatch(name, value) => {
                !value.is_empty() && element.attr(name).is_some_and(|v| v.contains(value.as_str()))
            }
        }
    }
}

/// Simple selectors with no combinator between them; all must hold.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    /// The conditions, in source order.
    pub simple_selectors: Vec<SimpleSelector>,
}

impl CompoundSelector {
    /// Whether `element` satisfies every condition except `:not`.
    #[must_use]
    pub fn matches(&self, element: &ElementData) -> bool {
        self.simple_selectors.iter().all(|simple| match simple {
            SimpleSelector::Type(name) => element.is(name),
            SimpleSelector::Class(class) => element.has_class(class),
            SimpleSelector::Id(id) => element.id() == Some(id.as_str()),
            SimpleSelector::Universal | SimpleSelector::Not(_) => true,
            SimpleSelector::Attribute(attr) => attr.matches(element),
            SimpleSelector::NeverMatch => false,
        })
    }
}

/// The relationship between two compounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace.
    Descendant,
    /// `>`
    Child,
    /// `+`, never matches.
    NextSibling,
    /// `~`, never matches.
    SubsequentSibling,
}

/// A chain of compounds joined by combinators.
///
/// For `A > B C` the subject is `C` and `combinators` is
/// `[(Descendant, B), (Child, A)]`, ordered from the subject leftwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComplexSelector {
    /// The rightmost compound; the elements it matches are the result.
    pub subject: CompoundSelector,
    /// `(combinator, compound)` pairs going left from the subject.
    pub combinators: Vec<(Combinator, CompoundSelector)>,
}

impl ComplexSelector {
    fn parse(text: &str) -> Self {
        let mut scanner = Scanner::new(text);
        let mut compounds: Vec<CompoundSelector> = Vec::new();
        let mut between: Vec<Combinator> = Vec::new();
        let mut pending: Option<Combinator> = None;

        loop {
            scanner.skip_whitespace();
            let Some(b) = scanner.peek() else { break };
            let explicit = match b {
                b'>' => Some(Combinator::Child),
                b'+' => Some(Combinator::NextSibling),
                b'~' => Some(Combinator::SubsequentSibling),
                _ => None,
            };
            if let Some(combinator) = explicit {
                scanner.pos += 1;
                pending = Some(combinator);
                continue;
            }
            let compound = scanner.compound();
            let combinator = pending.take().unwrap_or(Combinator::Descendant);
            if !compounds.is_empty() {
                between.push(combinator);
            }
            compounds.push(compound);
        }

        let Some(subject) = compounds.pop() else {
            return Self {
                subject: CompoundSelector {
                    simple_selectors: vec![SimpleSelector::NeverMatch],
                },
                combinators: Vec::new(),
            };
        };
        let combinators = between.into_iter().rev().zip(compounds.into_iter().rev()).collect();
        Self {
            subject,
            combinators,
        }
    }

    /// Whether `id` matches, ignoring any `:not` parts.
    ///
    /// With a `scope`, the compounds left of the subject may only match
    /// strict descendants of it, so `div p` searched under a `div` does not
    /// use that `div` (or anything above it) for the `div` part.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, id: NodeId, scope: Option<NodeId>) -> bool {
        tree.as_element(id)
            .is_some_and(|element| self.subject.matches(element))
            && self.matches_from(tree, id, scope, 0)
    }

    fn matches_from(&self, tree: &DomTree, id: NodeId, scope: Option<NodeId>, step: usize) -> bool {
        let Some((combinator, compound)) = self.combinators.get(step) else {
            return true;
        };
        let fits = |candidate: NodeId| {
            tree.as_element(candidate)
                .is_some_and(|element| compound.matches(element))
                && self.matches_from(tree, candidate, scope, step + 1)
        };
        let in_scope = |candidate: &NodeId| Some(*candidate) != scope;
        match combinator {
            Combinator::Child => tree.parent(id).filter(in_scope).is_some_and(fits),
            Combinator::Descendant => tree.ancestors(id).take_while(in_scope).any(fits),
            Combinator::NextSibling | Combinator::SubsequentSibling => false,
        }
    }

    /// Every `:not(...)` list written anywhere in this selector.
    fn negations(&self) -> impl Iterator<Item = &SelectorList> {
        std::iter::once(&self.subject)
            .chain(self.combinators.iter().map(|(_, compound)| compound))
            .flat_map(|compound| &compound.simple_selectors)
            .filter_map(|simple| match simple {
                SimpleSelector::Not(list) => Some(list),
                _ => None,
            })
    }
}

/// A comma-separated selector list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectorList {
    /// The alternatives; an element matching any of them is selected.
    pub selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    /// Parse a selector list. Never fails: unsupported parts become
    /// never-matching conditions and an empty input matches nothing.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self {
            selectors: split_top_level(text, b',')
                .into_iter()
                .map(ComplexSelector::parse)
                .collect(),
        }
    }
}

/// Byte cursor over one complex selector. All syntax is ASCII, so slicing at
/// ASCII delimiters always lands on a char boundary.
struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    const fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn ident(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_byte) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    /// Text up to the byte that closes the group opened just before the
    /// cursor, with quotes and nesting respected. The cursor ends past it.
    fn group(&mut self, open: u8, close: u8) -> &'a str {
        let bytes = self.src.as_bytes();
        let start = self.pos;
        let mut depth = 1usize;
        let mut quote: Option<u8> = None;
        while let Some(&b) = bytes.get(self.pos) {
            self.pos += 1;
            if let Some(q) = quote {
                if b == b'\\' {
                    self.pos += 1;
                } else if b == q {
                    quote = None;
                }
                continue;
            }
            match b {
                b'"' | b'\'' => quote = Some(b),
                _ if b == open => depth += 1,
                _ if b == close => {
                    depth -= 1;
                    if depth == 0 {
                        return &self.src[start..self.pos - 1];
                    }
                }
                _ => {}
            }
        }
        self.pos = self.pos.min(bytes.len());
        &self.src[start..]
    }

    fn compound(&mut self) -> CompoundSelector {
        let mut simple_selectors = Vec::new();
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || matches!(b, b'>' | b'+' | b'~') {
                break;
            }
            let simple = match b {
                b'*' => {
                    self.pos += 1;
                    SimpleSelector::Universal
                }
                b'#' | b'.' => {
                    self.pos += 1;
                    let name = self.ident();
                    if name.is_empty() {
                        SimpleSelector::NeverMatch
                    } else if b == b'#' {
                        SimpleSelector::Id(name.to_string())
                    } else {
                        SimpleSelector::Class(name.to_string())
                    }
                }
                b'[' => {
                    self.pos += 1;
                    let inner = self.group(b'[', b']');
                    AttributeSelector::parse(inner).map_or_else(
                        || unsupported(inner),
                        SimpleSelector::Attribute,
                    )
                }
                b':' => self.pseudo(),
                _ if is_ident_byte(b) => SimpleSelector::Type(self.ident().to_string()),
                _ => {
                    self.pos += 1;
                    unsupported(&self.src[self.pos - 1..self.pos])
                }
            };
            simple_selectors.push(simple);
        }
        CompoundSelector { simple_selectors }
    }

    fn pseudo(&mut self) -> SimpleSelector {
        let start = self.pos;
        self.pos += 1;
        let pseudo_element = self.peek() == Some(b':');
        if pseudo_element {
            self.pos += 1;
        }
        let name = self.ident();
        if self.peek() == Some(b'(') {
            self.pos += 1;
            let inner = self.group(b'(', b')');
            if !pseudo_element && name.eq_ignore_ascii_case("not") {
                return SimpleSelector::Not(SelectorList::parse(inner));
            }
        }
        unsupported(&self.src[start..self.pos])
    }
}

pub(crate) const fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b >= 0x80
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(&q @ (b'"' | b'\'')), Some(&end)) if bytes.len() >= 2 && q == end => {
            &value[1..value.len() - 1]
        }
        _ => value,
    }
}

fn unsupported(text: &str) -> SimpleSelector {
    warn_once(
        Component::Selector,
        &format!("unsupported selector syntax '{text}' never matches"),
    );
    SimpleSelector::NeverMatch
}

/// `tag-open` nodes below `root` in breadth-first order, `root` itself
/// included when asked for and when it is an element.
fn elements_breadth_first(tree: &DomTree, root: NodeId, include_root: bool) -> Vec<NodeId> {
    let mut found = Vec::new();
    if include_root && tree.as_element(root).is_some() {
        found.push(root);
    }
    let mut queue: VecDeque<NodeId> = tree.children(root).iter().copied().collect();
    while let Some(id) = queue.pop_front() {
        if tree.as_element(id).is_some() {
            found.push(id);
        }
        queue.extend(tree.children(id).iter().copied());
    }
    found
}

impl DomTree {
    /// Elements below `root` matching `selector`, breadth-first, each once.
    ///
    /// `root` itself is never part of the result. See the module docs for
    /// how `:not` applies.
    #[must_use]
    pub fn query_selector_all(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        self.select(root, &SelectorList::parse(selector), false)
    }

    /// The first element that [`DomTree::query_selector_all`] would return.
    #[must_use]
    pub fn query_selector(&self, root: NodeId, selector: &str) -> Option<NodeId> {
        self.query_selector_all(root, selector).into_iter().next()
    }

    fn select(&self, root: NodeId, list: &SelectorList, include_root: bool) -> Vec<NodeId> {
        let top = self.top(root);
        // `:not` lists are matched from the top with the top included, so
        // nothing above a candidate is out of reach there.
        let scope = (!include_root).then_some(root);
        let excluded: Vec<HashSet<NodeId>> = list
            .selectors
            .iter()
            .map(|complex| {
                complex
                    .negations()
                    .flat_map(|inner| self.select(top, inner, true))
                    .collect()
            })
            .collect();

        elements_breadth_first(self, root, include_root)
            .into_iter()
            .filter(|&id| {
                list.selectors
                    .iter()
                    .zip(&excluded)
                    .any(|(complex, excluded)| {
                        !excluded.contains(&id) && complex.matches(self, id, scope)
                    })
            })
            .collect()
    }
}
