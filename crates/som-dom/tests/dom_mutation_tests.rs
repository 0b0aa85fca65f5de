//! Tests for structural mutation: append_child, insert_before, insert_after,
//! replace_with, remove, create_element and insert_adjacent_html.

use som_dom::{
    AttributesMap, DomTree, ElementData, FragmentParser, NodeContent, NodeId, NodeType, SomError,
};

/// Append an element pair (`<tag>` then `</tag>`) to `parent`, returning the open.
fn element(tree: &mut DomTree, parent: NodeId, tag: &str) -> NodeId {
    let open = tree.alloc(NodeType::TagOpen(ElementData::new(tag)));
    let close = tree.alloc(NodeType::TagClose(tag.to_string()));
    tree.push_child(parent, open);
    tree.push_child(parent, close);
    open
}

fn text(tree: &mut DomTree, parent: NodeId, content: &str) -> NodeId {
    let id = tree.alloc(NodeType::Text(content.to_string()));
    tree.push_child(parent, id);
    id
}

fn html(tree: &DomTree) -> String {
    tree.serialize(NodeId::ROOT, true)
}

/// Appends each fragment as a single text node, standing in for a real
/// markup parser.
#[derive(Debug)]
struct TextParser;

impl FragmentParser for TextParser {
    fn parse_into(&self, tree: &mut DomTree, container: NodeId, markup: &str) {
        let _ = text(tree, container, markup);
    }
}

// ========== append_child ==========

#[test]
fn test_append_moves_element_with_leading_whitespace() {
    let mut tree = DomTree::new();
    let ul = element(&mut tree, NodeId::ROOT, "ul");
    let _ = text(&mut tree, ul, "\n  ");
    let a = element(&mut tree, ul, "a");
    let _ = text(&mut tree, ul, "\n  ");
    let _ = element(&mut tree, ul, "b");
    let _ = text(&mut tree, ul, "\n");

    tree.append_child(ul, &[a]).unwrap();

    assert_eq!(html(&tree), "<ul>\n  <b></b>\n\n  <a></a></ul>");
}

#[test]
fn test_append_last_child_is_a_no_op() {
    let mut tree = DomTree::new();
    let div = element(&mut tree, NodeId::ROOT, "div");
    let _ = text(&mut tree, div, " ");
    let p = element(&mut tree, div, "p");
    let before = html(&tree);

    tree.append_child(div, &[p]).unwrap();

    assert_eq!(html(&tree), before);
    let visits = tree.traverse(NodeId::ROOT).filter(|&id| id == p).count();
    assert_eq!(visits, 1);
}

#[test]
fn test_append_same_node_twice_moves_it_once() {
    let mut tree = DomTree::new();
    let div = element(&mut tree, NodeId::ROOT, "div");
    let a = text(&mut tree, NodeId::ROOT, "a");

    tree.append_child(div, &[a, a]).unwrap();

    assert_eq!(tree.children(div), &[a]);
    assert_eq!(html(&tree), "<div>a</div>");
}

#[test]
fn test_append_by_close_tag_moves_the_element() {
    let mut tree = DomTree::new();
    let target = element(&mut tree, NodeId::ROOT, "section");
    let p = element(&mut tree, NodeId::ROOT, "p");
    let p_close = tree.next_sibling(p).unwrap();

    tree.append_child(target, &[p_close]).unwrap();

    assert_eq!(html(&tree), "<section><p></p></section>");
}

#[test]
fn test_append_into_void_element_fails() {
    let mut tree = DomTree::new();
    let br = tree.alloc(NodeType::TagOpen(ElementData::new("br")));
    tree.push_child(NodeId::ROOT, br);
    let t = tree.create_text("x");

    let err = tree.append_child(br, &[t]).unwrap_err();
    assert!(matches!(err, SomError::InvalidOperationForElementKind { .. }));
}

#[test]
fn test_append_into_own_subtree_fails() {
    let mut tree = DomTree::new();
    let outer = element(&mut tree, NodeId::ROOT, "div");
    let inner = element(&mut tree, outer, "span");

    assert_eq!(
        tree.append_child(inner, &[outer]),
        Err(SomError::CyclicInsertion(outer))
    );
}

// ========== insert_before / insert_after ==========

#[test]
fn test_insert_before_close_anchor_goes_before_open() {
    let mut tree = DomTree::new();
    let div = element(&mut tree, NodeId::ROOT, "div");
    let close = tree.next_sibling(div).unwrap();
    let t = tree.create_text("x");

    tree.insert_before(close, &[t]).unwrap();

    assert_eq!(html(&tree), "x<div></div>");
}

#[test]
fn test_insert_after_open_anchor_goes_after_close() {
    let mut tree = DomTree::new();
    let div = element(&mut tree, NodeId::ROOT, "div");
    let _ = text(&mut tree, NodeId::ROOT, "tail");
    let a = tree.create_text("1");
    let b = tree.create_text("2");

    tree.insert_after(div, &[a, b]).unwrap();

    assert_eq!(html(&tree), "<div></div>12tail");
}

#[test]
fn test_insert_after_moves_earlier_sibling_forward() {
    let mut tree = DomTree::new();
    let a = element(&mut tree, NodeId::ROOT, "a");
    let _ = text(&mut tree, NodeId::ROOT, " ");
    let b = element(&mut tree, NodeId::ROOT, "b");

    tree.insert_after(b, &[a]).unwrap();

    assert_eq!(html(&tree), " <b></b><a></a>");
}

#[test]
fn test_insert_before_moves_later_sibling_back() {
    let mut tree = DomTree::new();
    let a = element(&mut tree, NodeId::ROOT, "a");
    let _ = text(&mut tree, NodeId::ROOT, "\n");
    let b = element(&mut tree, NodeId::ROOT, "b");

    tree.insert_before(a, &[b]).unwrap();

    assert_eq!(html(&tree), "\n<b></b><a></a>");
}

#[test]
fn test_insert_on_detached_anchor_fails() {
    let mut tree = DomTree::new();
    let lonely = tree.create_text("x");
    let t = tree.create_text("y");
    assert_eq!(tree.insert_before(lonely, &[t]), Err(SomError::NoParent(lonely)));
    assert_eq!(tree.insert_after(lonely, &[t]), Err(SomError::NoParent(lonely)));
}

// ========== replace_with ==========

#[test]
fn test_replace_with_descendant_keeps_only_inner() {
    let mut tree = DomTree::new();
    let outer = element(&mut tree, NodeId::ROOT, "div");
    let _ = text(&mut tree, outer, "before");
    let inner = element(&mut tree, outer, "span");
    let _ = text(&mut tree, inner, "keep");
    let _ = text(&mut tree, outer, "after");

    tree.replace_with(outer, &[inner]).unwrap();

    assert_eq!(html(&tree), "<span>keep</span>");
    assert_eq!(tree.parent(outer), None);
    assert_eq!(tree.parent(inner), Some(NodeId::ROOT));
}

#[test]
fn test_replace_with_several_nodes() {
    let mut tree = DomTree::new();
    let _ = text(&mut tree, NodeId::ROOT, "<");
    let old = element(&mut tree, NodeId::ROOT, "old");
    let _ = text(&mut tree, NodeId::ROOT, ">");
    let created = tree
        .create_element("new", AttributesMap::new(), "n")
        .unwrap();
    let extra = tree.create_text("!");
    let mut nodes = created.nodes();
    nodes.push(extra);

    tree.replace_with(old, &nodes).unwrap();

    assert_eq!(html(&tree), "<<new>n</new>!>");
}

#[test]
fn test_replace_with_ancestor_fails() {
    let mut tree = DomTree::new();
    let outer = element(&mut tree, NodeId::ROOT, "div");
    let inner = element(&mut tree, outer, "span");
    assert_eq!(
        tree.replace_with(inner, &[outer]),
        Err(SomError::CyclicInsertion(outer))
    );
}

// ========== remove ==========

#[test]
fn test_remove_open_takes_close() {
    let mut tree = DomTree::new();
    let _ = text(&mut tree, NodeId::ROOT, "a");
    let div = element(&mut tree, NodeId::ROOT, "div");
    let _ = text(&mut tree, NodeId::ROOT, "b");

    tree.remove(div).unwrap();

    assert_eq!(html(&tree), "ab");
    assert_eq!(tree.parent(div), None);
}

#[test]
fn test_remove_close_takes_open() {
    let mut tree = DomTree::new();
    let div = element(&mut tree, NodeId::ROOT, "div");
    let close = tree.next_sibling(div).unwrap();

    tree.remove(close).unwrap();

    assert!(tree.children(NodeId::ROOT).is_empty());
    assert_eq!(tree.parent(div), None);
}

#[test]
fn test_remove_detached_is_a_no_op() {
    let mut tree = DomTree::new();
    let t = tree.create_text("x");
    assert_eq!(tree.remove(t), Ok(()));
}

// ========== create_element ==========

#[test]
fn test_create_void_element_has_no_close() {
    let mut tree = DomTree::new();
    let img = tree
        .create_element("img", AttributesMap::new(), NodeContent::Empty)
        .unwrap();
    assert_eq!(img.close, None);
    assert_eq!(img.nodes(), vec![img.open]);
}

#[test]
fn test_create_element_with_node_content() {
    let mut tree = DomTree::new();
    let t = text(&mut tree, NodeId::ROOT, "moved");
    let attrs: AttributesMap = [("class", "x".into())].into_iter().collect();
    let em = tree.create_element("em", attrs, t).unwrap();
    tree.append_child(NodeId::ROOT, &em.nodes()).unwrap();

    assert_eq!(html(&tree), "<em class=\"x\">moved</em>");
}

// ========== insert_adjacent_html ==========

#[test]
fn test_insert_adjacent_positions() {
    let mut tree = DomTree::new();
    tree.set_parser(std::rc::Rc::new(TextParser));
    let div = element(&mut tree, NodeId::ROOT, "div");
    let _ = text(&mut tree, div, "mid");

    let _ = tree.insert_adjacent_html(div, "beforebegin", "1").unwrap();
    let _ = tree.insert_adjacent_html(div, "afterbegin", "2").unwrap();
    let _ = tree.insert_adjacent_html(div, "beforeend", "3").unwrap();
    let inserted = tree.insert_adjacent_html(div, "AfterEnd", "4").unwrap();

    assert_eq!(html(&tree), "1<div>2mid3</div>4");
    assert_eq!(inserted.len(), 1);
    assert_eq!(tree.parent(inserted[0]), Some(NodeId::ROOT));
}

#[test]
fn test_insert_adjacent_errors() {
    let mut tree = DomTree::new();
    let div = element(&mut tree, NodeId::ROOT, "div");
    assert_eq!(
        tree.insert_adjacent_html(div, "beforeend", "x"),
        Err(SomError::ParserUnavailable)
    );

    tree.set_parser(std::rc::Rc::new(TextParser));
    assert_eq!(
        tree.insert_adjacent_html(div, "middle", "x"),
        Err(SomError::InvalidPosition("middle".to_string()))
    );

    let detached = tree.create_text("t");
    assert_eq!(
        tree.insert_adjacent_html(detached, "afterend", "x"),
        Err(SomError::NoParent(detached))
    );
    assert!(matches!(
        tree.insert_adjacent_html(detached, "afterbegin", "x"),
        Err(SomError::InvalidOperationForElementKind { .. })
    ));

    let hr = tree.alloc(NodeType::TagOpen(ElementData::new("hr")));
    tree.push_child(NodeId::ROOT, hr);
    assert!(matches!(
        tree.insert_adjacent_html(hr, "beforeend", "x"),
        Err(SomError::InvalidOperationForElementKind { .. })
    ));
}
