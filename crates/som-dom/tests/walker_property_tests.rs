//! Property tests for the tree walker and for append idempotence, over
//! randomly shaped trees.

use std::collections::HashSet;

use quickcheck_macros::quickcheck;
use som_dom::{CommentKind, DomTree, ElementData, NodeId, NodeType};

/// Build a tree from a byte script: 0 adds text, 1 opens an element, 2 closes
/// the innermost open element, 3 adds a comment, 4 adds whitespace.
fn build(script: &[u8]) -> DomTree {
    let mut tree = DomTree::new();
    let mut open: Vec<NodeId> = Vec::new();
    let insertion = |open: &[NodeId]| open.last().copied().unwrap_or(NodeId::ROOT);

    for (i, &op) in script.iter().enumerate() {
        let parent = insertion(&open);
        match op % 5 {
            0 => {
                let id = tree.create_text(format!("t{i}"));
                tree.push_child(parent, id);
            }
            1 => {
                let id = tree.alloc(NodeType::TagOpen(ElementData::new("div")));
                tree.push_child(parent, id);
                open.push(id);
            }
            2 => close(&mut tree, &mut open),
            3 => {
                let id = tree.create_comment(format!("c{i}"), CommentKind::HtmlComment);
                tree.push_child(parent, id);
            }
            _ => {
                let id = tree.create_text("\n  ");
                tree.push_child(parent, id);
            }
        }
    }
    while !open.is_empty() {
        close(&mut tree, &mut open);
    }
    tree
}

fn close(tree: &mut DomTree, open: &mut Vec<NodeId>) {
    if let Some(element) = open.pop() {
        let parent = open.last().copied().unwrap_or(NodeId::ROOT);
        let id = tree.alloc(NodeType::TagClose("div".into()));
        tree.push_child(parent, id);
        debug_assert_eq!(tree.prev_sibling(id), Some(element));
    }
}

fn attached(tree: &DomTree) -> HashSet<NodeId> {
    tree.traverse(NodeId::ROOT).collect()
}

#[quickcheck]
fn walk_visits_every_node_once(script: Vec<u8>) -> bool {
    let tree = build(&script);
    let visited: Vec<NodeId> = tree.traverse(NodeId::ROOT).collect();
    let unique: HashSet<NodeId> = visited.iter().copied().collect();
    // Everything except the root itself is in the arena and attached.
    unique.len() == visited.len() && visited.len() == tree.len() - 1
}

#[quickcheck]
fn walk_survives_removing_yielded_nodes(script: Vec<u8>, every: u8) -> bool {
    let mut tree = build(&script);
    let every = usize::from(every % 4) + 2;
    let mut walker = tree.walker(NodeId::ROOT);
    let mut seen = HashSet::new();
    let mut step = 0usize;

    while let Some(id) = walker.next_node(&tree) {
        if !seen.insert(id) {
            return false;
        }
        step += 1;
        if step % every == 0 {
            tree.remove(id).unwrap();
        }
    }
    // Whatever is still attached must have been visited.
    attached(&tree).is_subset(&seen)
}

#[quickcheck]
fn append_of_last_child_keeps_output(script: Vec<u8>) -> bool {
    let mut tree = build(&script);
    let Some(last) = tree.last_child(NodeId::ROOT) else {
        return true;
    };
    let before = tree.serialize(NodeId::ROOT, true);
    tree.append_child(NodeId::ROOT, &[last]).unwrap();
    let count = tree.traverse(NodeId::ROOT).filter(|&id| id == last).count();
    tree.serialize(NodeId::ROOT, true) == before && count == 1
}
