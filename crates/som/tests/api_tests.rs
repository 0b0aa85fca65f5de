//! Tests for the top-level parse and serialize functions.

use som::dom::{CssFormat, NodeKind};
use som::html::HtmlParser;
use som::{LoadError, load_document, parse_css, parse_document, parse_html, serialize};

#[test]
fn test_parse_html_and_serialize() {
    let source = "<main>\n  <h1 class=\"t\">Hi</h1><!-- note -->\n</main>";
    let tree = parse_html(source);
    assert_eq!(serialize(&tree, tree.root(), true), source);
    assert_eq!(
        serialize(&tree, tree.root(), false),
        "<main>\n  <h1 class=\"t\">Hi</h1>\n</main>"
    );
}

#[test]
fn test_serialize_single_element() {
    let tree = parse_html("<ul><li>a</li><li>b</li></ul>");
    let second = tree.query_selector_all(tree.root(), "li")[1];
    assert_eq!(serialize(&tree, second, true), "<li>b");
    assert_eq!(tree.outer_html(second), "<li>b</li>");
    assert_eq!(tree.inner_html(second), "b");
}

#[test]
fn test_parse_css_and_format() {
    let tree = parse_css(".a { color: red; .b { margin: 0 } }");
    let root = tree.root();
    assert_eq!(tree.kind(root), Some(NodeKind::CssRoot));
    assert_eq!(
        tree.css_to_string(root, &CssFormat::default().flatten_nested(true).single_line(true)),
        ".a { color: red; } .a .b { margin: 0; }"
    );
}

#[test]
fn test_css_in_document_is_searchable() {
    let tree = parse_html(
        "<style>:root { --gap: 4px } .card { padding: var(--gap) }</style><div class=\"card\"></div>",
    );
    let root = tree.root();
    assert_eq!(tree.css_find_variable(root, "gap", None).as_deref(), Some("4px"));
    let rules = tree.css_find_rules(root, ".card", som::dom::CssRuleQuery::default());
    assert_eq!(rules.len(), 1);
    assert_eq!(tree.get_declaration(rules[0], "padding"), Some("var(--gap)"));
}

#[test]
fn test_parse_document_keeps_issues() {
    som_common::set_quiet(true);
    let parser = HtmlParser::new();
    let doc = parse_document("<p>a</span></p>", &parser);
    assert_eq!(doc.parse_issues.len(), 1);
    assert_eq!(doc.to_html(), doc.source);
}

#[test]
fn test_load_missing_file() {
    let err = load_document("/definitely/not/here.html", &HtmlParser::new()).unwrap_err();
    let LoadError::File { path, .. } = &err;
    assert!(path.ends_with("here.html"));
    assert!(err.to_string().starts_with("failed to read"));
}
