//! SOM command-line tool
//!
//! Parses HTML (or CSS) and writes it back out: serialized, as a colored node
//! tree, or as JSON, optionally narrowed to the elements matching a selector.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use owo_colors::OwoColorize;
use serde::Serialize;
use som::{load_document, parse_css, parse_document};
use som_dom::{AttrValue, DomTree, NodeId, NodeKind, NodeType};
use som_html::HtmlParser;

/// SOM - parse, query and re-serialize HTML and CSS
#[derive(Parser, Debug)]
#[command(name = "som")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Re-serialize a file (comments dropped)
    som index.html

    # Keep comments
    som --comments index.html

    # Print the node tree
    som --tree --html '<ul><li>a</li></ul>'

    # Elements matching a selector, as JSON
    som --select 'nav a:not(.active)' --json index.html

    # Lex <template> content for comments as well as <script>
    som --special-tag script --special-tag template index.html

    # Parse a stylesheet
    som --css --tree site.css
"#)]
struct Cli {
    /// Path to the input file
    #[arg(value_name = "FILE", required_unless_present = "html")]
    path: Option<PathBuf>,

    /// Parse this string instead of a file
    #[arg(long, value_name = "HTML", conflicts_with = "path")]
    html: Option<String>,

    /// Treat the input as CSS instead of HTML
    #[arg(long)]
    css: bool,

    /// Tag whose content is lexed for comments (repeatable, default: script)
    #[arg(long = "special-tag", value_name = "TAG")]
    special_tags: Vec<String>,

    /// Keep comments in serialized output
    #[arg(short, long)]
    comments: bool,

    /// Only output elements matching this selector
    #[arg(short, long, value_name = "SELECTOR")]
    select: Option<String>,

    /// Output JSON instead of markup
    #[arg(short, long, conflicts_with = "tree")]
    json: bool,

    /// Print the node tree
    #[arg(short, long)]
    tree: bool,

    /// Do not print parser warnings
    #[arg(short, long)]
    quiet: bool,
}

/// A node and its subtree in the shape written by `--json`.
#[derive(Serialize)]
struct JsonNode<'a> {
    id: NodeId,
    kind: NodeKind,
    data: &'a NodeType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<JsonNode<'a>>,
}

impl<'a> JsonNode<'a> {
    fn new(tree: &'a DomTree, id: NodeId) -> Option<Self> {
        let node = tree.get(id)?;
        Some(Self {
            id,
            kind: node.kind(),
            data: &node.node_type,
            children: node
                .children()
                .iter()
                .filter_map(|&child| Self::new(tree, child))
                .collect(),
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    som_common::set_quiet(cli.quiet);

    let tree = load_tree(&cli)?;
    let (text, matched) = output(&cli, &tree)?;
    if cli.tree {
        for &id in &matched {
            print_tree(&tree, id, 0);
        }
    } else {
        print!("{text}");
    }

    if cli.select.is_some() && matched.is_empty() && !cli.quiet {
        eprintln!("{}", "no elements matched".dimmed());
    }
    Ok(())
}

/// What goes to stdout for JSON and markup output, plus the nodes it covers.
///
/// A whole document is written exactly as serialized, so `som page.html >
/// copy.html` reproduces the input. Selected elements get one line each.
fn output(cli: &Cli, tree: &DomTree) -> Result<(String, Vec<NodeId>)> {
    let root = tree.root();
    let targets = match &cli.select {
        Some(selector) => tree.query_selector_all(root, selector),
        None => vec![root],
    };

    let text = if cli.json {
        let nodes: Vec<JsonNode<'_>> = targets
            .iter()
            .filter_map(|&id| JsonNode::new(tree, id))
            .collect();
        let json = if cli.select.is_some() {
            serde_json::to_string_pretty(&nodes)?
        } else {
            serde_json::to_string_pretty(&nodes.first())?
        };
        format!("{json}\n")
    } else if cli.select.is_some() {
        targets
            .iter()
            .map(|&id| format!("{}\n", render(tree, id, cli.comments)))
            .collect()
    } else {
        render(tree, root, cli.comments)
    };
    Ok((text, targets))
}

fn load_tree(cli: &Cli) -> Result<DomTree> {
    if cli.css {
        let css = match (&cli.html, &cli.path) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) => fs::read_to_string(path)
                .with_context(|| format!("failed to read '{}'", path.display()))?,
            (None, None) => bail!("no input: pass a FILE or --html"),
        };
        return Ok(parse_css(&css));
    }

    let parser = if cli.special_tags.is_empty() {
        HtmlParser::new()
    } else {
        HtmlParser::new().with_special_tags(cli.special_tags.iter().cloned())
    };
    let document = match (&cli.html, &cli.path) {
        (Some(html), _) => parse_document(html, &parser),
        (None, Some(path)) => load_document(path, &parser)?,
        (None, None) => bail!("no input: pass a FILE or --html"),
    };
    Ok(document.tree)
}

/// The node as markup, with its paired close tag when it has one.
fn render(tree: &DomTree, id: NodeId, include_comments: bool) -> String {
    let mut out = tree.serialize(id, include_comments);
    if let Some(close) = tree.paired_close(id) {
        out.push_str(&tree.serialize(close, include_comments));
    }
    out
}

/// Print a node and its subtree, one node per line.
fn print_tree(tree: &DomTree, id: NodeId, indent: usize) {
    let prefix = "  ".repeat(indent);
    let Some(node) = tree.get(id) else { return };
    match &node.node_type {
        NodeType::Root => println!("{prefix}{}", "Root".bold()),
        NodeType::CssRoot => println!("{prefix}{}", "CssRoot".bold()),
        NodeType::TagOpen(data) => {
            let mut line = format!("<{}", data.tag_name.cyan());
            for (name, value) in data.attrs.iter() {
                match value {
                    AttrValue::Boolean => line.push_str(&format!(" {}", name.yellow())),
                    AttrValue::Value(value) => {
                        line.push_str(&format!(" {}=\"{value}\"", name.yellow()));
                    }
                }
            }
            line.push('>');
            if data.style_block {
                line.push_str(&format!(" {}", "[style]".dimmed()));
            }
            if data.script_block {
                line.push_str(&format!(" {}", "[script]".dimmed()));
            }
            println!("{prefix}{line}");
        }
        NodeType::TagClose(name) => println!("{prefix}{}", format!("</{name}>").dimmed()),
        NodeType::Text(text) => {
            let display = text.replace('\n', "\\n").replace(' ', "\u{00B7}");
            println!("{prefix}{}", format!("\"{display}\"").green());
        }
        NodeType::Comment(comment) => println!("{prefix}{}", comment.to_source().dimmed()),
        NodeType::CssRule(rule) => {
            println!("{prefix}{}", rule.selector.magenta());
            for (property, value) in rule.declarations.iter() {
                println!("{prefix}  {}: {value}", property.blue());
            }
        }
        NodeType::CssAtRule(at_rule) => {
            println!("{prefix}{}", format!("@{} {}", at_rule.name, at_rule.params).magenta());
            for (property, value) in at_rule.declarations.iter() {
                println!("{prefix}  {}: {value}", property.blue());
            }
        }
    }
    for &child in node.children() {
        print_tree(tree, child, indent + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &[&str]) -> String {
        let cli = Cli::parse_from(std::iter::once("som").chain(args.iter().copied()));
        som_common::set_quiet(true);
        let tree = load_tree(&cli).unwrap();
        output(&cli, &tree).unwrap().0
    }

    #[test]
    fn test_document_output_has_no_added_newline() {
        let source = "<p class=\"a\">x</p><!-- c -->";
        assert_eq!(run(&["--comments", "--html", source]), source);
        assert_eq!(run(&["--html", "<br/>\n"]), "<br/>\n");
    }

    #[test]
    fn test_selected_elements_one_per_line() {
        let text = run(&["--select", "li", "--html", "<ul><li>a</li><li>b</li></ul>"]);
        assert_eq!(text, "<li>a</li>\n<li>b</li>\n");
    }

    #[test]
    fn test_json_output_names_node_kinds() {
        let text = run(&["--json", "--html", "<p>x</p>"]);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["kind"], "root");
        assert_eq!(value["children"][0]["kind"], "tag-open");
    }
}
