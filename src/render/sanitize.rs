//! Allow-list HTML sanitizer
//!
//! Markup is parsed with the render-tree parser and rebuilt from allowed
//! parts only:
//!
//! - executable or document-level elements are dropped with their content
//! - unknown elements are unwrapped (their children are kept)
//! - event handler and unlisted attributes are dropped
//! - URL attributes with a script-capable scheme are dropped

use regex::Regex;
use std::sync::OnceLock;

use crate::dom::{serialize_nodes, Element, Fragment, Node};

/// Removed together with everything inside them
const DROPPED: &[&str] = &[
    "script", "style", "iframe", "frame", "frameset", "object", "embed", "applet", "link", "meta",
    "base", "noscript", "template", "form", "textarea", "select", "button", "svg", "math",
];

const ALLOWED_TAGS: &[&str] = &[
    "a", "abbr", "article", "b", "blockquote", "br", "caption", "cite", "code", "col", "colgroup",
    "dd", "del", "details", "div", "dl", "dt", "em", "figcaption", "figure", "footer", "h1", "h2",
    "h3", "h4", "h5", "h6", "header", "hr", "i", "img", "input", "ins", "kbd", "li", "mark", "ol",
    "p", "pre", "q", "s", "section", "small", "span", "strong", "sub", "summary", "sup", "table",
    "tbody", "td", "tfoot", "th", "thead", "tr", "u", "ul",
];

const ALLOWED_ATTRS: &[&str] = &[
    "align", "alt", "checked", "cite", "class", "colspan", "datetime", "dir", "disabled", "height",
    "href", "id", "lang", "open", "rel", "rowspan", "src", "start", "target", "title", "type",
    "width",
];

const URL_ATTRS: &[&str] = &["href", "src", "cite"];

fn script_scheme() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^(javascript|vbscript|data):").expect("static pattern"))
}

/// Whether a URL may appear in `href`/`src`
///
/// Whitespace and control characters are ignored when reading the scheme,
/// matching how browsers normalize it.
pub fn is_safe_url(url: &str) -> bool {
    let compact: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();
    !script_scheme().is_match(&compact)
}

/// Sanitize an HTML fragment and serialize the result
pub fn sanitize(markup: &str) -> String {
    serialize_nodes(&sanitize_nodes(Fragment::parse(markup).into_nodes()))
}

/// Sanitize already parsed nodes
pub fn sanitize_nodes(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        clean_into(node, &mut out);
    }
    out
}

fn clean_into(node: Node, out: &mut Vec<Node>) {
    let element = match node {
        Node::Text(text) => {
            out.push(Node::Text(text));
            return;
        }
        Node::Element(element) => element,
    };

    let tag = element.tag.as_str();
    if DROPPED.contains(&tag) {
        return;
    }
    if !ALLOWED_TAGS.contains(&tag) {
        for child in element.children {
            clean_into(child, out);
        }
        return;
    }
    if tag == "input" && element.attr("type") != Some("checkbox") {
        return;
    }

    let Element {
        tag,
        attributes,
        children,
    } = element;
    let mut clean = Element::new(tag);
    for (name, value) in attributes {
        if !ALLOWED_ATTRS.contains(&name.as_str()) {
            continue;
        }
        if URL_ATTRS.contains(&name.as_str()) && !is_safe_url(&value) {
            continue;
        }
        clean.set_attr(name, value);
    }
    if clean.tag == "a" && clean.attr("target").is_some() {
        clean.set_attr("rel", "noopener noreferrer");
    }
    clean.children = sanitize_nodes(children);
    out.push(Node::Element(clean));
}
