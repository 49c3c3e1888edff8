//! In-process render tree
//!
//! This is the platform binding the lifecycle layer renders into: a small
//! element/text tree, a tolerant markup parser, a selector engine and the
//! isolated [`RenderRoot`] each component owns.

mod parser;
mod root;
mod selector;
mod serialize;

pub use parser::{decode_entities, is_raw_text, is_void, parse_fragment};
pub use root::{Event, EventHandler, RenderRoot, Stylesheet};
pub use selector::Selector;
pub use serialize::{escape_attr, escape_text, serialize_nodes};

use std::fmt;
use std::str::FromStr;

// ─────────────────────────────────────────────────────────────────────────────
// Isolation
// ─────────────────────────────────────────────────────────────────────────────

/// Whether a component's render root is reachable from outside code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum IsolationMode {
    /// Outside code can reach the root through the host instance
    Open,
    /// Only the owning component sees the root (default)
    #[default]
    Closed,
}

impl IsolationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl FromStr for IsolationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown isolation mode: {}", other)),
        }
    }
}

impl fmt::Display for IsolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Nodes
// ─────────────────────────────────────────────────────────────────────────────

/// A node of the render tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    fn push_text_content(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => {
                for child in &e.children {
                    child.push_text_content(out);
                }
            }
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// An element with ordered attributes and children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style child append
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Builder-style text child
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(Node::Text(text.into()))
    }

    /// Attribute value; names compare ASCII case-insensitively
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_ascii_lowercase();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self
            .attributes
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))?;
        Some(self.attributes.remove(idx).1)
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|name| name == class))
    }

    /// Concatenated text of all descendants
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.push_text_content(&mut out);
        }
        out
    }

    /// Replace all children with a single text node
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![Node::Text(text.into())];
    }

    pub fn inner_html(&self) -> String {
        if is_raw_text(&self.tag) {
            return self.text_content();
        }
        serialize_nodes(&self.children)
    }

    pub fn outer_html(&self) -> String {
        serialize_nodes(std::slice::from_ref(&Node::Element(self.clone())))
    }
}

/// A detached list of nodes, produced by parsing markup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    nodes: Vec<Node>,
}

impl Fragment {
    pub fn parse(markup: &str) -> Self {
        parse_fragment(markup)
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn to_html(&self) -> String {
        serialize_nodes(&self.nodes)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tree walking (shared by the root and the sanitizer)
// ─────────────────────────────────────────────────────────────────────────────

/// Depth-first search for elements matching `selector`.
/// Each hit is reported as the index path from the top-level node list.
pub(crate) fn find_paths(nodes: &[Node], selector: &Selector, first_only: bool) -> Vec<Vec<usize>> {
    fn walk<'a>(
        nodes: &'a [Node],
        selector: &Selector,
        ancestors: &mut Vec<&'a Element>,
        path: &mut Vec<usize>,
        hits: &mut Vec<Vec<usize>>,
        first_only: bool,
    ) {
        for (idx, node) in nodes.iter().enumerate() {
            if first_only && !hits.is_empty() {
                return;
            }
            let Node::Element(element) = node else {
                continue;
            };
            path.push(idx);
            if selector.matches(element, ancestors) {
                hits.push(path.clone());
            }
            ancestors.push(element);
            walk(&element.children, selector, ancestors, path, hits, first_only);
            ancestors.pop();
            path.pop();
        }
    }

    let mut hits = Vec::new();
    walk(nodes, selector, &mut Vec::new(), &mut Vec::new(), &mut hits, first_only);
    hits
}

/// The element at `path` plus its ancestors (outermost first)
pub(crate) fn element_with_ancestors<'a>(
    nodes: &'a [Node],
    path: &[usize],
) -> Option<(&'a Element, Vec<&'a Element>)> {
    let (last, init) = path.split_last()?;
    let mut ancestors = Vec::with_capacity(init.len());
    let mut level = nodes;
    for &idx in init {
        let element = level.get(idx)?.as_element()?;
        ancestors.push(element);
        level = &element.children;
    }
    let element = level.get(*last)?.as_element()?;
    Some((element, ancestors))
}

pub(crate) fn element_at_mut<'a>(nodes: &'a mut [Node], path: &[usize]) -> Option<&'a mut Element> {
    let (first, rest) = path.split_first()?;
    let element = nodes.get_mut(*first)?.as_element_mut()?;
    if rest.is_empty() {
        Some(element)
    } else {
        element_at_mut(&mut element.children, rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_builders() {
        let el = Element::new("LI")
            .with_attr("data-id", "x")
            .with_attr("class", "row active")
            .with_text("Row");
        assert_eq!(el.tag, "li");
        assert!(el.has_class("active"));
        assert!(!el.has_class("act"));
        assert_eq!(el.outer_html(), r#"<li data-id="x" class="row active">Row</li>"#);
    }

    #[test]
    fn test_set_attr_replaces_existing() {
        let mut el = Element::new("input").with_attr("value", "a");
        el.set_attr("VALUE", "b");
        assert_eq!(el.attributes.len(), 1);
        assert_eq!(el.attr("value"), Some("b"));
        assert_eq!(el.remove_attr("value"), Some("b".to_string()));
        assert_eq!(el.attr("value"), None);
    }

    #[test]
    fn test_attr_lookup_ignores_case() {
        let mut el = Element::new("input");
        el.set_attr("Data-Tool-Id", "fs");
        assert_eq!(el.attr("DATA-TOOL-ID"), Some("fs"));
        assert_eq!(el.attr("data-tool-id"), Some("fs"));
        assert_eq!(el.remove_attr("Data-Tool-Id"), Some("fs".to_string()));
        assert!(el.attributes.is_empty());
    }

    #[test]
    fn test_isolation_mode_parse() {
        assert_eq!("OPEN".parse::<IsolationMode>(), Ok(IsolationMode::Open));
        assert_eq!(IsolationMode::default(), IsolationMode::Closed);
        assert!("sealed".parse::<IsolationMode>().is_err());
    }

    #[test]
    fn test_find_paths() {
        let fragment = Fragment::parse("<ul><li>a</li><li class=x>b</li></ul><li>c</li>");
        let sel = Selector::parse("li").unwrap();
        let hits = find_paths(fragment.nodes(), &sel, false);
        assert_eq!(hits, vec![vec![0, 0], vec![0, 1], vec![1]]);
        let first = find_paths(fragment.nodes(), &sel, true);
        assert_eq!(first, vec![vec![0, 0]]);

        let (el, ancestors) = element_with_ancestors(fragment.nodes(), &[0, 1]).unwrap();
        assert!(el.has_class("x"));
        assert_eq!(ancestors[0].tag, "ul");
    }
}
