//! Tolerant markup parser
//!
//! Turns a template body into a detached [`Fragment`]. Like a browser's
//! fragment parser it never fails: stray closing tags are ignored, unclosed
//! elements are closed at end of input, and comments/doctypes are dropped.

use super::{Element, Fragment, Node};

/// Elements that never have children or a closing tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose body is raw text (no nested markup, no entity decoding)
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea"];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

/// Parse markup into a detached fragment
pub fn parse_fragment(input: &str) -> Fragment {
    let mut parser = MarkupParser {
        src: input,
        pos: 0,
        roots: Vec::new(),
        open: Vec::new(),
    };
    parser.run();
    Fragment::from_nodes(parser.roots)
}

struct MarkupParser<'a> {
    src: &'a str,
    pos: usize,
    roots: Vec<Node>,
    open: Vec<Element>,
}

impl<'a> MarkupParser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn run(&mut self) {
        while self.pos < self.src.len() {
            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.skip_past("-->");
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                self.skip_past(">");
            } else if rest.starts_with("</") {
                self.close_tag();
            } else if rest.starts_with('<')
                && rest[1..].chars().next().is_some_and(|c| c.is_ascii_alphabetic())
            {
                self.open_tag();
            } else {
                self.text();
            }
        }

        while let Some(element) = self.open.pop() {
            self.append(Node::Element(element));
        }
    }

    fn append(&mut self, node: Node) {
        let siblings = match self.open.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut self.roots,
        };
        // Adjacent text runs collapse into one node
        if let (Node::Text(text), Some(Node::Text(prev))) = (&node, siblings.last_mut()) {
            prev.push_str(text);
            return;
        }
        siblings.push(node);
    }

    fn skip_past(&mut self, terminator: &str) {
        match self.rest().find(terminator) {
            Some(idx) => self.pos += idx + terminator.len(),
            None => self.pos = self.src.len(),
        }
    }

    fn text(&mut self) {
        let rest = self.rest();
        // A lone '<' that does not start a tag is literal text
        let skip = usize::from(rest.starts_with('<'));
        let end = rest[skip..].find('<').map(|i| i + skip).unwrap_or(rest.len());
        let raw = &rest[..end];
        self.pos += end;
        if !raw.is_empty() {
            self.append(Node::Text(decode_entities(raw)));
        }
    }

    fn close_tag(&mut self) {
        let rest = self.rest();
        let end = rest.find('>').unwrap_or(rest.len());
        let name = rest[2..end].trim().to_ascii_lowercase();
        self.pos += (end + 1).min(rest.len());

        // Stray end tags are ignored; otherwise close everything above the match
        if let Some(idx) = self.open.iter().rposition(|e| e.tag == name) {
            while self.open.len() > idx {
                if let Some(element) = self.open.pop() {
                    self.append(Node::Element(element));
                }
            }
        }
    }

    fn open_tag(&mut self) {
        self.pos += 1;
        let name = self.take_while(|c| !c.is_whitespace() && c != '>' && c != '/');
        let mut element = Element::new(name.to_ascii_lowercase());
        let self_closing = self.attributes(&mut element);

        if is_void(&element.tag) || self_closing {
            self.append(Node::Element(element));
        } else if is_raw_text(&element.tag) {
            let body = self.raw_text_body(&element.tag);
            if !body.is_empty() {
                element.children.push(Node::Text(body));
            }
            self.append(Node::Element(element));
        } else {
            self.open.push(element);
        }
    }

    /// Parse attributes up to the end of the start tag.
    /// Returns true when the tag was written self-closing (`/>`).
    fn attributes(&mut self, element: &mut Element) -> bool {
        loop {
            self.take_while(char::is_whitespace);
            let rest = self.rest();
            if rest.is_empty() {
                return false;
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                return true;
            }
            if rest.starts_with('>') {
                self.pos += 1;
                return false;
            }
            if rest.starts_with('/') {
                self.pos += 1;
                continue;
            }

            let name = self
                .take_while(|c| !c.is_whitespace() && c != '=' && c != '>' && c != '/')
                .to_ascii_lowercase();
            self.take_while(char::is_whitespace);

            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.take_while(char::is_whitespace);
                self.attribute_value()
            } else {
                String::new()
            };

            if !name.is_empty() && element.attr(&name).is_none() {
                element.attributes.push((name, value));
            }
        }
    }

    fn attribute_value(&mut self) -> String {
        let rest = self.rest();
        match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &rest[1..];
                let end = body.find(quote).unwrap_or(body.len());
                self.pos += 1 + end + usize::from(end < body.len());
                decode_entities(&body[..end])
            }
            _ => {
                let raw = self.take_while(|c| !c.is_whitespace() && c != '>');
                decode_entities(raw)
            }
        }
    }

    fn raw_text_body(&mut self, tag: &str) -> String {
        let rest = self.rest();
        let closing = format!("</{}", tag);
        let end = rest
            .to_ascii_lowercase()
            .find(&closing)
            .unwrap_or(rest.len());
        let body = rest[..end].to_string();
        self.pos += end;
        if self.pos < self.src.len() {
            self.skip_past(">");
        }
        body
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let end = rest
            .char_indices()
            .find(|&(_, c)| !pred(c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }
}

/// Decode the character references templates actually use
pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];

        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_reference(&rest[1..semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" | "#39" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(|c: char| c == 'x' || c == 'X') {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_element(fragment: &Fragment) -> &Element {
        match fragment.nodes() {
            [Node::Element(e)] => e,
            other => panic!("expected a single element, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_nested_elements() {
        let fragment = parse_fragment(r#"<div id="main" class="card wide"><p>hi <b>there</b></p></div>"#);
        let div = only_element(&fragment);
        assert_eq!(div.tag, "div");
        assert_eq!(div.attr("id"), Some("main"));
        assert!(div.has_class("wide"));
        assert_eq!(div.text_content(), "hi there");
    }

    #[test]
    fn test_void_and_self_closing() {
        let fragment = parse_fragment(r#"<form><input id="a" disabled><br/><span/>x</form>"#);
        let form = only_element(&fragment);
        assert_eq!(form.children.len(), 4);
        let input = form.children[0].as_element().unwrap();
        assert_eq!(input.attr("disabled"), Some(""));
        assert!(input.children.is_empty());
    }

    #[test]
    fn test_unclosed_and_stray_tags() {
        let fragment = parse_fragment("<ul><li>one<li>two</span></ul><p>tail");
        assert_eq!(fragment.nodes().len(), 2);
        let p = fragment.nodes()[1].as_element().unwrap();
        assert_eq!(p.tag, "p");
        assert_eq!(p.text_content(), "tail");
    }

    #[test]
    fn test_comments_and_doctype_dropped() {
        let fragment = parse_fragment("<!DOCTYPE html><!-- note --><p>x</p>");
        assert_eq!(only_element(&fragment).tag, "p");
    }

    #[test]
    fn test_raw_text_body_kept_verbatim() {
        let fragment = parse_fragment("<style>a > b { color: red; }</style>");
        let style = only_element(&fragment);
        assert_eq!(style.text_content(), "a > b { color: red; }");
    }

    #[test]
    fn test_entities_decoded() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt; &#65;&#x42;"), "a & b <c> AB");
        assert_eq!(decode_entities("R&D &unknown; done"), "R&D &unknown; done");
    }

    #[test]
    fn test_lone_angle_bracket_is_text() {
        let fragment = parse_fragment("1 < 2");
        assert_eq!(fragment.nodes(), &[Node::Text("1 < 2".to_string())]);
    }

    #[test]
    fn test_uppercase_tags_normalized() {
        let fragment = parse_fragment("<DIV CLASS=box>x</DIV>");
        let div = only_element(&fragment);
        assert_eq!(div.tag, "div");
        assert_eq!(div.attr("class"), Some("box"));
    }
}
