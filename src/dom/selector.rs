//! Subset of CSS selectors used by the views
//!
//! Supports compound selectors (`tag#id.class[attr]`, `[attr=value]`)
//! joined by descendant combinators (whitespace).

use super::Element;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

impl Compound {
    fn parse(src: &str) -> Option<Self> {
        let mut compound = Compound::default();
        let mut rest = src;

        let tag_end = rest.find(&['#', '.', '['][..]).unwrap_or(rest.len());
        let tag = &rest[..tag_end];
        if !tag.is_empty() && tag != "*" {
            compound.tag = Some(tag.to_ascii_lowercase());
        }
        rest = &rest[tag_end..];

        while let Some(marker) = rest.chars().next() {
            match marker {
                '#' | '.' => {
                    let body = &rest[1..];
                    let end = body.find(&['#', '.', '['][..]).unwrap_or(body.len());
                    let name = &body[..end];
                    if name.is_empty() {
                        return None;
                    }
                    if marker == '#' {
                        compound.id = Some(name.to_string());
                    } else {
                        compound.classes.push(name.to_string());
                    }
                    rest = &body[end..];
                }
                '[' => {
                    let end = bracket_end(rest)?;
                    let body = &rest[1..end];
                    let attr = match body.split_once('=') {
                        Some((name, value)) => (name.trim().to_ascii_lowercase(), Some(unquote(value.trim())?)),
                        None => (body.trim().to_ascii_lowercase(), None),
                    };
                    if attr.0.is_empty() {
                        return None;
                    }
                    compound.attrs.push(attr);
                    rest = &rest[end + 1..];
                }
                _ => return None,
            }
        }

        Some(compound)
    }

    fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if &element.tag != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.id() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| element.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|(name, expected)| match (element.attr(name), expected) {
            (Some(actual), Some(expected)) => actual == expected,
            (Some(_), None) => true,
            (None, _) => false,
        })
    }
}

/// Index of the `]` closing the attribute block `rest` starts with,
/// skipping brackets inside quoted values
fn bracket_end(rest: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in rest.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, ']') => return Some(i),
            (None, _) => {}
        }
    }
    None
}

/// Attribute value with its surrounding quotes removed
fn unquote(value: &str) -> Option<String> {
    match value.chars().next() {
        Some(q @ ('"' | '\'')) => {
            let inner = value[1..].strip_suffix(q)?;
            Some(inner.to_string())
        }
        _ => Some(value.to_string()),
    }
}

/// Split on whitespace outside attribute blocks and quoted values.
/// `None` if a block or quote is left open.
fn split_compounds(src: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut start = None;
    let mut in_block = false;
    let mut quote = None;
    for (i, c) in src.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') if in_block => quote = Some(c),
            (None, '[') => in_block = true,
            (None, ']') => in_block = false,
            (None, c) if c.is_whitespace() && !in_block => {
                if let Some(s) = start.take() {
                    parts.push(&src[s..i]);
                }
                continue;
            }
            _ => {}
        }
        if start.is_none() {
            start = Some(i);
        }
    }
    if in_block || quote.is_some() {
        return None;
    }
    if let Some(s) = start {
        parts.push(&src[s..]);
    }
    Some(parts)
}

/// A parsed selector: compounds separated by descendant combinators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    parts: Vec<Compound>,
}

impl Selector {
    /// Parse a selector. Returns `None` for empty or malformed input.
    pub fn parse(src: &str) -> Option<Self> {
        let parts = split_compounds(src)?
            .into_iter()
            .map(Compound::parse)
            .collect::<Option<Vec<_>>>()?;
        if parts.is_empty() {
            return None;
        }
        Some(Self { parts })
    }

    /// Match an element given its ancestors (outermost first)
    pub fn matches(&self, element: &Element, ancestors: &[&Element]) -> bool {
        let Some((last, rest)) = self.parts.split_last() else {
            return false;
        };
        if !last.matches(element) {
            return false;
        }

        let mut idx = ancestors.len();
        for part in rest.iter().rev() {
            loop {
                if idx == 0 {
                    return false;
                }
                idx -= 1;
                if part.matches(ancestors[idx]) {
                    break;
                }
            }
        }
        true
    }
}
