//! Form field access on a render root
//!
//! Inputs keep their value in the `value` attribute, textareas in their
//! text, selects in the `selected` option (or a `value` attribute set on
//! the select itself).

use crate::dom::{Element, Node, RenderRoot};

use super::ViewError;

fn element_value(element: &Element) -> String {
    match element.tag.as_str() {
        "textarea" => element.text_content(),
        "select" => {
            if let Some(value) = element.attr("value") {
                return value.to_string();
            }
            let options: Vec<&Element> = element
                .children
                .iter()
                .filter_map(Node::as_element)
                .filter(|e| e.tag == "option")
                .collect();
            options
                .iter()
                .find(|o| o.attr("selected").is_some())
                .or_else(|| options.first())
                .map(|o| o.attr("value").map(str::to_string).unwrap_or_else(|| o.text_content()))
                .unwrap_or_default()
        }
        "input" if matches!(element.attr("type"), Some("checkbox" | "radio")) => {
            if element.attr("checked").is_some() {
                element.attr("value").unwrap_or("on").to_string()
            } else {
                String::new()
            }
        }
        _ => element.attr("value").unwrap_or_default().to_string(),
    }
}

/// Current value of the field matching `selector`
pub fn input_value(root: &RenderRoot, selector: &str) -> Option<String> {
    root.query_selector(selector).map(|e| element_value(&e))
}

/// Set the value of the field matching `selector`, as typing would
pub fn set_input_value(root: &RenderRoot, selector: &str, value: &str) -> bool {
    root.with_element_mut(selector, |element| match element.tag.as_str() {
        "textarea" => element.set_text(value),
        "select" => {
            element.remove_attr("value");
            for option in element.children.iter_mut().filter_map(Node::as_element_mut) {
                if option.attr("value") == Some(value) {
                    option.set_attr("selected", "");
                } else {
                    option.remove_attr("selected");
                }
            }
            element.set_attr("value", value);
        }
        _ => element.set_attr("value", value),
    })
    .is_some()
}

/// Replace the options of a select, marking `selected`
pub fn set_options(root: &RenderRoot, selector: &str, options: &[(String, String)], selected: Option<&str>) -> bool {
    root.with_element_mut(selector, |element| {
        element.children = options
            .iter()
            .map(|(value, label)| {
                let mut option = Element::new("option").with_attr("value", value.as_str()).with_text(label.as_str());
                if selected == Some(value.as_str()) {
                    option.set_attr("selected", "");
                }
                Node::Element(option)
            })
            .collect();
        match selected {
            Some(value) => element.set_attr("value", value),
            None => {
                element.remove_attr("value");
            }
        }
    })
    .is_some()
}

pub(crate) fn set_checked(root: &RenderRoot, selector: &str, checked: bool) -> bool {
    root.with_element_mut(selector, |element| {
        if checked {
            element.set_attr("checked", "");
        } else {
            element.remove_attr("checked");
        }
    })
    .is_some()
}

/// Trimmed value, `None` when the field is missing or blank
pub(crate) fn optional(root: &RenderRoot, selector: &str) -> Option<String> {
    input_value(root, selector)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trimmed non-blank value or a validation error naming `label`
pub(crate) fn required(root: &RenderRoot, selector: &str, label: &str) -> Result<String, ViewError> {
    optional(root, selector).ok_or_else(|| ViewError::Validation(format!("{} is required", label)))
}

/// Set several fields at once; `None` clears the field
pub(crate) fn fill(root: &RenderRoot, fields: &[(&str, Option<&str>)]) {
    for (selector, value) in fields {
        set_input_value(root, selector, value.unwrap_or_default());
    }
}
