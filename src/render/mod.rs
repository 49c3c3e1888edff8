//! Renderers for user-provided content: markdown and untrusted HTML

pub mod markdown;
pub mod sanitize;

pub use markdown::{to_html as markdown_to_html, to_safe_html as markdown_to_safe_html};
pub use sanitize::sanitize;
