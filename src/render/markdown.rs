// Markdown to HTML for chat messages and descriptions
//
// Uses pulldown-cmark with strikethrough and tables enabled. Raw HTML in
// the source is never passed through: block and inline HTML events are
// re-emitted as text so the serializer escapes them. Link and image
// destinations with a script-capable scheme are replaced by "#".

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

use super::sanitize;

fn options() -> Options {
    Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES | Options::ENABLE_TASKLISTS
}

fn neutralize(url: CowStr<'_>) -> CowStr<'_> {
    if sanitize::is_safe_url(&url) {
        url
    } else {
        CowStr::Borrowed("#")
    }
}

/// Render markdown to an HTML string
pub fn to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, options()).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: neutralize(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: neutralize(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Render markdown and pass the result through the allow-list sanitizer
pub fn to_safe_html(markdown: &str) -> String {
    sanitize::sanitize(&to_html(markdown))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_blocks() {
        let html = to_html("# Title\n\nSome **bold** and `code`.\n\n- a\n- b\n");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<code>code</code>"));
        assert!(html.contains("<li>a</li>"));
    }

    #[test]
    fn test_fenced_code_keeps_language() {
        let html = to_html("```rust\nfn main() {}\n```\n");
        assert!(html.contains(r#"<code class="language-rust">"#));
        assert!(html.contains("fn main() {}"));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = to_html("hello <script>alert(1)</script>\n\n<div onclick=\"x()\">block</div>\n");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<div"));
    }

    #[test]
    fn test_script_links_neutralized() {
        let html = to_html("[click](javascript:alert(1)) [ok](https://example.com)");
        assert!(html.contains(r##"<a href="#">click</a>"##));
        assert!(html.contains(r#"<a href="https://example.com">ok</a>"#));
    }

    #[test]
    fn test_tables_and_strikethrough() {
        let html = to_html("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~old~~\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
        assert!(html.contains("<del>old</del>"));
    }

    #[test]
    fn test_safe_html_survives_sanitizer() {
        let html = to_safe_html("*hi* [x](https://a.test)");
        assert!(html.contains("<em>hi</em>"));
        assert!(html.contains(r#"href="https://a.test""#));
    }
}
