//! Server-rendered pages: static templates embedded at compile time with a
//! `{{placeholder}}` substitution pass. Dynamic values must be escaped by
//! the caller unless noted otherwise.

use axum::http::StatusCode;
use axum::response::Html;

use crate::session::Flash;

const BASE_CSS: &str = include_str!("static/base.css");

/// Substitute `{{key}}` placeholders. The shared stylesheet is always
/// available as `{{css}}`. Unknown placeholders are left in place, which
/// makes a missing substitution visible instead of silent.
pub fn render(template: &str, vars: &[(&str, String)]) -> Html<String> {
    let mut out = template.replace("{{css}}", BASE_CSS);
    for (key, value) in vars {
        out = out.replace(&format!("{{{{{key}}}}}"), value);
    }
    Html(out)
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render pending flashes as a category-classed list; empty input renders
/// nothing.
pub fn flash_block(flashes: &[Flash]) -> String {
    if flashes.is_empty() {
        return String::new();
    }
    let mut out = String::from("<ul class=\"flashes\">\n");
    for flash in flashes {
        out.push_str(&format!(
            "  <li class=\"flash-{}\">{}</li>\n",
            escape(&flash.category),
            escape(&flash.message)
        ));
    }
    out.push_str("</ul>");
    out
}

pub fn error_page(status: StatusCode, message: &str) -> Html<String> {
    render(
        include_str!("static/error.html"),
        &[
            ("status", status.as_u16().to_string()),
            ("message", escape(message)),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_covers_html_metacharacters() {
        assert_eq!(
            escape(r#"<b a="1">&'x'</b>"#),
            "&lt;b a=&quot;1&quot;&gt;&amp;&#39;x&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn flashes_render_with_category_classes() {
        let block = flash_block(&[Flash {
            category: "danger".to_string(),
            message: "nope & <stop>".to_string(),
        }]);
        assert!(block.contains("flash-danger"));
        assert!(block.contains("nope &amp; &lt;stop&gt;"));
    }

    #[test]
    fn unknown_placeholders_stay_visible() {
        let Html(out) = render("a {{known}} b {{unknown}}", &[("known", "X".to_string())]);
        assert_eq!(out, "a X b {{unknown}}");
    }
}
