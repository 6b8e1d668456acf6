//! HTML serialization of rendered messages for browser front ends.

use proto::Role;

use crate::render::{DisplayNode, Segment};

/// Warning icon placed in front of error messages.
pub const ERROR_ICON_HTML: &str = r#"<i class="fas fa-exclamation-triangle me-2"></i>"#;

/// Greeting shown in a fresh conversation, with the API key modal trigger.
pub const GREETING_HTML: &str = concat!(
    "Hello! Start a new chat or select one. <br>",
    r#"<small class="text-muted">Remember to <button type="button" class="btn btn-link p-0 align-baseline" "#,
    r##"data-bs-toggle="modal" data-bs-target="#apiKeysModal">add your API keys</button> if needed.</small>"##,
);

/// Escapes `& < > " '` so text can be placed in element content or attributes.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

impl DisplayNode {
    /// CSS classes of the message container.
    pub fn css_classes(&self) -> String {
        let sender = match self.role {
            Role::User => "user-message",
            _ => "bot-message",
        };
        if self.is_error {
            format!("message {sender} error-message")
        } else {
            format!("message {sender}")
        }
    }

    /// Serializes the node as a message `<div>`.
    pub fn to_html(&self) -> String {
        let mut out = format!(r#"<div class="{}">"#, self.css_classes());
        for segment in &self.segments {
            match segment {
                Segment::Text(text) if self.is_error => {
                    out.push_str("<span>");
                    out.push_str(&escape_html(text));
                    out.push_str("</span>");
                }
                Segment::Text(text) => out.push_str(&escape_html(text)),
                Segment::Code(code) => {
                    out.push_str(r#"<pre><code class="language-"#);
                    out.push_str(&escape_html(&code.language));
                    out.push_str(r#"">"#);
                    out.push_str(&escape_html(&code.code));
                    out.push_str("</code></pre>");
                }
                Segment::ErrorMarker => out.push_str(ERROR_ICON_HTML),
                Segment::Greeting => out.push_str(GREETING_HTML),
            }
        }
        out.push_str("</div>");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html(r#""it's""#), "&quot;it&#39;s&quot;");
    }

    #[test]
    fn script_tag_is_escaped_in_html() {
        let html = render(Role::User, "<script>alert(1)</script>", false).to_html();
        assert_eq!(
            html,
            r#"<div class="message user-message">&lt;script&gt;alert(1)&lt;/script&gt;</div>"#
        );
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn code_block_becomes_pre_code() {
        let html = render(Role::Assistant, "See:\n```html\n<p>&</p>\n```", false).to_html();
        let expected = "<div class=\"message bot-message\">See:\n\
            <pre><code class=\"language-html\">&lt;p&gt;&amp;&lt;/p&gt;</code></pre></div>";
        assert_eq!(html, expected);
    }

    #[test]
    fn error_node_has_icon_and_escaped_span() {
        let html = render(Role::Assistant, "ERROR: <b>quota</b>", true).to_html();
        assert_eq!(
            html,
            format!(
                r#"<div class="message bot-message error-message">{ERROR_ICON_HTML}<span>&lt;b&gt;quota&lt;/b&gt;</span></div>"#
            )
        );
    }

    #[test]
    fn greeting_is_fixed_markup() {
        let html = DisplayNode::greeting().to_html();
        assert!(html.starts_with(r#"<div class="message bot-message">Hello!"#));
        assert!(html.contains(r##"data-bs-target="#apiKeysModal""##));
    }
}
