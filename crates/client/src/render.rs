//! Message content rendering.
//!
//! Raw message text is turned into a [`DisplayNode`]: an ordered list of
//! [`Segment`]s where remote text is only ever carried as literal text and
//! fenced code blocks are isolated into [`CodeSegment`]s. The only markup a
//! node can carry verbatim is the fixed greeting and the fixed error marker.

use proto::Role;

const FENCE: &str = "```";
const ERROR_PREFIX: &str = "ERROR:";
const DEFAULT_LANGUAGE: &str = "plaintext";

/// Plain-text form of the greeting shown in a fresh conversation.
pub const GREETING_TEXT: &str =
    "Hello! Start a new chat or select one. Remember to add your API keys if needed.";

/// A fenced code block extracted from a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSegment {
    /// Language tag restricted to `[A-Za-z0-9_-]`, never empty.
    pub language: String,
    /// Block body, kept verbatim.
    pub code: String,
}

/// One piece of a rendered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, never interpreted as markup.
    Text(String),
    /// Fenced code block.
    Code(CodeSegment),
    /// Fixed warning marker that leads an error node.
    ErrorMarker,
    /// Fixed initial greeting.
    Greeting,
}

/// A rendered transcript entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayNode {
    /// Author of the message; drives user/bot styling.
    pub role: Role,
    /// Whether the node is error-styled.
    pub is_error: bool,
    /// Ordered content.
    pub segments: Vec<Segment>,
}

impl DisplayNode {
    /// The greeting shown when a new conversation starts.
    pub fn greeting() -> Self {
        Self {
            role: Role::Assistant,
            is_error: false,
            segments: vec![Segment::Greeting],
        }
    }

    /// Code blocks of this node, in order.
    pub fn code_segments(&self) -> impl Iterator<Item = &CodeSegment> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Code(code) => Some(code),
            _ => None,
        })
    }

    /// Concatenated literal text, ignoring code blocks and markers.
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Terminal rendering: code blocks are re-fenced with their language.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(t) => out.push_str(t),
                Segment::Code(c) => {
                    out.push_str(FENCE);
                    out.push_str(&c.language);
                    out.push('\n');
                    out.push_str(&c.code);
                    out.push('\n');
                    out.push_str(FENCE);
                }
                Segment::ErrorMarker => out.push_str("⚠ "),
                Segment::Greeting => out.push_str(GREETING_TEXT),
            }
        }
        out
    }
}

/// Renders raw message text into a safe display structure.
pub fn render(role: Role, text: &str, is_error: bool) -> DisplayNode {
    let segments = if is_error {
        vec![
            Segment::ErrorMarker,
            Segment::Text(strip_error_prefix(text).to_string()),
        ]
    } else {
        split_fences(text)
    };
    DisplayNode {
        role,
        is_error,
        segments,
    }
}

/// Removes a leading `ERROR:` marker and the whitespace around the rest.
///
/// Text without the marker is returned unchanged.
pub fn strip_error_prefix(text: &str) -> &str {
    match text.strip_prefix(ERROR_PREFIX) {
        Some(rest) => rest.trim(),
        None => text,
    }
}

/// Keeps only `[A-Za-z0-9_-]`; falls back to `plaintext` when nothing is left.
pub fn sanitize_language(tag: &str) -> String {
    let cleaned: String = tag
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        DEFAULT_LANGUAGE.to_string()
    } else {
        cleaned
    }
}

enum ScanState {
    Literal,
    FenceHeader { open: usize },
    FenceBody { open: usize, language: String, body_start: usize },
}

/// Splits text into literal and fenced-code segments.
///
/// A fence is "```", a header up to the end of the line, the body, and a
/// closing "\n```". The header must be a single token without backticks.
/// When a candidate fence fails to parse, its first backtick is literal and
/// scanning resumes right after it.
pub fn split_fences(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut pos = 0;
    let mut state = ScanState::Literal;

    loop {
        state = match state {
            ScanState::Literal => match text[pos..].find(FENCE) {
                Some(offset) => ScanState::FenceHeader { open: pos + offset },
                None => break,
            },
            ScanState::FenceHeader { open } => {
                let header_start = open + FENCE.len();
                let header = text[header_start..]
                    .find('\n')
                    .map(|nl| (&text[header_start..header_start + nl], header_start + nl + 1));
                match header {
                    Some((tag, body_start)) if is_valid_header(tag) => ScanState::FenceBody {
                        open,
                        language: sanitize_language(tag.trim()),
                        body_start,
                    },
                    _ => {
                        pos = open + 1;
                        ScanState::Literal
                    }
                }
            }
            ScanState::FenceBody {
                open,
                language,
                body_start,
            } => {
                match text[body_start..].find("\n```") {
                    Some(offset) => {
                        let body_end = body_start + offset;
                        if literal_start < open {
                            segments.push(Segment::Text(text[literal_start..open].to_string()));
                        }
                        segments.push(Segment::Code(CodeSegment {
                            language,
                            code: text[body_start..body_end].to_string(),
                        }));
                        pos = body_end + 1 + FENCE.len();
                        literal_start = pos;
                    }
                    None => pos = open + 1,
                }
                ScanState::Literal
            }
        };
    }

    if literal_start < text.len() || segments.is_empty() {
        segments.push(Segment::Text(text[literal_start..].to_string()));
    }
    segments
}

fn is_valid_header(tag: &str) -> bool {
    let tag = tag.trim();
    !tag.contains('`') && !tag.contains(char::is_whitespace)
}

/// Display label for a sidebar title: the first 25 characters plus `...`.
pub fn truncate_title(title: &str) -> String {
    const LABEL_CHARS: usize = 25;
    if title.chars().count() > LABEL_CHARS {
        let head: String = title.chars().take(LABEL_CHARS).collect();
        format!("{head}...")
    } else {
        title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(language: &str, code: &str) -> Segment {
        Segment::Code(CodeSegment {
            language: language.to_string(),
            code: code.to_string(),
        })
    }

    fn text(t: &str) -> Segment {
        Segment::Text(t.to_string())
    }

    #[test]
    fn markup_like_text_stays_literal() {
        let node = render(Role::Assistant, "<script>alert(1)</script>", false);
        assert_eq!(node.segments, vec![text("<script>alert(1)</script>")]);
        assert!(!node.is_error);
    }

    #[test]
    fn single_fence_yields_one_code_segment() {
        let node = render(Role::Assistant, "```rust\nfn main() {}\n```", false);
        assert_eq!(node.segments, vec![code("rust", "fn main() {}")]);
    }

    #[test]
    fn multiple_fences_keep_order_and_prose() {
        let input = "Intro:\n```py\nprint(1)\n```\nthen\n```\n<b>x</b>\n```\nbye";
        let node = render(Role::Assistant, input, false);
        assert_eq!(
            node.segments,
            vec![
                text("Intro:\n"),
                code("py", "print(1)"),
                text("\nthen\n"),
                code("plaintext", "<b>x</b>"),
                text("\nbye"),
            ]
        );
    }

    #[test]
    fn language_is_sanitized() {
        assert_eq!(sanitize_language("c++"), "c");
        assert_eq!(sanitize_language("objective-c_2"), "objective-c_2");
        assert_eq!(sanitize_language("\"><"), "plaintext");
        assert_eq!(sanitize_language(""), "plaintext");

        let node = render(Role::Assistant, "```c++\nint x;\n```", false);
        assert_eq!(node.segments, vec![code("c", "int x;")]);
    }

    #[test]
    fn unterminated_fence_is_literal() {
        let input = "look: ```rust\nfn main() {}";
        let node = render(Role::Assistant, input, false);
        assert_eq!(node.segments, vec![text(input)]);
    }

    #[test]
    fn inline_backticks_are_not_a_fence() {
        let input = "use ```inline code``` here\nand more";
        let node = render(Role::Assistant, input, false);
        assert_eq!(node.segments, vec![text(input)]);
    }

    #[test]
    fn failed_header_resumes_after_first_backtick() {
        let node = render(Role::Assistant, "````js\nx\n```", false);
        assert_eq!(node.segments, vec![text("`"), code("js", "x")]);
    }

    #[test]
    fn empty_body_and_multiline_body() {
        let node = render(Role::Assistant, "```sh\n\n```", false);
        assert_eq!(node.segments, vec![code("sh", "")]);

        let node = render(Role::Assistant, "```\na\n\nb\n```", false);
        assert_eq!(node.segments, vec![code("plaintext", "a\n\nb")]);
    }

    #[test]
    fn error_prefix_is_stripped() {
        let node = render(Role::Assistant, "ERROR: foo", true);
        assert!(node.is_error);
        assert_eq!(node.segments, vec![Segment::ErrorMarker, text("foo")]);

        let node = render(Role::Assistant, "foo", true);
        assert_eq!(node.text(), "foo");

        let node = render(Role::Assistant, "error: foo", true);
        assert_eq!(node.text(), "error: foo");

        let node = render(Role::Assistant, "  foo  ", true);
        assert_eq!(node.text(), "  foo  ");

        let node = render(Role::Assistant, "ERROR:   spaced out  ", true);
        assert_eq!(node.text(), "spaced out");
    }

    #[test]
    fn error_text_with_fence_is_not_split() {
        let node = render(Role::Assistant, "```js\nx\n```", true);
        assert_eq!(node.code_segments().count(), 0);
        assert_eq!(node.text(), "```js\nx\n```");
    }

    #[test]
    fn empty_text_renders_one_empty_segment() {
        let node = render(Role::User, "", false);
        assert_eq!(node.segments, vec![text("")]);
    }

    #[test]
    fn plain_text_refences_code() {
        let node = render(Role::Assistant, "a\n```go\nx\n```", false);
        assert_eq!(node.plain_text(), "a\n```go\nx\n```");
        assert_eq!(DisplayNode::greeting().plain_text(), GREETING_TEXT);
    }

    #[test]
    fn multibyte_text_around_fences() {
        let node = render(Role::Assistant, "héllo ✓\n```rs\nlet é = 1;\n```\nfin ✓", false);
        assert_eq!(
            node.segments,
            vec![text("héllo ✓\n"), code("rs", "let é = 1;"), text("\nfin ✓")]
        );
    }

    #[test]
    fn titles_truncate_at_25_chars() {
        assert_eq!(truncate_title("short"), "short");
        let exact = "a".repeat(25);
        assert_eq!(truncate_title(&exact), exact);
        assert_eq!(
            truncate_title("This title is definitely too long"),
            "This title is definitely ..."
        );
    }
}
