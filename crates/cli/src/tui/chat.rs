//! Transcript widget: display nodes with framed code blocks.

use super::app::TuiApp;
use super::theme::THEME;
use client::render::GREETING_TEXT;
use client::{CodeSegment, DisplayNode, Segment};
use proto::Role;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;

const INDENT: &str = "  ";

/// Renders the transcript and the typing indicator, clamping the scroll offset.
pub fn render(app: &mut TuiApp, frame: &mut Frame<'_>, area: Rect) {
    let inner_width = area.width.saturating_sub(2);
    let mut lines: Vec<Line<'static>> = Vec::new();
    for node in app.session.transcript().nodes() {
        lines.extend(node_lines(node, inner_width));
    }
    if app.session.state().is_typing() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("{INDENT}{} Bot is typing...", app.spinner()),
            Style::default()
                .fg(THEME.status_spinner)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    let content_height = wrapped_height(&lines, inner_width);
    let visible_height = area.height.saturating_sub(2);
    let max_scroll = content_height.saturating_sub(visible_height);
    let scroll = app.history_scroll.min(max_scroll);
    app.history_scroll = scroll;

    let history = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(THEME.fg_muted)),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));

    frame.render_widget(history, area);
}

/// Approximate row count after wrapping at `width`.
fn wrapped_height(lines: &[Line<'_>], width: u16) -> u16 {
    let width = width.max(1) as usize;
    let rows: usize = lines
        .iter()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum();
    rows.min(u16::MAX as usize) as u16
}

/// Lines for one transcript entry: a role label followed by its segments.
pub fn node_lines(node: &DisplayNode, width: u16) -> Vec<Line<'static>> {
    let (label, label_color) = match node.role {
        Role::User => ("You", THEME.user_label),
        _ => ("Bot", THEME.assistant_label),
    };
    let body_style = if node.is_error {
        Style::default().fg(THEME.error)
    } else {
        Style::default().fg(THEME.fg)
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("{label}:"),
            Style::default()
                .fg(label_color)
                .add_modifier(Modifier::BOLD),
        )),
    ];

    let mut marker = false;
    for (idx, segment) in node.segments.iter().enumerate() {
        match segment {
            Segment::ErrorMarker => marker = true,
            Segment::Greeting => lines.push(Line::from(Span::styled(
                format!("{INDENT}{GREETING_TEXT}"),
                body_style,
            ))),
            Segment::Code(code) => lines.extend(code_block_lines(code, width)),
            Segment::Text(text) => {
                let after_code = idx > 0 && matches!(node.segments[idx - 1], Segment::Code(_));
                let before_code = matches!(node.segments.get(idx + 1), Some(Segment::Code(_)));
                let mut text = text.as_str();
                if after_code {
                    text = text.strip_prefix('\n').unwrap_or(text);
                }
                if before_code {
                    text = text.strip_suffix('\n').unwrap_or(text);
                }
                if text.is_empty() && (after_code || before_code) {
                    continue;
                }
                for line in text.split('\n') {
                    let mut spans = vec![Span::raw(INDENT)];
                    if std::mem::take(&mut marker) {
                        spans.push(Span::styled(
                            "⚠ ",
                            Style::default()
                                .fg(THEME.error)
                                .add_modifier(Modifier::BOLD),
                        ));
                    }
                    spans.push(Span::styled(line.to_string(), body_style));
                    lines.push(Line::from(spans));
                }
            }
        }
    }
    lines
}

/// A code block framed with box-drawing characters and labeled with its language.
fn code_block_lines(code: &CodeSegment, width: u16) -> Vec<Line<'static>> {
    let frame_style = Style::default().fg(THEME.code_frame);
    let rule_len = (width as usize)
        .saturating_sub(INDENT.width() + code.language.width() + 5)
        .max(3);

    let mut lines = vec![Line::from(vec![
        Span::raw(INDENT),
        Span::styled("┌─ ", frame_style),
        Span::styled(
            code.language.clone(),
            Style::default()
                .fg(THEME.code_language)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {}", "─".repeat(rule_len)), frame_style),
    ])];
    for line in code.code.split('\n') {
        lines.push(Line::from(vec![
            Span::raw(INDENT),
            Span::styled("│ ", frame_style),
            Span::styled(line.to_string(), Style::default().fg(THEME.code_text)),
        ]));
    }
    lines.push(Line::from(vec![
        Span::raw(INDENT),
        Span::styled(
            format!("└{}", "─".repeat(rule_len + code.language.width() + 3)),
            frame_style,
        ),
    ]));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use client::render;

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn user_node_has_label_and_text() {
        let node = render(Role::User, "hi there", false);
        let text = plain(&node_lines(&node, 40));
        assert_eq!(text[1], "You:");
        assert_eq!(text[2], "  hi there");
    }

    #[test]
    fn code_block_is_framed_with_language() {
        let node = render(
            Role::Assistant,
            "Try this:\n```rust\nfn main() {}\n```\nDone.",
            false,
        );
        let text = plain(&node_lines(&node, 40));
        assert_eq!(text[1], "Bot:");
        assert_eq!(text[2], "  Try this:");
        assert!(text[3].starts_with("  ┌─ rust ─"));
        assert_eq!(text[4], "  │ fn main() {}");
        assert!(text[5].starts_with("  └─"));
        assert_eq!(text[6], "  Done.");
        assert_eq!(text.len(), 7);
    }

    #[test]
    fn markup_in_code_is_shown_verbatim() {
        let node = render(Role::Assistant, "```html\n<b>bold</b>\n```", false);
        let text = plain(&node_lines(&node, 40));
        assert!(text.iter().any(|l| l == "  │ <b>bold</b>"));
    }

    #[test]
    fn error_node_gets_marker_and_error_color() {
        let node = render(Role::Assistant, "ERROR: quota exceeded", true);
        let lines = node_lines(&node, 40);
        assert_eq!(plain(&lines)[2], "  ⚠ quota exceeded");
        let body = lines[2].spans.last().expect("body span");
        assert_eq!(body.style.fg, Some(THEME.error));
    }

    #[test]
    fn greeting_renders_fixed_text() {
        let text = plain(&node_lines(&DisplayNode::greeting(), 80));
        assert!(text[2].contains("Hello! Start a new chat"));
    }

    #[test]
    fn wrapped_height_accounts_for_long_lines() {
        let lines = vec![Line::from("x".repeat(25)), Line::from("")];
        assert_eq!(wrapped_height(&lines, 10), 4);
    }
}
