//! Conversation sidebar: active marker, inline title editor, full-title tooltip.

use super::app::{Focus, TuiApp};
use super::theme::THEME;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Fixed sidebar width in terminal columns.
const SIDEBAR_WIDTH: u16 = 32;

/// Rows reserved for the full title of a truncated entry.
const TOOLTIP_HEIGHT: u16 = 3;

/// Returns the fixed sidebar width in columns.
pub fn sidebar_width() -> u16 {
    SIDEBAR_WIDTH
}

/// Renders the conversation list.
pub fn render(app: &TuiApp, frame: &mut Frame<'_>, area: Rect) {
    let focused = app.focus == Focus::Sidebar;
    let chats = app.session.chats();
    let focus_hint = if focused {
        Span::styled(" ◉", Style::default().fg(THEME.sidebar_active_indicator))
    } else {
        Span::styled(" [Tab]", Style::default().fg(THEME.fg_muted))
    };
    let header = Line::from(vec![
        Span::styled(
            " Chats ",
            Style::default()
                .fg(THEME.sidebar_active_indicator)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("({})", chats.len()),
            Style::default().fg(THEME.fg_muted),
        ),
        focus_hint,
    ]);

    let border_style = if focused {
        Style::default().fg(THEME.sidebar_active_indicator)
    } else {
        Style::default().fg(THEME.sidebar_border)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(header);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if chats.is_empty() {
        let empty_msg = Paragraph::new(Line::from(Span::styled(
            " No chats yet",
            Style::default().fg(THEME.fg_muted),
        )));
        frame.render_widget(empty_msg, inner);
        return;
    }

    let max_name_width = inner.width.saturating_sub(2) as usize;
    let mut lines: Vec<Line<'_>> = Vec::new();
    let mut tooltip: Option<&str> = None;

    for (idx, item) in chats.iter().enumerate() {
        let is_selected = idx == app.sidebar_index;
        let indicator = if item.is_active() {
            Span::styled("▌", Style::default().fg(THEME.sidebar_active_indicator))
        } else if is_selected && focused {
            Span::styled("▌", Style::default().fg(THEME.sidebar_hover))
        } else {
            Span::raw(" ")
        };

        if let Some(draft) = item.edit.draft() {
            let caret = if item.edit.is_saving() { "" } else { "▏" };
            let shown = fit_width_tail(draft, max_name_width.saturating_sub(2));
            lines.push(Line::from(vec![
                indicator,
                Span::styled(
                    format!(" {shown}{caret}"),
                    Style::default().fg(THEME.fg).bg(THEME.sidebar_edit_bg),
                ),
            ]));
            continue;
        }

        let label = fit_width(&item.label(), max_name_width);
        if is_selected && label != item.title() {
            tooltip = Some(item.title());
        }
        let name_style = if item.is_active() {
            Style::default().fg(THEME.fg).add_modifier(Modifier::BOLD)
        } else if is_selected && focused {
            Style::default().fg(THEME.fg)
        } else {
            Style::default().fg(THEME.sidebar_text)
        };
        lines.push(Line::from(vec![
            indicator,
            Span::styled(format!(" {label}"), name_style),
        ]));
    }

    let (list_area, tooltip_area) = match tooltip {
        Some(_) if focused && inner.height > TOOLTIP_HEIGHT + 1 => {
            let [list, tip] =
                Layout::vertical([Constraint::Min(0), Constraint::Length(TOOLTIP_HEIGHT)])
                    .areas(inner);
            (list, Some(tip))
        }
        _ => (inner, None),
    };

    // Keep the selected row visible.
    let visible = list_area.height as usize;
    let scroll = (app.sidebar_index + 1).saturating_sub(visible) as u16;
    frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), list_area);

    if let (Some(area), Some(title)) = (tooltip_area, tooltip) {
        let tip = Paragraph::new(title)
            .style(Style::default().fg(THEME.fg_dim))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(THEME.sidebar_border)),
            );
        frame.render_widget(tip, area);
    }
}

/// Truncates to `max_width` display columns, appending `…` if shortened.
pub fn fit_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max_width - 1 {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

/// Keeps the end of `s` so the caret of an edit field stays visible.
fn fit_width_tail(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut kept: Vec<char> = Vec::new();
    let mut used = 0;
    for c in s.chars().rev() {
        let w = c.width().unwrap_or(0);
        if used + w > max_width.saturating_sub(1) {
            break;
        }
        used += w;
        kept.push(c);
    }
    let mut out = String::from("…");
    out.extend(kept.into_iter().rev());
    out
}
