//! Centralized TUI theme built on ratatui's Tailwind CSS palette.

use ratatui::style::Color;
use ratatui::style::palette::tailwind;

/// Visual tokens for every widget.
pub struct Theme {
    // ── Base ──
    pub fg: Color,
    pub fg_dim: Color,
    pub fg_muted: Color,
    pub border: Color,
    /// Border color for the focused panel.
    pub border_active: Color,

    // ── Accent / Brand ──
    pub accent: Color,

    // ── Semantic ──
    pub error: Color,
    pub info: Color,
    pub warning: Color,

    // ── Chat roles ──
    /// Label color for user messages.
    pub user_label: Color,
    /// Label color for bot replies.
    pub assistant_label: Color,
    /// Frame around fenced code blocks.
    pub code_frame: Color,
    /// Language tag on a code block frame.
    pub code_language: Color,
    /// Code block body text.
    pub code_text: Color,

    // ── Status bar ──
    pub status_spinner: Color,
    pub status_hint: Color,
    pub status_model: Color,

    // ── Sidebar ──
    pub sidebar_border: Color,
    /// Indicator mark for the active conversation.
    pub sidebar_active_indicator: Color,
    /// Cursor highlight for the selected row.
    pub sidebar_hover: Color,
    pub sidebar_text: Color,
    /// Background of the inline title editor.
    pub sidebar_edit_bg: Color,
}

impl Theme {
    /// The default dark theme using Tailwind palette.
    pub const fn default_dark() -> Self {
        Self {
            // Base
            fg: tailwind::SLATE.c100,
            fg_dim: tailwind::SLATE.c400,
            fg_muted: tailwind::SLATE.c500,
            border: tailwind::SLATE.c700,
            border_active: tailwind::EMERALD.c500,

            // Accent
            accent: tailwind::EMERALD.c500,

            // Semantic
            error: tailwind::RED.c500,
            info: tailwind::SKY.c500,
            warning: tailwind::AMBER.c500,

            // Chat
            user_label: tailwind::CYAN.c400,
            assistant_label: tailwind::EMERALD.c400,
            code_frame: tailwind::SLATE.c600,
            code_language: tailwind::AMBER.c400,
            code_text: tailwind::SLATE.c200,

            // Status bar
            status_spinner: tailwind::AMBER.c400,
            status_hint: tailwind::SLATE.c500,
            status_model: tailwind::SKY.c400,

            // Sidebar
            sidebar_border: tailwind::SLATE.c700,
            sidebar_active_indicator: tailwind::CYAN.c400,
            sidebar_hover: tailwind::SLATE.c600,
            sidebar_text: tailwind::SLATE.c300,
            sidebar_edit_bg: tailwind::SLATE.c800,
        }
    }
}

/// Global theme instance.
pub const THEME: Theme = Theme::default_dark();
