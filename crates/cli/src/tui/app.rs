//! TUI application state, key mapping, update and rendering.

use client::{Notice, NoticeLevel, SessionController};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use proto::ChatId;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use tracing::debug;
use unicode_width::UnicodeWidthStr;

use super::action::{Action, Command};
use super::theme::THEME;
use super::{chat, sidebar};

/// Spinner animation frames (Braille pattern).
const SPINNER: &[char] = &['⣾', '⣽', '⣻', '⢿', '⡿', '⣟', '⣯', '⣷'];

/// Which panel receives typed keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Sidebar,
}

// ─── TuiApp ──────────────────────────────────────────────────

/// Full state for the TUI session.
pub struct TuiApp {
    /// Conversation state; the only thing the view reads chat data from.
    pub session: SessionController,
    pub focus: Focus,
    /// Current text typed in the input box (not yet submitted).
    pub input: String,
    /// Cursor position within `input` (byte offset).
    pub cursor_pos: usize,
    /// Sidebar cursor row.
    pub sidebar_index: usize,
    /// Vertical scroll offset for the transcript; clamped on render.
    pub history_scroll: u16,
    /// Last notice raised by the session.
    pub status: Option<Notice>,
    /// Confirmation text while a delete awaits `y`/`n`.
    pub delete_prompt: Option<String>,
    pub spinner_tick: u8,
    pub should_quit: bool,
}

impl TuiApp {
    pub fn new(session: SessionController) -> Self {
        Self {
            session,
            focus: Focus::Input,
            input: String::new(),
            cursor_pos: 0,
            sidebar_index: 0,
            history_scroll: 0,
            status: None,
            delete_prompt: None,
            spinner_tick: 0,
            should_quit: false,
        }
    }

    /// Chat under the sidebar cursor.
    pub fn selected_chat_id(&self) -> Option<ChatId> {
        self.session
            .chats()
            .get_index(self.sidebar_index)
            .map(|item| item.id().clone())
    }

    /// Chat whose title is being edited from the sidebar.
    fn sidebar_edit_id(&self) -> Option<ChatId> {
        if self.focus != Focus::Sidebar {
            return None;
        }
        self.session.pending_edit_chat_id().cloned()
    }

    pub fn spinner(&self) -> char {
        SPINNER[(self.spinner_tick as usize) % SPINNER.len()]
    }

    /// Take the current input and reset it.
    pub fn take_input(&mut self) -> String {
        self.cursor_pos = 0;
        std::mem::take(&mut self.input)
    }

    /// Render clamps this to the last page.
    pub fn scroll_to_bottom(&mut self) {
        self.history_scroll = u16::MAX;
    }

    fn clamp_sidebar(&mut self) {
        let len = self.session.chats().len();
        if self.sidebar_index >= len {
            self.sidebar_index = len.saturating_sub(1);
        }
    }

    // ── Input mapping ────────────────────────────────────────

    /// Translates a key press into an [`Action`], given the current mode.
    pub fn key_action(&self, key: KeyEvent) -> Option<Action> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => Some(Action::Quit),
                KeyCode::Char('n') => Some(Action::NewChat),
                _ => None,
            };
        }

        if self.delete_prompt.is_some() {
            return match key.code {
                KeyCode::Char('y' | 'Y') => Some(Action::ConfirmDelete),
                KeyCode::Char('n' | 'N') | KeyCode::Esc => Some(Action::CancelDelete),
                _ => None,
            };
        }

        let editing = self.sidebar_edit_id().is_some();
        let action = match (self.focus, key.code) {
            (_, KeyCode::F(2)) => Action::CycleModel,
            (_, KeyCode::Tab) => Action::ToggleFocus,
            (_, KeyCode::Esc) => Action::Cancel,
            (_, KeyCode::Enter) => Action::Submit,
            (_, KeyCode::Backspace) => Action::DeleteChar,
            (_, KeyCode::PageUp) => Action::ScrollUp(10),
            (_, KeyCode::PageDown) => Action::ScrollDown(10),
            (Focus::Sidebar, KeyCode::Char(c)) if editing => Action::InsertChar(c),
            (Focus::Sidebar, KeyCode::Up) => Action::SidebarUp,
            (Focus::Sidebar, KeyCode::Down) => Action::SidebarDown,
            (Focus::Sidebar, KeyCode::Char('e')) => Action::BeginEdit,
            (Focus::Sidebar, KeyCode::Char('d')) => Action::RequestDelete,
            (Focus::Input, KeyCode::Char(c)) => Action::InsertChar(c),
            (Focus::Input, KeyCode::Left) => Action::MoveCursorLeft,
            (Focus::Input, KeyCode::Right) => Action::MoveCursorRight,
            (Focus::Input, KeyCode::Up) => Action::ScrollUp(1),
            (Focus::Input, KeyCode::Down) => Action::ScrollDown(1),
            _ => return None,
        };
        Some(action)
    }

    // ── Update ───────────────────────────────────────────────

    /// Applies one action and returns the side effect to run.
    pub fn update(&mut self, action: Action) -> Command {
        let command = match action {
            Action::InsertChar(c) => {
                self.insert_char(c);
                Command::None
            }
            Action::DeleteChar => {
                self.delete_char();
                Command::None
            }
            Action::MoveCursorLeft => {
                if let Some((i, _)) = self.input[..self.cursor_pos].char_indices().last() {
                    self.cursor_pos = i;
                }
                Command::None
            }
            Action::MoveCursorRight => {
                if let Some(c) = self.input[self.cursor_pos..].chars().next() {
                    self.cursor_pos += c.len_utf8();
                }
                Command::None
            }
            Action::Submit => self.submit(),
            Action::ScrollUp(n) => {
                self.history_scroll = self.history_scroll.saturating_sub(n);
                Command::None
            }
            Action::ScrollDown(n) => {
                self.history_scroll = self.history_scroll.saturating_add(n);
                Command::None
            }
            Action::ToggleFocus => {
                self.focus = match self.focus {
                    Focus::Input => Focus::Sidebar,
                    Focus::Sidebar => Focus::Input,
                };
                Command::None
            }
            Action::SidebarUp => {
                self.sidebar_index = self.sidebar_index.saturating_sub(1);
                Command::None
            }
            Action::SidebarDown => {
                if self.sidebar_index + 1 < self.session.chats().len() {
                    self.sidebar_index += 1;
                }
                Command::None
            }
            Action::NewChat => {
                self.focus = Focus::Input;
                self.delete_prompt = None;
                self.session.cancel_delete();
                Command::Spawn(self.session.begin_new_chat())
            }
            Action::BeginEdit => {
                if let Some(id) = self.selected_chat_id()
                    && let Err(err) = self.session.begin_edit(&id)
                {
                    self.status = Some(Notice::error(err.to_string()));
                }
                Command::None
            }
            Action::RequestDelete => {
                if let Some(id) = self.selected_chat_id() {
                    self.delete_prompt = self.session.request_delete(&id);
                }
                Command::None
            }
            Action::ConfirmDelete => {
                self.delete_prompt = None;
                Command::spawn(self.session.confirm_delete())
            }
            Action::CancelDelete => {
                self.delete_prompt = None;
                self.session.cancel_delete();
                Command::None
            }
            Action::Cancel => {
                match self.sidebar_edit_id() {
                    Some(id) => {
                        self.session.cancel_edit(&id);
                    }
                    None => self.should_quit = true,
                }
                Command::None
            }
            Action::CycleModel => {
                let model = self.session.cycle_model();
                self.status = Some(Notice::info(format!("Model: {}", model.label())));
                Command::PersistModel(model)
            }
            Action::Completed(completion) => {
                self.session.apply(completion);
                self.clamp_sidebar();
                self.scroll_to_bottom();
                Command::None
            }
            Action::Tick => {
                self.spinner_tick = self.spinner_tick.wrapping_add(1);
                Command::None
            }
            Action::Quit => {
                self.should_quit = true;
                Command::None
            }
            Action::Resize => Command::None,
        };

        if let Some(notice) = self.session.drain_notices().pop() {
            self.status = Some(notice);
        }
        command
    }

    fn insert_char(&mut self, c: char) {
        if let Some(id) = self.sidebar_edit_id() {
            if let Some(draft) = self.session.edit_draft(&id) {
                draft.push(c);
            }
            return;
        }
        if self.focus == Focus::Input && self.session.input_enabled() {
            self.input.insert(self.cursor_pos, c);
            self.cursor_pos += c.len_utf8();
        }
    }

    fn delete_char(&mut self) {
        if let Some(id) = self.sidebar_edit_id() {
            if let Some(draft) = self.session.edit_draft(&id) {
                draft.pop();
            }
            return;
        }
        if self.focus != Focus::Input {
            return;
        }
        if let Some((prev, _)) = self.input[..self.cursor_pos].char_indices().last() {
            self.input.drain(prev..self.cursor_pos);
            self.cursor_pos = prev;
        }
    }

    fn submit(&mut self) -> Command {
        if let Some(id) = self.sidebar_edit_id() {
            // Validation failures surface as notices; the field stays open.
            return self
                .session
                .save_edit(&id)
                .map_or(Command::None, Command::spawn);
        }
        match self.focus {
            Focus::Sidebar => {
                let Some(id) = self.selected_chat_id() else {
                    return Command::None;
                };
                self.focus = Focus::Input;
                self.scroll_to_bottom();
                Command::spawn(self.session.begin_load(id))
            }
            Focus::Input => {
                if !self.session.input_enabled() {
                    return Command::None;
                }
                let text = self.take_input();
                let request = self.session.begin_send(&text);
                if request.is_some() {
                    self.status = None;
                    self.scroll_to_bottom();
                    debug!(chars = text.chars().count(), "Message submitted");
                }
                Command::spawn(request)
            }
        }
    }

    // ── Rendering ────────────────────────────────────────────

    /// Render the entire TUI into the given frame.
    pub fn render(&mut self, frame: &mut Frame<'_>) {
        let [sidebar_area, main_area] = Layout::horizontal([
            Constraint::Length(sidebar::sidebar_width()),
            Constraint::Min(0),
        ])
        .areas(frame.area());

        // Layout: header(1) | transcript(fill) | status(1) | input(3)
        let [header, history, status, input] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .areas(main_area);

        sidebar::render(self, frame, sidebar_area);
        self.render_header(frame, header);
        chat::render(self, frame, history);
        self.render_status(frame, status);
        self.render_input(frame, input);
    }

    fn render_header(&self, frame: &mut Frame<'_>, area: Rect) {
        let title = Line::from(vec![
            Span::styled(
                " multichat ",
                Style::default()
                    .fg(THEME.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" {} ", self.session.state().header_title()),
                Style::default().fg(THEME.fg).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" {} ", self.session.model().label()),
                Style::default().fg(THEME.status_model),
            ),
        ]);
        frame.render_widget(Paragraph::new(title), area);
    }

    fn render_status(&self, frame: &mut Frame<'_>, area: Rect) {
        let line = if let Some(prompt) = &self.delete_prompt {
            Line::from(vec![
                Span::styled(format!(" {prompt} "), Style::default().fg(THEME.warning)),
                Span::styled(
                    "[y/n]",
                    Style::default()
                        .fg(THEME.warning)
                        .add_modifier(Modifier::BOLD),
                ),
            ])
        } else if self.session.state().is_typing() {
            Line::from(Span::styled(
                format!(" {} Bot is typing...", self.spinner()),
                Style::default().fg(THEME.status_spinner),
            ))
        } else if let Some(notice) = &self.status {
            let color = match notice.level {
                NoticeLevel::Info => THEME.info,
                NoticeLevel::Error => THEME.error,
            };
            Line::from(Span::styled(
                format!(" {}", notice.text),
                Style::default().fg(color),
            ))
        } else {
            let hint = match self.focus {
                Focus::Input => " Enter:send  Tab:chats  Ctrl+N:new  F2:model  Ctrl+C:quit",
                Focus::Sidebar => " Enter:open  e:rename  d:delete  Tab:input  Ctrl+N:new",
            };
            Line::from(Span::styled(hint, Style::default().fg(THEME.status_hint)))
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_input(&self, frame: &mut Frame<'_>, area: Rect) {
        let enabled = self.session.input_enabled();
        let active = enabled && self.focus == Focus::Input;
        let border_color = if active {
            THEME.border_active
        } else {
            THEME.border
        };

        let (display_text, style) = if !self.input.is_empty() {
            (self.input.as_str(), Style::default().fg(THEME.fg))
        } else if enabled {
            ("Type a message...", Style::default().fg(THEME.fg_muted))
        } else {
            (
                "Select a chat or press Ctrl+N to start one",
                Style::default().fg(THEME.fg_muted),
            )
        };

        let input = Paragraph::new(Span::styled(display_text, style)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .title(" Message "),
        );
        frame.render_widget(input, area);

        if active && self.delete_prompt.is_none() {
            let cursor_col = self.input[..self.cursor_pos].width() as u16;
            frame.set_cursor_position((area.x + 1 + cursor_col, area.y + 1));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tui::test_gateway::StubGateway;
    use client::Selection;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use proto::{ConversationSummary, ModelChoice};
    use ratatui::{Terminal, backend::TestBackend};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn make_app() -> TuiApp {
        TuiApp::new(SessionController::new(Arc::new(StubGateway::default())))
    }

    fn make_app_with_chats(titles: &[(&str, &str)]) -> TuiApp {
        let gateway = StubGateway::with_titles(titles);
        let summaries = titles
            .iter()
            .map(|(id, title)| ConversationSummary::new(*id, *title))
            .collect();
        TuiApp::new(SessionController::with_chats(Arc::new(gateway), summaries))
    }

    /// Feeds keys through the same path the event loop uses.
    fn press(app: &mut TuiApp, code: KeyCode) -> Command {
        match app.key_action(key(code)) {
            Some(action) => app.update(action),
            None => Command::None,
        }
    }

    fn type_text(app: &mut TuiApp, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    async fn run(app: &mut TuiApp, command: Command) {
        if let Command::Spawn(request) = command {
            let gateway = app.session.gateway();
            let completion = request.execute(gateway.as_ref()).await;
            app.update(Action::Completed(completion));
        }
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn typing_edits_input_at_cursor() {
        let mut app = make_app();
        type_text(&mut app, "ab");
        press(&mut app, KeyCode::Left);
        type_text(&mut app, "é");
        assert_eq!(app.input, "aéb");
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.input, "ab");
        assert_eq!(app.cursor_pos, 1);
    }

    #[test]
    fn typing_is_ignored_while_input_disabled() {
        let mut app = make_app();
        app.session = SessionController::with_chats(
            Arc::new(StubGateway::default()),
            vec![ConversationSummary {
                is_active: true,
                ..ConversationSummary::new("c1", "Seeded")
            }],
        );
        assert_eq!(*app.session.state().selection(), Selection::None);
        type_text(&mut app, "hi");
        assert!(app.input.is_empty());
        assert!(press(&mut app, KeyCode::Enter).is_none());
    }

    #[test]
    fn global_keys_map_regardless_of_focus() {
        let mut app = make_app();
        for focus in [Focus::Input, Focus::Sidebar] {
            app.focus = focus;
            assert!(matches!(
                app.key_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
                Some(Action::Quit)
            ));
            assert!(matches!(
                app.key_action(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL)),
                Some(Action::NewChat)
            ));
            assert!(matches!(
                app.key_action(key(KeyCode::F(2))),
                Some(Action::CycleModel)
            ));
        }
    }

    #[test]
    fn sidebar_letters_are_commands_unless_editing() {
        let mut app = make_app_with_chats(&[("c1", "First")]);
        app.focus = Focus::Sidebar;
        assert!(matches!(
            app.key_action(key(KeyCode::Char('e'))),
            Some(Action::BeginEdit)
        ));
        press(&mut app, KeyCode::Char('e'));
        assert!(matches!(
            app.key_action(key(KeyCode::Char('e'))),
            Some(Action::InsertChar('e'))
        ));
    }

    #[test]
    fn cycle_model_reports_and_persists() {
        let mut app = make_app();
        let command = press(&mut app, KeyCode::F(2));
        assert!(matches!(command, Command::PersistModel(ModelChoice::Gemini)));
        assert_eq!(app.session.model(), ModelChoice::Gemini);
        assert_eq!(
            app.status.as_ref().map(|n| n.text.as_str()),
            Some("Model: Gemini (Google)")
        );
    }

    #[test]
    fn esc_quits_when_not_editing() {
        let mut app = make_app();
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn enter_sends_and_reply_lands_in_transcript() {
        let mut app = make_app();
        type_text(&mut app, "hello");
        let command = press(&mut app, KeyCode::Enter);
        assert!(app.input.is_empty());
        assert!(app.session.state().is_typing());
        run(&mut app, command).await;

        assert!(!app.session.state().is_typing());
        let last = app.session.transcript().last().expect("reply");
        assert_eq!(last.text(), "echo: hello");
        assert_eq!(app.session.chats().len(), 1);
        assert_eq!(app.session.state().header_title(), "hello");
    }

    #[tokio::test]
    async fn sidebar_enter_loads_selected_chat() {
        let mut app = make_app_with_chats(&[("c1", "First"), ("c2", "Second")]);
        app.focus = Focus::Sidebar;
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected_chat_id(), Some(ChatId::from("c2")));
        let command = press(&mut app, KeyCode::Enter);
        assert_eq!(app.focus, Focus::Input);
        run(&mut app, command).await;
        assert_eq!(app.session.current_chat_id(), Some(&ChatId::from("c2")));
        assert_eq!(app.session.state().header_title(), "Second");
    }

    #[tokio::test]
    async fn rename_flow_from_sidebar() {
        let mut app = make_app_with_chats(&[("c1", "First")]);
        app.focus = Focus::Sidebar;
        press(&mut app, KeyCode::Char('e'));
        for _ in 0.."First".len() {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "Renamed");
        let command = press(&mut app, KeyCode::Enter);
        run(&mut app, command).await;
        assert_eq!(
            app.session.chats().get(&ChatId::from("c1")).map(|c| c.title()),
            Some("Renamed")
        );
        assert!(app.session.pending_edit_chat_id().is_none());
    }

    #[test]
    fn blank_rename_shows_validation_notice() {
        let mut app = make_app_with_chats(&[("c1", "First")]);
        app.focus = Focus::Sidebar;
        press(&mut app, KeyCode::Char('e'));
        for _ in 0.."First".len() {
            press(&mut app, KeyCode::Backspace);
        }
        assert!(press(&mut app, KeyCode::Enter).is_none());
        assert_eq!(
            app.status.as_ref().map(|n| n.text.as_str()),
            Some("Title cannot be empty.")
        );
        assert!(app.session.pending_edit_chat_id().is_some());

        press(&mut app, KeyCode::Esc);
        assert!(app.session.pending_edit_chat_id().is_none());
        assert!(!app.should_quit);
    }

    #[tokio::test]
    async fn delete_requires_confirmation() {
        let mut app = make_app_with_chats(&[("c1", "First"), ("c2", "Second")]);
        app.focus = Focus::Sidebar;
        press(&mut app, KeyCode::Char('d'));
        assert!(app.delete_prompt.as_deref().unwrap_or("").contains("\"First\""));

        // Other keys are swallowed while the prompt is open.
        assert!(app.key_action(key(KeyCode::Down)).is_none());
        press(&mut app, KeyCode::Char('n'));
        assert!(app.delete_prompt.is_none());
        assert_eq!(app.session.chats().len(), 2);

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('d'));
        let command = press(&mut app, KeyCode::Char('y'));
        run(&mut app, command).await;
        assert_eq!(app.session.chats().len(), 1);
        assert_eq!(app.sidebar_index, 0);
    }

    #[tokio::test]
    async fn failed_request_sets_error_status() {
        let gateway = StubGateway {
            fail_deletes: true,
            ..StubGateway::with_titles(&[("c1", "First")])
        };
        let mut app = TuiApp::new(SessionController::with_chats(
            Arc::new(gateway),
            vec![ConversationSummary::new(ChatId::from("c1"), "First")],
        ));
        app.focus = Focus::Sidebar;
        press(&mut app, KeyCode::Char('d'));
        let command = press(&mut app, KeyCode::Char('y'));
        run(&mut app, command).await;
        let status = app.status.as_ref().expect("notice");
        assert_eq!(status.level, NoticeLevel::Error);
        assert!(status.text.starts_with("Failed to delete chat:"));
    }

    #[test]
    fn render_shows_header_greeting_and_hint() {
        let mut app = make_app();
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        let screen = buffer_text(&terminal);
        assert!(screen.contains("New Chat"));
        assert!(screen.contains("GPT (OpenAI)"));
        assert!(screen.contains("Hello! Start a new chat"));
        assert!(screen.contains("Enter:send"));
    }

    #[tokio::test]
    async fn render_shows_typing_indicator_and_delete_prompt() {
        let mut app = make_app_with_chats(&[("c1", "First")]);
        let send = app.session.begin_send("hi");
        assert!(send.is_some());
        let mut terminal = Terminal::new(TestBackend::new(120, 24)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        assert!(buffer_text(&terminal).contains("Bot is typing..."));

        app.focus = Focus::Sidebar;
        press(&mut app, KeyCode::Char('d'));
        terminal.draw(|frame| app.render(frame)).unwrap();
        assert!(buffer_text(&terminal).contains("[y/n]"));
    }
}
