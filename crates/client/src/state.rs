//! Session state owned by the controller.

use std::collections::VecDeque;

use proto::{ChatId, ModelChoice};

/// Header shown while a new conversation is pending.
pub const NEW_CHAT_TITLE: &str = "New Chat";
/// Header shown after a load failure.
pub const ERROR_LOADING_TITLE: &str = "Error Loading";
/// Header used when a loaded chat has no title.
pub const DEFAULT_CHAT_TITLE: &str = "Chat";
const WINDOW_TITLE_SUFFIX: &str = "Multi-AI Chatbot";

/// Which conversation the next message goes to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    /// Nothing selected; input is disabled.
    #[default]
    None,
    /// The next send starts a new conversation.
    NewChat,
    /// A saved conversation is shown.
    Chat(ChatId),
}

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A user-visible alert raised outside the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Result of the last provider-key save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStatus {
    Saved(String),
    Failed(String),
}

impl std::fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyStatus::Saved(message) => write!(f, "{message}"),
            KeyStatus::Failed(message) => write!(f, "Error: {message}"),
        }
    }
}

/// Mutable session context: selection, request bookkeeping and view-level flags.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    selection: Selection,
    generation: u64,
    blocking: usize,
    sending: usize,
    header_title: String,
    model: ModelChoice,
    key_status: Option<KeyStatus>,
    notices: VecDeque<Notice>,
    pending_delete: Option<ChatId>,
}

impl SessionState {
    pub fn new(selection: Selection) -> Self {
        let header_title = match &selection {
            Selection::NewChat => NEW_CHAT_TITLE.to_string(),
            _ => String::new(),
        };
        Self {
            selection,
            header_title,
            ..Self::default()
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    /// Id of the conversation the next send targets; `None` in new-chat mode.
    pub fn current_chat_id(&self) -> Option<&ChatId> {
        match &self.selection {
            Selection::Chat(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_new_chat(&self) -> bool {
        self.selection == Selection::NewChat
    }

    /// Input accepts text when something is selected and no blocking request is outstanding.
    pub fn input_enabled(&self) -> bool {
        self.selection != Selection::None && self.blocking == 0
    }

    /// Whether the typing indicator is shown.
    pub fn is_typing(&self) -> bool {
        self.sending > 0
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts a new navigation intent; responses tagged with older generations become stale.
    pub fn bump_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub(crate) fn begin_blocking(&mut self, sending: bool) {
        self.blocking += 1;
        if sending {
            self.sending += 1;
        }
    }

    pub(crate) fn end_blocking(&mut self, sending: bool) {
        self.blocking = self.blocking.saturating_sub(1);
        if sending {
            self.sending = self.sending.saturating_sub(1);
        }
    }

    pub fn in_flight(&self) -> usize {
        self.blocking
    }

    pub fn header_title(&self) -> &str {
        &self.header_title
    }

    pub fn set_header_title(&mut self, title: impl Into<String>) {
        self.header_title = title.into();
    }

    /// Window title: `"{header} - Multi-AI Chatbot"`.
    pub fn window_title(&self) -> String {
        if self.header_title.is_empty() {
            WINDOW_TITLE_SUFFIX.to_string()
        } else {
            format!("{} - {WINDOW_TITLE_SUFFIX}", self.header_title)
        }
    }

    pub fn model(&self) -> ModelChoice {
        self.model
    }

    pub fn set_model(&mut self, model: ModelChoice) {
        self.model = model;
    }

    pub fn key_status(&self) -> Option<&KeyStatus> {
        self.key_status.as_ref()
    }

    pub fn set_key_status(&mut self, status: KeyStatus) {
        self.key_status = Some(status);
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push_back(notice);
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    pub fn pending_delete(&self) -> Option<&ChatId> {
        self.pending_delete.as_ref()
    }

    pub fn set_pending_delete(&mut self, id: Option<ChatId>) {
        self.pending_delete = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_policy_follows_selection_and_in_flight() {
        let mut state = SessionState::new(Selection::None);
        assert!(!state.input_enabled());

        state.set_selection(Selection::NewChat);
        assert!(state.input_enabled());

        state.begin_blocking(true);
        assert!(!state.input_enabled());
        assert!(state.is_typing());

        state.end_blocking(true);
        assert!(state.input_enabled());
        assert!(!state.is_typing());
    }

    #[test]
    fn current_chat_id_is_derived_from_selection() {
        let mut state = SessionState::new(Selection::NewChat);
        assert_eq!(state.current_chat_id(), None);
        assert!(state.is_new_chat());

        state.set_selection(Selection::Chat(ChatId::from("abc")));
        assert_eq!(state.current_chat_id(), Some(&ChatId::from("abc")));
        assert!(!state.is_new_chat());
    }

    #[test]
    fn generation_marks_older_requests_stale() {
        let mut state = SessionState::default();
        let first = state.bump_generation();
        assert!(state.is_current(first));
        state.bump_generation();
        assert!(!state.is_current(first));
    }

    #[test]
    fn window_title_uses_header() {
        let mut state = SessionState::new(Selection::NewChat);
        assert_eq!(state.window_title(), "New Chat - Multi-AI Chatbot");
        state.set_header_title("Trip ideas");
        assert_eq!(state.window_title(), "Trip ideas - Multi-AI Chatbot");
    }

    #[test]
    fn notices_drain_in_order() {
        let mut state = SessionState::default();
        state.push_notice(Notice::error("first"));
        state.push_notice(Notice::info("second"));
        let drained = state.drain_notices();
        assert_eq!(drained, vec![Notice::error("first"), Notice::info("second")]);
        assert!(state.drain_notices().is_empty());
    }

    #[test]
    fn key_status_display() {
        assert_eq!(KeyStatus::Saved("Keys updated!".into()).to_string(), "Keys updated!");
        assert_eq!(KeyStatus::Failed("denied".into()).to_string(), "Error: denied");
    }
}
