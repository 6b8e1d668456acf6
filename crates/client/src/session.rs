//! Session controller: conversation operations and response reconciliation.
//!
//! Every operation is split in three steps so several requests can be in
//! flight at once:
//!
//! 1. a `begin_*` method applies the optimistic part and returns a [`Request`]
//!    tagged with the current intent generation,
//! 2. [`Request::execute`] performs the network round-trip,
//! 3. [`SessionController::apply`] reconciles the [`Completion`] with whatever
//!    the session looks like by then, discarding stale results.
//!
//! The `async` methods (`start_new_chat`, `load_chat`, ...) run the three
//! steps back to back for callers that do not interleave requests.

use std::sync::Arc;

use proto::{
    ChatId, ConversationSummary, GatewayError, LoadChatResponse, ModelChoice, RenameRequest,
    RenameResponse, Role, SaveKeysRequest, SaveKeysResponse, SendMessageRequest,
    SendMessageResponse, ValidationError,
};
use tracing::{debug, warn};

use crate::chat_list::ChatListView;
use crate::edit::SaveOutcome;
use crate::gateway::ChatGateway;
use crate::state::{
    DEFAULT_CHAT_TITLE, ERROR_LOADING_TITLE, KeyStatus, NEW_CHAT_TITLE, Notice, Selection,
    SessionState,
};
use crate::transcript::Transcript;

const KEYS_SAVED_TEXT: &str = "Keys updated!";

/// A network call prepared by a `begin_*` method.
#[derive(Debug)]
pub struct Request {
    kind: RequestKind,
}

#[derive(Debug)]
enum RequestKind {
    NewChat {
        generation: u64,
        intent: u64,
    },
    LoadChat {
        id: ChatId,
        generation: u64,
    },
    Send {
        body: SendMessageRequest,
        generation: u64,
        new_chat_mode: bool,
    },
    Rename {
        id: ChatId,
        title: String,
    },
    Delete {
        id: ChatId,
    },
    SaveKeys {
        body: SaveKeysRequest,
    },
}

/// Outcome of an executed [`Request`], to be passed to [`SessionController::apply`].
#[derive(Debug)]
pub struct Completion {
    kind: CompletionKind,
}

#[derive(Debug)]
enum CompletionKind {
    NewChat {
        generation: u64,
        intent: u64,
        result: Result<(), GatewayError>,
    },
    LoadChat {
        id: ChatId,
        generation: u64,
        result: Result<LoadChatResponse, GatewayError>,
    },
    Send {
        generation: u64,
        new_chat_mode: bool,
        result: Result<SendMessageResponse, GatewayError>,
    },
    Rename {
        id: ChatId,
        title: String,
        result: Result<RenameResponse, GatewayError>,
    },
    Delete {
        id: ChatId,
        result: Result<(), GatewayError>,
    },
    SaveKeys {
        result: Result<SaveKeysResponse, GatewayError>,
    },
}

impl Request {
    /// Short operation name for logs and status lines.
    pub fn label(&self) -> &'static str {
        match &self.kind {
            RequestKind::NewChat { .. } => "new_chat",
            RequestKind::LoadChat { .. } => "load_chat",
            RequestKind::Send { .. } => "send_message",
            RequestKind::Rename { .. } => "rename_chat",
            RequestKind::Delete { .. } => "delete_chat",
            RequestKind::SaveKeys { .. } => "save_api_keys",
        }
    }

    /// Performs the round-trip. Never fails; errors travel inside the completion.
    pub async fn execute(self, gateway: &dyn ChatGateway) -> Completion {
        let kind = match self.kind {
            RequestKind::NewChat { generation, intent } => CompletionKind::NewChat {
                generation,
                intent,
                result: gateway.new_chat().await,
            },
            RequestKind::LoadChat { id, generation } => {
                let result = gateway.load_chat(&id).await;
                CompletionKind::LoadChat {
                    id,
                    generation,
                    result,
                }
            }
            RequestKind::Send {
                body,
                generation,
                new_chat_mode,
            } => CompletionKind::Send {
                generation,
                new_chat_mode,
                result: gateway.send_message(&body).await,
            },
            RequestKind::Rename { id, title } => {
                let body = RenameRequest {
                    new_title: title.clone(),
                };
                let result = gateway.rename_chat(&id, &body).await;
                CompletionKind::Rename { id, title, result }
            }
            RequestKind::Delete { id } => {
                let result = gateway.delete_chat(&id).await;
                CompletionKind::Delete { id, result }
            }
            RequestKind::SaveKeys { body } => CompletionKind::SaveKeys {
                result: gateway.save_api_keys(&body).await,
            },
        };
        Completion { kind }
    }
}

impl Completion {
    /// Whether the round-trip failed at the gateway level.
    pub fn is_error(&self) -> bool {
        match &self.kind {
            CompletionKind::NewChat { result, .. } | CompletionKind::Delete { result, .. } => {
                result.is_err()
            }
            CompletionKind::LoadChat { result, .. } => result.is_err(),
            CompletionKind::Send { result, .. } => result.is_err(),
            CompletionKind::Rename { result, .. } => result.is_err(),
            CompletionKind::SaveKeys { result } => result.is_err(),
        }
    }
}

/// Owns the session state, the sidebar list and the transcript, and keeps
/// them consistent with an asynchronous, fallible backend.
pub struct SessionController {
    gateway: Arc<dyn ChatGateway>,
    state: SessionState,
    chats: ChatListView,
    transcript: Transcript,
    initial_chat: Option<ChatId>,
    /// Latest new-chat request; older ones are stale.
    new_chat_intent: u64,
    /// Target and generation of the load the view is waiting for.
    pending_load: Option<(ChatId, u64)>,
}

impl SessionController {
    /// A controller in new-chat mode with an empty sidebar.
    pub fn new(gateway: Arc<dyn ChatGateway>) -> Self {
        Self::with_chats(gateway, Vec::new())
    }

    /// Seeds the sidebar with server-provided entries.
    ///
    /// If one entry is marked active it becomes the initial chat to load via
    /// [`open_initial_chat`](Self::open_initial_chat); until then nothing is
    /// selected. Otherwise the controller starts in new-chat mode.
    pub fn with_chats(
        gateway: Arc<dyn ChatGateway>,
        summaries: Vec<ConversationSummary>,
    ) -> Self {
        let mut chats = ChatListView::from_summaries(summaries);
        let initial_chat = chats.active_id().cloned();
        chats.set_active(None);
        let selection = if initial_chat.is_some() {
            Selection::None
        } else {
            Selection::NewChat
        };
        Self {
            gateway,
            state: SessionState::new(selection),
            chats,
            transcript: Transcript::with_greeting(),
            initial_chat,
            new_chat_intent: 0,
            pending_load: None,
        }
    }

    pub fn gateway(&self) -> Arc<dyn ChatGateway> {
        Arc::clone(&self.gateway)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn chats(&self) -> &ChatListView {
        &self.chats
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn current_chat_id(&self) -> Option<&ChatId> {
        self.state.current_chat_id()
    }

    pub fn input_enabled(&self) -> bool {
        self.state.input_enabled()
    }

    /// Id of the single sidebar item in edit mode, if any.
    pub fn pending_edit_chat_id(&self) -> Option<&ChatId> {
        self.chats.editing_id()
    }

    pub fn initial_chat_id(&self) -> Option<&ChatId> {
        self.initial_chat.as_ref()
    }

    pub fn model(&self) -> ModelChoice {
        self.state.model()
    }

    pub fn set_model(&mut self, model: ModelChoice) {
        debug!(%model, "Model selected");
        self.state.set_model(model);
    }

    /// Switches to the next model and returns it.
    pub fn cycle_model(&mut self) -> ModelChoice {
        let next = self.state.model().next();
        self.set_model(next);
        next
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.state.drain_notices()
    }

    /// Issues the load for the chat that was active when the controller was seeded.
    pub fn open_initial_chat(&mut self) -> Option<Request> {
        let id = self.initial_chat.take()?;
        self.begin_load(id)
    }

    // ── New chat ─────────────────────────────────────────────

    /// Prepares the new-chat request.
    ///
    /// The navigation generation only moves once the backend accepts, so a
    /// failed request leaves in-flight replies for the current chat valid.
    pub fn begin_new_chat(&mut self) -> Request {
        self.chats.cancel_all_edits();
        self.new_chat_intent += 1;
        let intent = self.new_chat_intent;
        let generation = self.state.generation();
        self.state.begin_blocking(false);
        debug!(generation, intent, "Starting new chat");
        Request {
            kind: RequestKind::NewChat { generation, intent },
        }
    }

    fn apply_new_chat(&mut self, generation: u64, intent: u64, result: Result<(), GatewayError>) {
        self.state.end_blocking(false);
        if !self.state.is_current(generation) || intent != self.new_chat_intent {
            warn!(generation, intent, "Discarding stale new chat response");
            return;
        }
        match result {
            Ok(()) => {
                self.state.bump_generation();
                self.pending_load = None;
                self.reset_to_new_chat();
            }
            Err(err) => {
                debug!(error = %err, "New chat request failed");
                self.transcript.append(
                    Role::Assistant,
                    &format!("Error starting new chat: {err}"),
                    true,
                );
            }
        }
    }

    fn reset_to_new_chat(&mut self) {
        self.transcript.reset_to_greeting();
        self.chats.set_active(None);
        self.state.set_selection(Selection::NewChat);
        self.state.set_header_title(NEW_CHAT_TITLE);
    }

    // ── Load ─────────────────────────────────────────────────

    /// Returns `None` when `id` is already the current chat.
    pub fn begin_load(&mut self, id: ChatId) -> Option<Request> {
        if self.current_chat_id() == Some(&id) {
            debug!(chat_id = %id, "Chat already loaded");
            return None;
        }
        self.chats.cancel_all_edits();
        let generation = self.state.bump_generation();
        self.state.begin_blocking(false);
        debug!(chat_id = %id, generation, "Loading chat");
        self.pending_load = Some((id.clone(), generation));
        Some(Request {
            kind: RequestKind::LoadChat { id, generation },
        })
    }

    fn apply_load(
        &mut self,
        id: ChatId,
        generation: u64,
        result: Result<LoadChatResponse, GatewayError>,
    ) {
        self.state.end_blocking(false);
        if !self.state.is_current(generation) {
            warn!(chat_id = %id, generation, "Discarding stale load response");
            return;
        }
        self.pending_load = None;
        match result {
            Ok(loaded) => {
                self.transcript.replace_with_history(&loaded.history);
                self.chats.set_active(Some(&id));
                let title = loaded
                    .title
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| DEFAULT_CHAT_TITLE.to_string());
                self.state.set_header_title(title);
                self.state.set_selection(Selection::Chat(id));
            }
            Err(err) => {
                debug!(chat_id = %id, error = %err, "Load chat failed");
                self.chats.set_active(None);
                self.state.set_selection(Selection::None);
                self.transcript
                    .reset_with_error(&format!("Error loading chat: {err}"));
                self.state.set_header_title(ERROR_LOADING_TITLE);
            }
        }
    }

    // ── Send ─────────────────────────────────────────────────

    /// Appends the user message and prepares the send.
    ///
    /// Returns `None` when input is disabled or the text is blank.
    pub fn begin_send(&mut self, text: &str) -> Option<Request> {
        let message = text.trim();
        if message.is_empty() || !self.state.input_enabled() {
            return None;
        }
        self.transcript.append(Role::User, message, false);
        let new_chat_mode = self.state.is_new_chat();
        let generation = self.state.generation();
        self.state.begin_blocking(true);
        debug!(generation, new_chat_mode, "Sending message");
        Some(Request {
            kind: RequestKind::Send {
                body: SendMessageRequest {
                    message: message.to_string(),
                    model_choice: self.state.model(),
                },
                generation,
                new_chat_mode,
            },
        })
    }

    fn apply_send(
        &mut self,
        generation: u64,
        new_chat_mode: bool,
        result: Result<SendMessageResponse, GatewayError>,
    ) {
        self.state.end_blocking(true);
        let current = self.state.is_current(generation);
        match result {
            Ok(reply) => {
                if new_chat_mode && reply.new_chat_info.is_none() && !reply.is_failure() {
                    warn!(generation, "Reply in a new chat carried no new_chat_info");
                }
                if let Some(info) = reply.new_chat_info.as_ref().filter(|_| new_chat_mode) {
                    let activate = current && self.state.is_new_chat();
                    debug!(chat_id = %info.id, activate, "Backend created a chat");
                    self.chats.insert(info.id.clone(), info.title.clone(), activate);
                    if activate {
                        self.state.set_selection(Selection::Chat(info.id.clone()));
                        self.state.set_header_title(info.title.clone());
                    }
                }
                if current {
                    self.transcript
                        .append(Role::Assistant, reply.display_text(), reply.is_failure());
                } else {
                    warn!(generation, "Discarding stale reply");
                }
            }
            Err(err) if current => {
                debug!(error = %err, "Send failed");
                let text = if err.is_network() {
                    format!("Network Error: {err}")
                } else {
                    err.to_string()
                };
                self.transcript.append(Role::Assistant, &text, true);
            }
            Err(err) => warn!(generation, error = %err, "Discarding stale send failure"),
        }
    }

    // ── Rename ───────────────────────────────────────────────

    /// Puts `id` in edit mode, force-cancelling any other edit.
    pub fn begin_edit(&mut self, id: &ChatId) -> Result<(), ValidationError> {
        if let Some(cancelled) = self.chats.begin_edit(id)? {
            debug!(chat_id = %cancelled, "Edit cancelled by another edit");
        }
        Ok(())
    }

    pub fn cancel_edit(&mut self, id: &ChatId) -> bool {
        self.chats.cancel_edit(id)
    }

    pub fn edit_draft(&mut self, id: &ChatId) -> Option<&mut String> {
        self.chats.draft_mut(id)
    }

    /// Validates the draft of `id` and prepares the rename.
    ///
    /// Validation failures are also queued as notices; the item stays in edit mode.
    /// `Ok(None)` means nothing needs to be sent.
    pub fn save_edit(&mut self, id: &ChatId) -> Result<Option<Request>, ValidationError> {
        match self.chats.prepare_save(id) {
            Ok(SaveOutcome::Rename(title)) => {
                debug!(chat_id = %id, "Renaming chat");
                Ok(Some(Request {
                    kind: RequestKind::Rename {
                        id: id.clone(),
                        title,
                    },
                }))
            }
            Ok(SaveOutcome::Unchanged | SaveOutcome::InFlight) => Ok(None),
            Err(err) => {
                self.state.push_notice(Notice::error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Edits and saves in one step.
    pub fn begin_rename(
        &mut self,
        id: &ChatId,
        title: &str,
    ) -> Result<Option<Request>, ValidationError> {
        self.begin_edit(id)?;
        if let Some(draft) = self.chats.draft_mut(id) {
            *draft = title.to_string();
        }
        self.save_edit(id)
    }

    fn apply_rename(
        &mut self,
        id: ChatId,
        title: String,
        result: Result<RenameResponse, GatewayError>,
    ) {
        match result {
            Ok(renamed) => {
                let stored = renamed
                    .new_title
                    .filter(|t| !t.is_empty())
                    .unwrap_or(title);
                if self.current_chat_id() == Some(&id) {
                    self.state.set_header_title(stored.clone());
                }
                self.chats.finish_rename(&id, Some(stored));
            }
            Err(err) => {
                debug!(chat_id = %id, error = %err, "Rename failed");
                self.chats.finish_rename(&id, None);
                self.state
                    .push_notice(Notice::error(format!("Failed to update title: {err}")));
            }
        }
    }

    // ── Delete ───────────────────────────────────────────────

    /// Records `id` as awaiting confirmation and returns the prompt to show.
    pub fn request_delete(&mut self, id: &ChatId) -> Option<String> {
        let title = self.chats.get(id)?.title().to_string();
        self.state.set_pending_delete(Some(id.clone()));
        Some(delete_prompt(&title))
    }

    /// Confirms the pending delete, if any.
    pub fn confirm_delete(&mut self) -> Option<Request> {
        let id = self.state.pending_delete()?.clone();
        self.state.set_pending_delete(None);
        debug!(chat_id = %id, "Deleting chat");
        Some(Request {
            kind: RequestKind::Delete { id },
        })
    }

    pub fn cancel_delete(&mut self) {
        self.state.set_pending_delete(None);
    }

    fn apply_delete(&mut self, id: ChatId, result: Result<(), GatewayError>) {
        if let Err(err) = result {
            debug!(chat_id = %id, error = %err, "Delete failed");
            self.state
                .push_notice(Notice::error(format!("Failed to delete chat: {err}")));
            return;
        }
        let was_current =
            self.chats.active_id() == Some(&id) || self.current_chat_id() == Some(&id);
        let was_loading = self
            .pending_load
            .as_ref()
            .is_some_and(|(target, _)| *target == id);
        self.chats.remove(&id);
        if was_current {
            self.state.bump_generation();
            self.pending_load = None;
            self.reset_to_new_chat();
        } else {
            if was_loading {
                debug!(chat_id = %id, "Deleted chat was still loading");
                self.state.bump_generation();
                self.pending_load = None;
            }
            if self.chats.is_empty() && *self.state.selection() == Selection::None {
                self.state.set_selection(Selection::NewChat);
            }
        }
    }

    // ── Provider keys ────────────────────────────────────────

    pub fn begin_save_keys(&mut self, openai_key: &str, google_key: &str) -> Request {
        Request {
            kind: RequestKind::SaveKeys {
                body: SaveKeysRequest {
                    openai_key: openai_key.trim().to_string(),
                    google_key: google_key.trim().to_string(),
                },
            },
        }
    }

    fn apply_save_keys(&mut self, result: Result<SaveKeysResponse, GatewayError>) {
        match result {
            Ok(saved) => {
                let message = saved
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| KEYS_SAVED_TEXT.to_string());
                self.state.push_notice(Notice::info(message.clone()));
                self.state.set_key_status(KeyStatus::Saved(message));
            }
            Err(err) => {
                let status = KeyStatus::Failed(err.to_string());
                self.state.push_notice(Notice::error(status.to_string()));
                self.state.set_key_status(status);
            }
        }
    }

    // ── Completion ───────────────────────────────────────────

    /// Reconciles a finished request with the current session.
    pub fn apply(&mut self, completion: Completion) {
        match completion.kind {
            CompletionKind::NewChat {
                generation,
                intent,
                result,
            } => self.apply_new_chat(generation, intent, result),
            CompletionKind::LoadChat {
                id,
                generation,
                result,
            } => self.apply_load(id, generation, result),
            CompletionKind::Send {
                generation,
                new_chat_mode,
                result,
            } => self.apply_send(generation, new_chat_mode, result),
            CompletionKind::Rename { id, title, result } => self.apply_rename(id, title, result),
            CompletionKind::Delete { id, result } => self.apply_delete(id, result),
            CompletionKind::SaveKeys { result } => self.apply_save_keys(result),
        }
    }

    async fn run(&mut self, request: Request) {
        let gateway = Arc::clone(&self.gateway);
        let completion = request.execute(gateway.as_ref()).await;
        self.apply(completion);
    }

    // ── Sequential forms ─────────────────────────────────────

    pub async fn start_new_chat(&mut self) {
        let request = self.begin_new_chat();
        self.run(request).await;
    }

    pub async fn load_chat(&mut self, id: ChatId) {
        if let Some(request) = self.begin_load(id) {
            self.run(request).await;
        }
    }

    pub async fn send_message(&mut self, text: &str) {
        if let Some(request) = self.begin_send(text) {
            self.run(request).await;
        }
    }

    pub async fn rename_chat(&mut self, id: &ChatId, title: &str) -> Result<(), ValidationError> {
        if let Some(request) = self.begin_rename(id, title)? {
            self.run(request).await;
        }
        Ok(())
    }

    /// Asks `confirm` with the delete prompt and deletes only if it returns `true`.
    pub async fn delete_chat(&mut self, id: &ChatId, confirm: impl FnOnce(&str) -> bool) {
        let Some(prompt) = self.request_delete(id) else {
            return;
        };
        if !confirm(&prompt) {
            self.cancel_delete();
            return;
        }
        if let Some(request) = self.confirm_delete() {
            self.run(request).await;
        }
    }

    pub async fn save_api_keys(&mut self, openai_key: &str, google_key: &str) {
        let request = self.begin_save_keys(openai_key, google_key);
        self.run(request).await;
    }
}

/// Confirmation text naming the full title.
pub fn delete_prompt(title: &str) -> String {
    format!("Are you sure you want to delete the chat \"{title}\"? This cannot be undone.")
}
