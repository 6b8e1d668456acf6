//! Elm Architecture (TEA) action and command types for the TUI.
//!
//! All state mutations flow through [`Action`], and side effects are
//! expressed as [`Command`] values returned from `TuiApp::update()`.

use client::{Completion, Request};
use proto::ModelChoice;

// ─── Action ──────────────────────────────────────────────────────────────────

/// Every possible state mutation in the TUI. The `update()` method on
/// `TuiApp` is the *only* place where `Action` variants are matched
/// and applied.
#[derive(Debug)]
pub enum Action {
    // ── Text entry ───────────────────────────────────────────
    /// Insert a character into the message input or the title being edited.
    InsertChar(char),
    /// Delete the character before the cursor.
    DeleteChar,
    MoveCursorLeft,
    MoveCursorRight,
    /// Enter: send the message, load the selected chat, or save the edit.
    Submit,

    // ── Navigation ───────────────────────────────────────────
    /// Scroll the transcript up by `n` lines.
    ScrollUp(u16),
    /// Scroll the transcript down by `n` lines.
    ScrollDown(u16),
    /// Toggle keyboard focus between sidebar and input.
    ToggleFocus,
    SidebarUp,
    SidebarDown,

    // ── Conversations ────────────────────────────────────────
    NewChat,
    /// Put the selected sidebar chat in edit mode.
    BeginEdit,
    /// Ask for confirmation before deleting the selected chat.
    RequestDelete,
    ConfirmDelete,
    CancelDelete,
    /// Esc: cancel the edit in progress, otherwise quit.
    Cancel,
    /// Switch to the next model.
    CycleModel,
    /// A request finished.
    Completed(Completion),

    // ── System ───────────────────────────────────────────────
    /// Periodic spinner tick.
    Tick,
    Quit,
    /// Terminal was resized (no-op, triggers redraw).
    Resize,
}

// ─── Command ─────────────────────────────────────────────────────────────────

/// Side effects returned by `TuiApp::update()`. The event loop is
/// responsible for executing these asynchronously.
#[derive(Debug)]
pub enum Command {
    /// No side effect.
    None,
    /// Run the request against the backend and feed its completion back.
    Spawn(Request),
    /// Remember the model for the next session.
    PersistModel(ModelChoice),
    /// Execute multiple commands in order.
    Batch(Vec<Command>),
}

impl Command {
    pub fn is_none(&self) -> bool {
        matches!(self, Command::None)
    }

    /// Wraps an optional request.
    pub fn spawn(request: Option<Request>) -> Self {
        request.map_or(Command::None, Command::Spawn)
    }
}
