//! Client-side chat session core.
//!
//! Owns the state machine that keeps a transcript, a sidebar list of saved
//! conversations and the input controls consistent with an asynchronous chat
//! backend, plus the renderer that turns message text into safe display
//! segments. Front ends (terminal, browser) bind their events to
//! [`SessionController`] methods and draw from its accessors.

pub mod chat_list;
pub mod edit;
pub mod gateway;
pub mod html;
pub mod render;
pub mod session;
pub mod state;
pub mod transcript;

pub use chat_list::{ChatListItem, ChatListView};
pub use edit::{EditState, SaveOutcome, validate_title};
#[cfg(feature = "http")]
pub use gateway::HttpGateway;
pub use gateway::ChatGateway;
pub use html::escape_html;
pub use render::{CodeSegment, DisplayNode, Segment, render, truncate_title};
pub use session::{Completion, Request, SessionController, delete_prompt};
pub use state::{KeyStatus, Notice, NoticeLevel, Selection, SessionState};
pub use transcript::Transcript;
