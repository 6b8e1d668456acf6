//! Shared protocol types for the chat client and its front ends.
//!
//! This crate defines the serializable conversation/message structures, the
//! HTTP request/response bodies exchanged with the chat backend, and the
//! strongly-typed error enums shared across the workspace.

pub mod api;
pub mod error;
pub mod message;

/// Re-export of HTTP request/response bodies.
pub use api::{
    EMPTY_RESPONSE_TEXT, ErrorBody, LoadChatResponse, ModelChoice, NewChatInfo, RenameRequest,
    RenameResponse, SaveKeysRequest, SaveKeysResponse, SendMessageRequest, SendMessageResponse,
};
/// Re-export of all protocol error types.
pub use error::*;
/// Re-export of conversation/message identity types.
pub use message::{ChatId, ConversationSummary, Message, Role};

/// Maximum number of characters accepted for a conversation title.
pub const MAX_TITLE_LENGTH: usize = 100;
