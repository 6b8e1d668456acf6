//! Request and response bodies of the chat backend's HTTP API.

use serde::{Deserialize, Serialize};

use crate::message::{ChatId, Message};

/// Fallback text shown when a send succeeds but carries neither a reply nor an error.
pub const EMPTY_RESPONSE_TEXT: &str = "An unexpected empty response occurred.";

/// Which backend model answers a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelChoice {
    /// OpenAI chat completions. Default.
    #[default]
    Gpt,
    /// Google Gemini.
    Gemini,
}

impl ModelChoice {
    /// All selectable models, in picker order.
    pub const fn all() -> &'static [Self] {
        &[Self::Gpt, Self::Gemini]
    }

    /// Wire value sent as `model_choice`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gpt => "gpt",
            Self::Gemini => "gemini",
        }
    }

    /// Human-readable label for pickers and status lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Gpt => "GPT (OpenAI)",
            Self::Gemini => "Gemini (Google)",
        }
    }

    /// The next model in picker order, wrapping around.
    pub fn next(self) -> Self {
        match self {
            Self::Gpt => Self::Gemini,
            Self::Gemini => Self::Gpt,
        }
    }
}

impl std::fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ModelChoice {
    type Err = crate::error::ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gpt" | "openai" => Ok(Self::Gpt),
            "gemini" | "google" => Ok(Self::Gemini),
            other => Err(crate::error::ProtoError::InvalidModel(other.to_string())),
        }
    }
}

/// Body of `GET /load_chat/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadChatResponse {
    /// Stored history, possibly including system messages.
    #[serde(default)]
    pub history: Vec<Message>,
    /// Conversation title, already safe for literal display.
    #[serde(default)]
    pub title: Option<String>,
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    /// Trimmed user text.
    pub message: String,
    /// Model that should answer.
    pub model_choice: ModelChoice,
}

/// Identity of a conversation the backend created while handling a send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChatInfo {
    /// New conversation id.
    pub id: ChatId,
    /// Server-chosen title.
    pub title: String,
}

/// Response of `POST /chat`.
///
/// A 200 response may still describe a failure through `is_error` or an
/// `error` field; that is a successfully decoded reply, not a transport error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageResponse {
    /// Model reply text.
    #[serde(default)]
    pub response: Option<String>,
    /// Application-level error message.
    #[serde(default)]
    pub error: Option<String>,
    /// Explicit failure flag.
    #[serde(default)]
    pub is_error: bool,
    /// Present when this send started a new conversation.
    #[serde(default)]
    pub new_chat_info: Option<NewChatInfo>,
}

impl SendMessageResponse {
    /// Text to append to the transcript.
    pub fn display_text(&self) -> &str {
        self.response
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.error.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or(EMPTY_RESPONSE_TEXT)
    }

    /// Whether the reply should be styled as an error.
    pub fn is_failure(&self) -> bool {
        self.is_error
            || (self.response.as_deref().is_none_or(str::is_empty) && self.error.is_some())
    }
}

/// Body of `POST /update_title/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRequest {
    /// Requested title, already trimmed and validated.
    pub new_title: String,
}

/// Response of `POST /update_title/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameResponse {
    /// Title as stored by the server.
    #[serde(default)]
    pub new_title: Option<String>,
}

/// Body of `POST /save_api_keys`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveKeysRequest {
    /// OpenAI key; empty clears it.
    pub openai_key: String,
    /// Google key; empty clears it.
    pub google_key: String,
}

/// Response of `POST /save_api_keys`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveKeysResponse {
    /// Confirmation text.
    #[serde(default)]
    pub message: Option<String>,
}

/// JSON error object returned with non-2xx statuses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error message.
    #[serde(default)]
    pub error: Option<String>,
}
