use thiserror::Error;

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration loading/validation error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Backend request error.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Client-side input validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Internal protocol type error.
    #[error("Proto error: {0}")]
    Proto(#[from] ProtoError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field was not provided.
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// A field has an invalid value and reason.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// Filesystem read error.
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error.
    #[error("TOML parse error: {0}")]
    Toml(String),
}

/// Errors raised while talking to the chat backend.
///
/// The variants follow how a failure reached the client: the transport never
/// produced a response, the server answered non-2xx with a JSON `error`
/// field, the server answered non-2xx with something else, or a 2xx body
/// could not be decoded.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never produced an HTTP response.
    #[error("Could not reach the server. {0}")]
    Network(String),

    /// Non-2xx response carrying a JSON `error` message.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// Non-2xx response whose body is not a JSON error object.
    #[error("Server error: {status} {reason}")]
    Status { status: u16, reason: String },

    /// A 2xx response body did not match the expected shape.
    #[error("Invalid response from server: {0}")]
    Decode(String),

    /// The configured base URL cannot be used to build request URLs.
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),
}

impl GatewayError {
    /// Returns `true` for transport-level failures (no HTTP response at all).
    pub fn is_network(&self) -> bool {
        matches!(self, GatewayError::Network(_))
    }

    /// HTTP status of the failed response, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Server { status, .. } | GatewayError::Status { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// Input rejected on the client before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Title was blank after trimming.
    #[error("Title cannot be empty.")]
    EmptyTitle,

    /// Title longer than the allowed number of characters.
    #[error("Title cannot exceed {max} characters.")]
    TitleTooLong { max: usize, len: usize },

    /// Save/cancel issued for a chat that is not in edit mode.
    #[error("Chat {0} is not being edited")]
    NotEditing(String),

    /// The referenced chat is not in the sidebar list.
    #[error("Chat not found: {0}")]
    UnknownChat(String),
}

/// Internal proto errors
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Invalid role string value.
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    /// Invalid model choice string value.
    #[error("Invalid model choice: {0}")]
    InvalidModel(String),

    /// Generic serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}
