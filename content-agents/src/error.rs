//! Error types for the coordination core

use crate::message::MessageType;

/// Result type for coordination operations
pub type Result<T> = std::result::Result<T, CoordinationError>;

/// Errors surfaced to callers of the hub, coordinator and content collaborator
#[derive(Debug, thiserror::Error)]
pub enum CoordinationError {
    #[error("Agent already registered: {0}")]
    DuplicateAgent(String),

    #[error("Agent name is reserved: {0}")]
    ReservedName(String),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Template not found: {0}")]
    UnknownTemplate(String),

    #[error("Content block not found: {0}")]
    UnknownContentBlock(String),

    #[error("Expected a {expected} message, got {actual}")]
    IntentMismatch {
        expected: MessageType,
        actual: MessageType,
    },

    #[error("Malformed {message_type} payload: {reason}")]
    MalformedPayload {
        message_type: MessageType,
        reason: String,
    },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
