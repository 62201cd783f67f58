//! Error types for the conversational interface.

use sleuth_core::error::SleuthError;

/// Errors from the chat engine.
///
/// Collaborator failures never surface here: they degrade into an
/// `Unavailable` dispatch payload instead.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat is disabled")]
    Disabled,
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<ChatError> for SleuthError {
    fn from(err: ChatError) -> Self {
        SleuthError::Chat(err.to_string())
    }
}

/// Failure reported by a downstream collaborator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CollaboratorError {
    /// Not configured, unreachable, or answering with a server error.
    #[error("{0}")]
    Unavailable(String),
    #[error("no answer within {0} seconds")]
    Timeout(u64),
    /// The collaborator refused the request itself (unknown sites, bad input).
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("unreadable response: {0}")]
    InvalidResponse(String),
}
