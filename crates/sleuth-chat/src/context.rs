//! Conversation context management.
//!
//! A conversation remembers exactly one thing across turns: the last
//! username the user asked about. [`ConversationContext`] is that slot;
//! [`ConversationManager`] owns session lifetimes around it.

use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::ConversationSession;

// =============================================================================
// ConversationContext
// =============================================================================

/// The last username referenced in a conversation.
///
/// Only the dispatcher writes to it, after it has resolved the identifier a
/// request was served with. Every other component reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationContext {
    last_identifier: Option<String>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hydrate from a caller-supplied value. Blank values leave the slot empty.
    pub fn with_identifier(identifier: impl Into<String>) -> Self {
        let mut ctx = Self::new();
        ctx.set(identifier);
        ctx
    }

    pub fn get(&self) -> Option<&str> {
        self.last_identifier.as_deref()
    }

    /// Overwrite the slot. Blank values are ignored.
    pub fn set(&mut self, identifier: impl Into<String>) {
        let identifier = identifier.into();
        let trimmed = identifier.trim();
        if !trimmed.is_empty() {
            self.last_identifier = Some(trimmed.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.last_identifier.is_none()
    }
}

// =============================================================================
// ConversationManager
// =============================================================================

/// Creates, expires, and advances conversation sessions.
pub struct ConversationManager {
    /// Session timeout in minutes.
    pub session_timeout_minutes: u32,
}

impl ConversationManager {
    pub fn new(session_timeout_minutes: u32) -> Self {
        Self {
            session_timeout_minutes,
        }
    }

    /// Create a fresh conversation session with an empty context.
    pub fn create_session(&self) -> ConversationSession {
        let now = Local::now().timestamp();
        ConversationSession {
            id: Uuid::new_v4(),
            started_at: now,
            last_message_at: now,
            message_count: 0,
            context: ConversationContext::default(),
        }
    }

    /// Check whether a session has expired based on the configured timeout.
    pub fn is_expired(&self, session: &ConversationSession) -> bool {
        let now = Local::now().timestamp();
        let timeout_secs = i64::from(self.session_timeout_minutes) * 60;
        now - session.last_message_at > timeout_secs
    }

    /// Record a completed turn: store the post-dispatch context and bump
    /// the activity counters.
    pub fn record_turn(&self, session: &mut ConversationSession, context: ConversationContext) {
        session.last_message_at = Local::now().timestamp();
        session.message_count += 1;
        session.context = context;
    }
}
