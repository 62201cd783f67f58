//! Chat orchestrator.
//!
//! Entry point for a conversational turn: validates the query, finds or
//! creates the session, hydrates the conversation context, parses the
//! utterance, dispatches it, and writes the updated context back.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, TimeZone, Utc};
use tracing::{debug, error, info};
use uuid::Uuid;

use sleuth_core::config::{ChatConfig, SleuthConfig};

use crate::classifier::IntentClassifier;
use crate::collaborator::{AccountDiscovery, RiskAnalyzer};
use crate::context::{ConversationContext, ConversationManager};
use crate::dispatcher::{DispatchSettings, Dispatcher};
use crate::error::ChatError;
use crate::extractor::IdentifierExtractor;
use crate::response::ResponseFormatter;
use crate::types::{
    ChatRequest, ChatResponse, ChatSessionSummary, ConversationSession, DispatchPayload,
    StructuredQuery,
};

/// Coordinates extraction, classification, dispatch, and session state.
pub struct ChatOrchestrator {
    extractor: IdentifierExtractor,
    classifier: IntentClassifier,
    context_manager: ConversationManager,
    dispatcher: Dispatcher,
    sessions: Mutex<HashMap<Uuid, ConversationSession>>,
    config: ChatConfig,
}

impl ChatOrchestrator {
    /// Build an orchestrator over the given collaborators.
    pub fn new(
        config: &SleuthConfig,
        discovery: Arc<dyn AccountDiscovery>,
        analyzer: Arc<dyn RiskAnalyzer>,
    ) -> Self {
        let dispatcher = Dispatcher::new(
            discovery,
            analyzer,
            ResponseFormatter::new(config.chat.max_listed_accounts),
            DispatchSettings::from_config(&config.discovery),
        );
        Self::with_dispatcher(config.chat.clone(), dispatcher)
    }

    pub fn with_dispatcher(config: ChatConfig, dispatcher: Dispatcher) -> Self {
        Self {
            extractor: IdentifierExtractor::new(),
            classifier: IntentClassifier::new(),
            context_manager: ConversationManager::new(config.session_timeout_minutes),
            dispatcher,
            sessions: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Reject queries that must not reach the pipeline.
    pub fn validate(&self, text: &str) -> Result<(), ChatError> {
        if !self.config.enabled {
            return Err(ChatError::Disabled);
        }
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if text.chars().count() > self.config.max_message_length {
            return Err(ChatError::MessageTooLong(self.config.max_message_length));
        }
        Ok(())
    }

    /// Extract and classify an utterance. The two steps are independent.
    pub fn parse(&self, text: &str, received_at: DateTime<Utc>) -> StructuredQuery {
        StructuredQuery {
            raw_query: text.to_string(),
            received_at,
            intent: self.classifier.classify(text),
            identifier: self.extractor.extract(text),
            sites: self.extractor.extract_platforms(text),
        }
    }

    /// Handle one chat turn.
    ///
    /// A `last_identifier` on the request takes precedence over the
    /// session's remembered username. Collaborator failures come back as a
    /// degraded response, never as an error.
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatResponse, ChatError> {
        self.validate(&request.query)?;

        let received_at = request.timestamp.unwrap_or_else(Utc::now);
        let (session_id, session_context) = self.resolve_session(request.session_id)?;

        let supplied = request
            .last_identifier
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        let mut context = match supplied {
            Some(id) => ConversationContext::with_identifier(id),
            None => session_context,
        };

        let query = self.parse(request.query.trim(), received_at);
        debug!(
            session_id = %session_id,
            intent = %query.intent,
            extracted = ?query.identifier,
            remembered = ?context.get(),
            "Query parsed"
        );

        // No lock is held here: the context was copied out above.
        let result = self.dispatcher.dispatch(&query, &mut context).await;

        let last_identifier = context.get().map(str::to_string);
        self.store_turn(session_id, context)?;

        info!(
            session_id = %session_id,
            intent = %result.intent,
            identifier = ?result.identifier,
            degraded = result.payload.is_unavailable(),
            "Query handled"
        );

        let data = match result.payload {
            DispatchPayload::General { .. } => None,
            other => Some(other),
        };

        Ok(ChatResponse {
            query: request.query,
            response: result.reply,
            query_type: result.intent,
            timestamp: received_at,
            data,
            last_identifier,
            session_id,
            suggestions: result.suggestions,
        })
    }

    /// Get a session by ID.
    pub fn get_session(&self, session_id: Uuid) -> Option<ConversationSession> {
        self.sessions
            .lock()
            .ok()
            .and_then(|s| s.get(&session_id).cloned())
    }

    /// List all active sessions.
    pub fn list_sessions(&self) -> Vec<ChatSessionSummary> {
        let sessions = match self.sessions.lock() {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        let mut summaries: Vec<ChatSessionSummary> = sessions
            .values()
            .map(|s| ChatSessionSummary {
                id: s.id,
                started_at: format_epoch(s.started_at),
                last_message_at: format_epoch(s.last_message_at),
                message_count: s.message_count,
                last_identifier: s.context.get().map(str::to_string),
            })
            .collect();
        summaries.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        summaries
    }

    /// Delete a session and the username it remembers.
    pub fn delete_session(&self, session_id: Uuid) -> Result<(), ChatError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| ChatError::StorageError(format!("session lock poisoned: {}", e)))?;
        if sessions.remove(&session_id).is_none() {
            return Err(ChatError::SessionNotFound(session_id));
        }
        info!(session_id = %session_id, "Session deleted");
        Ok(())
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let Ok(mut sessions) = self.sessions.lock() else {
            return 0;
        };
        let before = sessions.len();
        sessions.retain(|_, s| !self.context_manager.is_expired(s));
        let removed = before - sessions.len();
        if removed > 0 {
            debug!(removed, "Expired sessions purged");
        }
        removed
    }

    /// Find the requested live session or start a new one. Returns the id and
    /// a copy of its context.
    fn resolve_session(
        &self,
        requested: Option<Uuid>,
    ) -> Result<(Uuid, ConversationContext), ChatError> {
        let mut sessions = self.sessions.lock().map_err(|e| {
            error!("Session lock poisoned: {}", e);
            ChatError::StorageError(format!("session lock poisoned: {}", e))
        })?;

        if let Some(sid) = requested {
            if let Some(session) = sessions.get(&sid) {
                if !self.context_manager.is_expired(session) {
                    return Ok((sid, session.context.clone()));
                }
                debug!(session_id = %sid, "Session expired, starting a new one");
                sessions.remove(&sid);
            }
        }

        let session = self.context_manager.create_session();
        let sid = session.id;
        sessions.insert(sid, session);
        Ok((sid, ConversationContext::default()))
    }

    fn store_turn(&self, session_id: Uuid, context: ConversationContext) -> Result<(), ChatError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| ChatError::StorageError(format!("session lock poisoned: {}", e)))?;
        // The session may have been deleted while the dispatch was in flight.
        if let Some(session) = sessions.get_mut(&session_id) {
            self.context_manager.record_turn(session, context);
        }
        Ok(())
    }
}

fn format_epoch(epoch: i64) -> String {
    Local
        .timestamp_opt(epoch, 0)
        .single()
        .map(|dt: DateTime<Local>| dt.to_rfc3339())
        .unwrap_or_else(|| epoch.to_string())
}
