//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use sleuth_chat::ChatOrchestrator;
use sleuth_core::config::SleuthConfig;

/// Shared application state, passed to handlers via axum's `State`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SleuthConfig>,
    /// The conversational engine; owns all sessions.
    pub chat: Arc<ChatOrchestrator>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: SleuthConfig, chat: ChatOrchestrator) -> Self {
        Self {
            config: Arc::new(config),
            chat: Arc::new(chat),
            start_time: Instant::now(),
        }
    }
}
