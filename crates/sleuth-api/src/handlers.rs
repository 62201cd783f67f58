//! Route handler functions for the chat API.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sleuth_chat::{ChatRequest, ChatResponse, ChatSessionSummary};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub active_sessions: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatSessionsResponse {
    pub sessions: Vec<ChatSessionSummary>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteSessionResponse {
    pub deleted: bool,
    pub session_id: Uuid,
}

// =============================================================================
// Chat
// =============================================================================

/// POST /chat - handle one conversational turn.
///
/// Collaborator outages come back as 200 with an `unavailable` payload;
/// only invalid input or a disabled engine produce an error status.
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) =
        body.map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e.body_text())))?;
    let response = state.chat.handle(request).await?;
    Ok(Json(response))
}

/// GET /chat/sessions - list live sessions, most recent first.
pub async fn list_sessions(State(state): State<AppState>) -> Json<ChatSessionsResponse> {
    let sessions = state.chat.list_sessions();
    let total = sessions.len();
    Json(ChatSessionsResponse { sessions, total })
}

/// DELETE /chat/sessions/{id} - forget a session and its remembered username.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteSessionResponse>, ApiError> {
    let session_id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::BadRequest(format!("Invalid session id: '{}'", id)))?;
    state.chat.delete_session(session_id)?;
    Ok(Json(DeleteSessionResponse {
        deleted: true,
        session_id,
    }))
}

// =============================================================================
// Health
// =============================================================================

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_sessions: state.chat.session_count(),
    })
}
