//! API error types and JSON error response formatting.
//!
//! Every failure leaves the server as `{error, message}` with a status code
//! derived from the underlying chat or core error.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use sleuth_chat::ChatError;
use sleuth_core::error::SleuthError;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 400 - malformed body or invalid query.
    #[error("{0}")]
    BadRequest(String),
    /// 404 - unknown session.
    #[error("{0}")]
    NotFound(String),
    /// 500 - unexpected server error.
    #[error("{0}")]
    Internal(String),
    /// 503 - chat switched off in config.
    #[error("{0}")]
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::NotFound(_) => "not_found",
            ApiError::Internal(_) => "internal_error",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = %status, error = %self, "Request failed");
        }
        let body = ErrorBody {
            error: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyMessage | ChatError::MessageTooLong(_) => {
                ApiError::BadRequest(err.to_string())
            }
            ChatError::SessionNotFound(_) => ApiError::NotFound(err.to_string()),
            ChatError::Disabled => ApiError::ServiceUnavailable(err.to_string()),
            ChatError::StorageError(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<SleuthError> for ApiError {
    fn from(err: SleuthError) -> Self {
        match &err {
            SleuthError::Config(msg) => ApiError::BadRequest(msg.clone()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_chat_error_status_mapping() {
        let cases = [
            (ChatError::EmptyMessage, StatusCode::BAD_REQUEST),
            (ChatError::MessageTooLong(2000), StatusCode::BAD_REQUEST),
            (ChatError::Disabled, StatusCode::SERVICE_UNAVAILABLE),
            (
                ChatError::SessionNotFound(Uuid::new_v4()),
                StatusCode::NOT_FOUND,
            ),
            (
                ChatError::StorageError("lock".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_message_is_user_facing() {
        let err = ApiError::from(ChatError::MessageTooLong(10));
        assert_eq!(
            err.to_string(),
            "message exceeds maximum length of 10 characters"
        );
    }
}
