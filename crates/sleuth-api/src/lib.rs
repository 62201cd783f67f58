//! HTTP surface for Sleuth.
//!
//! Exposes the chat orchestrator over axum: `POST /chat`, session
//! listing and deletion, and a health check.

pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
