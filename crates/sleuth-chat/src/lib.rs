//! Conversational front end for Sleuth.
//!
//! Turns free-text questions about a username into structured queries,
//! routes them to the discovery and analysis collaborators, and remembers
//! the last investigated username per session so follow-ups can omit it.

pub mod classifier;
pub mod collaborator;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod extractor;
pub mod orchestrator;
pub mod response;
pub mod types;

pub use classifier::IntentClassifier;
pub use collaborator::{
    analyzer_from_config, AccountDiscovery, HttpDiscovery, LlmAnalyzer, RiskAnalyzer,
    UnconfiguredAnalyzer,
};
pub use context::{ConversationContext, ConversationManager};
pub use dispatcher::{DispatchSettings, Dispatcher};
pub use error::{ChatError, CollaboratorError};
pub use extractor::IdentifierExtractor;
pub use orchestrator::ChatOrchestrator;
pub use response::{RenderedReply, ResponseFormatter};
pub use types::{
    Capability, ChatRequest, ChatResponse, ChatSessionSummary, ConversationSession,
    DispatchPayload, DispatchResult, GeneralTopic, QueryIntent, StructuredQuery,
};
