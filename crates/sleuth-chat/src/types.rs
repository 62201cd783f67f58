//! Data model for the conversational engine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sleuth_core::types::{PlatformRisk, RiskAssessment};

use crate::context::ConversationContext;

// =============================================================================
// Intent
// =============================================================================

/// Closed set of things a user can ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryIntent {
    /// Enumerate the accounts a username holds.
    Investigation,
    /// Suspicion analysis and riskiest-platform comparison.
    Intelligence,
    /// Numeric risk scoring.
    Analysis,
    /// Narrative report.
    Reporting,
    /// Anything else. Answered without touching a collaborator.
    General,
}

impl QueryIntent {
    pub const ALL: [QueryIntent; 5] = [
        QueryIntent::Investigation,
        QueryIntent::Intelligence,
        QueryIntent::Analysis,
        QueryIntent::Reporting,
        QueryIntent::General,
    ];

    /// Whether the intent needs a username to be served.
    pub fn requires_identifier(&self) -> bool {
        !matches!(self, QueryIntent::General)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryIntent::Investigation => "investigation",
            QueryIntent::Intelligence => "intelligence",
            QueryIntent::Analysis => "analysis",
            QueryIntent::Reporting => "reporting",
            QueryIntent::General => "general",
        }
    }
}

impl fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flavour of a `general` query, used to pick the canned reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneralTopic {
    Greeting,
    Thanks,
    Help,
}

// =============================================================================
// Query
// =============================================================================

/// A parsed utterance, ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredQuery {
    /// The text exactly as received.
    pub raw_query: String,
    pub received_at: DateTime<Utc>,
    pub intent: QueryIntent,
    /// Username extracted from this utterance alone.
    pub identifier: Option<String>,
    /// Platforms named in the utterance ("... on GitHub and Reddit").
    pub sites: Vec<String>,
}

// =============================================================================
// Dispatch payloads
// =============================================================================

/// Downstream capability a dispatch relied on.
///
/// Report writing has no entry: a failed report falls back to the local
/// template and never degrades the answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Discovery,
    Analysis,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Capability::Discovery => "account discovery",
            Capability::Analysis => "risk analysis",
        })
    }
}

/// A platform where the username is claimed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountHit {
    pub site_name: String,
    pub url_user: String,
    pub url_main: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_time: Option<f64>,
}

/// Result of an account enumeration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvestigationPayload {
    pub username: String,
    /// Sites the discovery engine was asked about.
    pub total_sites: usize,
    /// Claimed accounts, counted over returned results only.
    pub found_count: usize,
    /// Checks that produced a definite answer.
    pub checked_count: usize,
    /// Checks that errored or never came back.
    pub failed_checks: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sites_requested: Vec<String>,
    pub accounts: Vec<AccountHit>,
}

/// Suspicion analysis plus the riskiest platform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntelligencePayload {
    pub found_count: usize,
    pub assessment: RiskAssessment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub riskiest_platform: Option<PlatformRisk>,
    /// Why the platform comparison is missing, when it is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_note: Option<String>,
}

/// Numeric risk scoring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPayload {
    pub found_count: usize,
    pub assessment: RiskAssessment,
}

/// Narrative report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportPayload {
    pub found_count: usize,
    pub assessment: RiskAssessment,
    pub report: String,
    /// True when the analysis service failed to write the report and the
    /// template version was used instead.
    pub generated_locally: bool,
}

/// Capability-specific outcome of one dispatch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchPayload {
    /// The intent needs a username and none could be resolved.
    Clarification { reason: String },
    Investigation(InvestigationPayload),
    Intelligence(IntelligencePayload),
    Analysis(AnalysisPayload),
    Report(ReportPayload),
    /// A collaborator could not serve the request.
    Unavailable {
        capability: Capability,
        reason: String,
    },
    General { topic: GeneralTopic },
}

impl DispatchPayload {
    /// Whether this is a degraded outcome.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, DispatchPayload::Unavailable { .. })
    }
}

/// Everything produced for one query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub intent: QueryIntent,
    /// The username actually used, if any.
    pub identifier: Option<String>,
    pub payload: DispatchPayload,
    pub reply: String,
    pub suggestions: Vec<String>,
}

// =============================================================================
// Request / response boundary
// =============================================================================

/// Inbound chat request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Username remembered by a stateless caller from its previous turn.
    #[serde(default)]
    pub last_identifier: Option<String>,
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

impl ChatRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn in_session(mut self, session_id: Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_last_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.last_identifier = Some(identifier.into());
        self
    }
}

/// Outbound chat response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub query: String,
    pub response: String,
    pub query_type: QueryIntent,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DispatchPayload>,
    /// Username to re-supply on the next call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_identifier: Option<String>,
    pub session_id: Uuid,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

// =============================================================================
// Sessions
// =============================================================================

/// Server-side conversation envelope.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    pub id: Uuid,
    /// Epoch seconds.
    pub started_at: i64,
    /// Epoch seconds.
    pub last_message_at: i64,
    pub message_count: u64,
    pub context: ConversationContext,
}

/// Session listing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSessionSummary {
    pub id: Uuid,
    pub started_at: String,
    pub last_message_at: String,
    pub message_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_identifier: Option<String>,
}
