//! Downstream collaborators.
//!
//! The conversational layer consumes two capabilities it does not
//! implement: account discovery and risk analysis. Both sit behind
//! traits so the dispatcher can be driven by HTTP clients in production
//! and by the [`mock`] implementations in tests.

pub mod analysis;
pub mod discovery;
pub mod mock;

use async_trait::async_trait;

use sleuth_core::types::{
    DiscoveryRequest, DiscoveryResult, PlatformRisk, RiskAssessment,
};

use crate::error::CollaboratorError;

pub use analysis::{analyzer_from_config, LlmAnalyzer, UnconfiguredAnalyzer};
pub use discovery::HttpDiscovery;

/// Enumerates the platforms on which a username is registered.
#[async_trait]
pub trait AccountDiscovery: Send + Sync {
    async fn discover(
        &self,
        request: &DiscoveryRequest,
    ) -> Result<DiscoveryResult, CollaboratorError>;
}

/// Scores a username's footprint and writes about it.
#[async_trait]
pub trait RiskAnalyzer: Send + Sync {
    /// Structured risk assessment over the claimed accounts.
    async fn analyze(
        &self,
        username: &str,
        discovery: &DiscoveryResult,
    ) -> Result<RiskAssessment, CollaboratorError>;

    /// The single riskiest platform among the claimed accounts.
    async fn riskiest_platform(
        &self,
        username: &str,
        discovery: &DiscoveryResult,
    ) -> Result<PlatformRisk, CollaboratorError>;

    /// Narrative report. `assessment` is the already computed score, if any.
    async fn report(
        &self,
        username: &str,
        discovery: &DiscoveryResult,
        assessment: Option<&RiskAssessment>,
    ) -> Result<String, CollaboratorError>;
}

/// Map a transport failure to a collaborator error.
pub(crate) fn transport_error(
    service: &str,
    timeout_secs: u64,
    err: reqwest::Error,
) -> CollaboratorError {
    if err.is_timeout() {
        CollaboratorError::Timeout(timeout_secs)
    } else if err.is_decode() {
        CollaboratorError::InvalidResponse(format!("{} sent an unexpected body: {}", service, err))
    } else {
        CollaboratorError::Unavailable(format!("{} unreachable: {}", service, err))
    }
}
