//! Intent dispatch.
//!
//! Resolves the identifier a query is about, invokes the collaborators its
//! intent needs, and folds every collaborator failure into an
//! [`DispatchPayload::Unavailable`] result. The dispatcher is the only
//! component that writes to a [`ConversationContext`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use sleuth_core::config::DiscoveryConfig;
use sleuth_core::types::{DiscoveryRequest, DiscoveryResult};

use crate::classifier::general_topic;
use crate::collaborator::{AccountDiscovery, RiskAnalyzer};
use crate::context::ConversationContext;
use crate::error::CollaboratorError;
use crate::response::ResponseFormatter;
use crate::types::{
    AccountHit, AnalysisPayload, Capability, DispatchPayload, DispatchResult,
    IntelligencePayload, InvestigationPayload, QueryIntent, ReportPayload, StructuredQuery,
};

/// Outcome of one capability step; the error names the capability that failed.
type Step<T> = Result<T, (Capability, CollaboratorError)>;

/// Discovery parameters applied to every dispatch.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Per-site timeout handed to the discovery engine.
    pub site_timeout_secs: u64,
    /// Upper bound on a whole discovery call.
    pub request_timeout: Duration,
    pub include_nsfw: bool,
}

impl DispatchSettings {
    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self {
            site_timeout_secs: config.site_timeout_secs,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            include_nsfw: config.include_nsfw,
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self::from_config(&DiscoveryConfig::default())
    }
}

/// Routes classified queries to collaborators.
pub struct Dispatcher {
    discovery: Arc<dyn AccountDiscovery>,
    analyzer: Arc<dyn RiskAnalyzer>,
    formatter: ResponseFormatter,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(
        discovery: Arc<dyn AccountDiscovery>,
        analyzer: Arc<dyn RiskAnalyzer>,
        formatter: ResponseFormatter,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            discovery,
            analyzer,
            formatter,
            settings,
        }
    }

    /// The identifier a query is about: the one it names, else the one the
    /// conversation remembers.
    pub fn resolve_identifier(
        query: &StructuredQuery,
        context: &ConversationContext,
    ) -> Option<String> {
        query
            .identifier
            .clone()
            .or_else(|| context.get().map(str::to_string))
    }

    /// Serve one query. Never fails: collaborator errors degrade the payload.
    pub async fn dispatch(
        &self,
        query: &StructuredQuery,
        context: &mut ConversationContext,
    ) -> DispatchResult {
        let intent = query.intent;
        if !intent.requires_identifier() {
            let topic = general_topic(&query.raw_query);
            return self.finish(intent, None, DispatchPayload::General { topic });
        }

        let Some(identifier) = Self::resolve_identifier(query, context) else {
            debug!(intent = %intent, "No username resolvable, asking for one");
            let payload = DispatchPayload::Clarification {
                reason: "no username in the query or the conversation".to_string(),
            };
            return self.finish(intent, None, payload);
        };

        info!(
            intent = %intent,
            identifier = %identifier,
            inherited = query.identifier.is_none(),
            "Dispatching query"
        );

        let outcome = match intent {
            QueryIntent::Investigation => self.investigate(&identifier, &query.sites).await,
            QueryIntent::Intelligence => self.assess_suspicion(&identifier, &query.sites).await,
            QueryIntent::Analysis => self.score(&identifier, &query.sites).await,
            QueryIntent::Reporting => {
                self.write_report(&identifier, &query.sites, query.received_at)
                    .await
            }
            QueryIntent::General => Ok(DispatchPayload::General {
                topic: general_topic(&query.raw_query),
            }),
        };

        let payload = outcome.unwrap_or_else(|(capability, e)| {
            warn!(
                capability = ?capability,
                identifier = %identifier,
                error = %e,
                "Collaborator unavailable"
            );
            DispatchPayload::Unavailable {
                capability,
                reason: e.to_string(),
            }
        });

        context.set(identifier.clone());
        self.finish(intent, Some(identifier), payload)
    }

    fn finish(
        &self,
        intent: QueryIntent,
        identifier: Option<String>,
        payload: DispatchPayload,
    ) -> DispatchResult {
        let rendered = self.formatter.render(intent, identifier.as_deref(), &payload);
        DispatchResult {
            intent,
            identifier,
            payload,
            reply: rendered.text,
            suggestions: rendered.suggestions,
        }
    }

    // =========================================================================
    // Capability steps
    // =========================================================================

    async fn discover(&self, identifier: &str, sites: &[String]) -> Step<DiscoveryResult> {
        let request = DiscoveryRequest {
            username: identifier.to_string(),
            sites: (!sites.is_empty()).then(|| sites.to_vec()),
            timeout_secs: self.settings.site_timeout_secs,
            include_nsfw: self.settings.include_nsfw,
        };

        let call = self.discovery.discover(&request);
        match tokio::time::timeout(self.settings.request_timeout, call).await {
            Ok(Ok(result)) => {
                if result.found_count != result.claimed_count() {
                    debug!(
                        reported = result.found_count,
                        counted = result.claimed_count(),
                        "Discovery found_count disagrees with results; using counted value"
                    );
                }
                Ok(result)
            }
            Ok(Err(e)) => Err((Capability::Discovery, e)),
            Err(_) => Err((
                Capability::Discovery,
                CollaboratorError::Timeout(self.settings.request_timeout.as_secs()),
            )),
        }
    }

    async fn investigate(&self, identifier: &str, sites: &[String]) -> Step<DispatchPayload> {
        let result = self.discover(identifier, sites).await?;
        let accounts: Vec<AccountHit> = result
            .claimed()
            .map(|r| AccountHit {
                site_name: r.site_name.clone(),
                url_user: r.url_user.clone(),
                url_main: r.url_main.clone(),
                query_time: r.query_time,
            })
            .collect();

        Ok(DispatchPayload::Investigation(InvestigationPayload {
            username: identifier.to_string(),
            total_sites: result.total_sites.max(result.results.len()),
            found_count: accounts.len(),
            checked_count: result.checked_count(),
            failed_checks: result.failed_checks(),
            sites_requested: sites.to_vec(),
            accounts,
        }))
    }

    async fn assess_suspicion(&self, identifier: &str, sites: &[String]) -> Step<DispatchPayload> {
        let result = self.discover(identifier, sites).await?;
        let assessment = self
            .analyzer
            .analyze(identifier, &result)
            .await
            .map_err(|e| (Capability::Analysis, e))?;

        let found_count = result.claimed_count();
        let (riskiest_platform, platform_note) = if found_count == 0 {
            (None, None)
        } else {
            match self.analyzer.riskiest_platform(identifier, &result).await {
                Ok(platform) => (Some(platform), None),
                Err(e) => {
                    warn!(identifier, error = %e, "Platform comparison failed");
                    (None, Some(e.to_string()))
                }
            }
        };

        Ok(DispatchPayload::Intelligence(IntelligencePayload {
            found_count,
            assessment,
            riskiest_platform,
            platform_note,
        }))
    }

    async fn score(&self, identifier: &str, sites: &[String]) -> Step<DispatchPayload> {
        let result = self.discover(identifier, sites).await?;
        let assessment = self
            .analyzer
            .analyze(identifier, &result)
            .await
            .map_err(|e| (Capability::Analysis, e))?;

        Ok(DispatchPayload::Analysis(AnalysisPayload {
            found_count: result.claimed_count(),
            assessment,
        }))
    }

    async fn write_report(
        &self,
        identifier: &str,
        sites: &[String],
        generated_at: DateTime<Utc>,
    ) -> Step<DispatchPayload> {
        let result = self.discover(identifier, sites).await?;
        let assessment = self
            .analyzer
            .analyze(identifier, &result)
            .await
            .map_err(|e| (Capability::Analysis, e))?;

        let (report, generated_locally) = match self
            .analyzer
            .report(identifier, &result, Some(&assessment))
            .await
        {
            Ok(text) => (text, false),
            Err(e) => {
                warn!(identifier, error = %e, "Report generation failed, using local template");
                let text =
                    self.formatter
                        .fallback_report(identifier, &result, &assessment, generated_at);
                (text, true)
            }
        };

        Ok(DispatchPayload::Report(ReportPayload {
            found_count: result.claimed_count(),
            assessment,
            report,
            generated_locally,
        }))
    }
}
