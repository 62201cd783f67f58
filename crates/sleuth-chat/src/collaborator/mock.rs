//! In-memory collaborators for tests, benchmarks, and offline demos.
//!
//! Each mock counts its calls so tests can assert which capabilities a
//! dispatch touched.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use sleuth_core::types::{
    DiscoveryRequest, DiscoveryResult, PlatformRisk, RiskAssessment, RiskLevel, SiteResult,
    SiteStatus,
};

use super::{AccountDiscovery, RiskAnalyzer};
use crate::error::CollaboratorError;

// =============================================================================
// Discovery
// =============================================================================

/// Discovery that answers every username with the same site table.
pub struct StaticDiscovery {
    sites: Vec<(String, SiteStatus)>,
    /// Sites the engine claims to have checked but never returned.
    missing: usize,
    delay: Option<Duration>,
    failure: Option<CollaboratorError>,
    calls: AtomicUsize,
    last_request: Mutex<Option<DiscoveryRequest>>,
}

impl StaticDiscovery {
    pub fn new(sites: &[(&str, SiteStatus)]) -> Self {
        Self {
            sites: sites
                .iter()
                .map(|(name, status)| (name.to_string(), *status))
                .collect(),
            missing: 0,
            delay: None,
            failure: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Every listed site claimed.
    pub fn claimed(sites: &[&str]) -> Self {
        let table: Vec<(&str, SiteStatus)> =
            sites.iter().map(|s| (*s, SiteStatus::Claimed)).collect();
        Self::new(&table)
    }

    /// Discovery that always fails with `error`.
    pub fn failing(error: CollaboratorError) -> Self {
        let mut d = Self::new(&[]);
        d.failure = Some(error);
        d
    }

    /// Report `count` extra sites in `total_sites` without returning them.
    pub fn with_missing(mut self, count: usize) -> Self {
        self.missing = count;
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<DiscoveryRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }

    fn result_for(&self, request: &DiscoveryRequest) -> DiscoveryResult {
        let wanted = |name: &str| match &request.sites {
            Some(filter) => filter.iter().any(|s| s.eq_ignore_ascii_case(name)),
            None => true,
        };
        let results: Vec<SiteResult> = self
            .sites
            .iter()
            .filter(|(name, _)| wanted(name))
            .map(|(name, status)| {
                let host = name.to_lowercase();
                SiteResult {
                    site_name: name.clone(),
                    url_main: format!("https://{}.com/", host),
                    url_user: format!("https://{}.com/{}", host, request.username),
                    status: *status,
                    query_time: Some(0.1),
                    context: None,
                }
            })
            .collect();
        let found_count = results
            .iter()
            .filter(|r| r.status == SiteStatus::Claimed)
            .count();
        DiscoveryResult {
            username: request.username.clone(),
            total_sites: results.len() + self.missing,
            found_count,
            results,
        }
    }
}

#[async_trait]
impl AccountDiscovery for StaticDiscovery {
    async fn discover(
        &self,
        request: &DiscoveryRequest,
    ) -> Result<DiscoveryResult, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(self.result_for(request)),
        }
    }
}

// =============================================================================
// Analysis
// =============================================================================

/// Analyzer returning a fixed score, with per-capability failure switches.
pub struct StaticAnalyzer {
    risk_score: f64,
    platform: Option<PlatformRisk>,
    report_text: String,
    analyze_failure: Option<CollaboratorError>,
    platform_failure: Option<CollaboratorError>,
    report_failure: Option<CollaboratorError>,
    analyze_calls: AtomicUsize,
    platform_calls: AtomicUsize,
    report_calls: AtomicUsize,
}

impl StaticAnalyzer {
    pub fn new(risk_score: f64) -> Self {
        Self {
            risk_score,
            platform: None,
            report_text: "EXECUTIVE SUMMARY\nNo notable risk.".to_string(),
            analyze_failure: None,
            platform_failure: None,
            report_failure: None,
            analyze_calls: AtomicUsize::new(0),
            platform_calls: AtomicUsize::new(0),
            report_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_platform(mut self, platform: &str, reason: &str, risk_score: f64) -> Self {
        self.platform = Some(PlatformRisk {
            platform: platform.to_string(),
            reason: reason.to_string(),
            risk_score,
        });
        self
    }

    pub fn with_report(mut self, text: &str) -> Self {
        self.report_text = text.to_string();
        self
    }

    pub fn failing_analysis(mut self, error: CollaboratorError) -> Self {
        self.analyze_failure = Some(error);
        self
    }

    pub fn failing_platform(mut self, error: CollaboratorError) -> Self {
        self.platform_failure = Some(error);
        self
    }

    pub fn failing_report(mut self, error: CollaboratorError) -> Self {
        self.report_failure = Some(error);
        self
    }

    pub fn analyze_calls(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst)
    }

    pub fn platform_calls(&self) -> usize {
        self.platform_calls.load(Ordering::SeqCst)
    }

    pub fn report_calls(&self) -> usize {
        self.report_calls.load(Ordering::SeqCst)
    }

    /// Total calls across all capabilities.
    pub fn total_calls(&self) -> usize {
        self.analyze_calls() + self.platform_calls() + self.report_calls()
    }
}

#[async_trait]
impl RiskAnalyzer for StaticAnalyzer {
    async fn analyze(
        &self,
        username: &str,
        discovery: &DiscoveryResult,
    ) -> Result<RiskAssessment, CollaboratorError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.analyze_failure {
            return Err(err.clone());
        }
        let total_accounts = discovery.claimed_count();
        if total_accounts == 0 {
            return Ok(RiskAssessment::no_accounts(username));
        }
        Ok(RiskAssessment {
            username: username.to_string(),
            risk_score: self.risk_score,
            is_suspicious: self.risk_score >= 7.0,
            risk_level: RiskLevel::from_score(self.risk_score),
            indicators: vec![format!("Present on {} platforms", total_accounts)],
            explanation: format!("Fixed assessment for '{}'.", username),
            total_accounts,
        })
    }

    async fn riskiest_platform(
        &self,
        _username: &str,
        discovery: &DiscoveryResult,
    ) -> Result<PlatformRisk, CollaboratorError> {
        self.platform_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.platform_failure {
            return Err(err.clone());
        }
        if let Some(p) = &self.platform {
            return Ok(p.clone());
        }
        let first = discovery
            .claimed()
            .next()
            .map(|r| r.site_name.clone())
            .unwrap_or_else(|| "None".to_string());
        Ok(PlatformRisk {
            platform: first,
            reason: "First claimed platform".to_string(),
            risk_score: self.risk_score,
        })
    }

    async fn report(
        &self,
        _username: &str,
        _discovery: &DiscoveryResult,
        _assessment: Option<&RiskAssessment>,
    ) -> Result<String, CollaboratorError> {
        self.report_calls.fetch_add(1, Ordering::SeqCst);
        match &self.report_failure {
            Some(err) => Err(err.clone()),
            None => Ok(self.report_text.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(sites: Option<Vec<&str>>) -> DiscoveryRequest {
        DiscoveryRequest {
            username: "kash".to_string(),
            sites: sites.map(|s| s.into_iter().map(String::from).collect()),
            timeout_secs: 60,
            include_nsfw: false,
        }
    }

    #[tokio::test]
    async fn test_static_discovery_applies_site_filter() {
        let d = StaticDiscovery::claimed(&["GitHub", "Reddit", "Twitch"]);
        let result = d.discover(&request(Some(vec!["github"]))).await.unwrap();
        assert_eq!(result.results.len(), 1);
        assert_eq!(result.results[0].url_user, "https://github.com/kash");
        assert_eq!(d.calls(), 1);
        assert_eq!(
            d.last_request().and_then(|r| r.sites),
            Some(vec!["github".to_string()])
        );
    }

    #[tokio::test]
    async fn test_static_discovery_missing_sites() {
        let d = StaticDiscovery::claimed(&["GitHub"]).with_missing(3);
        let result = d.discover(&request(None)).await.unwrap();
        assert_eq!(result.total_sites, 4);
        assert_eq!(result.failed_checks(), 3);
    }

    #[tokio::test]
    async fn test_failing_discovery() {
        let d = StaticDiscovery::failing(CollaboratorError::Unavailable("down".into()));
        assert!(d.discover(&request(None)).await.is_err());
        assert_eq!(d.calls(), 1);
    }

    #[tokio::test]
    async fn test_static_analyzer_counts_calls() {
        let a = StaticAnalyzer::new(8.0);
        let d = StaticDiscovery::claimed(&["GitHub"])
            .discover(&request(None))
            .await
            .unwrap();
        let assessment = a.analyze("kash", &d).await.unwrap();
        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert!(assessment.is_suspicious);
        a.riskiest_platform("kash", &d).await.unwrap();
        a.report("kash", &d, Some(&assessment)).await.unwrap();
        assert_eq!(a.analyze_calls(), 1);
        assert_eq!(a.platform_calls(), 1);
        assert_eq!(a.report_calls(), 1);
        assert_eq!(a.total_calls(), 3);
    }
}
