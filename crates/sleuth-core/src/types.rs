use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Discovery
// =============================================================================

/// Outcome of probing one platform for a username.
///
/// Wire values match the discovery service: `Claimed`, `Available`,
/// `Unknown`, `Illegal`, `WAF`. Unrecognised values decode as `Unknown`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SiteStatus {
    /// The username exists on the platform.
    Claimed,
    /// The username is free on the platform.
    Available,
    /// The check errored; the platform could not be checked.
    Unknown,
    /// The username is not valid for the platform's naming rules.
    Illegal,
    /// The check was blocked by a web application firewall.
    Waf,
}

impl SiteStatus {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteStatus::Claimed => "Claimed",
            SiteStatus::Available => "Available",
            SiteStatus::Unknown => "Unknown",
            SiteStatus::Illegal => "Illegal",
            SiteStatus::Waf => "WAF",
        }
    }

    /// Whether the check failed to produce a usable answer.
    pub fn is_failure(&self) -> bool {
        matches!(self, SiteStatus::Unknown | SiteStatus::Waf)
    }
}

impl From<String> for SiteStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "claimed" => SiteStatus::Claimed,
            "available" => SiteStatus::Available,
            "illegal" => SiteStatus::Illegal,
            "waf" => SiteStatus::Waf,
            _ => SiteStatus::Unknown,
        }
    }
}

impl From<SiteStatus> for String {
    fn from(value: SiteStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-platform check result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SiteResult {
    pub site_name: String,
    pub url_main: String,
    pub url_user: String,
    pub status: SiteStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Parameters for one discovery call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryRequest {
    pub username: String,
    /// Restrict the search to these platforms. `None` searches every known site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sites: Option<Vec<String>>,
    /// Per-site timeout handed to the discovery engine, in seconds.
    pub timeout_secs: u64,
    pub include_nsfw: bool,
}

/// Result set returned by the discovery engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryResult {
    pub username: String,
    pub total_sites: usize,
    pub found_count: usize,
    #[serde(default)]
    pub results: Vec<SiteResult>,
}

impl DiscoveryResult {
    /// Platforms where the username is claimed, in result order.
    pub fn claimed(&self) -> impl Iterator<Item = &SiteResult> {
        self.results
            .iter()
            .filter(|r| r.status == SiteStatus::Claimed)
    }

    /// Number of claimed platforms, counted over the returned results only.
    pub fn claimed_count(&self) -> usize {
        self.claimed().count()
    }

    /// Checks that errored, plus sites the engine reported but never returned.
    pub fn failed_checks(&self) -> usize {
        let errored = self.results.iter().filter(|r| r.status.is_failure()).count();
        errored + self.total_sites.saturating_sub(self.results.len())
    }

    /// Checks that produced a definite answer.
    pub fn checked_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| !r.status.is_failure())
            .count()
    }

    /// Names of the claimed platforms, capped at `limit`.
    pub fn claimed_site_names(&self, limit: usize) -> Vec<&str> {
        self.claimed()
            .take(limit)
            .map(|r| r.site_name.as_str())
            .collect()
    }
}

// =============================================================================
// Analysis
// =============================================================================

/// Coarse risk bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Bucket a 0-10 score.
    pub fn from_score(score: f64) -> Self {
        if score < 4.0 {
            RiskLevel::Low
        } else if score < 7.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    /// Parse a level label. "Critical" folds into `High`.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Some(RiskLevel::Low),
            "medium" | "moderate" => Some(RiskLevel::Medium),
            "high" | "critical" => Some(RiskLevel::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured risk assessment for one username.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub username: String,
    /// 0.0 (benign) to 10.0 (hostile).
    pub risk_score: f64,
    pub is_suspicious: bool,
    pub risk_level: RiskLevel,
    /// Ordered, most significant first.
    pub indicators: Vec<String>,
    pub explanation: String,
    pub total_accounts: usize,
}

impl RiskAssessment {
    /// Assessment for a username with no discovered accounts.
    pub fn no_accounts(username: &str) -> Self {
        Self {
            username: username.to_string(),
            risk_score: 0.0,
            is_suspicious: false,
            risk_level: RiskLevel::Low,
            indicators: vec!["No accounts found".to_string()],
            explanation: format!(
                "No accounts found for username '{}'. Cannot perform risk analysis.",
                username
            ),
            total_accounts: 0,
        }
    }
}

/// The single platform judged riskiest for a username.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlatformRisk {
    pub platform: String,
    pub reason: String,
    pub risk_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(name: &str, status: SiteStatus) -> SiteResult {
        SiteResult {
            site_name: name.to_string(),
            url_main: format!("https://{}.com", name.to_lowercase()),
            url_user: format!("https://{}.com/kash", name.to_lowercase()),
            status,
            query_time: Some(0.25),
            context: None,
        }
    }

    #[test]
    fn test_site_status_wire_values() {
        let json = serde_json::to_string(&SiteStatus::Waf).unwrap();
        assert_eq!(json, "\"WAF\"");

        let status: SiteStatus = serde_json::from_str("\"Claimed\"").unwrap();
        assert_eq!(status, SiteStatus::Claimed);

        let status: SiteStatus = serde_json::from_str("\"WAF\"").unwrap();
        assert_eq!(status, SiteStatus::Waf);
    }

    #[test]
    fn test_site_status_unrecognised_is_unknown() {
        let status: SiteStatus = serde_json::from_str("\"Rate Limited\"").unwrap();
        assert_eq!(status, SiteStatus::Unknown);
    }

    #[test]
    fn test_site_status_failures() {
        assert!(SiteStatus::Unknown.is_failure());
        assert!(SiteStatus::Waf.is_failure());
        assert!(!SiteStatus::Claimed.is_failure());
        assert!(!SiteStatus::Available.is_failure());
        assert!(!SiteStatus::Illegal.is_failure());
    }

    #[test]
    fn test_site_result_decodes_discovery_payload() {
        let raw = r#"{
            "site_name": "GitHub",
            "url_main": "https://www.github.com/",
            "url_user": "https://www.github.com/kash",
            "status": "Claimed",
            "query_time": 0.41,
            "context": null
        }"#;
        let result: SiteResult = serde_json::from_str(raw).unwrap();
        assert_eq!(result.site_name, "GitHub");
        assert_eq!(result.status, SiteStatus::Claimed);
        assert!(result.context.is_none());
    }

    #[test]
    fn test_discovery_result_counts() {
        let result = DiscoveryResult {
            username: "kash".to_string(),
            total_sites: 4,
            found_count: 2,
            results: vec![
                site("GitHub", SiteStatus::Claimed),
                site("Reddit", SiteStatus::Available),
                site("Twitch", SiteStatus::Claimed),
                site("Telegram", SiteStatus::Unknown),
            ],
        };
        assert_eq!(result.claimed_count(), 2);
        assert_eq!(result.failed_checks(), 1);
        assert_eq!(result.checked_count(), 3);
        assert_eq!(result.claimed_site_names(1), vec!["GitHub"]);
    }

    #[test]
    fn test_discovery_result_missing_sites_count_as_failed() {
        let result = DiscoveryResult {
            username: "kash".to_string(),
            total_sites: 10,
            found_count: 1,
            results: vec![site("GitHub", SiteStatus::Claimed)],
        };
        assert_eq!(result.failed_checks(), 9);
    }

    #[test]
    fn test_discovery_result_results_default_to_empty() {
        let raw = r#"{"username": "kash", "total_sites": 0, "found_count": 0}"#;
        let result: DiscoveryResult = serde_json::from_str(raw).unwrap();
        assert!(result.results.is_empty());
        assert_eq!(result.failed_checks(), 0);
    }

    #[test]
    fn test_risk_level_from_score() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(3.99), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(4.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(6.9), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(7.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(10.0), RiskLevel::High);
    }

    #[test]
    fn test_risk_level_parse() {
        assert_eq!(RiskLevel::parse("low"), Some(RiskLevel::Low));
        assert_eq!(RiskLevel::parse(" Medium "), Some(RiskLevel::Medium));
        assert_eq!(RiskLevel::parse("Critical"), Some(RiskLevel::High));
        assert_eq!(RiskLevel::parse("Unknown"), None);
    }

    #[test]
    fn test_risk_level_serializes_capitalised() {
        let json = serde_json::to_string(&RiskLevel::High).unwrap();
        assert_eq!(json, "\"High\"");
    }

    #[test]
    fn test_no_accounts_assessment() {
        let a = RiskAssessment::no_accounts("ghost");
        assert_eq!(a.risk_score, 0.0);
        assert!(!a.is_suspicious);
        assert_eq!(a.total_accounts, 0);
        assert_eq!(a.indicators, vec!["No accounts found"]);
        assert!(a.explanation.contains("'ghost'"));
    }
}
