//! Reply composition.
//!
//! Turns dispatch payloads into human-readable replies and follow-up
//! suggestions without calling any model. Also writes the template report
//! used when the analysis service cannot produce one.

use chrono::{DateTime, Utc};

use sleuth_core::types::{DiscoveryResult, RiskAssessment, RiskLevel};

use crate::types::{
    AnalysisPayload, Capability, DispatchPayload, GeneralTopic, IntelligencePayload,
    InvestigationPayload, QueryIntent, ReportPayload,
};

/// Platforms named in a locally generated report.
const REPORT_PLATFORM_CAP: usize = 20;

/// A composed reply.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedReply {
    pub text: String,
    pub suggestions: Vec<String>,
}

// =============================================================================
// ResponseFormatter
// =============================================================================

/// Composes replies from dispatch payloads.
#[derive(Debug, Clone)]
pub struct ResponseFormatter {
    /// Maximum number of claimed accounts listed in an investigation reply.
    pub max_listed_accounts: usize,
}

impl ResponseFormatter {
    pub fn new(max_listed_accounts: usize) -> Self {
        Self {
            max_listed_accounts,
        }
    }

    /// Compose the reply for a payload. `intent` drives clarification wording;
    /// `identifier` names the username in degraded replies.
    pub fn render(
        &self,
        intent: QueryIntent,
        identifier: Option<&str>,
        payload: &DispatchPayload,
    ) -> RenderedReply {
        match payload {
            DispatchPayload::Clarification { .. } => self.clarification(intent),
            DispatchPayload::Investigation(p) => self.investigation(p),
            DispatchPayload::Intelligence(p) => self.intelligence(p),
            DispatchPayload::Analysis(p) => self.analysis(p),
            DispatchPayload::Report(p) => self.report(p),
            DispatchPayload::Unavailable { capability, reason } => {
                self.unavailable(*capability, reason, identifier)
            }
            DispatchPayload::General { topic } => self.general(*topic),
        }
    }

    fn clarification(&self, intent: QueryIntent) -> RenderedReply {
        let (verb, example) = match intent {
            QueryIntent::Investigation => ("search for", "Find all accounts of kash"),
            QueryIntent::Intelligence => ("check for suspicious activity", "Is kash suspicious?"),
            QueryIntent::Analysis => ("score", "What's the risk score for kash?"),
            _ => ("write a report on", "Generate a report for kash"),
        };
        RenderedReply {
            text: format!(
                "Which username should I {}? Name it in your question, for example: \"{}\".",
                verb, example
            ),
            suggestions: vec!["Find all accounts of <username>".to_string()],
        }
    }

    fn investigation(&self, p: &InvestigationPayload) -> RenderedReply {
        let coverage = if p.failed_checks > 0 {
            format!(
                " {} of {} sites could not be checked.",
                p.failed_checks, p.total_sites
            )
        } else {
            String::new()
        };

        if p.found_count == 0 {
            return RenderedReply {
                text: format!(
                    "No accounts found for '{}' across {} checked sites.{}",
                    p.username, p.checked_count, coverage
                ),
                suggestions: vec!["Try a different username".to_string()],
            };
        }

        let mut text = format!(
            "Found {} {} for '{}':\n",
            p.found_count,
            plural(p.found_count, "account", "accounts"),
            p.username
        );
        for hit in p.accounts.iter().take(self.max_listed_accounts) {
            text.push_str(&format!("- {}: {}\n", hit.site_name, hit.url_user));
        }
        if p.accounts.len() > self.max_listed_accounts {
            text.push_str(&format!(
                "...and {} more\n",
                p.accounts.len() - self.max_listed_accounts
            ));
        }
        text.push_str(coverage.trim_start());

        RenderedReply {
            text: text.trim_end().to_string(),
            suggestions: vec![
                "Is it suspicious?".to_string(),
                "What's the risk score?".to_string(),
                "Generate a report".to_string(),
            ],
        }
    }

    fn intelligence(&self, p: &IntelligencePayload) -> RenderedReply {
        let a = &p.assessment;
        if p.found_count == 0 {
            return RenderedReply {
                text: format!(
                    "No accounts found for '{}', so there is nothing to assess.",
                    a.username
                ),
                suggestions: vec!["Try a different username".to_string()],
            };
        }

        let verdict = if a.is_suspicious {
            "looks SUSPICIOUS"
        } else {
            "does not look suspicious"
        };
        let mut text = format!(
            "'{}' {} (risk {:.1}/10, {}).",
            a.username, verdict, a.risk_score, a.risk_level
        );
        if !a.explanation.is_empty() {
            text.push('\n');
            text.push_str(&a.explanation);
        }
        push_indicators(&mut text, &a.indicators);

        match (&p.riskiest_platform, &p.platform_note) {
            (Some(platform), _) => text.push_str(&format!(
                "\nHighest-risk platform: {} ({:.1}/10): {}",
                platform.platform, platform.risk_score, platform.reason
            )),
            (None, Some(note)) => {
                text.push_str(&format!("\nPlatform comparison unavailable: {}", note))
            }
            (None, None) => {}
        }

        RenderedReply {
            text,
            suggestions: vec![
                "What's the risk score?".to_string(),
                "Generate a report".to_string(),
            ],
        }
    }

    fn analysis(&self, p: &AnalysisPayload) -> RenderedReply {
        let a = &p.assessment;
        let mut text = format!(
            "Risk score for '{}': {:.1}/10 ({}) across {} {}.",
            a.username,
            a.risk_score,
            a.risk_level,
            p.found_count,
            plural(p.found_count, "account", "accounts")
        );
        if !a.explanation.is_empty() {
            text.push('\n');
            text.push_str(&a.explanation);
        }
        push_indicators(&mut text, &a.indicators);

        RenderedReply {
            text,
            suggestions: vec![
                "Is it suspicious?".to_string(),
                "Generate a report".to_string(),
            ],
        }
    }

    fn report(&self, p: &ReportPayload) -> RenderedReply {
        let mut text = format!("Risk report for '{}':\n\n{}", p.assessment.username, p.report);
        if p.generated_locally {
            text.push_str(
                "\n\n(Generated locally: the analysis service could not write this report.)",
            );
        }
        RenderedReply {
            text,
            suggestions: vec![
                "Is it suspicious?".to_string(),
                "Find all accounts of <username>".to_string(),
            ],
        }
    }

    fn unavailable(
        &self,
        capability: Capability,
        reason: &str,
        identifier: Option<&str>,
    ) -> RenderedReply {
        let subject = identifier
            .map(|id| format!(" for '{}'", id))
            .unwrap_or_default();
        RenderedReply {
            text: format!(
                "I couldn't complete the {}{} right now: {}. Please try again later.",
                capability, subject, reason
            ),
            suggestions: vec!["Try again".to_string()],
        }
    }

    fn general(&self, topic: GeneralTopic) -> RenderedReply {
        let text = match topic {
            GeneralTopic::Greeting => "Hi! I'm Sleuth. Ask me to find the accounts behind a \
                username, check whether it looks suspicious, score its risk, or write a report."
                .to_string(),
            GeneralTopic::Thanks => {
                "You're welcome! Ask about another username any time.".to_string()
            }
            GeneralTopic::Help => "I investigate usernames. Try:\n\
                - \"Find all accounts of <username>\"\n\
                - \"Is it suspicious?\"\n\
                - \"What's the risk score?\"\n\
                - \"Generate a report\""
                .to_string(),
        };
        RenderedReply {
            text,
            suggestions: vec![
                "Find all accounts of <username>".to_string(),
                "Is it suspicious?".to_string(),
            ],
        }
    }

    /// Template report used when the analysis service fails to write one.
    /// Output depends only on its inputs.
    pub fn fallback_report(
        &self,
        username: &str,
        discovery: &DiscoveryResult,
        assessment: &RiskAssessment,
        generated_at: DateTime<Utc>,
    ) -> String {
        let found = discovery.claimed_count();
        let mut out = format!(
            "SECURITY RISK REPORT: {}\nGenerated: {}\n\n",
            username,
            generated_at.format("%Y-%m-%d %H:%M UTC")
        );

        out.push_str("EXECUTIVE SUMMARY\n");
        out.push_str(&format!(
            "'{}' holds {} {} across {} checked sites. Overall risk: {} ({:.1}/10).\n\n",
            username,
            found,
            plural(found, "account", "accounts"),
            discovery.checked_count(),
            assessment.risk_level,
            assessment.risk_score
        ));

        out.push_str("KEY FINDINGS\n");
        out.push_str(&format!(
            "- Suspicious: {}\n",
            if assessment.is_suspicious { "Yes" } else { "No" }
        ));
        for indicator in &assessment.indicators {
            out.push_str(&format!("- {}\n", indicator));
        }
        let platforms = discovery.claimed_site_names(REPORT_PLATFORM_CAP);
        if !platforms.is_empty() {
            out.push_str(&format!("- Platforms: {}\n", platforms.join(", ")));
        }
        out.push('\n');

        out.push_str("RECOMMENDATIONS\n");
        let first = match assessment.risk_level {
            RiskLevel::High => "Treat this identity as untrusted until it is independently verified.",
            RiskLevel::Medium => "Verify the identity before sharing sensitive information.",
            RiskLevel::Low => "No immediate action needed.",
        };
        out.push_str(&format!("- {}\n", first));
        out.push_str("- Review the public information exposed on each platform.\n");
        out.push_str("- Re-run the analysis if the footprint changes.");
        out
    }
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}

fn push_indicators(text: &mut String, indicators: &[String]) {
    if indicators.is_empty() {
        return;
    }
    text.push_str("\nIndicators:");
    for indicator in indicators {
        text.push_str("\n- ");
        text.push_str(indicator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccountHit;
    use chrono::TimeZone;
    use sleuth_core::types::{PlatformRisk, SiteResult, SiteStatus};

    fn formatter() -> ResponseFormatter {
        ResponseFormatter::new(2)
    }

    fn hit(name: &str) -> AccountHit {
        AccountHit {
            site_name: name.to_string(),
            url_user: format!("https://{}.com/kash", name.to_lowercase()),
            url_main: format!("https://{}.com", name.to_lowercase()),
            query_time: None,
        }
    }

    fn assessment(score: f64) -> RiskAssessment {
        RiskAssessment {
            username: "kash".to_string(),
            risk_score: score,
            is_suspicious: score >= 7.0,
            risk_level: RiskLevel::from_score(score),
            indicators: vec!["Many platforms".to_string()],
            explanation: "Broad footprint.".to_string(),
            total_accounts: 3,
        }
    }

    fn investigation(found: usize, failed: usize) -> InvestigationPayload {
        let names = ["GitHub", "Reddit", "Twitch"];
        InvestigationPayload {
            username: "kash".to_string(),
            total_sites: 10,
            found_count: found,
            checked_count: 10 - failed,
            failed_checks: failed,
            sites_requested: vec![],
            accounts: names.iter().take(found).map(|n| hit(n)).collect(),
        }
    }

    #[test]
    fn test_investigation_lists_and_truncates() {
        let reply = formatter().render(
            QueryIntent::Investigation,
            Some("kash"),
            &DispatchPayload::Investigation(investigation(3, 0)),
        );
        assert!(reply.text.starts_with("Found 3 accounts for 'kash':"));
        assert!(reply.text.contains("- GitHub: https://github.com/kash"));
        assert!(reply.text.contains("- Reddit: https://reddit.com/kash"));
        assert!(!reply.text.contains("Twitch"));
        assert!(reply.text.contains("...and 1 more"));
        assert!(!reply.text.contains("could not be checked"));
        assert_eq!(reply.suggestions.len(), 3);
    }

    #[test]
    fn test_investigation_reports_partial_coverage() {
        let reply = formatter().render(
            QueryIntent::Investigation,
            Some("kash"),
            &DispatchPayload::Investigation(investigation(1, 4)),
        );
        assert!(reply.text.starts_with("Found 1 account for 'kash':"));
        assert!(reply.text.ends_with("4 of 10 sites could not be checked."));
    }

    #[test]
    fn test_investigation_nothing_found() {
        let reply = formatter().render(
            QueryIntent::Investigation,
            Some("kash"),
            &DispatchPayload::Investigation(investigation(0, 0)),
        );
        assert_eq!(reply.text, "No accounts found for 'kash' across 10 checked sites.");
        assert_eq!(reply.suggestions, vec!["Try a different username"]);
    }

    #[test]
    fn test_intelligence_with_platform() {
        let payload = DispatchPayload::Intelligence(IntelligencePayload {
            found_count: 3,
            assessment: assessment(8.2),
            riskiest_platform: Some(PlatformRisk {
                platform: "Telegram".to_string(),
                reason: "Anonymous channels".to_string(),
                risk_score: 7.5,
            }),
            platform_note: None,
        });
        let reply = formatter().render(QueryIntent::Intelligence, Some("kash"), &payload);
        assert!(reply.text.starts_with("'kash' looks SUSPICIOUS (risk 8.2/10, High)."));
        assert!(reply.text.contains("Indicators:\n- Many platforms"));
        assert!(reply
            .text
            .contains("Highest-risk platform: Telegram (7.5/10): Anonymous channels"));
    }

    #[test]
    fn test_intelligence_with_platform_note() {
        let payload = DispatchPayload::Intelligence(IntelligencePayload {
            found_count: 3,
            assessment: assessment(2.0),
            riskiest_platform: None,
            platform_note: Some("no answer within 60 seconds".to_string()),
        });
        let reply = formatter().render(QueryIntent::Intelligence, Some("kash"), &payload);
        assert!(reply.text.contains("does not look suspicious"));
        assert!(reply
            .text
            .ends_with("Platform comparison unavailable: no answer within 60 seconds"));
    }

    #[test]
    fn test_intelligence_without_accounts() {
        let payload = DispatchPayload::Intelligence(IntelligencePayload {
            found_count: 0,
            assessment: RiskAssessment::no_accounts("kash"),
            riskiest_platform: None,
            platform_note: None,
        });
        let reply = formatter().render(QueryIntent::Intelligence, Some("kash"), &payload);
        assert_eq!(
            reply.text,
            "No accounts found for 'kash', so there is nothing to assess."
        );
    }

    #[test]
    fn test_analysis() {
        let payload = DispatchPayload::Analysis(AnalysisPayload {
            found_count: 1,
            assessment: assessment(4.3),
        });
        let reply = formatter().render(QueryIntent::Analysis, Some("kash"), &payload);
        assert!(reply
            .text
            .starts_with("Risk score for 'kash': 4.3/10 (Medium) across 1 account."));
    }

    #[test]
    fn test_report_marks_local_generation() {
        let payload = DispatchPayload::Report(ReportPayload {
            found_count: 3,
            assessment: assessment(5.0),
            report: "EXECUTIVE SUMMARY".to_string(),
            generated_locally: true,
        });
        let reply = formatter().render(QueryIntent::Reporting, Some("kash"), &payload);
        assert!(reply.text.starts_with("Risk report for 'kash':\n\nEXECUTIVE SUMMARY"));
        assert!(reply.text.contains("Generated locally"));
    }

    #[test]
    fn test_clarification_wording_per_intent() {
        let payload = DispatchPayload::Clarification {
            reason: "no username".to_string(),
        };
        let f = formatter();
        let inv = f.render(QueryIntent::Investigation, None, &payload);
        assert!(inv.text.starts_with("Which username should I search for?"));
        let intel = f.render(QueryIntent::Intelligence, None, &payload);
        assert!(intel.text.contains("Is kash suspicious?"));
        let rep = f.render(QueryIntent::Reporting, None, &payload);
        assert!(rep.text.contains("write a report on"));
    }

    #[test]
    fn test_unavailable_names_capability_and_reason() {
        let payload = DispatchPayload::Unavailable {
            capability: Capability::Analysis,
            reason: "analysis backend not configured: set GROQ_API_KEY".to_string(),
        };
        let reply = formatter().render(QueryIntent::Analysis, Some("kash"), &payload);
        assert_eq!(
            reply.text,
            "I couldn't complete the risk analysis for 'kash' right now: \
             analysis backend not configured: set GROQ_API_KEY. Please try again later."
        );
    }

    #[test]
    fn test_general_topics() {
        let f = formatter();
        let hi = f.render(
            QueryIntent::General,
            None,
            &DispatchPayload::General {
                topic: GeneralTopic::Greeting,
            },
        );
        assert!(hi.text.starts_with("Hi! I'm Sleuth."));
        let help = f.render(
            QueryIntent::General,
            None,
            &DispatchPayload::General {
                topic: GeneralTopic::Help,
            },
        );
        assert!(help.text.contains("\"Find all accounts of <username>\""));
    }

    #[test]
    fn test_fallback_report_is_deterministic() {
        let discovery = DiscoveryResult {
            username: "kash".to_string(),
            total_sites: 3,
            found_count: 2,
            results: ["GitHub", "Reddit"]
                .iter()
                .map(|n| SiteResult {
                    site_name: n.to_string(),
                    url_main: String::new(),
                    url_user: String::new(),
                    status: SiteStatus::Claimed,
                    query_time: None,
                    context: None,
                })
                .collect(),
        };
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 12, 30, 0).unwrap();
        let f = formatter();
        let a = f.fallback_report("kash", &discovery, &assessment(7.5), at);
        let b = f.fallback_report("kash", &discovery, &assessment(7.5), at);
        assert_eq!(a, b);
        assert!(a.starts_with("SECURITY RISK REPORT: kash\nGenerated: 2026-10-19 12:30 UTC"));
        assert!(a.contains("EXECUTIVE SUMMARY"));
        assert!(a.contains("'kash' holds 2 accounts across 2 checked sites. Overall risk: High (7.5/10)."));
        assert!(a.contains("KEY FINDINGS\n- Suspicious: Yes"));
        assert!(a.contains("- Platforms: GitHub, Reddit"));
        assert!(a.contains("RECOMMENDATIONS\n- Treat this identity as untrusted"));
    }
}
