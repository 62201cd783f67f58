//! Risk analysis backed by an OpenAI-compatible chat-completions API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use sleuth_core::config::AnalysisConfig;
use sleuth_core::types::{DiscoveryResult, PlatformRisk, RiskAssessment, RiskLevel};

use super::{transport_error, RiskAnalyzer};
use crate::error::CollaboratorError;

const SERVICE: &str = "analysis backend";

/// Platforms listed in an assessment prompt.
const ASSESSMENT_PLATFORM_CAP: usize = 30;
/// Platforms listed in a report prompt.
const REPORT_PLATFORM_CAP: usize = 20;

const ASSESSMENT_SYSTEM_PROMPT: &str = "You are a cybersecurity analyst specialising in \
    OSINT and social-media footprint risk. Reply with a single JSON object and nothing else.";

const REPORT_SYSTEM_PROMPT: &str = "You are a cybersecurity analyst writing concise, \
    professional OSINT risk reports in plain text.";

// OpenAI-compatible wire types
#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct CompletionMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionContent,
}

#[derive(Deserialize)]
struct CompletionContent {
    #[serde(default)]
    content: Option<String>,
}

// Shapes the model is asked to produce
#[derive(Deserialize)]
struct RawAssessment {
    risk_score: f64,
    #[serde(default)]
    is_suspicious: Option<bool>,
    #[serde(default)]
    risk_level: Option<String>,
    #[serde(default)]
    indicators: Vec<String>,
    #[serde(default)]
    explanation: String,
}

#[derive(Deserialize)]
struct RawPlatformRisk {
    platform: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    risk_score: f64,
}

/// Sampling parameters for one kind of call.
#[derive(Debug, Clone, Copy)]
struct CallShape {
    temperature: f32,
    max_tokens: u32,
}

// =============================================================================
// LlmAnalyzer
// =============================================================================

/// Risk analyzer that prompts a hosted language model.
pub struct LlmAnalyzer {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    request_timeout_secs: u64,
    client: reqwest::Client,
}

impl LlmAnalyzer {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let defaults = AnalysisConfig::default();
        Self::build(
            base_url.into(),
            api_key.into(),
            model.into(),
            defaults.temperature,
            defaults.request_timeout_secs,
        )
    }

    /// Build from config. Returns `None` when no API key can be resolved.
    pub fn from_config(config: &AnalysisConfig) -> Option<Self> {
        let key = config.resolve_api_key()?;
        Some(Self::build(
            config.base_url.clone(),
            key,
            config.model.clone(),
            config.temperature,
            config.request_timeout_secs,
        ))
    }

    fn build(
        base_url: String,
        api_key: String,
        model: String,
        temperature: f32,
        request_timeout_secs: u64,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(request_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
            model,
            temperature,
            request_timeout_secs,
            client,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        system: &str,
        user: &str,
        shape: CallShape,
    ) -> Result<String, CollaboratorError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = CompletionRequest {
            model: &self.model,
            messages: vec![
                CompletionMessage {
                    role: "system",
                    content: system,
                },
                CompletionMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: shape.temperature,
            max_tokens: shape.max_tokens,
        };

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, self.request_timeout_secs, e))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            warn!(status = %status, "Analysis backend returned an error");
            return Err(match status.as_u16() {
                401 | 403 => {
                    CollaboratorError::Unavailable(format!("{} rejected the API key ({})", SERVICE, status))
                }
                400 | 422 => CollaboratorError::Rejected(text),
                _ => CollaboratorError::Unavailable(format!("{} returned {}", SERVICE, status)),
            });
        }

        let parsed: CompletionResponse = res.json().await.map_err(|e| {
            CollaboratorError::InvalidResponse(format!("{} sent an unexpected body: {}", SERVICE, e))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| CollaboratorError::InvalidResponse("empty completion".to_string()))
    }

    fn assessment_prompt(username: &str, discovery: &DiscoveryResult) -> String {
        let platforms = discovery.claimed_site_names(ASSESSMENT_PLATFORM_CAP);
        format!(
            "Analyse the following social media footprint for potential security risks.\n\n\
             Username: {username}\n\
             Accounts found: {count}\n\
             Platforms: {platforms}\n\n\
             Consider account spread and platform types, username patterns associated with \
             bots or impersonation, presence on high-risk or anonymous platforms, and signs of \
             coordinated inauthentic behaviour.\n\n\
             Respond with JSON only:\n\
             {{\"risk_score\": <0-10>, \"is_suspicious\": <true|false>, \
             \"risk_level\": \"Low|Medium|High\", \"indicators\": [\"...\"], \
             \"explanation\": \"...\"}}",
            count = discovery.claimed_count(),
            platforms = platforms.join(", "),
        )
    }

    fn platform_prompt(username: &str, discovery: &DiscoveryResult) -> String {
        let platforms = discovery.claimed_site_names(ASSESSMENT_PLATFORM_CAP);
        format!(
            "The username '{username}' is registered on these platforms: {platforms}.\n\n\
             Which single platform carries the highest security risk for this user, and why?\n\n\
             Respond with JSON only:\n\
             {{\"platform\": \"...\", \"reason\": \"...\", \"risk_score\": <0-10>}}",
            platforms = platforms.join(", "),
        )
    }

    fn report_prompt(
        username: &str,
        discovery: &DiscoveryResult,
        assessment: Option<&RiskAssessment>,
    ) -> String {
        let platforms = discovery.claimed_site_names(REPORT_PLATFORM_CAP);
        let mut prompt = format!(
            "Write a security risk report for the username '{username}'.\n\n\
             Accounts found: {count}\n\
             Platforms: {platforms}\n",
            count = discovery.claimed_count(),
            platforms = platforms.join(", "),
        );
        if let Some(a) = assessment {
            prompt.push_str(&format!(
                "Risk score: {:.1}/10 ({})\nIndicators: {}\n",
                a.risk_score,
                a.risk_level,
                a.indicators.join("; "),
            ));
        }
        prompt.push_str(
            "\nUse three sections: EXECUTIVE SUMMARY, KEY FINDINGS, RECOMMENDATIONS. \
             Keep it under 400 words.",
        );
        prompt
    }
}

#[async_trait]
impl RiskAnalyzer for LlmAnalyzer {
    async fn analyze(
        &self,
        username: &str,
        discovery: &DiscoveryResult,
    ) -> Result<RiskAssessment, CollaboratorError> {
        let total_accounts = discovery.claimed_count();
        if total_accounts == 0 {
            return Ok(RiskAssessment::no_accounts(username));
        }

        let prompt = Self::assessment_prompt(username, discovery);
        let shape = CallShape {
            temperature: self.temperature,
            max_tokens: 500,
        };
        let content = self.complete(ASSESSMENT_SYSTEM_PROMPT, &prompt, shape).await?;
        debug!(username, "Assessment completion received");

        let raw: RawAssessment = parse_model_json(&content)?;
        let risk_score = raw.risk_score.clamp(0.0, 10.0);
        let risk_level = raw
            .risk_level
            .as_deref()
            .and_then(RiskLevel::parse)
            .unwrap_or_else(|| RiskLevel::from_score(risk_score));

        Ok(RiskAssessment {
            username: username.to_string(),
            risk_score,
            is_suspicious: raw.is_suspicious.unwrap_or(risk_score >= 7.0),
            risk_level,
            indicators: raw.indicators,
            explanation: raw.explanation,
            total_accounts,
        })
    }

    async fn riskiest_platform(
        &self,
        username: &str,
        discovery: &DiscoveryResult,
    ) -> Result<PlatformRisk, CollaboratorError> {
        if discovery.claimed_count() == 0 {
            return Ok(PlatformRisk {
                platform: "None".to_string(),
                reason: "No accounts found".to_string(),
                risk_score: 0.0,
            });
        }

        let prompt = Self::platform_prompt(username, discovery);
        let shape = CallShape {
            temperature: self.temperature,
            max_tokens: 300,
        };
        let content = self.complete(ASSESSMENT_SYSTEM_PROMPT, &prompt, shape).await?;
        let raw: RawPlatformRisk = parse_model_json(&content)?;

        Ok(PlatformRisk {
            platform: raw.platform,
            reason: raw.reason,
            risk_score: raw.risk_score.clamp(0.0, 10.0),
        })
    }

    async fn report(
        &self,
        username: &str,
        discovery: &DiscoveryResult,
        assessment: Option<&RiskAssessment>,
    ) -> Result<String, CollaboratorError> {
        let prompt = Self::report_prompt(username, discovery, assessment);
        let shape = CallShape {
            temperature: 0.4,
            max_tokens: 800,
        };
        self.complete(REPORT_SYSTEM_PROMPT, &prompt, shape).await
    }
}

// =============================================================================
// UnconfiguredAnalyzer
// =============================================================================

/// Stand-in used when no analysis backend is configured. Every call reports
/// the capability as unavailable.
pub struct UnconfiguredAnalyzer {
    reason: String,
}

impl UnconfiguredAnalyzer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn unavailable<T>(&self) -> Result<T, CollaboratorError> {
        Err(CollaboratorError::Unavailable(self.reason.clone()))
    }
}

#[async_trait]
impl RiskAnalyzer for UnconfiguredAnalyzer {
    async fn analyze(
        &self,
        _username: &str,
        _discovery: &DiscoveryResult,
    ) -> Result<RiskAssessment, CollaboratorError> {
        self.unavailable()
    }

    async fn riskiest_platform(
        &self,
        _username: &str,
        _discovery: &DiscoveryResult,
    ) -> Result<PlatformRisk, CollaboratorError> {
        self.unavailable()
    }

    async fn report(
        &self,
        _username: &str,
        _discovery: &DiscoveryResult,
        _assessment: Option<&RiskAssessment>,
    ) -> Result<String, CollaboratorError> {
        self.unavailable()
    }
}

/// Pick the analyzer for a configuration: the hosted model when a key
/// resolves, otherwise an [`UnconfiguredAnalyzer`].
pub fn analyzer_from_config(config: &AnalysisConfig) -> Arc<dyn RiskAnalyzer> {
    match LlmAnalyzer::from_config(config) {
        Some(analyzer) => {
            info!(model = %analyzer.model(), base_url = %config.base_url, "Risk analysis enabled");
            Arc::new(analyzer)
        }
        None => {
            warn!(
                env = %config.api_key_env,
                "No analysis API key configured; risk analysis is unavailable"
            );
            Arc::new(UnconfiguredAnalyzer::new(format!(
                "{} not configured: set {}",
                SERVICE, config.api_key_env
            )))
        }
    }
}

// =============================================================================
// JSON recovery
// =============================================================================

/// Locate the first balanced JSON object in a model reply. Markdown code
/// fences and surrounding prose are skipped; braces inside strings are
/// ignored.
pub fn extract_json_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in content[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&content[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_model_json<T: serde::de::DeserializeOwned>(content: &str) -> Result<T, CollaboratorError> {
    let object = extract_json_object(content)
        .ok_or_else(|| CollaboratorError::InvalidResponse("no JSON object in model reply".to_string()))?;
    serde_json::from_str(object)
        .map_err(|e| CollaboratorError::InvalidResponse(format!("malformed model JSON: {}", e)))
}
