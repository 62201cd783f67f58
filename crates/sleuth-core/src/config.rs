use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SleuthError};

/// Top-level configuration for the Sleuth application.
///
/// Loaded from `~/.sleuth/config.toml` by default. Each section corresponds
/// to one component or collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SleuthConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl SleuthConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SleuthConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SleuthError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Origins allowed by CORS (the presentation layer).
    pub allowed_origins: Vec<String>,
    /// Maximum requests per second across the chat routes.
    pub rate_limit_per_sec: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3030,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            rate_limit_per_sec: 100,
        }
    }
}

/// Conversational engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Whether the chat endpoint accepts queries.
    pub enabled: bool,
    /// Idle minutes after which a session (and its remembered username) is dropped.
    pub session_timeout_minutes: u32,
    /// Maximum query length in characters.
    pub max_message_length: usize,
    /// Maximum number of claimed accounts listed in a reply.
    pub max_listed_accounts: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            session_timeout_minutes: 30,
            max_message_length: 2000,
            max_listed_accounts: 25,
        }
    }
}

/// Account-discovery collaborator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Base URL of the discovery service.
    pub base_url: String,
    /// Per-site timeout handed to the discovery engine.
    pub site_timeout_secs: u64,
    /// Upper bound on one whole discovery call.
    pub request_timeout_secs: u64,
    /// Include NSFW platforms in searches.
    pub include_nsfw: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            site_timeout_secs: 60,
            request_timeout_secs: 120,
            include_nsfw: false,
        }
    }
}

/// Risk-analysis collaborator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Base URL of an OpenAI-compatible chat-completions API.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// API key. Prefer `api_key_env`; this field is for local setups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable consulted when `api_key` is unset.
    pub api_key_env: String,
    /// Sampling temperature for assessments.
    pub temperature: f32,
    /// Upper bound on one model call.
    pub request_timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            api_key: None,
            api_key_env: "GROQ_API_KEY".to_string(),
            temperature: 0.3,
            request_timeout_secs: 60,
        }
    }
}

impl AnalysisConfig {
    /// Resolve the API key: explicit config value, then the environment.
    /// Blank values count as missing.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}
