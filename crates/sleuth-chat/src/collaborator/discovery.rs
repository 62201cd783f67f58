//! HTTP client for the account-discovery service.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use sleuth_core::config::DiscoveryConfig;
use sleuth_core::types::{DiscoveryRequest, DiscoveryResult};

use super::{transport_error, AccountDiscovery};
use crate::error::CollaboratorError;

const SERVICE: &str = "discovery service";

#[derive(Serialize)]
struct SearchBody<'a> {
    username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sites: Option<&'a [String]>,
    timeout: u64,
    nsfw: bool,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Talks to a discovery service exposing `POST /search`.
pub struct HttpDiscovery {
    base_url: String,
    request_timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpDiscovery {
    pub fn new(base_url: impl Into<String>, request_timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(request_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout_secs,
            client,
        }
    }

    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self::new(config.base_url.clone(), config.request_timeout_secs)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl AccountDiscovery for HttpDiscovery {
    async fn discover(
        &self,
        request: &DiscoveryRequest,
    ) -> Result<DiscoveryResult, CollaboratorError> {
        let url = format!("{}/search", self.base_url);
        let body = SearchBody {
            username: &request.username,
            sites: request.sites.as_deref(),
            timeout: request.timeout_secs,
            nsfw: request.include_nsfw,
        };
        debug!(username = %request.username, sites = ?request.sites, "Querying discovery service");

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, self.request_timeout_secs, e))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.detail)
                .unwrap_or(text);
            warn!(status = %status, detail = %detail, "Discovery service refused request");
            return Err(if status.is_client_error() {
                CollaboratorError::Rejected(detail)
            } else {
                CollaboratorError::Unavailable(format!("{} returned {}: {}", SERVICE, status, detail))
            });
        }

        res.json::<DiscoveryResult>()
            .await
            .map_err(|e| CollaboratorError::InvalidResponse(format!("{} sent an unexpected body: {}", SERVICE, e)))
    }
}
