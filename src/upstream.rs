//! Client for the Anthropic usage endpoints.
//!
//! A request goes to the primary endpoint first. Only a transport fault there
//! (the exchange never completed) sends the same request to the admin
//! endpoint; an HTTP error status from the primary is reported as-is.

use crate::config::UsageConfig;
use crate::error::ApiError;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

const ANTHROPIC_VERSION_HEADER: &str = "anthropic-version";

#[derive(Debug, thiserror::Error)]
pub(crate) enum UpstreamError {
    #[error("API key contains characters not allowed in a header")]
    InvalidKey,
    #[error("anthropic-version contains characters not allowed in a header")]
    InvalidVersion,
    #[error("failed to reach usage endpoint: {0}")]
    Transport(reqwest::Error),
    #[error("failed to read usage response body: {0}")]
    Body(reqwest::Error),
    #[error("failed to parse usage response as JSON: {0}")]
    Decode(serde_json::Error),
}

impl From<UpstreamError> for ApiError {
    fn from(e: UpstreamError) -> Self {
        tracing::error!(error = %e, "usage fetch failed");
        ApiError::Internal(e.to_string())
    }
}

/// Outcome of a completed exchange with the usage API.
#[derive(Debug)]
pub(crate) enum UsageReply {
    Payload(Value),
    Rejected {
        status: u16,
        status_text: String,
        body: String,
    },
}

impl UsageReply {
    pub(crate) fn into_result(self) -> Result<Value, ApiError> {
        match self {
            UsageReply::Payload(payload) => Ok(payload),
            UsageReply::Rejected {
                status,
                status_text,
                body,
            } => Err(ApiError::Upstream {
                status,
                status_text,
                details: body,
            }),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UsageClient {
    http: reqwest::Client,
}

impl UsageClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn fetch(
        &self,
        config: &UsageConfig,
        api_key: &str,
    ) -> Result<UsageReply, UpstreamError> {
        let headers = request_headers(api_key, &config.anthropic_version)?;

        let response = match self.get(&config.primary_url, &headers).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    url = %config.primary_url,
                    error = %e,
                    "primary usage endpoint failed, trying admin endpoint"
                );
                self.get(&config.fallback_url, &headers)
                    .await
                    .map_err(UpstreamError::Transport)?
            }
        };

        let status = response.status();
        if !status.is_success() {
            // Canonical phrase for the code; empty for codes with no standard reason.
            let status_text = status.canonical_reason().unwrap_or_default().to_string();
            let body = response.text().await.map_err(UpstreamError::Body)?;
            tracing::warn!(
                status = status.as_u16(),
                status_text = %status_text,
                body = %body,
                "usage endpoint returned an error status"
            );
            return Ok(UsageReply::Rejected {
                status: status.as_u16(),
                status_text,
                body,
            });
        }

        let bytes = response.bytes().await.map_err(UpstreamError::Body)?;
        let payload: Value = serde_json::from_slice(&bytes).map_err(UpstreamError::Decode)?;
        tracing::info!(payload = %payload, "usage data received");
        Ok(UsageReply::Payload(payload))
    }

    async fn get(&self, url: &str, headers: &HeaderMap) -> reqwest::Result<reqwest::Response> {
        self.http.get(url).headers(headers.clone()).send().await
    }
}

fn request_headers(api_key: &str, version: &str) -> Result<HeaderMap, UpstreamError> {
    let mut bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
        .map_err(|_| UpstreamError::InvalidKey)?;
    bearer.set_sensitive(true);
    let version = HeaderValue::from_str(version).map_err(|_| UpstreamError::InvalidVersion)?;

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ANTHROPIC_VERSION_HEADER, version);
    Ok(headers)
}
