use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::adaptive::types::{AdaptiveContext, AdaptiveRecommendation};

const DEFAULT_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote recommender not configured: {0}")]
    NotConfigured(&'static str),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: reqwest::StatusCode, body: String },
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Scoring service that turns a context into a recommendation.
#[async_trait]
pub trait RemoteRecommender: Send + Sync {
    async fn recommend(
        &self,
        context: &AdaptiveContext,
    ) -> Result<AdaptiveRecommendation, RemoteError>;
}

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub endpoint: Option<String>,
    pub api_token: Option<String>,
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_token: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl RemoteConfig {
    pub fn from_env() -> Self {
        let timeout = env_string("ADAPTIVE_REMOTE_TIMEOUT_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        Self {
            endpoint: env_string("ADAPTIVE_REMOTE_URL"),
            api_token: env_string("ADAPTIVE_REMOTE_TOKEN"),
            timeout: Duration::from_millis(timeout),
        }
    }
}

// Accepts both a bare recommendation and the `{ success, data }` envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum RemotePayload {
    Envelope { data: AdaptiveRecommendation },
    Bare(AdaptiveRecommendation),
}

#[derive(Clone)]
pub struct HttpRecommender {
    config: RemoteConfig,
    client: reqwest::Client,
}

impl HttpRecommender {
    pub fn new(config: RemoteConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { config, client }
    }

    pub fn from_env() -> Self {
        Self::new(RemoteConfig::from_env())
    }

    pub fn is_available(&self) -> bool {
        self.config
            .endpoint
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty())
    }
}

#[async_trait]
impl RemoteRecommender for HttpRecommender {
    async fn recommend(
        &self,
        context: &AdaptiveContext,
    ) -> Result<AdaptiveRecommendation, RemoteError> {
        let endpoint = self
            .config
            .endpoint
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or(RemoteError::NotConfigured("ADAPTIVE_REMOTE_URL"))?;

        let mut request = self.client.post(endpoint).json(context);
        if let Some(token) = self.config.api_token.as_deref() {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await.map_err(|e| {
            if e.is_timeout() {
                RemoteError::Timeout(self.config.timeout)
            } else {
                RemoteError::Request(e)
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteError::HttpStatus { status, body });
        }

        let bytes = resp.bytes().await?;
        let payload: RemotePayload = serde_json::from_slice(&bytes).map_err(|e| {
            tracing::debug!(error = %e, body = %String::from_utf8_lossy(&bytes), "undecodable recommendation payload");
            RemoteError::Json(e)
        })?;

        Ok(match payload {
            RemotePayload::Envelope { data } => data,
            RemotePayload::Bare(rec) => rec,
        })
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
