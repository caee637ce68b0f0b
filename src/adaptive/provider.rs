use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::adaptive::builder::build_with;
use crate::adaptive::difficulty::AdjustmentThresholds;
use crate::adaptive::remote::{RemoteError, RemoteRecommender};
use crate::adaptive::types::{AdaptiveContext, AdaptiveRecommendation, RecommendationSource};

pub const FALLBACK_ADVISORY: &str =
    "Remote recommendation service unavailable; using local fallback";
pub const NO_CONTEXT_ERROR: &str =
    "No adaptive context available; recommendation cannot be produced";

const DEFAULT_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderOutcome {
    Remote(AdaptiveRecommendation),
    Fallback {
        recommendation: AdaptiveRecommendation,
        advisory: String,
    },
    Failed(String),
}

impl ProviderOutcome {
    /// Map a remote result onto the three-way outcome, computing the local
    /// heuristic when the remote side failed.
    pub fn resolve(
        context: Option<&AdaptiveContext>,
        remote: Result<AdaptiveRecommendation, RemoteError>,
        thresholds: &AdjustmentThresholds,
    ) -> Self {
        match (remote, context) {
            (Ok(recommendation), _) => Self::Remote(recommendation),
            (Err(_), Some(context)) => Self::Fallback {
                recommendation: build_with(context, thresholds),
                advisory: FALLBACK_ADVISORY.to_string(),
            },
            (Err(_), None) => Self::Failed(NO_CONTEXT_ERROR.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StateAction {
    Started,
    Resolved(ProviderOutcome),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationState {
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<AdaptiveRecommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<RecommendationSource>,
}

impl RecommendationState {
    pub fn reduce(self, action: StateAction) -> Self {
        match action {
            StateAction::Started => Self {
                loading: true,
                error: None,
                ..self
            },
            StateAction::Resolved(ProviderOutcome::Remote(recommendation)) => Self {
                loading: false,
                recommendation: Some(recommendation),
                error: None,
                source: Some(RecommendationSource::Remote),
            },
            StateAction::Resolved(ProviderOutcome::Fallback {
                recommendation,
                advisory,
            }) => Self {
                loading: false,
                recommendation: Some(recommendation),
                error: Some(advisory),
                source: Some(RecommendationSource::Fallback),
            },
            StateAction::Resolved(ProviderOutcome::Failed(reason)) => Self {
                loading: false,
                recommendation: None,
                error: Some(reason),
                source: None,
            },
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.source == Some(RecommendationSource::Fallback)
    }
}

#[derive(Default)]
struct ProviderInner {
    state: RecommendationState,
    latest_token: u64,
    last_context: Option<AdaptiveContext>,
    refreshed: bool,
}

/// Remote-first recommendation source with a local heuristic fallback.
///
/// Each refresh takes a new token; a result is only committed while its
/// token is still the latest, so a slow response never overwrites the state
/// produced for a newer context.
pub struct RecommendationProvider {
    remote: Arc<dyn RemoteRecommender>,
    thresholds: AdjustmentThresholds,
    timeout: Duration,
    inner: Mutex<ProviderInner>,
}

impl RecommendationProvider {
    pub fn new(remote: Arc<dyn RemoteRecommender>) -> Self {
        Self {
            remote,
            thresholds: AdjustmentThresholds::default(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            inner: Mutex::new(ProviderInner::default()),
        }
    }

    pub fn with_thresholds(mut self, thresholds: AdjustmentThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn thresholds(&self) -> &AdjustmentThresholds {
        &self.thresholds
    }

    pub fn state(&self) -> RecommendationState {
        self.inner.lock().state.clone()
    }

    /// Refresh only when the context differs from the last one refreshed.
    pub async fn on_context_change(&self, context: Option<&AdaptiveContext>) -> RecommendationState {
        {
            let inner = self.inner.lock();
            if inner.refreshed && inner.last_context.as_ref() == context {
                debug!("context unchanged, skipping refresh");
                return inner.state.clone();
            }
        }
        self.refresh(context).await
    }

    pub async fn refresh(&self, context: Option<&AdaptiveContext>) -> RecommendationState {
        let request_id = Uuid::new_v4();
        let token = {
            let mut inner = self.inner.lock();
            inner.latest_token += 1;
            inner.last_context = context.cloned();
            inner.refreshed = true;
            inner.state = std::mem::take(&mut inner.state).reduce(StateAction::Started);
            inner.latest_token
        };

        let remote = match context {
            Some(ctx) => self.call_remote(ctx).await,
            None => Err(RemoteError::NotConfigured("context")),
        };
        if let Err(err) = &remote {
            warn!(%request_id, error = %err, "remote recommendation failed");
        }

        let outcome = ProviderOutcome::resolve(context, remote, &self.thresholds);
        match &outcome {
            ProviderOutcome::Remote(rec) => {
                info!(%request_id, child_id = %rec.child_id, next = %rec.next_difficulty, "remote recommendation")
            }
            ProviderOutcome::Fallback { recommendation, .. } => {
                info!(%request_id, child_id = %recommendation.child_id, next = %recommendation.next_difficulty, "fallback recommendation")
            }
            ProviderOutcome::Failed(reason) => warn!(%request_id, %reason, "no recommendation"),
        }

        let mut inner = self.inner.lock();
        if inner.latest_token != token {
            debug!(%request_id, token, latest = inner.latest_token, "discarding stale recommendation");
            return inner.state.clone();
        }
        inner.state = std::mem::take(&mut inner.state).reduce(StateAction::Resolved(outcome));
        inner.state.clone()
    }

    async fn call_remote(
        &self,
        context: &AdaptiveContext,
    ) -> Result<AdaptiveRecommendation, RemoteError> {
        match tokio::time::timeout(self.timeout, self.remote.recommend(context)).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Timeout(self.timeout)),
        }
    }
}
