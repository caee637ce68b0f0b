#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use adaptive_engine::adaptive::remote::{RemoteError, RemoteRecommender};
use adaptive_engine::adaptive::types::{AdaptiveContext, AdaptiveRecommendation};
use adaptive_engine::adaptive::RecommendationProvider;
use adaptive_engine::state::AppState;
use async_trait::async_trait;
use axum::Router;

/// Remote that always fails the way an unreachable service does.
pub struct FailingRemote {
    pub calls: AtomicUsize,
}

impl FailingRemote {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteRecommender for FailingRemote {
    async fn recommend(
        &self,
        _context: &AdaptiveContext,
    ) -> Result<AdaptiveRecommendation, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RemoteError::NotConfigured("test"))
    }
}

/// Remote that answers with a fixed recommendation.
pub struct FixedRemote {
    pub recommendation: AdaptiveRecommendation,
}

#[async_trait]
impl RemoteRecommender for FixedRemote {
    async fn recommend(
        &self,
        _context: &AdaptiveContext,
    ) -> Result<AdaptiveRecommendation, RemoteError> {
        Ok(self.recommendation.clone())
    }
}

pub fn create_test_app() -> Router {
    create_test_app_with(Arc::new(FailingRemote::new()))
}

pub fn create_test_app_with(remote: Arc<dyn RemoteRecommender>) -> Router {
    let provider = Arc::new(RecommendationProvider::new(remote));
    adaptive_engine::app_with_state(AppState::new(provider))
}
