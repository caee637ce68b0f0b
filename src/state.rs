use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::adaptive::difficulty::AdjustmentThresholds;
use crate::adaptive::provider::RecommendationProvider;
use crate::adaptive::remote::{HttpRecommender, RemoteRecommender};
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    provider: Arc<RecommendationProvider>,
}

impl AppState {
    pub fn new(provider: Arc<RecommendationProvider>) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            provider,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let remote: Arc<dyn RemoteRecommender> = Arc::new(HttpRecommender::new(config.remote.clone()));
        if config.remote.endpoint.is_none() {
            tracing::warn!("ADAPTIVE_REMOTE_URL not set, every refresh will use the local fallback");
        }
        Self::new(Arc::new(Self::create_provider(remote, config)))
    }

    pub fn create_provider(
        remote: Arc<dyn RemoteRecommender>,
        config: &Config,
    ) -> RecommendationProvider {
        RecommendationProvider::new(remote)
            .with_thresholds(config.thresholds)
            .with_timeout(config.remote.timeout)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn provider(&self) -> Arc<RecommendationProvider> {
        Arc::clone(&self.provider)
    }

    pub fn thresholds(&self) -> AdjustmentThresholds {
        *self.provider.thresholds()
    }
}
