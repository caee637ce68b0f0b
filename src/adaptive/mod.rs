pub mod builder;
pub mod difficulty;
pub mod provider;
pub mod ranking;
pub mod remote;
pub mod types;

pub use builder::{build, build_with};
pub use difficulty::{adjust, AdjustmentThresholds};
pub use provider::{ProviderOutcome, RecommendationProvider, RecommendationState};
pub use remote::{HttpRecommender, RemoteError, RemoteRecommender};
#[allow(unused_imports)]
pub use types::*;
