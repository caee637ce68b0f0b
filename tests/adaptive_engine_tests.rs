use std::sync::Arc;
use std::time::Duration;

use adaptive_engine::adaptive::provider::{FALLBACK_ADVISORY, NO_CONTEXT_ERROR};
use adaptive_engine::adaptive::remote::{RemoteError, RemoteRecommender};
use adaptive_engine::adaptive::types::{
    AdaptiveContext, AdaptiveRecommendation, DifficultyLevel, EmotionalState, PerformanceSignal,
    RecommendationSource,
};
use adaptive_engine::adaptive::{adjust, build, ranking, RecommendationProvider};
use async_trait::async_trait;
use proptest::prelude::*;
use tokio::sync::Notify;

mod common;

use common::{FailingRemote, FixedRemote};

fn context(current: DifficultyLevel, signal: Option<PerformanceSignal>) -> AdaptiveContext {
    let ctx = AdaptiveContext::new("child-42", "counting", current);
    match signal {
        Some(signal) => ctx.with_signal(signal),
        None => ctx,
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn scenario_fast_mastery_moves_up() {
    let ctx = context(
        DifficultyLevel::Beginner,
        Some(PerformanceSignal::new(0.9, 1).with_emotion("happy")),
    );
    let rec = build(&ctx);

    assert_eq!(rec.next_difficulty, DifficultyLevel::Intermediate);
    assert!(rec.escalation_warnings.is_none());
}

#[test]
fn scenario_frustration_moves_down_despite_high_success() {
    let ctx = context(
        DifficultyLevel::Advanced,
        Some(PerformanceSignal::new(0.95, 1).with_emotion("frustrated")),
    );
    let rec = build(&ctx);

    assert_eq!(rec.next_difficulty, DifficultyLevel::Intermediate);
    assert_eq!(rec.escalation_warnings.map(|w| w.len()), Some(1));
}

#[test]
fn scenario_low_success_moves_down() {
    let ctx = context(
        DifficultyLevel::Intermediate,
        Some(PerformanceSignal::new(0.4, 4)),
    );
    assert_eq!(build(&ctx).next_difficulty, DifficultyLevel::Beginner);
}

#[tokio::test]
async fn scenario_remote_failure_uses_local_fallback() {
    let remote = Arc::new(FailingRemote::new());
    let provider = RecommendationProvider::new(remote.clone());
    let ctx = context(
        DifficultyLevel::Intermediate,
        Some(PerformanceSignal::new(0.7, 3)),
    );

    let state = provider.refresh(Some(&ctx)).await;

    assert_eq!(remote.calls(), 1);
    assert!(!state.loading);
    assert_eq!(state.recommendation, Some(build(&ctx)));
    assert_eq!(state.error.as_deref(), Some(FALLBACK_ADVISORY));
    assert_eq!(state.source, Some(RecommendationSource::Fallback));
    assert!(state.is_degraded());
}

#[tokio::test]
async fn scenario_missing_context_is_a_hard_error() {
    let remote = Arc::new(FailingRemote::new());
    let provider = RecommendationProvider::new(remote.clone());

    let state = provider.refresh(None).await;

    assert_eq!(remote.calls(), 0);
    assert!(!state.loading);
    assert!(state.recommendation.is_none());
    assert_eq!(state.error.as_deref(), Some(NO_CONTEXT_ERROR));
}

// ============================================================================
// Provider behavior
// ============================================================================

#[tokio::test]
async fn remote_result_is_trusted_as_is() {
    let ctx = context(DifficultyLevel::Beginner, Some(PerformanceSignal::new(0.2, 8)));
    let mut remote_rec = build(&ctx);
    remote_rec.next_difficulty = DifficultyLevel::Advanced;
    remote_rec.rationale = vec!["model score 0.93".to_string()];

    let provider = RecommendationProvider::new(Arc::new(FixedRemote {
        recommendation: remote_rec.clone(),
    }));
    let state = provider.refresh(Some(&ctx)).await;

    assert_eq!(state.recommendation, Some(remote_rec));
    assert_eq!(state.error, None);
    assert_eq!(state.source, Some(RecommendationSource::Remote));
    assert_eq!(provider.state(), state);
}

#[tokio::test]
async fn success_after_fallback_clears_advisory() {
    let ctx = context(DifficultyLevel::Beginner, Some(PerformanceSignal::new(0.9, 1)));
    let failing = RecommendationProvider::new(Arc::new(FailingRemote::new()));
    let degraded = failing.refresh(Some(&ctx)).await;
    assert!(degraded.error.is_some());

    let healthy = RecommendationProvider::new(Arc::new(FixedRemote {
        recommendation: build(&ctx),
    }));
    let state = healthy.refresh(Some(&ctx)).await;
    assert_eq!(state.error, None);
    assert!(!state.is_degraded());
}

struct HangingRemote;

#[async_trait]
impl RemoteRecommender for HangingRemote {
    async fn recommend(
        &self,
        _context: &AdaptiveContext,
    ) -> Result<AdaptiveRecommendation, RemoteError> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn slow_remote_times_out_into_fallback() {
    let provider = RecommendationProvider::new(Arc::new(HangingRemote))
        .with_timeout(Duration::from_millis(20));
    let ctx = context(DifficultyLevel::Advanced, Some(PerformanceSignal::new(0.3, 6)));

    let state = provider.refresh(Some(&ctx)).await;

    assert!(!state.loading);
    assert_eq!(state.recommendation.map(|r| r.next_difficulty), Some(DifficultyLevel::Intermediate));
    assert_eq!(state.error.as_deref(), Some(FALLBACK_ADVISORY));
}

#[tokio::test]
async fn unchanged_context_does_not_refresh_again() {
    let remote = Arc::new(FailingRemote::new());
    let provider = RecommendationProvider::new(remote.clone());
    let ctx = context(DifficultyLevel::Beginner, Some(PerformanceSignal::new(0.6, 3)));

    provider.on_context_change(Some(&ctx)).await;
    provider.on_context_change(Some(&ctx.clone())).await;
    assert_eq!(remote.calls(), 1);

    let changed = ctx.clone().with_signal(PerformanceSignal::new(0.1, 9));
    provider.on_context_change(Some(&changed)).await;
    assert_eq!(remote.calls(), 2);
}

/// Blocks requests for the "slow" child until released.
struct GatedRemote {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl RemoteRecommender for GatedRemote {
    async fn recommend(
        &self,
        context: &AdaptiveContext,
    ) -> Result<AdaptiveRecommendation, RemoteError> {
        if context.child_id == "slow" {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(build(context))
    }
}

#[tokio::test]
async fn stale_response_does_not_overwrite_newer_context() {
    let remote = Arc::new(GatedRemote {
        entered: Notify::new(),
        release: Notify::new(),
    });
    let provider = Arc::new(RecommendationProvider::new(remote.clone()));

    let slow_ctx = AdaptiveContext::new("slow", "letters", DifficultyLevel::Beginner);
    let fast_ctx = AdaptiveContext::new("fast", "letters", DifficultyLevel::Advanced);

    let slow = {
        let provider = Arc::clone(&provider);
        let ctx = slow_ctx.clone();
        tokio::spawn(async move { provider.refresh(Some(&ctx)).await })
    };
    remote.entered.notified().await;

    let fresh = provider.refresh(Some(&fast_ctx)).await;
    assert_eq!(fresh.recommendation.as_ref().map(|r| r.child_id.as_str()), Some("fast"));

    remote.release.notify_one();
    let stale = slow.await.expect("slow refresh task panicked");

    assert_eq!(stale, fresh);
    let committed = provider.state();
    assert!(!committed.loading);
    assert_eq!(committed.recommendation.map(|r| r.child_id), Some("fast".to_string()));
}

// ============================================================================
// Ranking
// ============================================================================

#[test]
fn ranking_follows_provider_recommendation() {
    use adaptive_engine::adaptive::types::Activity;

    let ctx = context(
        DifficultyLevel::Intermediate,
        Some(PerformanceSignal::new(0.3, 5)),
    );
    let rec = build(&ctx);
    let activities = vec![
        Activity::new("mid", "counting", DifficultyLevel::Intermediate),
        Activity::new("easy", "counting", DifficultyLevel::Beginner),
        Activity::new("other", "shapes", DifficultyLevel::Beginner),
    ];

    let ranked = ranking::apply(&activities, Some(&rec));
    let ids: Vec<_> = ranked.iter().map(|r| r.activity.id.as_str()).collect();

    // BEGINNER is both the trajectory and the safety net; the later 0.2 entry wins.
    assert_eq!(ids, vec!["mid", "easy", "other"]);
    assert_eq!(ranked[0].adaptive_weight, Some(0.2));
    assert_eq!(ranked[1].adaptive_weight, Some(0.2));
    assert_eq!(ranked[2].adaptive_weight, Some(0.0));
}

// ============================================================================
// Properties
// ============================================================================

fn arb_level() -> impl Strategy<Value = DifficultyLevel> {
    prop_oneof![
        Just(DifficultyLevel::Beginner),
        Just(DifficultyLevel::Intermediate),
        Just(DifficultyLevel::Advanced),
    ]
}

fn arb_calm_emotion() -> impl Strategy<Value = Option<EmotionalState>> {
    prop_oneof![
        Just(None),
        Just(Some(EmotionalState::Happy)),
        Just(Some(EmotionalState::Neutral)),
        Just(Some(EmotionalState::Anxious)),
    ]
}

proptest! {
    #[test]
    fn prop_empty_history_keeps_level(level in arb_level()) {
        let rec = build(&AdaptiveContext::new("c", "cat", level));
        prop_assert_eq!(rec.next_difficulty, level);
    }

    #[test]
    fn prop_fast_mastery_steps_up(
        level in arb_level(),
        rate in 0.851f64..=1.0,
        attempts in 0u32..=2,
        emotion in arb_calm_emotion(),
    ) {
        prop_assert_eq!(adjust(level, Some(rate), Some(attempts), emotion.as_ref()), level.harder());
    }

    #[test]
    fn prop_frustration_steps_down(
        level in arb_level(),
        rate in 0.0f64..=1.0,
        attempts in 0u32..20,
    ) {
        let frustrated = EmotionalState::Frustrated;
        prop_assert_eq!(adjust(level, Some(rate), Some(attempts), Some(&frustrated)), level.easier());
    }

    #[test]
    fn prop_plateau_holds(
        level in arb_level(),
        rate in 0.55f64..=0.85,
        attempts in 0u32..20,
        emotion in arb_calm_emotion(),
    ) {
        prop_assert_eq!(adjust(level, Some(rate), Some(attempts), emotion.as_ref()), level);
    }

    #[test]
    fn prop_slow_mastery_holds(
        level in arb_level(),
        rate in 0.851f64..=1.0,
        attempts in 3u32..50,
    ) {
        prop_assert_eq!(adjust(level, Some(rate), Some(attempts), None), level);
    }

    #[test]
    fn prop_builder_is_pure(
        level in arb_level(),
        rate in proptest::option::of(0.0f64..=1.0),
        attempts in proptest::option::of(0u32..10),
    ) {
        let signal = PerformanceSignal { success_rate: rate, attempts_count: attempts, ..Default::default() };
        let ctx = AdaptiveContext::new("c", "cat", level).with_signal(signal);
        prop_assert_eq!(build(&ctx), build(&ctx));
        prop_assert_eq!(build(&ctx).recommendations.len(), 3);
    }
}
