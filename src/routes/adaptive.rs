use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::adaptive::builder::build_with;
use crate::adaptive::ranking;
use crate::adaptive::types::{Activity, AdaptiveContext, AdaptiveRecommendation};
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recommendations", post(recommend))
        .route("/refresh", post(refresh))
        .route("/state", get(current_state))
        .route("/rank", post(rank))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    #[serde(default)]
    context: Option<AdaptiveContext>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RankRequest {
    #[serde(default)]
    activities: Vec<Activity>,
    #[serde(default)]
    recommendation: Option<AdaptiveRecommendation>,
}

async fn recommend(
    State(state): State<AppState>,
    payload: Result<Json<AdaptiveContext>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(context) = payload?;
    validate_context(&context)?;

    let recommendation = build_with(&context, &state.thresholds());
    tracing::debug!(
        child_id = %context.child_id,
        current = %context.current_difficulty,
        next = %recommendation.next_difficulty,
        "local recommendation"
    );
    Ok(ok(recommendation))
}

async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload?;
    if let Some(context) = request.context.as_ref() {
        validate_context(context)?;
    }

    let provider = state.provider();
    let result = provider.on_context_change(request.context.as_ref()).await;
    Ok(ok(result))
}

async fn current_state(State(state): State<AppState>) -> Response {
    ok(state.provider().state())
}

async fn rank(payload: Result<Json<RankRequest>, JsonRejection>) -> Result<Response, AppError> {
    let Json(request) = payload?;
    Ok(ok(ranking::apply(
        &request.activities,
        request.recommendation.as_ref(),
    )))
}

fn validate_context(context: &AdaptiveContext) -> Result<(), AppError> {
    if context.child_id.trim().is_empty() {
        return Err(AppError::validation("childId must not be empty"));
    }
    if context.target_category.trim().is_empty() {
        return Err(AppError::validation("targetCategory must not be empty"));
    }

    let out_of_range = context
        .recent_performance
        .iter()
        .filter_map(|signal| signal.success_rate)
        .any(|rate| !rate.is_finite() || !(0.0..=1.0).contains(&rate));
    if out_of_range {
        return Err(AppError::validation("successRate must be between 0 and 1"));
    }

    Ok(())
}
