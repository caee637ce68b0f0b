use crate::adaptive::difficulty::AdjustmentThresholds;
use crate::adaptive::types::{
    ActivityRecommendation, AdaptiveContext, AdaptiveRecommendation, DifficultyLevel,
};

const PRIMARY_WEIGHT: f64 = 0.6;
const STABILITY_WEIGHT: f64 = 0.2;
const SAFETY_NET_WEIGHT: f64 = 0.2;

/// Local heuristic recommendation using the default thresholds.
pub fn build(context: &AdaptiveContext) -> AdaptiveRecommendation {
    build_with(context, &AdjustmentThresholds::default())
}

/// Produce the three-entry recommendation for a context.
///
/// Only the head of `recent_performance` is consulted. Entries come out in a
/// fixed order (trajectory, stability, safety net) and are not sorted here.
pub fn build_with(
    context: &AdaptiveContext,
    thresholds: &AdjustmentThresholds,
) -> AdaptiveRecommendation {
    let latest = context.latest();
    let success_rate = latest.and_then(|s| s.success_rate);
    let attempts_count = latest.and_then(|s| s.attempts_count);
    let emotional_state = latest.and_then(|s| s.emotional_state.as_ref());

    let current = context.current_difficulty;
    let next = thresholds.adjust(current, success_rate, attempts_count, emotional_state);

    let recommendations = vec![
        ActivityRecommendation {
            category: context.target_category.clone(),
            difficulty: next,
            weight: PRIMARY_WEIGHT,
            reason: trajectory_reason(current, next),
            suggested_activity_id: context.current_activity_id.clone(),
        },
        ActivityRecommendation {
            category: context.target_category.clone(),
            difficulty: current,
            weight: STABILITY_WEIGHT,
            reason: format!("Stability option: stay at {current}"),
            suggested_activity_id: None,
        },
        ActivityRecommendation {
            category: context.target_category.clone(),
            difficulty: DifficultyLevel::Beginner,
            weight: SAFETY_NET_WEIGHT,
            reason: "Low cognitive load option".to_string(),
            suggested_activity_id: None,
        },
    ];

    let mut rationale = vec![
        format!(
            "success={} with {} attempts",
            success_rate.map_or_else(|| "N/A".to_string(), |v| v.to_string()),
            attempts_count.unwrap_or(0)
        ),
        format!("next difficulty: {next}"),
    ];
    if let Some(state) = emotional_state {
        rationale.push(format!("emotional state: {}", state.as_str()));
    }

    let escalation_warnings = latest.filter(|s| s.is_frustrated()).map(|_| {
        vec![format!(
            "Frustration reported for child {}; consider a break or adult support",
            context.child_id
        )]
    });

    AdaptiveRecommendation {
        child_id: context.child_id.clone(),
        next_difficulty: next,
        recommendations,
        rationale,
        escalation_warnings,
    }
}

fn trajectory_reason(current: DifficultyLevel, next: DifficultyLevel) -> String {
    match next.cmp(&current) {
        std::cmp::Ordering::Greater => format!("Ready to move up to {next}"),
        std::cmp::Ordering::Less => format!("Ease back to {next}"),
        std::cmp::Ordering::Equal => format!("Keep practicing at {next}"),
    }
}
