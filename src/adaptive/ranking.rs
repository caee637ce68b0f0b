use std::collections::HashMap;

use crate::adaptive::types::{
    Activity, ActivityRecommendation, AdaptiveRecommendation, DifficultyLevel, RankedActivity,
};

fn lookup_key(category: &str, difficulty: DifficultyLevel) -> String {
    format!("{category}-{}", difficulty.as_str())
}

/// Annotate and reorder activities by adaptive weight.
///
/// The input is left untouched. Without a recommendation the copies carry no
/// annotations and keep their order. Equal weights keep their input order.
pub fn apply(
    activities: &[Activity],
    recommendation: Option<&AdaptiveRecommendation>,
) -> Vec<RankedActivity> {
    let Some(recommendation) = recommendation else {
        return activities.iter().cloned().map(RankedActivity::from).collect();
    };

    let lookup: HashMap<String, &ActivityRecommendation> = recommendation
        .recommendations
        .iter()
        .map(|rec| (lookup_key(&rec.category, rec.difficulty), rec))
        .collect();

    let mut ranked: Vec<RankedActivity> = activities
        .iter()
        .map(|activity| {
            let matched = lookup
                .get(&lookup_key(&activity.category, activity.difficulty))
                .or_else(|| {
                    lookup.get(&lookup_key(&activity.category, recommendation.next_difficulty))
                });

            let (weight, suggested) = match matched {
                Some(rec) => (rec.weight, rec.difficulty),
                None => (0.0, activity.difficulty),
            };

            RankedActivity {
                activity: activity.clone(),
                suggested_difficulty: Some(suggested),
                adaptive_weight: Some(weight),
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        let wa = a.adaptive_weight.unwrap_or(0.0);
        let wb = b.adaptive_weight.unwrap_or(0.0);
        wb.total_cmp(&wa)
    });

    ranked
}
