use serde::{Deserialize, Serialize};

use crate::adaptive::types::{DifficultyLevel, EmotionalState};

const ESCALATE_SUCCESS_RATE: f64 = 0.85;
const ESCALATE_MAX_ATTEMPTS: u32 = 2;
const DEESCALATE_SUCCESS_RATE: f64 = 0.55;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentThresholds {
    /// Success rate that must be exceeded to move up a level.
    pub escalate_success_rate: f64,
    pub escalate_max_attempts: u32,
    /// Success rate below which the level drops.
    pub deescalate_success_rate: f64,
}

impl Default for AdjustmentThresholds {
    fn default() -> Self {
        Self {
            escalate_success_rate: ESCALATE_SUCCESS_RATE,
            escalate_max_attempts: ESCALATE_MAX_ATTEMPTS,
            deescalate_success_rate: DEESCALATE_SUCCESS_RATE,
        }
    }
}

impl AdjustmentThresholds {
    pub fn from_env() -> Self {
        let mut thresholds = Self::default();

        if let Some(val) = env_f64("ADAPTIVE_ESCALATE_SUCCESS") {
            thresholds.escalate_success_rate = val;
        }
        if let Some(val) = std::env::var("ADAPTIVE_ESCALATE_MAX_ATTEMPTS")
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
        {
            thresholds.escalate_max_attempts = val;
        }
        if let Some(val) = env_f64("ADAPTIVE_DEESCALATE_SUCCESS") {
            thresholds.deescalate_success_rate = val;
        }

        thresholds
    }

    /// Decide the next level from a single signal.
    ///
    /// Without both a success rate and an attempt count the current level is
    /// kept. Frustration blocks escalation and on its own forces a step down,
    /// whatever the success rate.
    pub fn adjust(
        &self,
        current: DifficultyLevel,
        success_rate: Option<f64>,
        attempts_count: Option<u32>,
        emotional_state: Option<&EmotionalState>,
    ) -> DifficultyLevel {
        let (Some(success_rate), Some(attempts_count)) = (success_rate, attempts_count) else {
            return current;
        };
        let frustrated = emotional_state.is_some_and(EmotionalState::is_frustrated);

        if success_rate > self.escalate_success_rate
            && attempts_count <= self.escalate_max_attempts
            && !frustrated
        {
            return current.harder();
        }

        if success_rate < self.deescalate_success_rate || frustrated {
            return current.easier();
        }

        current
    }
}

pub fn adjust(
    current: DifficultyLevel,
    success_rate: Option<f64>,
    attempts_count: Option<u32>,
    emotional_state: Option<&EmotionalState>,
) -> DifficultyLevel {
    AdjustmentThresholds::default().adjust(current, success_rate, attempts_count, emotional_state)
}

fn env_f64(key: &str) -> Option<f64> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && (0.0..=1.0).contains(v))
}
