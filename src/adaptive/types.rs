use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DifficultyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "BEGINNER",
            Self::Intermediate => "INTERMEDIATE",
            Self::Advanced => "ADVANCED",
        }
    }

    /// One level up, saturating at `Advanced`.
    pub fn harder(&self) -> Self {
        match self {
            Self::Beginner => Self::Intermediate,
            _ => Self::Advanced,
        }
    }

    /// One level down, saturating at `Beginner`.
    pub fn easier(&self) -> Self {
        match self {
            Self::Advanced => Self::Intermediate,
            _ => Self::Beginner,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "BEGINNER" => Some(Self::Beginner),
            "INTERMEDIATE" => Some(Self::Intermediate),
            "ADVANCED" => Some(Self::Advanced),
            _ => None,
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emotional tag reported with a signal. Unknown tags are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EmotionalState {
    Happy,
    Neutral,
    Frustrated,
    Anxious,
    Other(String),
}

impl EmotionalState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Happy => "happy",
            Self::Neutral => "neutral",
            Self::Frustrated => "frustrated",
            Self::Anxious => "anxious",
            Self::Other(tag) => tag.as_str(),
        }
    }

    pub fn is_frustrated(&self) -> bool {
        matches!(self, Self::Frustrated)
    }
}

impl From<String> for EmotionalState {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "happy" => Self::Happy,
            "neutral" => Self::Neutral,
            "frustrated" => Self::Frustrated,
            "anxious" => Self::Anxious,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for EmotionalState {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<EmotionalState> for String {
    fn from(value: EmotionalState) -> Self {
        match value {
            EmotionalState::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportLevel {
    None,
    Minimal,
    Moderate,
    Full,
}

/// One observed attempt window. A missing rate or count means there is not
/// enough data to move the difficulty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSignal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_time_per_question: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotional_state: Option<EmotionalState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_level: Option<SupportLevel>,
}

impl PerformanceSignal {
    pub fn new(success_rate: f64, attempts_count: u32) -> Self {
        Self {
            success_rate: Some(success_rate),
            attempts_count: Some(attempts_count),
            ..Default::default()
        }
    }

    pub fn with_emotion(mut self, state: impl Into<EmotionalState>) -> Self {
        self.emotional_state = Some(state.into());
        self
    }

    pub fn with_support(mut self, level: SupportLevel) -> Self {
        self.support_level = Some(level);
        self
    }

    pub fn is_frustrated(&self) -> bool {
        self.emotional_state
            .as_ref()
            .is_some_and(EmotionalState::is_frustrated)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveContext {
    pub child_id: String,
    pub target_category: String,
    pub current_difficulty: DifficultyLevel,
    /// Most recent first.
    #[serde(default)]
    pub recent_performance: Vec<PerformanceSignal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_activity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personalization: Option<HashMap<String, bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensory_preferences: Option<HashMap<String, String>>,
}

impl AdaptiveContext {
    pub fn new(
        child_id: impl Into<String>,
        target_category: impl Into<String>,
        current_difficulty: DifficultyLevel,
    ) -> Self {
        Self {
            child_id: child_id.into(),
            target_category: target_category.into(),
            current_difficulty,
            recent_performance: Vec::new(),
            current_activity_id: None,
            personalization: None,
            sensory_preferences: None,
        }
    }

    pub fn with_signal(mut self, signal: PerformanceSignal) -> Self {
        self.recent_performance.push(signal);
        self
    }

    pub fn with_activity(mut self, activity_id: impl Into<String>) -> Self {
        self.current_activity_id = Some(activity_id.into());
        self
    }

    pub fn latest(&self) -> Option<&PerformanceSignal> {
        self.recent_performance.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecommendation {
    pub category: String,
    pub difficulty: DifficultyLevel,
    /// Relative score in [0, 1]; a set of weights need not sum to one.
    pub weight: f64,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_activity_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveRecommendation {
    pub child_id: String,
    pub next_difficulty: DifficultyLevel,
    pub recommendations: Vec<ActivityRecommendation>,
    #[serde(default)]
    pub rationale: Vec<String>,
    /// Present only when a risk signal was detected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_warnings: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub category: String,
    pub difficulty: DifficultyLevel,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Activity {
    pub fn new(
        id: impl Into<String>,
        category: impl Into<String>,
        difficulty: DifficultyLevel,
    ) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            difficulty,
            metadata: serde_json::Map::new(),
        }
    }
}

/// A catalog activity copied and annotated for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedActivity {
    #[serde(flatten)]
    pub activity: Activity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_difficulty: Option<DifficultyLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adaptive_weight: Option<f64>,
}

impl From<Activity> for RankedActivity {
    fn from(activity: Activity) -> Self {
        Self {
            activity,
            suggested_difficulty: None,
            adaptive_weight: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationSource {
    Remote,
    Fallback,
}
