use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hard cap on stored mood-change records.
pub const MOOD_HISTORY_CAP: usize = 10;
/// Hard cap on stored triggers.
pub const MOOD_TRIGGER_CAP: usize = 5;

/// One recorded mood change, newest first in `MoodState::history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodChange {
    pub timestamp: DateTime<Utc>,
    pub previous_mood: String,
    pub trigger: String,
    pub impact: i32,
    pub interaction_type: String,
}

/// A character's time-varying mood, kept outside the character template.
///
/// Invariant: `intensity` stays in [1, 10]; `current_mood` is always a
/// label from the closed variant vocabulary derived from the base mood
/// family, the intensity tier, and the sign of the last impact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodState {
    pub character_id: String,
    pub base_mood: String,
    pub current_mood: String,
    /// 1–10, clamped.
    pub intensity: i32,
    /// Newest first, at most [`MOOD_TRIGGER_CAP`] entries.
    pub triggers: Vec<String>,
    /// Newest first, at most [`MOOD_HISTORY_CAP`] entries.
    pub history: Vec<MoodChange>,
}

impl MoodState {
    /// Fresh state from a character's base mood, at middling intensity.
    pub fn new(character_id: impl Into<String>, base_mood: impl Into<String>) -> Self {
        let base_mood = base_mood.into();
        Self {
            character_id: character_id.into(),
            current_mood: base_mood.clone(),
            base_mood,
            intensity: 5,
            triggers: Vec::new(),
            history: Vec::new(),
        }
    }
}
