/// Mood tracking — per-character mood label and intensity, derived
/// from the base mood plus recent emotional impact.
///
/// The current label always comes from a closed variant vocabulary
/// keyed by (base-mood keyword family, intensity tier, impact sign).
use chrono::Utc;
use rand::Rng;
use rustc_hash::FxHashMap;

use crate::schema::mood::{MoodChange, MoodState, MOOD_HISTORY_CAP, MOOD_TRIGGER_CAP};

/// Base-mood keyword families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoodFamily {
    Happy,
    Sad,
    Angry,
    Calm,
    Curious,
    Anxious,
    Confident,
    Other,
}

fn classify_base_mood(base_mood: &str) -> MoodFamily {
    let lower = base_mood.to_lowercase();
    let contains_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    if contains_any(&["happy", "joy", "cheer", "delight"]) {
        MoodFamily::Happy
    } else if contains_any(&["sad", "melanch", "gloom", "somber"]) {
        MoodFamily::Sad
    } else if contains_any(&["angry", "grump", "irrit", "brood"]) {
        MoodFamily::Angry
    } else if contains_any(&["calm", "serene", "peace", "tranquil"]) {
        MoodFamily::Calm
    } else if contains_any(&["curious", "inquis", "wonder"]) {
        MoodFamily::Curious
    } else if contains_any(&["anxious", "nerv", "fear", "wary"]) {
        MoodFamily::Anxious
    } else if contains_any(&["confident", "bold", "brave", "proud"]) {
        MoodFamily::Confident
    } else {
        MoodFamily::Other
    }
}

/// (high tier ≥ 8, medium tier ≥ 5) positive variants per family.
fn positive_variant(family: MoodFamily, intensity: i32) -> &'static str {
    let (high, medium) = match family {
        MoodFamily::Happy => ("Ecstatic", "Delighted"),
        MoodFamily::Sad => ("Comforted", "Consoled"),
        MoodFamily::Angry => ("Mollified", "Calmer"),
        MoodFamily::Calm => ("Serene", "Content"),
        MoodFamily::Curious => ("Fascinated", "Intrigued"),
        MoodFamily::Anxious => ("Reassured", "Steadier"),
        MoodFamily::Confident => ("Exultant", "Emboldened"),
        MoodFamily::Other => ("Elated", "Pleased"),
    };
    if intensity >= 8 {
        high
    } else if intensity >= 5 {
        medium
    } else {
        "Neutral"
    }
}

/// Symmetric negative-variant table. The Other family peaks at
/// "Intense", the label the speaker selector keys on.
fn negative_variant(family: MoodFamily, intensity: i32) -> &'static str {
    let (high, medium) = match family {
        MoodFamily::Happy => ("Crushed", "Disheartened"),
        MoodFamily::Sad => ("Despairing", "Mournful"),
        MoodFamily::Angry => ("Furious", "Seething"),
        MoodFamily::Calm => ("Shaken", "Unsettled"),
        MoodFamily::Curious => ("Suspicious", "Doubtful"),
        MoodFamily::Anxious => ("Panicked", "Fearful"),
        MoodFamily::Confident => ("Humbled", "Hesitant"),
        MoodFamily::Other => ("Intense", "Troubled"),
    };
    if intensity >= 8 {
        high
    } else if intensity >= 5 {
        medium
    } else {
        "Neutral"
    }
}

/// Session-scoped store, created lazily per character.
#[derive(Debug, Clone, Default)]
pub struct MoodTracker {
    states: FxHashMap<String, MoodState>,
}

impl MoodTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create-on-read from the character's base mood at intensity 5.
    pub fn get(&mut self, character_id: &str, base_mood: &str) -> &MoodState {
        self.states
            .entry(character_id.to_string())
            .or_insert_with(|| MoodState::new(character_id, base_mood))
    }

    /// Peek without creating.
    pub fn peek(&self, character_id: &str) -> Option<&MoodState> {
        self.states.get(character_id)
    }

    /// Apply an update and return the new state.
    pub fn update(
        &mut self,
        character_id: &str,
        base_mood: &str,
        trigger: &str,
        emotional_impact: i32,
        interaction_type: &str,
    ) -> MoodState {
        let current = self
            .states
            .entry(character_id.to_string())
            .or_insert_with(|| MoodState::new(character_id, base_mood));
        let updated = update_mood(current, trigger, emotional_impact, interaction_type);
        *current = updated.clone();
        updated
    }

    /// Current mood label, when the character has state.
    pub fn current_label(&self, character_id: &str) -> Option<&str> {
        self.states.get(character_id).map(|s| s.current_mood.as_str())
    }
}

/// Pure update: clamp intensity, derive the new label from the variant
/// tables, push ring-buffer records.
pub fn update_mood(
    state: &MoodState,
    trigger: &str,
    emotional_impact: i32,
    interaction_type: &str,
) -> MoodState {
    let intensity = (state.intensity + emotional_impact).clamp(1, 10);
    let family = classify_base_mood(&state.base_mood);

    let current_mood = if intensity <= 3 {
        // Low intensity collapses to Neutral regardless of sign.
        "Neutral".to_string()
    } else if emotional_impact >= 2 {
        positive_variant(family, intensity).to_string()
    } else if emotional_impact <= -2 {
        negative_variant(family, intensity).to_string()
    } else {
        state.current_mood.clone()
    };

    let mut history = Vec::with_capacity(state.history.len() + 1);
    history.push(MoodChange {
        timestamp: Utc::now(),
        previous_mood: state.current_mood.clone(),
        trigger: trigger.to_string(),
        impact: emotional_impact,
        interaction_type: interaction_type.to_string(),
    });
    history.extend(state.history.iter().cloned());
    history.truncate(MOOD_HISTORY_CAP);

    let mut triggers = Vec::with_capacity(state.triggers.len() + 1);
    triggers.push(trigger.to_string());
    triggers.extend(state.triggers.iter().cloned());
    triggers.truncate(MOOD_TRIGGER_CAP);

    MoodState {
        character_id: state.character_id.clone(),
        base_mood: state.base_mood.clone(),
        current_mood,
        intensity,
        triggers,
        history,
    }
}

/// Whether a mood change deserves a system message.
///
/// Dramatic swings are always surfaced; trivial churn mostly is not.
/// Never announced when the label did not change.
pub fn should_announce<R: Rng>(previous: &MoodState, updated: &MoodState, rng: &mut R) -> bool {
    if previous.current_mood == updated.current_mood {
        return false;
    }
    if updated.intensity >= 8 {
        true
    } else if updated.intensity >= 5 {
        rng.gen_bool(0.5)
    } else {
        rng.gen_bool(0.2)
    }
}

/// True when the character's mood should bias speaker selection.
pub fn is_intense(state: &MoodState) -> bool {
    state.current_mood == "Intense" || state.intensity >= 8
}
