use serde::{Deserialize, Serialize};

/// Coarse story-structure stage inferred from conversation length and tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NarrativePhase {
    #[default]
    Introduction,
    Discovery,
    RisingAction,
    Conflict,
    Planning,
    Climax,
    Resolution,
}

impl NarrativePhase {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Introduction => "phase:introduction",
            Self::Discovery => "phase:discovery",
            Self::RisingAction => "phase:rising_action",
            Self::Conflict => "phase:conflict",
            Self::Planning => "phase:planning",
            Self::Climax => "phase:climax",
            Self::Resolution => "phase:resolution",
        }
    }

    /// True during the confrontational stretch of the arc.
    pub fn is_confrontational(&self) -> bool {
        matches!(self, Self::Conflict | Self::Climax)
    }
}

/// How much dramatic pressure the scene carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tension {
    Low,
    #[default]
    Medium,
    High,
    VeryHigh,
}

impl Tension {
    pub fn is_high(&self) -> bool {
        matches!(self, Self::High | Self::VeryHigh)
    }
}

/// Coarse sentiment of a message or message window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

/// Dominant emotion of a message window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmotionalTone {
    Angry,
    Sad,
    Happy,
    Afraid,
    Surprised,
    Tense,
    Curious,
    Determined,
    #[default]
    Neutral,
}

impl EmotionalTone {
    /// Tones that push the arc toward confrontation.
    pub fn is_escalating(&self) -> bool {
        matches!(self, Self::Angry | Self::Tense)
    }

    /// Tones that argue against escalation.
    pub fn is_positive(&self) -> bool {
        matches!(self, Self::Happy | Self::Surprised)
    }
}

/// The story arc the director maintains across the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeContext {
    pub theme: String,
    pub current_phase: NarrativePhase,
    pub current_tension: Tension,
    pub current_goal: String,
    /// Free text describing the active scene.
    pub current_context: String,
}

impl NarrativeContext {
    pub fn new(theme: impl Into<String>) -> Self {
        Self {
            theme: theme.into(),
            current_phase: NarrativePhase::Introduction,
            current_tension: Tension::Medium,
            current_goal: String::new(),
            current_context: String::new(),
        }
    }
}

impl Default for NarrativeContext {
    fn default() -> Self {
        Self::new("adventure")
    }
}
