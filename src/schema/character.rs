use serde::{Deserialize, Serialize};

/// Genre archetype of a character. Drives template-pool selection in
/// scene generation and response synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CharacterType {
    Fantasy,
    Scifi,
    Historical,
    #[default]
    Modern,
    Superhero,
    Adventure,
}

impl CharacterType {
    /// Returns the tag string for this type (e.g., "type:fantasy").
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Fantasy => "type:fantasy",
            Self::Scifi => "type:scifi",
            Self::Historical => "type:historical",
            Self::Modern => "type:modern",
            Self::Superhero => "type:superhero",
            Self::Adventure => "type:adventure",
        }
    }
}

/// The seven personality traits, each on a 1–10 scale.
///
/// Every trait defaults to 5 so partially specified characters never
/// need defaulting logic at the point of use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Personality {
    pub analytical: u8,
    pub emotional: u8,
    pub philosophical: u8,
    pub humor: u8,
    pub confidence: u8,
    pub creativity: u8,
    pub sociability: u8,
}

impl Default for Personality {
    fn default() -> Self {
        Self {
            analytical: 5,
            emotional: 5,
            philosophical: 5,
            humor: 5,
            confidence: 5,
            creativity: 5,
            sociability: 5,
        }
    }
}

/// An immutable character template. Time-varying state (mood,
/// relationships) lives outside this struct, keyed by `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    /// Unique within a session.
    pub name: String,
    #[serde(default)]
    pub character_type: CharacterType,
    /// Free-text base mood label, e.g. "Happy" or "Brooding".
    pub mood: String,
    #[serde(default)]
    pub personality: Personality,
    /// 1–10; weights speaker selection.
    #[serde(default = "default_talkativeness")]
    pub talkativeness: u8,
    /// 0.5–2.0 multiplier on simulated reply latency.
    #[serde(default = "default_thinking_speed")]
    pub thinking_speed: f32,
    #[serde(default)]
    pub voice_style: Option<String>,
    #[serde(default)]
    pub catchphrases: Vec<String>,
    #[serde(default)]
    pub opening_line: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

fn default_talkativeness() -> u8 {
    5
}

fn default_thinking_speed() -> f32 {
    1.0
}

impl Character {
    /// A character with every optional field at its neutral default.
    pub fn new(name: impl Into<String>, character_type: CharacterType) -> Self {
        Self {
            name: name.into(),
            character_type,
            mood: "Neutral".to_string(),
            personality: Personality::default(),
            talkativeness: default_talkativeness(),
            thinking_speed: default_thinking_speed(),
            voice_style: None,
            catchphrases: Vec::new(),
            opening_line: None,
            avatar: None,
        }
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = mood.into();
        self
    }

    pub fn with_personality(mut self, personality: Personality) -> Self {
        self.personality = personality;
        self
    }

    pub fn with_talkativeness(mut self, talkativeness: u8) -> Self {
        self.talkativeness = talkativeness.clamp(1, 10);
        self
    }

    pub fn with_thinking_speed(mut self, speed: f32) -> Self {
        self.thinking_speed = speed.clamp(0.5, 2.0);
        self
    }

    pub fn with_catchphrases(mut self, phrases: &[&str]) -> Self {
        self.catchphrases = phrases.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_voice_style(mut self, style: impl Into<String>) -> Self {
        self.voice_style = Some(style.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_character_has_neutral_defaults() {
        let c = Character::new("Elara", CharacterType::Fantasy);
        assert_eq!(c.talkativeness, 5);
        assert_eq!(c.thinking_speed, 1.0);
        assert_eq!(c.personality.analytical, 5);
        assert!(c.catchphrases.is_empty());
        assert!(c.voice_style.is_none());
    }

    #[test]
    fn builder_clamps_ranges() {
        let c = Character::new("Zed", CharacterType::Scifi)
            .with_talkativeness(14)
            .with_thinking_speed(3.0);
        assert_eq!(c.talkativeness, 10);
        assert_eq!(c.thinking_speed, 2.0);
    }

    #[test]
    fn type_tags() {
        assert_eq!(CharacterType::Fantasy.tag(), "type:fantasy");
        assert_eq!(CharacterType::Superhero.tag(), "type:superhero");
    }

    #[test]
    fn serde_defaults_fill_missing_fields() {
        // Partial RON record: only name, type, and mood given.
        let ron_src = r#"(name: "Mira", character_type: scifi, mood: "Curious")"#;
        let c: Character = ron::from_str(ron_src).unwrap();
        assert_eq!(c.talkativeness, 5);
        assert_eq!(c.personality.humor, 5);
        assert_eq!(c.thinking_speed, 1.0);
    }
}
