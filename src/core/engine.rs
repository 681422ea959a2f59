/// The session facade: owns the message log, per-character state, and a
/// seeded RNG, and exposes the operations a chat front end drives.
///
/// Determinism contract: every stochastic operation draws from a fresh
/// `StdRng` seeded from the session seed plus a generation counter, so
/// two engines built with the same seed and driven by the same call
/// sequence produce identical transcripts.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::branches::BranchGenerator;
use crate::core::director::{
    self, infer_phase, should_propose_branch, should_trigger_environmental_event, ReplyGuidance,
};
use crate::core::moods::{should_announce, MoodTracker};
use crate::core::relationships::RelationshipTracker;
use crate::core::scene::SceneGenerator;
use crate::core::sentiment::{affinity_delta, analyze_sentiment, window_tone};
use crate::core::speaker::{next_speaker, responders};
use crate::core::synthesis::{ResponseRequest, Synthesizer};
use crate::core::topics::extract_from_window;
use crate::core::voice::{VoiceError, VoiceRegistry};
use crate::schema::character::{Character, CharacterType};
use crate::schema::message::{Message, ResponseLength, WritingInstructions};
use crate::schema::mood::MoodState;
use crate::schema::narrative::{NarrativeContext, NarrativePhase, Sentiment, Tension};
use crate::schema::relationship::Relationship;

/// Recent-history window used for topics, tone, and guidance.
const CONTEXT_WINDOW: usize = 8;

/// Probability a synthesized reply carries a woven scene fragment.
const SCENE_WEAVE_CHANCE: f64 = 0.25;

/// Result of a mood update, with the optional table-talk announcement.
#[derive(Debug, Clone)]
pub struct MoodUpdate {
    pub state: MoodState,
    pub announcement: Option<String>,
}

/// Builder for a [`RoleplayEngine`] session.
#[derive(Debug, Clone)]
pub struct RoleplayEngineBuilder {
    seed: u64,
    characters: Vec<Character>,
    scenario: CharacterType,
    theme: String,
    instructions: WritingInstructions,
    voices: VoiceRegistry,
}

impl Default for RoleplayEngineBuilder {
    fn default() -> Self {
        Self {
            seed: 0,
            characters: Vec::new(),
            scenario: CharacterType::default(),
            theme: "adventure".to_string(),
            instructions: WritingInstructions::default(),
            voices: VoiceRegistry::with_defaults(),
        }
    }
}

impl RoleplayEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_character(mut self, character: Character) -> Self {
        self.characters.push(character);
        self
    }

    pub fn with_characters(mut self, characters: impl IntoIterator<Item = Character>) -> Self {
        self.characters.extend(characters);
        self
    }

    pub fn with_scenario(mut self, scenario: CharacterType) -> Self {
        self.scenario = scenario;
        self
    }

    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }

    pub fn with_instructions(mut self, instructions: WritingInstructions) -> Self {
        self.instructions = instructions;
        self
    }

    pub fn with_voice_registry(mut self, voices: VoiceRegistry) -> Self {
        self.voices = voices;
        self
    }

    /// Layer a RON voice pack on top of whatever is registered.
    pub fn with_voices_ron(mut self, contents: &str) -> Result<Self, VoiceError> {
        self.voices.load_ron_str(contents)?;
        Ok(self)
    }

    pub fn build(self) -> RoleplayEngine {
        RoleplayEngine {
            seed: self.seed,
            generation_count: 0,
            characters: self.characters,
            scenario: self.scenario,
            narrative: NarrativeContext::new(self.theme),
            instructions: self.instructions,
            synthesizer: Synthesizer::new(self.voices),
            moods: MoodTracker::new(),
            relationships: RelationshipTracker::new(),
            branches: BranchGenerator::new(),
            scene: SceneGenerator::new(),
            history: Vec::new(),
            next_message_id: 1,
            messages_since_last_branch: 0,
            messages_since_last_event: 0,
            typing: None,
        }
    }
}

/// A running conversational session.
pub struct RoleplayEngine {
    seed: u64,
    generation_count: u64,
    characters: Vec<Character>,
    scenario: CharacterType,
    narrative: NarrativeContext,
    instructions: WritingInstructions,
    synthesizer: Synthesizer,
    moods: MoodTracker,
    relationships: RelationshipTracker,
    branches: BranchGenerator,
    scene: SceneGenerator,
    history: Vec<Message>,
    next_message_id: u64,
    messages_since_last_branch: u32,
    messages_since_last_event: u32,
    typing: Option<String>,
}

impl RoleplayEngine {
    pub fn builder() -> RoleplayEngineBuilder {
        RoleplayEngineBuilder::new()
    }

    fn next_rng(&mut self) -> StdRng {
        self.generation_count = self.generation_count.wrapping_add(1);
        StdRng::seed_from_u64(self.seed.wrapping_add(self.generation_count))
    }

    fn recent(&self) -> &[Message] {
        let start = self.history.len().saturating_sub(CONTEXT_WINDOW);
        &self.history[start..]
    }

    fn character(&self, name: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.name == name)
    }

    /// Next free message id. Callers building their own [`Message`]
    /// values should take ids from here.
    pub fn next_message_id(&mut self) -> u64 {
        let id = self.next_message_id;
        self.next_message_id += 1;
        id
    }

    /// Append a message and advance the session clocks.
    ///
    /// Narrative phase is re-inferred from the updated history, tension
    /// is derived from the phase, and pacing counters tick. Recording a
    /// message from the character marked as typing clears the
    /// indicator.
    pub fn record_message(&mut self, message: Message) {
        if self.next_message_id <= message.id {
            self.next_message_id = message.id + 1;
        }
        if self.typing.as_deref() == message.speaker.as_deref() {
            self.typing = None;
        }
        if message.is_environmental_event {
            self.messages_since_last_event = 0;
        } else if !message.system {
            self.messages_since_last_event += 1;
        }
        if !message.system {
            self.messages_since_last_branch += 1;
        }
        self.history.push(message);

        let mut rng = self.next_rng();
        self.narrative.current_phase = infer_phase(&self.history, &mut rng);
        self.narrative.current_tension = tension_for_phase(self.narrative.current_phase);
    }

    /// Record a line from the human participant.
    pub fn record_user(&mut self, text: impl Into<String>) -> u64 {
        let id = self.next_message_id();
        self.record_message(Message::user(id, "You", text));
        id
    }

    /// Record a line spoken by a character.
    pub fn record_character(&mut self, speaker: &str, text: impl Into<String>) -> u64 {
        let id = self.next_message_id();
        self.record_message(Message::character(id, speaker, text));
        id
    }

    /// Pick who speaks next and mark them as typing.
    pub fn select_next_speaker(&mut self) -> Option<String> {
        let mut rng = self.next_rng();
        let (last_text, last_speaker) = match self.history.last() {
            Some(m) => (m.message.clone(), m.speaker.clone()),
            None => (String::new(), None),
        };
        let chosen = next_speaker(
            &self.characters,
            &last_text,
            last_speaker.as_deref(),
            &self.moods,
            &mut rng,
        )
        .map(|c| c.name.clone());
        // At most one character shows as typing at a time.
        self.typing = chosen.clone();
        chosen
    }

    /// Pick up to `max_responders` characters, in responding order.
    pub fn select_responders(&mut self, max_responders: usize) -> Vec<String> {
        let mut rng = self.next_rng();
        let (last_text, last_speaker) = match self.history.last() {
            Some(m) => (m.message.clone(), m.speaker.clone()),
            None => (String::new(), None),
        };
        responders(
            &self.characters,
            &last_text,
            last_speaker.as_deref(),
            max_responders,
            &self.moods,
            &mut rng,
        )
        .into_iter()
        .map(|c| c.name.clone())
        .collect()
    }

    /// Compose the named character's reply to the latest stimulus.
    ///
    /// Unknown speakers degrade to an empty string with a warning; the
    /// typing indicator is cleared either way.
    pub fn synthesize_response(&mut self, speaker: &str) -> String {
        let mut rng = self.next_rng();
        let Some(character) = self.character(speaker).cloned() else {
            tracing::warn!(speaker, "response requested for unknown character");
            self.typing = None;
            return String::new();
        };

        let stimulus = self
            .history
            .iter()
            .rev()
            .find(|m| m.speaker.as_deref() != Some(speaker) && !m.system);
        let stimulus_text = stimulus.map(|m| m.message.clone()).unwrap_or_default();
        let stimulus_is_action = stimulus.map(|m| m.is_pure_action()).unwrap_or(false);
        let stimulus_speaker = stimulus.and_then(|m| m.speaker.clone());

        let scene_fragment = if rng.gen_bool(SCENE_WEAVE_CHANCE) {
            Some(
                self.scene
                    .next_fragment(&self.narrative, Some(&character), false, &mut rng),
            )
        } else {
            None
        };

        let relationship = stimulus_speaker
            .as_deref()
            .and_then(|other| self.relationships.peek(speaker, other))
            .cloned();

        let topics = extract_from_window(self.recent());
        let guidance = director::guidance(speaker, self.recent(), &self.narrative, &topics);

        let text = {
            let request = ResponseRequest {
                character: &character,
                stimulus: &stimulus_text,
                stimulus_is_action,
                recent: self.recent(),
                instructions: Some(&self.instructions),
                narrative: &self.narrative,
                relationship: relationship.as_ref(),
                guidance: Some(&guidance),
                scene_fragment: scene_fragment.as_deref(),
            };
            self.synthesizer.respond(&request, &self.moods, &mut rng)
        };

        self.typing = None;
        if text.trim().is_empty() {
            tracing::warn!(speaker, "synthesis produced an empty reply, using fallback");
            return self
                .synthesizer
                .fallback_line(&character, self.in_battle_context());
        }
        text
    }

    /// Compose a line from `speaker` addressed to another character.
    pub fn synthesize_interaction(&mut self, speaker: &str, target: &str) -> String {
        let mut rng = self.next_rng();
        let Some(character) = self.character(speaker).cloned() else {
            tracing::warn!(speaker, "interaction requested for unknown character");
            self.typing = None;
            return String::new();
        };

        let target_message = self
            .history
            .iter()
            .rev()
            .find(|m| m.speaker.as_deref() == Some(target))
            .map(|m| m.message.clone())
            .unwrap_or_default();
        let relationship = self.relationships.peek(speaker, target).cloned();

        let text = self.synthesizer.interaction(
            &character,
            target,
            &target_message,
            self.recent(),
            &self.narrative,
            relationship.as_ref(),
            &mut rng,
        );
        self.typing = None;
        text
    }

    /// Apply an emotional impact to a character's mood.
    pub fn update_mood(
        &mut self,
        character: &str,
        trigger: &str,
        emotional_impact: i32,
        interaction_type: &str,
    ) -> MoodUpdate {
        let mut rng = self.next_rng();
        let base = match self.character(character) {
            Some(c) => c.mood.clone(),
            None => {
                tracing::warn!(character, "mood update for unknown character");
                "Neutral".to_string()
            }
        };
        let previous = self.moods.get(character, &base).clone();
        let state = self
            .moods
            .update(character, &base, trigger, emotional_impact, interaction_type);
        let announcement = if should_announce(&previous, &state, &mut rng) {
            Some(format!(
                "*{character} now seems {}*",
                state.current_mood.to_lowercase()
            ))
        } else {
            None
        };
        MoodUpdate {
            state,
            announcement,
        }
    }

    /// Score a message's effect on the pair's relationship and apply it.
    pub fn update_relationship(
        &mut self,
        a: &str,
        b: &str,
        initiator: &str,
        message: &str,
    ) -> Relationship {
        let delta = affinity_delta(message);
        let kind = match analyze_sentiment(message) {
            Sentiment::Positive => "supportive",
            Sentiment::Negative => "hostile",
            Sentiment::Neutral => "neutral",
        };
        self.relationships.update(a, b, initiator, message, delta, kind)
    }

    /// Whether the pacing model wants an environmental event now.
    pub fn should_trigger_environmental_event(&mut self) -> bool {
        let mut rng = self.next_rng();
        should_trigger_environmental_event(&self.narrative, self.messages_since_last_event, &mut rng)
    }

    /// Produce an environmental narration line and reset event pacing.
    ///
    /// When the room has a live topic, the event reacts to it half the
    /// time rather than arriving out of nowhere.
    pub fn generate_environmental_event(&mut self) -> String {
        let mut rng = self.next_rng();
        let fragment = self
            .scene
            .next_fragment(&self.narrative, None, false, &mut rng);
        let fragment = fragment.trim_end_matches('.').to_string();

        let topics = extract_from_window(self.recent());
        let text = match topics.first() {
            Some(topic) if rng.gen_bool(0.5) => {
                format!("*{fragment}, while talk of {topic} still hangs in the air*")
            }
            _ => format!("*{fragment}*"),
        };
        self.messages_since_last_event = 0;
        text
    }

    /// Whether the pacing model wants a branch proposal now.
    pub fn should_propose_branch(&mut self) -> bool {
        let mut rng = self.next_rng();
        should_propose_branch(self.messages_since_last_branch, &mut rng)
    }

    /// Generate 3–4 story-branch options and reset branch pacing.
    pub fn generate_branch_options(&mut self) -> Vec<String> {
        let mut rng = self.next_rng();
        let topics = extract_from_window(self.recent());
        let tone = window_tone(self.recent());
        let relationships: Vec<Relationship> = self.relationships.all().cloned().collect();
        let options = self.branches.generate(
            self.scenario,
            &topics,
            tone,
            self.narrative.current_phase,
            &relationships,
            &mut rng,
        );
        self.messages_since_last_branch = 0;
        options
    }

    /// Simulated thinking delay before the named character replies.
    ///
    /// Scales the length-class base by the character's thinking speed;
    /// unknown characters get the unscaled base.
    pub fn response_delay_ms(&self, speaker: &str) -> u64 {
        let base: f32 = match self.instructions.response_length {
            ResponseLength::Short => 900.0,
            ResponseLength::Medium => 1800.0,
            ResponseLength::Long => 3200.0,
        };
        let speed = self
            .character(speaker)
            .map(|c| c.thinking_speed)
            .unwrap_or(1.0);
        (base / speed.max(0.1)) as u64
    }

    /// Name of the character currently shown as typing, if any.
    pub fn currently_typing(&self) -> Option<&str> {
        self.typing.as_deref()
    }

    pub fn clear_typing(&mut self) {
        self.typing = None;
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn narrative(&self) -> &NarrativeContext {
        &self.narrative
    }

    /// Current mood label for a character, when one has been tracked.
    pub fn mood_label(&self, character: &str) -> Option<&str> {
        self.moods.current_label(character)
    }

    /// Relationship snapshot for a pair, when one has been tracked.
    pub fn relationship(&self, a: &str, b: &str) -> Option<&Relationship> {
        self.relationships.peek(a, b)
    }

    /// Per-reply guidance for a prospective speaker, for inspection.
    pub fn reply_guidance(&self, speaker: &str) -> ReplyGuidance {
        let topics = extract_from_window(self.recent());
        director::guidance(speaker, self.recent(), &self.narrative, &topics)
    }

    fn in_battle_context(&self) -> bool {
        let combined: String = self
            .recent()
            .iter()
            .filter(|m| !m.system)
            .map(|m| m.message.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        ["battle", "fight", "attack", "weapon", "enemy"]
            .iter()
            .any(|w| combined.contains(w))
    }
}

fn tension_for_phase(phase: NarrativePhase) -> Tension {
    match phase {
        NarrativePhase::Introduction | NarrativePhase::Discovery => Tension::Low,
        NarrativePhase::RisingAction | NarrativePhase::Planning => Tension::Medium,
        NarrativePhase::Conflict => Tension::High,
        NarrativePhase::Climax => Tension::VeryHigh,
        NarrativePhase::Resolution => Tension::Low,
    }
}
