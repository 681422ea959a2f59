/// Response synthesis — composes final character-voiced reply text.
///
/// The priority chain is an explicit ordered rule list with
/// first-match-wins semantics, so the order itself is testable. Every
/// reply then passes through the same post-processing pipeline:
/// forbidden-phrase scrub, urgency and environmental action weaving,
/// placeholder stripping, scene-fragment weave, and the sentence cap.
use rand::Rng;

use crate::core::director::ReplyGuidance;
use crate::core::moods::MoodTracker;
use crate::core::relationships::{describe_affinity, past_reference, should_reference_past};
use crate::core::sentiment::analyze_sentiment;
use crate::core::template::{fill, strip_unresolved, Slots};
use crate::core::topics::{extract_topics, is_greeting, is_question};
use crate::core::voice::{scrub_forbidden, VoiceRegistry};
use crate::schema::character::{Character, CharacterType};
use crate::schema::message::{has_action_span, Message, ResponseLength, WritingInstructions};
use crate::schema::narrative::{NarrativeContext, Sentiment};
use crate::schema::relationship::Relationship;

const WEAPON_WORDS: &[&str] = &[
    "sword", "blade", "dagger", "knife", "gun", "blaster", "pistol", "rifle", "axe", "spear",
    "weapon", "draws", "fires", "swings", "strikes", "stabs",
];

const DANGER_WORDS: &[&str] = &[
    "danger", "threat", "trap", "ambush", "enemy", "attack", "kill", "die", "poison", "bleed",
    "wounded", "surrounded",
];

const FRIENDLY_ACTION_WORDS: &[&str] = &[
    "hug", "wave", "smile", "handshake", "bows", "nods", "laughs", "pats", "offers", "embrace",
];

const AGGRESSIVE_ACTION_WORDS: &[&str] = &[
    "punch", "shove", "glare", "slams", "grabs", "lunges", "threatens", "snarls", "spits",
];

const BATTLE_GOAL_WORDS: &[&str] = &["battle", "fight", "war", "siege", "combat", "duel", "defend"];
const MAGIC_GOAL_WORDS: &[&str] = &["magic", "spell", "ritual", "curse", "enchant", "arcane"];
const TECH_GOAL_WORDS: &[&str] = &["ship", "reactor", "signal", "system", "tech", "orbit", "data"];

const URGENCY_WORDS: &[&str] = &["now", "hurry", "quick", "move", "run", "fast", "urgent"];

fn contains_any(text: &str, words: &[&str]) -> bool {
    let lower = text.to_lowercase();
    words.iter().any(|w| lower.contains(w))
}

/// Everything a rule needs to decide and render.
pub struct ResponseRequest<'a> {
    pub character: &'a Character,
    pub stimulus: &'a str,
    pub stimulus_is_action: bool,
    pub recent: &'a [Message],
    pub instructions: Option<&'a WritingInstructions>,
    pub narrative: &'a NarrativeContext,
    pub relationship: Option<&'a Relationship>,
    pub guidance: Option<&'a ReplyGuidance>,
    /// Scene fragment to weave into the final text.
    pub scene_fragment: Option<&'a str>,
}

/// The ordered response rules, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseRule {
    ActionReply,
    WeaponDeescalation,
    DangerConcern,
    Greeting,
    Question,
    DirectAddress,
    SentimentMatch,
    Default,
}

pub const RULE_ORDER: &[ResponseRule] = &[
    ResponseRule::ActionReply,
    ResponseRule::WeaponDeescalation,
    ResponseRule::DangerConcern,
    ResponseRule::Greeting,
    ResponseRule::Question,
    ResponseRule::DirectAddress,
    ResponseRule::SentimentMatch,
    ResponseRule::Default,
];

impl ResponseRule {
    /// Whether this rule claims the request. `Default` always does.
    pub fn applies<R: Rng>(&self, request: &ResponseRequest<'_>, rng: &mut R) -> bool {
        match self {
            Self::ActionReply => request.stimulus_is_action,
            Self::WeaponDeescalation => contains_any(request.stimulus, WEAPON_WORDS),
            Self::DangerConcern => contains_any(request.stimulus, DANGER_WORDS),
            Self::Greeting => {
                is_greeting(request.stimulus) && extract_topics(request.stimulus).len() <= 1
            }
            Self::Question => is_question(request.stimulus),
            Self::DirectAddress => request
                .stimulus
                .to_lowercase()
                .contains(&request.character.name.to_lowercase()),
            Self::SentimentMatch => {
                analyze_sentiment(request.stimulus) != Sentiment::Neutral && rng.gen_bool(0.6)
            }
            Self::Default => true,
        }
    }
}

/// First rule in [`RULE_ORDER`] that claims the request.
pub fn select_rule<R: Rng>(request: &ResponseRequest<'_>, rng: &mut R) -> ResponseRule {
    *RULE_ORDER
        .iter()
        .find(|rule| rule.applies(request, rng))
        .unwrap_or(&ResponseRule::Default)
}

/// How an `*action*` stimulus reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionClass {
    Weapon,
    Friendly,
    Aggressive,
    Neutral,
}

fn classify_action(stimulus: &str) -> ActionClass {
    if contains_any(stimulus, WEAPON_WORDS) {
        ActionClass::Weapon
    } else if contains_any(stimulus, FRIENDLY_ACTION_WORDS) {
        ActionClass::Friendly
    } else if contains_any(stimulus, AGGRESSIVE_ACTION_WORDS) {
        ActionClass::Aggressive
    } else {
        ActionClass::Neutral
    }
}

fn action_reply_pool(class: ActionClass) -> &'static [&'static str] {
    match class {
        ActionClass::Weapon => &[
            "*steps back, hands raised* Easy. There's no need for steel between us.",
            "*does not flinch* Put that away before someone gets hurt.",
            "*eyes the weapon* Think carefully about your next move.",
        ],
        ActionClass::Friendly => &[
            "*returns the gesture warmly* It's good to have you with us.",
            "*smiles* That lifts my spirits more than you know.",
            "*nods appreciatively* You have a generous heart.",
        ],
        ActionClass::Aggressive => &[
            "*squares up, unmoving* Careful. I don't back down easily.",
            "*holds their ground* That temper will cost you one day.",
            "*narrows their eyes* Is that how you want this to go?",
        ],
        ActionClass::Neutral => &[
            "*watches thoughtfully* Interesting choice.",
            "*tilts their head* I see what you're doing there.",
            "*considers the moment* Go on.",
        ],
    }
}

const DEESCALATION_POOL: &[&str] = &[
    "Lower the weapon. Whatever this is, we can settle it with words.",
    "Steel solves nothing here. Stand down and talk to me.",
    "Nobody needs to bleed today. Put it away.",
];

const CONCERN_POOL: &[&str] = &[
    "Wait — that sounds dangerous. We should think before we act.",
    "I don't like this. Stay close and keep your eyes open.",
    "If there's a threat out there, we face it together or not at all.",
];

const GREETING_POOL: &[&str] = &[
    "Well met! What brings you here?",
    "Hello there. Come, join us.",
    "Greetings. You picked an interesting moment to arrive.",
];

fn question_pool(character: &Character) -> &'static [&'static str] {
    if character.personality.analytical >= 7 {
        &[
            "Let me reason through it. The facts point one way: {{view}}.",
            "A fair question. Weighing what we know, {{view}}.",
        ]
    } else if character.personality.philosophical >= 7 {
        &[
            "Questions like that have more than one true answer. For me, {{view}}.",
            "I've turned that over many nights. I believe {{view}}.",
        ]
    } else {
        &[
            "Honestly? {{view}}.",
            "If you're asking me straight — {{view}}.",
        ]
    }
}

const QUESTION_VIEWS: &[&str] = &[
    "we should trust what we've seen, not what we've been told",
    "the safest road is rarely the right one",
    "we keep moving and stay together",
    "there's more to this than anyone is saying",
];

fn address_pool(character: &Character) -> &'static [&'static str] {
    if character.personality.emotional >= 7 {
        &[
            "You're speaking to me? Then hear me plainly — I care how this ends.",
            "Me? I'll give you an honest answer, whatever it costs.",
        ]
    } else if character.personality.humor >= 7 {
        &[
            "Singling me out? Bold. I like it.",
            "Ha — you've got my attention, for better or worse.",
        ]
    } else {
        &[
            "You have my attention. Speak.",
            "I'm listening. Choose your words well.",
        ]
    }
}

const POSITIVE_POOL: &[&str] = &[
    "That's the best news I've heard all day.",
    "Good. We could use a little fortune for once.",
    "You bring light into this, and I won't pretend otherwise.",
];

const NEGATIVE_POOL: &[&str] = &[
    "That sits poorly with me. We should tread carefully.",
    "Grim words. I'd hoped for better.",
    "Then we prepare for the worst and hope to be wrong.",
];

/// Default template pool keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PoolKey {
    Fantasy,
    Combat,
    Scifi,
    Historical,
    Modern,
}

fn default_pool_key(character: &Character, narrative: &NarrativeContext) -> PoolKey {
    // Narrative-goal keyword sniffing overrides the type mapping.
    if contains_any(&narrative.current_goal, BATTLE_GOAL_WORDS) {
        return PoolKey::Combat;
    }
    if contains_any(&narrative.current_goal, MAGIC_GOAL_WORDS) {
        return PoolKey::Fantasy;
    }
    if contains_any(&narrative.current_goal, TECH_GOAL_WORDS) {
        return PoolKey::Scifi;
    }
    match character.character_type {
        CharacterType::Fantasy | CharacterType::Adventure => PoolKey::Fantasy,
        CharacterType::Scifi => PoolKey::Scifi,
        CharacterType::Historical => PoolKey::Historical,
        CharacterType::Superhero => PoolKey::Combat,
        CharacterType::Modern => PoolKey::Modern,
    }
}

fn default_pool(key: PoolKey) -> &'static [&'static str] {
    match key {
        PoolKey::Fantasy => &[
            "The old tales warned of days like this. We write our own ending.",
            "There is magic in persistence, if nothing else. Onward.",
            "Whatever waits ahead, it will not find us unready.",
        ],
        PoolKey::Combat => &[
            "Stay sharp. Watch the flanks and call out what you see.",
            "We hold the line together or we don't hold it at all.",
            "Strength counts, but discipline wins. Keep formation.",
        ],
        PoolKey::Scifi => &[
            "The readings don't lie. Something out here defies the charts.",
            "Run the numbers again — I want certainty before we commit.",
            "Space is patient. We should be too.",
        ],
        PoolKey::Historical => &[
            "History rewards the prepared. Let us not be caught wanting.",
            "Every age believes itself unprecedented. Ours may be right.",
            "Decorum aside, the situation demands plain speech.",
        ],
        PoolKey::Modern => &[
            "Okay, let's take stock and figure out our next move.",
            "I've seen stranger things work out. Let's not panic yet.",
            "One step at a time. What do we actually know?",
        ],
    }
}

fn mood_prefix(mood_label: &str) -> &'static str {
    let lower = mood_label.to_lowercase();
    if lower.contains("angry") || lower.contains("furious") || lower.contains("seeth") {
        "Enough. "
    } else if lower.contains("happy") || lower.contains("delight") || lower.contains("ecstatic") {
        "Ha! "
    } else if lower.contains("sad") || lower.contains("mourn") || lower.contains("despair") {
        "*sighs* "
    } else if lower.contains("fear") || lower.contains("panic") || lower.contains("anxious") {
        "Careful... "
    } else if lower.contains("curious") || lower.contains("intrig") || lower.contains("fascin") {
        "Now that's interesting. "
    } else {
        ""
    }
}

fn urgency_action(character_type: CharacterType) -> &'static str {
    match character_type {
        CharacterType::Fantasy | CharacterType::Adventure => "*grips their blade, eyes hard* ",
        CharacterType::Scifi => "*slams a palm on the console* ",
        CharacterType::Historical => "*rises sharply from their seat* ",
        CharacterType::Modern => "*stands abruptly* ",
        CharacterType::Superhero => "*plants themselves between the others and the danger* ",
    }
}

fn environmental_action(character_type: CharacterType) -> &'static str {
    match character_type {
        CharacterType::Fantasy | CharacterType::Adventure => "*glances toward the treeline* ",
        CharacterType::Scifi => "*checks a flickering readout* ",
        CharacterType::Historical => "*adjusts their cuffs* ",
        CharacterType::Modern => "*leans against the wall* ",
        CharacterType::Superhero => "*scans the skyline* ",
    }
}

/// The synthesizer: a voice registry plus the rule table above.
#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    voices: VoiceRegistry,
}

impl Synthesizer {
    pub fn new(voices: VoiceRegistry) -> Self {
        Self { voices }
    }

    pub fn voices_mut(&mut self) -> &mut VoiceRegistry {
        &mut self.voices
    }

    /// Compose a reply to a stimulus from the human participant.
    pub fn respond<R: Rng>(
        &self,
        request: &ResponseRequest<'_>,
        moods: &MoodTracker,
        rng: &mut R,
    ) -> String {
        let rule = select_rule(request, rng);
        let body = self.render(rule, request, moods, rng);
        self.post_process(&body, request, rng)
    }

    fn render<R: Rng>(
        &self,
        rule: ResponseRule,
        request: &ResponseRequest<'_>,
        moods: &MoodTracker,
        rng: &mut R,
    ) -> String {
        match rule {
            ResponseRule::ActionReply => {
                let pool = action_reply_pool(classify_action(request.stimulus));
                pick(pool, rng)
            }
            ResponseRule::WeaponDeescalation => pick(DEESCALATION_POOL, rng),
            ResponseRule::DangerConcern => pick(CONCERN_POOL, rng),
            ResponseRule::Greeting => pick(GREETING_POOL, rng),
            ResponseRule::Question => {
                let template = pick(question_pool(request.character), rng);
                let slots = Slots::new().bind("view", pick(QUESTION_VIEWS, rng));
                // The pool only carries the bound slot; an error here
                // leaves the marker for strip_unresolved.
                fill(&template, &slots).unwrap_or(template)
            }
            ResponseRule::DirectAddress => pick(address_pool(request.character), rng),
            ResponseRule::SentimentMatch => {
                match analyze_sentiment(request.stimulus) {
                    Sentiment::Positive => pick(POSITIVE_POOL, rng),
                    _ => pick(NEGATIVE_POOL, rng),
                }
            }
            ResponseRule::Default => self.render_default(request, moods, rng),
        }
    }

    /// The default composition path: pool template plus mood prefix,
    /// one probabilistic callback, and probabilistic suffixes.
    fn render_default<R: Rng>(
        &self,
        request: &ResponseRequest<'_>,
        moods: &MoodTracker,
        rng: &mut R,
    ) -> String {
        let character = request.character;
        let template = pick(
            default_pool(default_pool_key(character, request.narrative)),
            rng,
        );

        let short = request
            .instructions
            .map(|i| i.response_length == ResponseLength::Short)
            .unwrap_or(false);

        let prefix = if request.instructions.and_then(|i| i.style.as_ref()).is_some() {
            // An explicit style instruction overrides the mood prefix.
            String::new()
        } else {
            moods
                .current_label(&character.name)
                .map(mood_prefix)
                .unwrap_or("")
                .to_string()
        };

        if short {
            return format!("{prefix}{template}");
        }

        // One callback at most, first gate that fires wins.
        let callback = self.pick_callback(request, rng).unwrap_or_default();

        let mut out = format!("{callback}{prefix}{template}");

        if !character.catchphrases.is_empty() && rng.gen_bool(0.2) {
            let phrase = &character.catchphrases[rng.gen_range(0..character.catchphrases.len())];
            out.push(' ');
            out.push_str(phrase);
        }
        if rng.gen_bool(0.3) {
            if let Some(style) = character.voice_style.as_deref().or_else(|| {
                self.voices
                    .resolve(&character.name, character.character_type)
                    .and_then(|v| v.style.as_deref())
            }) {
                out.push_str(&format!(" *their tone turns {style}*"));
            }
        }
        if rng.gen_bool(0.25) {
            out.push_str(&format!(
                " That's how it looks from where a {} stands.",
                role_word(character.character_type)
            ));
        }

        out
    }

    /// Self-reference (20%), chat-history callback (30%), relationship
    /// callback (trait-gated predicate), then the scenario-context
    /// chain. First match short-circuits.
    fn pick_callback<R: Rng>(&self, request: &ResponseRequest<'_>, rng: &mut R) -> Option<String> {
        if rng.gen_bool(0.2) {
            return Some("I've been turning something over in my head. ".to_string());
        }

        if rng.gen_bool(0.3) {
            let topics = crate::core::topics::extract_from_window(request.recent);
            if let Some(topic) = topics.first() {
                return Some(format!("You mentioned {topic} earlier. "));
            }
        }

        if let Some(relationship) = request.relationship {
            if should_reference_past(&request.character.personality, rng) {
                if let Some(line) = past_reference(relationship, rng) {
                    return Some(format!("{line} "));
                }
            }
        }

        self.scenario_callback(request, rng)
    }

    /// Scenario-context chain: flirtation, sensory detail,
    /// relationship-aware phrasing, combat context. Fixed order,
    /// first match short-circuits.
    fn scenario_callback<R: Rng>(
        &self,
        request: &ResponseRequest<'_>,
        rng: &mut R,
    ) -> Option<String> {
        let context = &request.narrative.current_context;

        if contains_any(request.stimulus, &["flirt", "wink", "charming", "blush"])
            && rng.gen_bool(0.2)
        {
            return Some("*a half-smile escapes despite everything* ".to_string());
        }

        if !context.is_empty() && rng.gen_bool(0.3) {
            let detail = pick(
                &[
                    "The air feels heavier than it did a moment ago. ",
                    "Every small sound seems louder now. ",
                    "The light catches everyone's faces just so. ",
                ],
                rng,
            );
            return Some(detail);
        }

        if let Some(relationship) = request.relationship {
            if relationship.affinity.abs() >= 5 && rng.gen_bool(0.3) {
                let other = relationship.other(&request.character.name);
                let band = describe_affinity(relationship.affinity);
                return Some(format!("Say what you will — {other} and I are {band}. "));
            }
        }

        if contains_any(&request.narrative.current_goal, BATTLE_GOAL_WORDS) && rng.gen_bool(0.5) {
            return Some("*keeps one eye on the perimeter* ".to_string());
        }

        None
    }

    /// Post-processing applied to every reply.
    fn post_process<R: Rng>(
        &self,
        body: &str,
        request: &ResponseRequest<'_>,
        rng: &mut R,
    ) -> String {
        let character = request.character;
        let mut out = body.to_string();

        // (a) forbidden-phrase scrub.
        if let Some(voice) = self
            .voices
            .resolve(&character.name, character.character_type)
        {
            out = scrub_forbidden(&out, &voice.forbidden);
        }

        // (b) urgency prepend during flat high-tension confrontation.
        if request.narrative.current_phase.is_confrontational()
            && request.narrative.current_tension.is_high()
            && !contains_any(&out, URGENCY_WORDS)
            && !has_action_span(&out)
        {
            out = format!("{}{}", urgency_action(character.character_type), out);
        }

        // (c) occasional environmental action when nothing moves.
        if !has_action_span(&out) && rng.gen_bool(0.3) {
            out = format!("{}{}", environmental_action(character.character_type), out);
        }

        // (d) strip any leftover placeholders.
        out = strip_unresolved(&out);

        // (e) weave the scene fragment, then cap sentence count.
        if let Some(fragment) = request.scene_fragment {
            out = format!("{out} *{fragment}*");
        }

        let length = request
            .instructions
            .map(|i| i.response_length)
            .unwrap_or_default();
        cap_length(&out, length)
    }

    /// Compose a line addressed to another character.
    pub fn interaction<R: Rng>(
        &self,
        character: &Character,
        target: &str,
        target_message: &str,
        recent: &[Message],
        narrative: &NarrativeContext,
        relationship: Option<&Relationship>,
        rng: &mut R,
    ) -> String {
        let window_text: String = recent
            .iter()
            .filter(|m| !m.system)
            .map(|m| m.message.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let battle_context = contains_any(&window_text, DANGER_WORDS)
            || contains_any(&window_text, WEAPON_WORDS)
            || contains_any(&window_text, BATTLE_GOAL_WORDS);

        let body = if battle_context {
            self.battle_interaction(character, target, rng)
        } else {
            self.social_interaction(character, target, target_message, relationship, rng)
        };

        let request = ResponseRequest {
            character,
            stimulus: target_message,
            stimulus_is_action: false,
            recent,
            instructions: None,
            narrative,
            relationship,
            guidance: None,
            scene_fragment: None,
        };
        self.post_process(&body, &request, rng)
    }

    /// Battle-window interaction: coordination, banter, tactical
    /// suggestion, or team support, biased by confidence and humor.
    fn battle_interaction<R: Rng>(
        &self,
        character: &Character,
        target: &str,
        rng: &mut R,
    ) -> String {
        let confidence = character.personality.confidence as u32;
        let humor = character.personality.humor as u32;
        // (variant, weight): confident characters favor coordination
        // and tactics, humorous ones banter more.
        let weights = [
            ("coordination", 3 + confidence),
            ("banter", 1 + humor),
            ("tactical", 2 + confidence),
            ("support", 3),
        ];
        let total: u32 = weights.iter().map(|(_, w)| w).sum();
        let mut draw = rng.gen_range(0..total);
        let mut choice = weights[0].0;
        for (variant, weight) in weights {
            if draw < weight {
                choice = variant;
                break;
            }
            draw -= weight;
        }

        match choice {
            "coordination" => format!("{target}, on me! We move as one or not at all."),
            "banter" => format!("Still in one piece, {target}? Try to keep it that way."),
            "tactical" => format!("{target} — flank left, I'll draw their eyes."),
            _ => format!("I've got your back, {target}. Don't look behind you."),
        }
    }

    /// Default interaction set, driven by the affinity sign.
    fn social_interaction<R: Rng>(
        &self,
        character: &Character,
        target: &str,
        target_message: &str,
        relationship: Option<&Relationship>,
        rng: &mut R,
    ) -> String {
        let affinity = relationship.map(|r| r.affinity).unwrap_or(0);
        let topics = extract_topics(target_message);
        let topic = topics
            .first()
            .cloned()
            .unwrap_or_else(|| "that".to_string());

        let mut pool: Vec<&str> = if affinity > 2 {
            vec!["agreement", "humor", "question"]
        } else if affinity < -2 {
            vec!["disagreement", "surprise", "question"]
        } else {
            vec!["agreement", "disagreement", "question", "humor", "surprise"]
        };
        // Humorless characters never reach for the banter variant.
        if character.personality.humor <= 2 {
            pool.retain(|v| *v != "humor");
        }
        let choice = pool[rng.gen_range(0..pool.len())];

        match choice {
            "agreement" => format!("{target} has the right of it. I'm with them on {topic}."),
            "disagreement" => format!("No, {target}. You're wrong about {topic}, and I'll say why."),
            "question" => format!("{target}, what makes you so sure about {topic}?"),
            "humor" => format!("Only {target} could make {topic} sound like a good idea."),
            _ => format!("Wait — {target}, did you truly just say that about {topic}?"),
        }
    }

    /// Short redirect line for when a generated reply has drifted.
    /// Lookup is name → type → generic, keyed by context.
    pub fn fallback_line(&self, character: &Character, battle: bool) -> String {
        // A per-character line registered as a catchphrase-style opener
        // would go name-first; the built-in tables are type-keyed.
        let line = match (character.character_type, battle) {
            (CharacterType::Fantasy | CharacterType::Adventure, true) => {
                "Enough talk — the fight is in front of us."
            }
            (CharacterType::Fantasy | CharacterType::Adventure, false) => {
                "We stray from the path. Back to the matter at hand."
            }
            (CharacterType::Scifi, true) => "Focus. The threat board is still lit.",
            (CharacterType::Scifi, false) => "Let's refocus on the mission parameters.",
            (CharacterType::Historical, true) => "Steady. The field demands our attention.",
            (CharacterType::Historical, false) => "Let us return to the business before us.",
            (CharacterType::Superhero, true) => "Eyes up — people still need us out there.",
            (CharacterType::Superhero, false) => "Back to the job. The city doesn't wait.",
            (_, true) => "Heads in the game, people.",
            (_, false) => "Anyway — where were we?",
        };
        line.to_string()
    }
}

fn role_word(character_type: CharacterType) -> &'static str {
    match character_type {
        CharacterType::Fantasy => "wanderer",
        CharacterType::Scifi => "spacer",
        CharacterType::Historical => "veteran of older days",
        CharacterType::Modern => "realist",
        CharacterType::Superhero => "guardian",
        CharacterType::Adventure => "pathfinder",
    }
}

fn pick<R: Rng>(pool: &[&str], rng: &mut R) -> String {
    pool[rng.gen_range(0..pool.len())].to_string()
}

/// Enforce the 1–3 sentence cap and length-class trims.
fn cap_length(text: &str, length: ResponseLength) -> String {
    let sentences = split_sentences(text);
    let capped: String = match length {
        ResponseLength::Short => {
            let first = sentences.first().cloned().unwrap_or_default();
            if first.len() > 100 {
                let cut = first
                    .char_indices()
                    .take_while(|(i, _)| *i < 100)
                    .last()
                    .map(|(i, c)| i + c.len_utf8())
                    .unwrap_or(first.len());
                format!("{}…", first[..cut].trim_end())
            } else {
                first
            }
        }
        _ => sentences.iter().take(3).cloned().collect::<Vec<_>>().join(" "),
    };
    capped.trim().to_string()
}

/// Split on sentence enders, keeping trailing action spans attached.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut in_action = false;
    for ch in text.chars() {
        if ch == '*' {
            in_action = !in_action;
        }
        current.push(ch);
        if !in_action && matches!(ch, '.' | '!' | '?') {
            let trimmed = current.trim().to_string();
            if !trimmed.is_empty() {
                sentences.push(trimmed);
            }
            current.clear();
        }
    }
    let trimmed = current.trim().to_string();
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moods::MoodTracker;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn hero() -> Character {
        Character::new("Elara", CharacterType::Fantasy)
            .with_mood("Happy")
            .with_catchphrases(&["By the old roads!"])
    }

    fn request<'a>(
        character: &'a Character,
        stimulus: &'a str,
        narrative: &'a NarrativeContext,
    ) -> ResponseRequest<'a> {
        ResponseRequest {
            character,
            stimulus,
            stimulus_is_action: stimulus.trim().starts_with('*') && stimulus.trim().ends_with('*'),
            recent: &[],
            instructions: None,
            narrative,
            relationship: None,
            guidance: None,
            scene_fragment: None,
        }
    }

    fn synthesizer() -> Synthesizer {
        Synthesizer::new(VoiceRegistry::with_defaults())
    }

    #[test]
    fn action_stimulus_selects_action_rule() {
        let character = hero();
        let narrative = NarrativeContext::default();
        let req = request(&character, "*draws sword*", &narrative);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(select_rule(&req, &mut rng), ResponseRule::ActionReply);
    }

    #[test]
    fn weapon_action_reply_comes_from_weapon_pool() {
        let character = hero();
        let narrative = NarrativeContext::default();
        let req = request(&character, "*draws sword*", &narrative);
        let synth = synthesizer();
        let moods = MoodTracker::new();

        let weapon_pool = action_reply_pool(ActionClass::Weapon);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let reply = synth.respond(&req, &moods, &mut rng);
            assert!(
                weapon_pool.contains(&reply.as_str()),
                "reply not from weapon pool: {reply}"
            );
        }
    }

    #[test]
    fn weapon_keyword_without_action_deescalates() {
        let character = hero();
        let narrative = NarrativeContext::default();
        let req = request(&character, "he has a sword at his belt", &narrative);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(select_rule(&req, &mut rng), ResponseRule::WeaponDeescalation);
    }

    #[test]
    fn danger_keyword_raises_concern() {
        let character = hero();
        let narrative = NarrativeContext::default();
        let req = request(&character, "there is an ambush past the ridge", &narrative);
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(select_rule(&req, &mut rng), ResponseRule::DangerConcern);
    }

    #[test]
    fn simple_greeting_rule() {
        let character = hero();
        let narrative = NarrativeContext::default();
        let req = request(&character, "hello everyone", &narrative);
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(select_rule(&req, &mut rng), ResponseRule::Greeting);
    }

    #[test]
    fn greeting_with_many_topics_falls_through() {
        let character = hero();
        let narrative = NarrativeContext::default();
        let req = request(
            &character,
            "hello, I bring news of the castle, the prophecy and the rebellion",
            &narrative,
        );
        let mut rng = StdRng::seed_from_u64(4);
        assert_ne!(select_rule(&req, &mut rng), ResponseRule::Greeting);
    }

    #[test]
    fn question_rule_fills_view_slot() {
        let character = hero();
        let narrative = NarrativeContext::default();
        let req = request(&character, "what should we do next?", &narrative);
        let synth = synthesizer();
        let moods = MoodTracker::new();
        let mut rng = StdRng::seed_from_u64(5);
        let reply = synth.respond(&req, &moods, &mut rng);
        assert!(!reply.contains("{{"), "unresolved slot in: {reply}");
        assert!(!reply.is_empty());
    }

    #[test]
    fn question_reply_carries_a_bound_view() {
        let synth = synthesizer();
        let character = hero();
        let narrative = NarrativeContext::default();
        let moods = MoodTracker::new();
        for seed in 0..10 {
            let req = request(&character, "what should we do next?", &narrative);
            let mut rng = StdRng::seed_from_u64(seed);
            let reply = synth.respond(&req, &moods, &mut rng);
            assert!(
                QUESTION_VIEWS.iter().any(|v| reply.contains(v)),
                "no view rendered in: {reply}"
            );
        }
    }

    #[test]
    fn direct_address_rule() {
        let character = hero();
        let narrative = NarrativeContext::default();
        let req = request(&character, "I leave the choice to Elara", &narrative);
        let mut rng = StdRng::seed_from_u64(6);
        assert_eq!(select_rule(&req, &mut rng), ResponseRule::DirectAddress);
    }

    #[test]
    fn neutral_statement_hits_default() {
        let character = hero();
        let narrative = NarrativeContext::default();
        let req = request(&character, "the road continues east", &narrative);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(select_rule(&req, &mut rng), ResponseRule::Default);
    }

    #[test]
    fn rule_priority_is_stable() {
        // An action stimulus that also contains danger words must still
        // resolve to the action rule.
        let character = hero();
        let narrative = NarrativeContext::default();
        let req = request(&character, "*lunges with a knife, a deadly attack*", &narrative);
        let mut rng = StdRng::seed_from_u64(8);
        assert_eq!(select_rule(&req, &mut rng), ResponseRule::ActionReply);
    }

    #[test]
    fn no_forbidden_phrase_survives() {
        let mut synth = synthesizer();
        synth.voices_mut().register(crate::core::voice::VoiceTemplate {
            character: Some("Elara".to_string()),
            character_type: CharacterType::Fantasy,
            style: None,
            example_lines: Vec::new(),
            forbidden: vec![crate::core::voice::ForbiddenPhrase {
                phrase: "the old tales".to_string(),
                replacement: "the elders".to_string(),
            }],
        });
        let character = hero();
        let narrative = NarrativeContext::default();
        let req = request(&character, "the road continues east", &narrative);
        let moods = MoodTracker::new();
        for seed in 0..40 {
            let mut rng = StdRng::seed_from_u64(seed);
            let reply = synth.respond(&req, &moods, &mut rng);
            assert!(
                !reply.to_lowercase().contains("the old tales"),
                "forbidden phrase in: {reply}"
            );
        }
    }

    #[test]
    fn no_unresolved_placeholders_ever() {
        let synth = synthesizer();
        let character = hero();
        let narrative = NarrativeContext::default();
        let moods = MoodTracker::new();
        let stimuli = [
            "*draws sword*",
            "hello",
            "what do you think?",
            "the danger is real",
            "a quiet evening",
        ];
        for (i, stimulus) in stimuli.iter().enumerate() {
            for seed in 0..10 {
                let req = request(&character, stimulus, &narrative);
                let mut rng = StdRng::seed_from_u64(seed * 31 + i as u64);
                let reply = synth.respond(&req, &moods, &mut rng);
                assert!(!reply.contains("{{") && !reply.contains("}}"), "{reply}");
            }
        }
    }

    #[test]
    fn replies_cap_at_three_sentences() {
        let synth = synthesizer();
        let character = hero();
        let narrative = NarrativeContext::default();
        let moods = MoodTracker::new();
        for seed in 0..30 {
            let req = request(&character, "the road continues east", &narrative);
            let mut rng = StdRng::seed_from_u64(seed);
            let reply = synth.respond(&req, &moods, &mut rng);
            assert!(
                split_sentences(&reply).len() <= 3,
                "too many sentences: {reply}"
            );
        }
    }

    #[test]
    fn short_instruction_trims_to_one_sentence() {
        let synth = synthesizer();
        let character = hero();
        let narrative = NarrativeContext::default();
        let moods = MoodTracker::new();
        let instructions = WritingInstructions {
            response_length: ResponseLength::Short,
            ..WritingInstructions::default()
        };
        for seed in 0..20 {
            let mut req = request(&character, "the road continues east", &narrative);
            req.instructions = Some(&instructions);
            let mut rng = StdRng::seed_from_u64(seed);
            let reply = synth.respond(&req, &moods, &mut rng);
            assert!(split_sentences(&reply).len() <= 1, "not short: {reply}");
            assert!(reply.len() <= 110, "too long for short: {reply}");
        }
    }

    #[test]
    fn high_tension_conflict_gets_urgency() {
        let synth = synthesizer();
        let character = hero();
        let mut narrative = NarrativeContext::default();
        narrative.current_phase = crate::schema::narrative::NarrativePhase::Climax;
        narrative.current_tension = crate::schema::narrative::Tension::VeryHigh;
        let moods = MoodTracker::new();

        for seed in 0..20 {
            let req = request(&character, "the road continues east", &narrative);
            let mut rng = StdRng::seed_from_u64(seed);
            let reply = synth.respond(&req, &moods, &mut rng);
            assert!(
                has_action_span(&reply) || contains_any(&reply, URGENCY_WORDS),
                "flat reply in climax: {reply}"
            );
        }
    }

    #[test]
    fn scene_fragment_is_woven_in() {
        let synth = synthesizer();
        let character = hero();
        let narrative = NarrativeContext::default();
        let moods = MoodTracker::new();
        let mut req = request(&character, "hello", &narrative);
        req.scene_fragment = Some("the torches gutter");
        let mut rng = StdRng::seed_from_u64(9);
        let reply = synth.respond(&req, &moods, &mut rng);
        assert!(reply.contains("*the torches gutter*"), "{reply}");
    }

    #[test]
    fn battle_window_uses_battle_interaction() {
        let synth = synthesizer();
        let character = hero();
        let narrative = NarrativeContext::default();
        let recent = vec![Message::character(1, "Brin", "they attack from the ridge!")];
        let mut rng = StdRng::seed_from_u64(10);
        let line = synth.interaction(
            &character,
            "Brin",
            "hold the line!",
            &recent,
            &narrative,
            None,
            &mut rng,
        );
        assert!(line.contains("Brin"), "{line}");
    }

    #[test]
    fn social_interaction_mentions_target_and_topic() {
        let synth = synthesizer();
        let character = hero();
        let narrative = NarrativeContext::default();
        let recent = vec![Message::character(1, "Brin", "a calm evening")];
        let mut rng = StdRng::seed_from_u64(11);
        let line = synth.interaction(
            &character,
            "Brin",
            "the prophecy troubles me",
            &recent,
            &narrative,
            None,
            &mut rng,
        );
        assert!(line.contains("Brin"), "{line}");
    }

    #[test]
    fn hostile_pairs_never_draw_from_friendly_set() {
        let synth = synthesizer();
        let character = hero();
        let mut relationship = Relationship::new("Elara", "Brin");
        relationship.affinity = -6;
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..50 {
            let line = synth.social_interaction(
                &character,
                "Brin",
                "a plan for the journey",
                Some(&relationship),
                &mut rng,
            );
            assert!(
                !line.contains("has the right of it") && !line.contains("good idea"),
                "friendly line from hostile pair: {line}"
            );
        }
    }

    #[test]
    fn fallback_lines_are_context_keyed() {
        let synth = synthesizer();
        let spacer = Character::new("Vex", CharacterType::Scifi);
        assert!(synth.fallback_line(&spacer, false).contains("mission"));
        assert!(synth.fallback_line(&spacer, true).contains("threat"));
    }

    #[test]
    fn sentence_splitter_keeps_action_spans_whole() {
        let sentences = split_sentences("*nods. slowly* We go east. Now.");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0], "*nods. slowly* We go east.");
        assert_eq!(sentences[1], "Now.");
    }
}
