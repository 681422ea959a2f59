/// Theme/topic extraction — purely lexical, no external NLP.
///
/// Pulls name-like tokens, objects, places, concepts, actions, and
/// location terms out of raw text. Deterministic given identical input;
/// consumers may sample randomly among the returned topics.
use rustc_hash::FxHashSet;

use crate::schema::message::{strip_action_spans, Message};

/// Maximum number of topics returned per extraction.
pub const MAX_TOPICS: usize = 10;

/// Tokens never treated as topics.
const STOP_WORDS: &[&str] = &[
    "this", "that", "with", "from", "have", "will", "would", "could", "should", "there", "their",
    "about", "which", "when", "what", "where", "your", "then", "than", "them", "they", "were",
    "been", "being", "because", "while", "into", "over", "just", "like", "some", "something",
    "really", "very", "here", "these", "those", "does", "doing", "going", "want", "know", "think",
    "said", "says", "tell", "told", "well", "okay", "yeah", "right", "sure", "dont", "cant",
];

const OBJECT_WORDS: &[&str] = &[
    "sword", "shield", "blade", "staff", "wand", "scroll", "tome", "book", "potion", "amulet",
    "ring", "crown", "key", "chest", "treasure", "gold", "blaster", "phaser", "console",
    "terminal", "datapad", "engine", "reactor", "ship", "artifact", "relic", "weapon", "armor",
    "cloak", "torch", "lantern", "rope", "dagger",
];

const PLACE_WORDS: &[&str] = &[
    "castle", "tower", "dungeon", "forest", "mountain", "river", "village", "city", "tavern",
    "temple", "ruins", "cave", "bridge", "gate", "harbor", "station", "bridge", "cargo",
    "airlock", "laboratory", "market", "palace", "library", "crypt", "shrine", "camp",
];

const CONCEPT_WORDS: &[&str] = &[
    "magic", "destiny", "prophecy", "honor", "betrayal", "loyalty", "courage", "freedom",
    "justice", "revenge", "power", "secret", "mystery", "truth", "curse", "blessing", "alliance",
    "rebellion", "mission", "quest", "journey", "legend", "memory", "hope", "fear", "trust",
];

const ACTION_WORDS: &[&str] = &[
    "fight", "attack", "defend", "escape", "explore", "search", "travel", "climb", "swim",
    "steal", "rescue", "hunt", "chase", "hide", "negotiate", "train", "build", "repair",
    "investigate", "discover", "ambush", "retreat", "charge", "guard",
];

const LOCATION_WORDS: &[&str] = &[
    "north", "south", "east", "west", "nearby", "distant", "beyond", "underground", "upstairs",
    "outside", "inside", "above", "below", "horizon",
];

/// Extract up to [`MAX_TOPICS`] topic strings from raw text.
///
/// Tokens are ranked by category: names first (capitalized-word
/// heuristic), then objects, places, concepts, actions, locations, and
/// finally any remaining long tokens in order of appearance.
pub fn extract_topics(text: &str) -> Vec<String> {
    let stripped = strip_action_spans(text);
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut names = Vec::new();
    let mut objects = Vec::new();
    let mut places = Vec::new();
    let mut concepts = Vec::new();
    let mut actions = Vec::new();
    let mut locations = Vec::new();
    let mut leftovers = Vec::new();

    for (i, raw) in stripped.split_whitespace().enumerate() {
        let word: String = raw.chars().filter(|c| c.is_alphanumeric()).collect();
        if word.len() <= 3 {
            continue;
        }
        let lower = word.to_lowercase();
        if STOP_WORDS.contains(&lower.as_str()) {
            continue;
        }
        if !seen.insert(lower.clone()) {
            continue;
        }

        // Sentence-initial capitals are unreliable name evidence.
        let capitalized = word.chars().next().is_some_and(|c| c.is_uppercase()) && i > 0;

        if capitalized {
            names.push(word);
        } else if OBJECT_WORDS.contains(&lower.as_str()) {
            objects.push(lower);
        } else if PLACE_WORDS.contains(&lower.as_str()) {
            places.push(lower);
        } else if CONCEPT_WORDS.contains(&lower.as_str()) {
            concepts.push(lower);
        } else if ACTION_WORDS.contains(&lower.as_str()) {
            actions.push(lower);
        } else if LOCATION_WORDS.contains(&lower.as_str()) {
            locations.push(lower);
        } else {
            leftovers.push(lower);
        }
    }

    let mut out = names;
    out.extend(objects);
    out.extend(places);
    out.extend(concepts);
    out.extend(actions);
    out.extend(locations);
    out.extend(leftovers);
    out.truncate(MAX_TOPICS);
    out
}

/// Extract topics from a window of messages, skipping system entries.
pub fn extract_from_window(window: &[Message]) -> Vec<String> {
    let combined: String = window
        .iter()
        .filter(|m| !m.system)
        .map(|m| m.message.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    extract_topics(&combined)
}

/// True when `text` reads as a question.
pub fn is_question(text: &str) -> bool {
    let stripped = strip_action_spans(text);
    let t = stripped.trim().to_lowercase();
    t.ends_with('?')
        || t.starts_with("who ")
        || t.starts_with("what ")
        || t.starts_with("where ")
        || t.starts_with("when ")
        || t.starts_with("why ")
        || t.starts_with("how ")
        || t.starts_with("do you")
        || t.starts_with("can you")
        || t.starts_with("could you")
        || t.starts_with("would you")
}

/// True when `text` opens with a greeting.
pub fn is_greeting(text: &str) -> bool {
    let stripped = strip_action_spans(text);
    let t = stripped.trim().to_lowercase();
    const GREETINGS: &[&str] = &[
        "hello", "hi ", "hi!", "hi,", "hey", "greetings", "good morning", "good evening",
        "good day", "howdy", "salutations", "well met",
    ];
    t == "hi" || GREETINGS.iter().any(|g| t.starts_with(g))
}
