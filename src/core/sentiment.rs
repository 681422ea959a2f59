/// Sentiment and emotional-tone analysis — fixed keyword families plus
/// punctuation heuristics. Both classifiers are pure functions of the
/// input window.
use crate::schema::message::Message;
use crate::schema::narrative::{EmotionalTone, Sentiment};

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "wonderful", "amazing", "love", "happy", "glad", "excellent", "fantastic",
    "beautiful", "perfect", "thank", "thanks", "friend", "joy", "delight", "brilliant", "safe",
    "peace", "hope", "trust", "kind", "warm", "laugh", "smile", "victory", "success",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "hate", "angry", "sad", "horrible", "worst", "fear", "afraid",
    "danger", "threat", "enemy", "betray", "hurt", "pain", "dark", "death", "kill", "attack",
    "cruel", "lose", "loss", "fail", "wrong", "never", "alone", "cold",
];

struct ToneFamily {
    tone: EmotionalTone,
    keywords: &'static [&'static str],
}

const TONE_FAMILIES: &[ToneFamily] = &[
    ToneFamily {
        tone: EmotionalTone::Angry,
        keywords: &["angry", "furious", "rage", "hate", "fight", "enough", "damn", "outrage"],
    },
    ToneFamily {
        tone: EmotionalTone::Sad,
        keywords: &["sad", "sorrow", "cry", "tears", "grief", "mourn", "miss", "lost", "alone"],
    },
    ToneFamily {
        tone: EmotionalTone::Happy,
        keywords: &["happy", "joy", "laugh", "smile", "wonderful", "great", "love", "celebrate"],
    },
    ToneFamily {
        tone: EmotionalTone::Afraid,
        keywords: &["afraid", "fear", "terrified", "scared", "dread", "panic", "horror"],
    },
    ToneFamily {
        tone: EmotionalTone::Surprised,
        keywords: &["surprised", "shocked", "unbelievable", "suddenly", "unexpected", "gasp"],
    },
    ToneFamily {
        tone: EmotionalTone::Tense,
        keywords: &["tense", "danger", "careful", "threat", "warning", "trap", "quiet", "wait"],
    },
    ToneFamily {
        tone: EmotionalTone::Curious,
        keywords: &["curious", "wonder", "why", "how", "strange", "mystery", "question", "odd"],
    },
    ToneFamily {
        tone: EmotionalTone::Determined,
        keywords: &["determined", "must", "will", "promise", "swear", "mission", "resolve", "duty"],
    },
];

/// A tone family must reach this count to displace Neutral.
const TONE_THRESHOLD: u32 = 2;

fn count_occurrences(text: &str, words: &[&str]) -> u32 {
    let lower = text.to_lowercase();
    words
        .iter()
        .map(|w| lower.matches(w).count() as u32)
        .sum()
}

/// Classify a piece of text as positive, negative, or neutral.
pub fn analyze_sentiment(text: &str) -> Sentiment {
    let pos = count_occurrences(text, POSITIVE_WORDS);
    let neg = count_occurrences(text, NEGATIVE_WORDS);
    if pos > neg {
        Sentiment::Positive
    } else if neg > pos {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Signed affinity delta for a relationship update: positive minus
/// negative keyword count, clamped to [-3, 3].
pub fn affinity_delta(text: &str) -> i32 {
    let pos = count_occurrences(text, POSITIVE_WORDS) as i32;
    let neg = count_occurrences(text, NEGATIVE_WORDS) as i32;
    (pos - neg).clamp(-3, 3)
}

/// Dominant emotional tone of a piece of text.
///
/// Exclamation marks boost the angry/happy/surprised families, question
/// marks boost curious. Returns Neutral unless some family counts at
/// least [`TONE_THRESHOLD`].
pub fn dominant_tone(text: &str) -> EmotionalTone {
    let bangs = text.matches('!').count() as u32;
    let questions = text.matches('?').count() as u32;

    let mut best = EmotionalTone::Neutral;
    let mut best_count = 0u32;
    for family in TONE_FAMILIES {
        let mut count = count_occurrences(text, family.keywords);
        match family.tone {
            EmotionalTone::Angry | EmotionalTone::Happy | EmotionalTone::Surprised => {
                count += bangs
            }
            EmotionalTone::Curious => count += questions,
            _ => {}
        }
        if count > best_count {
            best_count = count;
            best = family.tone;
        }
    }

    if best_count >= TONE_THRESHOLD {
        best
    } else {
        EmotionalTone::Neutral
    }
}

/// Dominant tone over a message window, skipping system entries.
pub fn window_tone(window: &[Message]) -> EmotionalTone {
    let combined: String = window
        .iter()
        .filter(|m| !m.system)
        .map(|m| m.message.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    dominant_tone(&combined)
}

/// Sentiment over a message window, skipping system entries.
pub fn window_sentiment(window: &[Message]) -> Sentiment {
    let combined: String = window
        .iter()
        .filter(|m| !m.system)
        .map(|m| m.message.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    analyze_sentiment(&combined)
}
