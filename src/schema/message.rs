use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Desired length of a synthesized reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseLength {
    Short,
    #[default]
    Medium,
    Long,
}

/// User-supplied style configuration. A pass-through modifier consumed
/// by the response synthesizer; it never evolves.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WritingInstructions {
    /// e.g. "terse", "flowery" — overrides the mood-keyed prefix.
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub use_emoji: bool,
    #[serde(default)]
    pub response_length: ResponseLength,
    #[serde(default)]
    pub character_reminders: Vec<String>,
    #[serde(default)]
    pub general_notes: Option<String>,
}

/// One entry in the append-only conversation log.
///
/// Entries are only ever replaced wholesale (same `id`) when a prior
/// reply is explicitly regenerated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    /// None for system messages.
    pub speaker: Option<String>,
    /// May embed `*action*` spans.
    pub message: String,
    #[serde(default)]
    pub is_user: bool,
    #[serde(default)]
    pub is_action: bool,
    #[serde(default)]
    pub system: bool,
    #[serde(default)]
    pub is_narration: bool,
    #[serde(default)]
    pub is_environmental_event: bool,
    pub timestamp: DateTime<Utc>,
    /// Id of the message this one answers, when known.
    #[serde(default)]
    pub reply_to: Option<u64>,
    /// Snapshot of the instructions active when this was generated.
    #[serde(default)]
    pub writing_instructions: Option<WritingInstructions>,
}

impl Message {
    pub fn user(id: u64, speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            speaker: Some(speaker.into()),
            message: text.into(),
            is_user: true,
            is_action: false,
            system: false,
            is_narration: false,
            is_environmental_event: false,
            timestamp: Utc::now(),
            reply_to: None,
            writing_instructions: None,
        }
    }

    pub fn character(id: u64, speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            is_user: false,
            ..Self::user(id, speaker, text)
        }
    }

    pub fn system(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            speaker: None,
            message: text.into(),
            is_user: false,
            is_action: false,
            system: true,
            is_narration: false,
            is_environmental_event: false,
            timestamp: Utc::now(),
            reply_to: None,
            writing_instructions: None,
        }
    }

    pub fn environmental(id: u64, text: impl Into<String>) -> Self {
        Self {
            is_narration: true,
            is_environmental_event: true,
            ..Self::system(id, text)
        }
    }

    /// True when the whole message is a single `*action*` span.
    pub fn is_pure_action(&self) -> bool {
        let t = self.message.trim();
        t.len() > 2 && t.starts_with('*') && t.ends_with('*') && !t[1..t.len() - 1].contains('*')
    }

    /// True when the text embeds at least one `*action*` span.
    pub fn has_action_span(&self) -> bool {
        has_action_span(&self.message)
    }
}

/// True when `text` contains a `*...*` span with content.
pub fn has_action_span(text: &str) -> bool {
    let mut open = None;
    for (i, ch) in text.char_indices() {
        if ch == '*' {
            match open {
                None => open = Some(i),
                Some(start) => {
                    if i > start + 1 {
                        return true;
                    }
                    open = None;
                }
            }
        }
    }
    false
}

/// Remove every `*action*` span from `text`, leaving plain dialogue.
pub fn strip_action_spans(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut inside = false;
    for ch in text.chars() {
        if ch == '*' {
            inside = !inside;
            continue;
        }
        if !inside {
            out.push(ch);
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
