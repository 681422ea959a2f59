use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hard cap on stored interaction records per pair.
pub const INTERACTION_CAP: usize = 10;

/// One recorded exchange between a pair, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub timestamp: DateTime<Utc>,
    pub initiator: String,
    /// Short excerpt of the message that caused the update.
    pub excerpt: String,
    pub interaction_type: String,
    pub affinity_delta: i32,
}

/// Time-varying state for one unordered character pair.
///
/// Symmetric: either participant may be the "self" when queried.
/// Invariant: `affinity` stays in [-10, 10].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    /// Exactly two names, sorted so the pair key is canonical.
    pub characters: [String; 2],
    pub affinity: i32,
    /// Newest first, at most [`INTERACTION_CAP`] entries.
    pub interactions: Vec<Interaction>,
    pub last_interaction: Option<DateTime<Utc>>,
}

impl Relationship {
    /// Fresh neutral relationship for an unordered pair.
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        let characters = if a <= b { [a, b] } else { [b, a] };
        Self {
            characters,
            affinity: 0,
            interactions: Vec::new(),
            last_interaction: None,
        }
    }

    /// Canonical lookup key for an unordered pair.
    pub fn pair_key(a: &str, b: &str) -> (String, String) {
        if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }

    /// The other participant's name, given one side of the pair.
    pub fn other(&self, name: &str) -> &str {
        if self.characters[0] == name {
            &self.characters[1]
        } else {
            &self.characters[0]
        }
    }

    pub fn involves(&self, name: &str) -> bool {
        self.characters[0] == name || self.characters[1] == name
    }
}
