/// Relationship tracking — signed affinity per character pair, an
/// interaction log, qualitative band descriptions, and callback lines
/// that let characters reference past exchanges.
use chrono::Utc;
use rand::Rng;
use rustc_hash::FxHashMap;

use crate::schema::character::Personality;
use crate::schema::relationship::{Interaction, Relationship, INTERACTION_CAP};

/// Session-scoped store, keyed by the canonical unordered pair.
#[derive(Debug, Clone, Default)]
pub struct RelationshipTracker {
    relationships: FxHashMap<(String, String), Relationship>,
}

impl RelationshipTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create-on-read: a missing pair starts neutral at affinity 0.
    pub fn get(&mut self, a: &str, b: &str) -> &Relationship {
        let key = Relationship::pair_key(a, b);
        self.relationships
            .entry(key)
            .or_insert_with(|| Relationship::new(a, b))
    }

    /// Peek without creating.
    pub fn peek(&self, a: &str, b: &str) -> Option<&Relationship> {
        self.relationships.get(&Relationship::pair_key(a, b))
    }

    /// Apply an update and return the new state.
    pub fn update(
        &mut self,
        a: &str,
        b: &str,
        initiator: &str,
        message: &str,
        affinity_delta: i32,
        interaction_type: &str,
    ) -> Relationship {
        let key = Relationship::pair_key(a, b);
        let current = self
            .relationships
            .entry(key)
            .or_insert_with(|| Relationship::new(a, b));
        let updated =
            update_relationship(current, initiator, message, affinity_delta, interaction_type);
        *current = updated.clone();
        updated
    }

    /// All tracked relationships, for snapshots.
    pub fn all(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    /// The pair with the largest |affinity|, if any pair is non-neutral.
    pub fn most_polarized(&self) -> Option<&Relationship> {
        self.relationships
            .values()
            .filter(|r| r.affinity != 0)
            .max_by_key(|r| r.affinity.abs())
    }
}

/// Pure update: re-clamp affinity, prepend the interaction record,
/// truncate the log, stamp `last_interaction`.
pub fn update_relationship(
    relationship: &Relationship,
    initiator: &str,
    message: &str,
    affinity_delta: i32,
    interaction_type: &str,
) -> Relationship {
    let now = Utc::now();
    let mut interactions = Vec::with_capacity(relationship.interactions.len() + 1);
    interactions.push(Interaction {
        timestamp: now,
        initiator: initiator.to_string(),
        excerpt: excerpt(message),
        interaction_type: interaction_type.to_string(),
        affinity_delta,
    });
    interactions.extend(relationship.interactions.iter().cloned());
    interactions.truncate(INTERACTION_CAP);

    Relationship {
        characters: relationship.characters.clone(),
        affinity: (relationship.affinity + affinity_delta).clamp(-10, 10),
        interactions,
        last_interaction: Some(now),
    }
}

fn excerpt(message: &str) -> String {
    const EXCERPT_LEN: usize = 60;
    if message.len() <= EXCERPT_LEN {
        message.to_string()
    } else {
        let cut = message
            .char_indices()
            .take_while(|(i, _)| *i < EXCERPT_LEN)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}…", &message[..cut])
    }
}

/// Qualitative label for an affinity value, in seven bands.
pub fn describe_affinity(affinity: i32) -> &'static str {
    match affinity {
        i32::MIN..=-8 => "bitter enemies",
        -7..=-5 => "hostile",
        -4..=-2 => "wary of each other",
        -1..=1 => "neutral acquaintances",
        2..=4 => "friendly",
        5..=7 => "close friends",
        _ => "very close friends",
    }
}

/// Whether a reply should call back to a past interaction.
///
/// More analytical and philosophical characters reference history more:
/// probability is 0.15 + 0.2 * (analytical + philosophical) / 20.
pub fn should_reference_past<R: Rng>(personality: &Personality, rng: &mut R) -> bool {
    let p = 0.15
        + 0.2 * (personality.analytical as f64 + personality.philosophical as f64) / 20.0;
    rng.gen_bool(p.min(1.0))
}

/// Render a callback sentence about a stored interaction.
///
/// Samples up to 3 stored records and keeps the most affinity-extreme
/// of them, then phrases the callback by interaction type and delta
/// sign. Returns None when the log is empty.
pub fn past_reference<R: Rng>(relationship: &Relationship, rng: &mut R) -> Option<String> {
    if relationship.interactions.is_empty() {
        return None;
    }

    let mut chosen: Option<&Interaction> = None;
    for _ in 0..3.min(relationship.interactions.len()) {
        let candidate = &relationship.interactions[rng.gen_range(0..relationship.interactions.len())];
        chosen = match chosen {
            Some(prev) if prev.affinity_delta.abs() >= candidate.affinity_delta.abs() => Some(prev),
            _ => Some(candidate),
        };
    }
    let interaction = chosen?;

    let line = match (interaction.interaction_type.as_str(), interaction.affinity_delta >= 0) {
        ("conflict", _) | (_, false) => format!(
            "I haven't forgotten our last exchange, {}.",
            interaction.initiator
        ),
        ("support", true) => format!(
            "You stood by me before, {} — I remember that.",
            interaction.initiator
        ),
        ("humor", true) => format!(
            "This reminds me of that joke of yours, {}.",
            interaction.initiator
        ),
        _ => format!(
            "Like you said before, {} — \"{}\"",
            interaction.initiator, interaction.excerpt
        ),
    };
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn create_on_read_starts_neutral() {
        let mut tracker = RelationshipTracker::new();
        let r = tracker.get("Anna", "Brin");
        assert_eq!(r.affinity, 0);
        assert!(r.interactions.is_empty());
    }

    #[test]
    fn affinity_clamps_at_ten() {
        let mut tracker = RelationshipTracker::new();
        for _ in 0..4 {
            tracker.update("Anna", "Brin", "Anna", "wonderful work", 3, "support");
        }
        let r = tracker.peek("Anna", "Brin").unwrap();
        assert_eq!(r.affinity, 10);
    }

    #[test]
    fn affinity_clamps_at_negative_ten() {
        let mut tracker = RelationshipTracker::new();
        for _ in 0..5 {
            tracker.update("Anna", "Brin", "Brin", "you traitor", -3, "conflict");
        }
        assert_eq!(tracker.peek("Anna", "Brin").unwrap().affinity, -10);
    }

    #[test]
    fn interaction_log_caps_at_ten_newest_first() {
        let mut tracker = RelationshipTracker::new();
        for i in 0..13 {
            tracker.update("Anna", "Brin", "Anna", &format!("message {i}"), 0, "chat");
        }
        let r = tracker.peek("Anna", "Brin").unwrap();
        assert_eq!(r.interactions.len(), INTERACTION_CAP);
        assert_eq!(r.interactions[0].excerpt, "message 12");
        assert_eq!(r.interactions[9].excerpt, "message 3");
    }

    #[test]
    fn update_is_symmetric_over_order() {
        let mut tracker = RelationshipTracker::new();
        tracker.update("Brin", "Anna", "Brin", "hello", 1, "chat");
        assert_eq!(tracker.peek("Anna", "Brin").unwrap().affinity, 1);
    }

    #[test]
    fn affinity_bands() {
        assert_eq!(describe_affinity(-10), "bitter enemies");
        assert_eq!(describe_affinity(-6), "hostile");
        assert_eq!(describe_affinity(-3), "wary of each other");
        assert_eq!(describe_affinity(0), "neutral acquaintances");
        assert_eq!(describe_affinity(3), "friendly");
        assert_eq!(describe_affinity(6), "close friends");
        assert_eq!(describe_affinity(9), "very close friends");
    }

    #[test]
    fn reference_probability_scales_with_traits() {
        let bookish = Personality {
            analytical: 10,
            philosophical: 10,
            ..Personality::default()
        };
        let impulsive = Personality {
            analytical: 1,
            philosophical: 1,
            ..Personality::default()
        };

        let mut rng = StdRng::seed_from_u64(7);
        let trials = 2000;
        let bookish_hits = (0..trials)
            .filter(|_| should_reference_past(&bookish, &mut rng))
            .count();
        let impulsive_hits = (0..trials)
            .filter(|_| should_reference_past(&impulsive, &mut rng))
            .count();

        // Expected rates: 0.35 vs 0.17.
        assert!(bookish_hits > impulsive_hits);
        assert!(bookish_hits > trials / 4);
        assert!(impulsive_hits < trials / 4);
    }

    #[test]
    fn past_reference_empty_log_is_none() {
        let r = Relationship::new("Anna", "Brin");
        let mut rng = StdRng::seed_from_u64(1);
        assert!(past_reference(&r, &mut rng).is_none());
    }

    #[test]
    fn past_reference_mentions_initiator() {
        let mut tracker = RelationshipTracker::new();
        let r = tracker.update("Anna", "Brin", "Brin", "I will guard the gate", 2, "support");
        let mut rng = StdRng::seed_from_u64(3);
        let line = past_reference(&r, &mut rng).unwrap();
        assert!(line.contains("Brin"));
    }

    #[test]
    fn excerpt_truncates_long_messages() {
        let long = "a".repeat(200);
        let mut tracker = RelationshipTracker::new();
        let r = tracker.update("Anna", "Brin", "Anna", &long, 0, "chat");
        assert!(r.interactions[0].excerpt.chars().count() <= 61);
    }
}
