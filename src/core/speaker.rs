/// Speaker and responder selection — who talks next, and in what order.
use rand::Rng;

use crate::core::moods::{is_intense, MoodTracker};
use crate::schema::character::Character;

/// Probability that an intense-mood character seizes the floor.
const INTENSE_GATE: f64 = 0.7;

fn mentioned_in(text: &str, name: &str) -> bool {
    text.to_lowercase().contains(&name.to_lowercase())
}

/// Pick the single character who should speak next.
///
/// The previous speaker is excluded. Mentioned characters outrank
/// intense-mood characters, which outrank the talkativeness-weighted
/// default draw.
pub fn next_speaker<'a, R: Rng>(
    characters: &'a [Character],
    last_message: &str,
    last_speaker: Option<&str>,
    moods: &MoodTracker,
    rng: &mut R,
) -> Option<&'a Character> {
    let candidates: Vec<&Character> = characters
        .iter()
        .filter(|c| Some(c.name.as_str()) != last_speaker)
        .collect();

    match candidates.len() {
        0 => return None,
        1 => return Some(candidates[0]),
        _ => {}
    }

    let mentioned: Vec<&Character> = candidates
        .iter()
        .copied()
        .filter(|c| mentioned_in(last_message, &c.name))
        .collect();
    if !mentioned.is_empty() {
        return Some(mentioned[rng.gen_range(0..mentioned.len())]);
    }

    let intense: Vec<&Character> = candidates
        .iter()
        .copied()
        .filter(|c| moods.peek(&c.name).is_some_and(is_intense))
        .collect();
    if !intense.is_empty() && rng.gen_bool(INTENSE_GATE) {
        return Some(intense[rng.gen_range(0..intense.len())]);
    }

    Some(weighted_pick(&candidates, rng))
}

/// Talkativeness-weighted draw over the cumulative weight sum.
/// Ties resolve by list order; the degenerate fallback is the
/// highest-weight candidate.
fn weighted_pick<'a, R: Rng>(candidates: &[&'a Character], rng: &mut R) -> &'a Character {
    let total: u32 = candidates.iter().map(|c| c.talkativeness as u32).sum();
    if total > 0 {
        let draw = rng.gen_range(0..total);
        let mut cumulative = 0u32;
        for candidate in candidates {
            cumulative += candidate.talkativeness as u32;
            if cumulative > draw {
                return candidate;
            }
        }
    }
    // Degenerate fallback: first candidate carrying the highest weight.
    let mut best = candidates[0];
    for candidate in &candidates[1..] {
        if candidate.talkativeness > best.talkativeness {
            best = candidate;
        }
    }
    best
}

/// Pick up to `max_responders` characters, in responding order.
///
/// Mentions first, then intense-mood characters each at the 70% gate,
/// then the talkativeness-sorted remainder until the cap.
pub fn responders<'a, R: Rng>(
    characters: &'a [Character],
    last_message: &str,
    last_speaker: Option<&str>,
    max_responders: usize,
    moods: &MoodTracker,
    rng: &mut R,
) -> Vec<&'a Character> {
    let candidates: Vec<&Character> = characters
        .iter()
        .filter(|c| Some(c.name.as_str()) != last_speaker)
        .collect();

    let mut selected: Vec<&Character> = Vec::new();

    for candidate in &candidates {
        if mentioned_in(last_message, &candidate.name) {
            selected.push(candidate);
        }
    }

    for candidate in &candidates {
        if selected.iter().any(|s| s.name == candidate.name) {
            continue;
        }
        if moods.peek(&candidate.name).is_some_and(is_intense) && rng.gen_bool(INTENSE_GATE) {
            selected.push(candidate);
        }
    }

    selected.truncate(max_responders);

    if selected.len() < max_responders {
        let mut remainder: Vec<&Character> = candidates
            .iter()
            .filter(|c| !selected.iter().any(|s| s.name == c.name))
            .copied()
            .collect();
        remainder.sort_by(|a, b| b.talkativeness.cmp(&a.talkativeness));
        for candidate in remainder {
            if selected.len() >= max_responders {
                break;
            }
            selected.push(candidate);
        }
    }

    selected
}
