/// Narrative direction — phase inference, branch and environmental
/// event pacing, and per-reply guidance hints.
use rand::Rng;

use crate::core::sentiment::window_tone;
use crate::core::topics::is_question;
use crate::schema::message::Message;
use crate::schema::narrative::{EmotionalTone, NarrativeContext, NarrativePhase, Tension};

/// Below this spacing a branch is never proposed.
pub const BRANCH_MIN_SPACING: u32 = 8;
/// At or above this spacing a branch is always proposed.
pub const BRANCH_MAX_SPACING: u32 = 12;
/// Below this spacing an environmental event never fires.
pub const EVENT_MIN_SPACING: u32 = 5;

/// Phase from conversation length alone.
pub fn phase_from_length(message_count: usize) -> NarrativePhase {
    match message_count {
        0..=9 => NarrativePhase::Introduction,
        10..=24 => NarrativePhase::RisingAction,
        25..=39 => NarrativePhase::Conflict,
        40..=59 => NarrativePhase::Climax,
        _ => NarrativePhase::Resolution,
    }
}

/// Infer the current phase from the full history, nudged by tone.
///
/// Tense or angry tone accelerates the early phases toward conflict;
/// happy tone can regress conflict back to rising action with 30%
/// probability so escalation never fights the room's mood.
pub fn infer_phase<R: Rng>(history: &[Message], rng: &mut R) -> NarrativePhase {
    let base = phase_from_length(history.len());
    let window_start = history.len().saturating_sub(6);
    let tone = window_tone(&history[window_start..]);

    let phase = match (base, tone) {
        (NarrativePhase::Introduction, t) if t.is_escalating() => NarrativePhase::RisingAction,
        (NarrativePhase::RisingAction, t) if t.is_escalating() => NarrativePhase::Conflict,
        (NarrativePhase::Conflict, t) if t.is_positive() && rng.gen_bool(0.3) => {
            NarrativePhase::RisingAction
        }
        (p, _) => p,
    };
    if phase != base {
        tracing::debug!(?base, ?phase, ?tone, "tone nudged narrative phase");
    }
    phase
}

/// Branch-proposal pacing: never below the minimum spacing, always at
/// the maximum, linearly increasing probability in between.
pub fn should_propose_branch<R: Rng>(messages_since_last_branch: u32, rng: &mut R) -> bool {
    if messages_since_last_branch < BRANCH_MIN_SPACING {
        return false;
    }
    if messages_since_last_branch >= BRANCH_MAX_SPACING {
        return true;
    }
    let p = (messages_since_last_branch - BRANCH_MIN_SPACING) as f64
        / (BRANCH_MAX_SPACING - BRANCH_MIN_SPACING) as f64;
    rng.gen_bool(p)
}

/// Environmental-event pacing: same shape as branch pacing, with the
/// slope scaled up under dramatic tension.
pub fn should_trigger_environmental_event<R: Rng>(
    context: &NarrativeContext,
    messages_since_last_event: u32,
    rng: &mut R,
) -> bool {
    if messages_since_last_event < EVENT_MIN_SPACING {
        return false;
    }
    let slope = match context.current_tension {
        Tension::Low => 0.08,
        Tension::Medium => 0.12,
        Tension::High => 0.18,
        Tension::VeryHigh => 0.25,
    };
    let p = ((messages_since_last_event - EVENT_MIN_SPACING) as f64 * slope).min(1.0);
    rng.gen_bool(p)
}

/// Per-reply guidance for the response synthesizer.
#[derive(Debug, Clone, Default)]
pub struct ReplyGuidance {
    /// What the reply should accomplish, phase-derived.
    pub goal: String,
    /// How to go about it.
    pub approach: String,
    /// A topic worth steering toward, when one stands out.
    pub topic: Option<String>,
    /// Emotional register hint.
    pub emotional: String,
    /// "dialogue" or "action" pacing preference.
    pub pace: &'static str,
    /// Free-text continuity notes.
    pub notes: Vec<String>,
}

/// Compute guidance for a prospective speaker from the recent window.
pub fn guidance(
    speaker: &str,
    history: &[Message],
    context: &NarrativeContext,
    topics: &[String],
) -> ReplyGuidance {
    let mut g = ReplyGuidance {
        pace: "dialogue",
        ..ReplyGuidance::default()
    };

    match context.current_phase {
        NarrativePhase::Introduction | NarrativePhase::Discovery => {
            g.goal = "establish who everyone is and what is at stake".to_string();
            g.approach = "ask questions, share small details".to_string();
            g.emotional = "open, curious".to_string();
        }
        NarrativePhase::RisingAction | NarrativePhase::Planning => {
            g.goal = "build on what was just said and raise the stakes".to_string();
            g.approach = "add complications, voice doubts".to_string();
            g.emotional = "engaged, wary".to_string();
        }
        NarrativePhase::Conflict | NarrativePhase::Climax => {
            g.goal = "press the confrontation toward a turning point".to_string();
            g.approach = "commit to a side, act decisively".to_string();
            g.emotional = "urgent, charged".to_string();
        }
        NarrativePhase::Resolution => {
            g.goal = "wind down and reflect on what happened".to_string();
            g.approach = "reconcile, take stock".to_string();
            g.emotional = "settled, thoughtful".to_string();
        }
    }

    g.topic = topics.first().cloned();

    let window_start = history.len().saturating_sub(8);
    let window = &history[window_start..];

    // A speaker dominating recent turns should pull others in.
    let spoken: Vec<&Message> = window.iter().filter(|m| !m.system).collect();
    if !spoken.is_empty() {
        let own = spoken
            .iter()
            .filter(|m| m.speaker.as_deref() == Some(speaker))
            .count();
        if own * 2 > spoken.len() {
            g.notes
                .push("you have been dominating the conversation; invite someone else in".to_string());
        }
    }

    // Answer the oldest question nobody has replied to.
    if let Some(question) = oldest_unanswered_question(window) {
        g.notes.push(format!(
            "an unanswered question is still hanging: \"{}\"",
            question.message.trim()
        ));
    }

    // Action-beat density: too flat favors a physical action, too busy
    // favors plain dialogue.
    let action_beats = window.iter().filter(|m| m.has_action_span()).count();
    if action_beats == 0 && window.len() >= 4 {
        g.pace = "action";
        g.notes
            .push("the scene has gone static; a physical action would help".to_string());
    } else if action_beats > 4 {
        g.pace = "dialogue";
        g.notes
            .push("plenty of motion already; let the characters talk".to_string());
    }

    // Flat tone during the confrontational phases argues for escalation.
    if context.current_phase.is_confrontational() && window_tone(window) == EmotionalTone::Neutral {
        g.notes
            .push("the tone is flat for this point in the story; escalate the emotional intensity".to_string());
    }

    g
}

/// The oldest question in the window that no later message answers.
pub fn oldest_unanswered_question(window: &[Message]) -> Option<&Message> {
    window
        .iter()
        .filter(|m| !m.system && is_question(&m.message))
        .find(|q| !window.iter().any(|m| m.reply_to == Some(q.id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn msg(id: u64, speaker: &str, text: &str) -> Message {
        Message::character(id, speaker, text)
    }

    fn neutral_history(len: usize) -> Vec<Message> {
        (0..len)
            .map(|i| msg(i as u64, "Anna", "the road continues"))
            .collect()
    }

    #[test]
    fn phase_thresholds() {
        assert_eq!(phase_from_length(0), NarrativePhase::Introduction);
        assert_eq!(phase_from_length(9), NarrativePhase::Introduction);
        assert_eq!(phase_from_length(10), NarrativePhase::RisingAction);
        assert_eq!(phase_from_length(24), NarrativePhase::RisingAction);
        assert_eq!(phase_from_length(25), NarrativePhase::Conflict);
        assert_eq!(phase_from_length(40), NarrativePhase::Climax);
        assert_eq!(phase_from_length(60), NarrativePhase::Resolution);
    }

    #[test]
    fn tense_tone_accelerates_toward_conflict() {
        let mut history = neutral_history(12);
        history.push(msg(100, "Brin", "danger! this is a trap, careful!"));
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(infer_phase(&history, &mut rng), NarrativePhase::Conflict);
    }

    #[test]
    fn happy_tone_can_regress_conflict() {
        let mut history = neutral_history(30);
        history.push(msg(100, "Brin", "wonderful! I love this, so happy!"));
        let mut rng = StdRng::seed_from_u64(0);
        let mut regressed = false;
        for _ in 0..100 {
            if infer_phase(&history, &mut rng) == NarrativePhase::RisingAction {
                regressed = true;
                break;
            }
        }
        assert!(regressed, "expected at least one 30% regression in 100 tries");
    }

    #[test]
    fn neutral_tone_never_regresses_conflict() {
        let history = neutral_history(30);
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..50 {
            assert_eq!(infer_phase(&history, &mut rng), NarrativePhase::Conflict);
        }
    }

    #[test]
    fn branch_spacing_bounds() {
        let mut rng = StdRng::seed_from_u64(5);
        for n in 0..BRANCH_MIN_SPACING {
            assert!(!should_propose_branch(n, &mut rng));
        }
        for _ in 0..50 {
            assert!(should_propose_branch(BRANCH_MAX_SPACING, &mut rng));
            assert!(should_propose_branch(BRANCH_MAX_SPACING + 5, &mut rng));
        }
    }

    #[test]
    fn branch_probability_rises_between_bounds() {
        let mut rng = StdRng::seed_from_u64(9);
        let trials = 2000;
        let hits_low = (0..trials)
            .filter(|_| should_propose_branch(BRANCH_MIN_SPACING + 1, &mut rng))
            .count();
        let hits_high = (0..trials)
            .filter(|_| should_propose_branch(BRANCH_MAX_SPACING - 1, &mut rng))
            .count();
        assert!(hits_high > hits_low);
    }

    #[test]
    fn environmental_event_never_fires_early() {
        let ctx = NarrativeContext::default();
        let mut rng = StdRng::seed_from_u64(2);
        for n in 0..EVENT_MIN_SPACING {
            for _ in 0..20 {
                assert!(!should_trigger_environmental_event(&ctx, n, &mut rng));
            }
        }
    }

    #[test]
    fn environmental_event_scales_with_tension() {
        let mut calm = NarrativeContext::default();
        calm.current_tension = Tension::Low;
        let mut fraught = NarrativeContext::default();
        fraught.current_tension = Tension::VeryHigh;

        let mut rng = StdRng::seed_from_u64(4);
        let trials = 2000;
        let calm_hits = (0..trials)
            .filter(|_| should_trigger_environmental_event(&calm, 8, &mut rng))
            .count();
        let fraught_hits = (0..trials)
            .filter(|_| should_trigger_environmental_event(&fraught, 8, &mut rng))
            .count();
        assert!(fraught_hits > calm_hits);
    }

    #[test]
    fn guidance_flags_dominant_speaker() {
        let history: Vec<Message> = (0..8).map(|i| msg(i, "Anna", "more from me")).collect();
        let ctx = NarrativeContext::default();
        let g = guidance("Anna", &history, &ctx, &[]);
        assert!(g.notes.iter().any(|n| n.contains("dominating")));

        let g = guidance("Brin", &history, &ctx, &[]);
        assert!(!g.notes.iter().any(|n| n.contains("dominating")));
    }

    #[test]
    fn guidance_surfaces_unanswered_question() {
        let mut history = neutral_history(3);
        history.push(msg(50, "Anna", "where is the key?"));
        history.push(msg(51, "Brin", "the wind howls"));
        let ctx = NarrativeContext::default();
        let g = guidance("Brin", &history, &ctx, &[]);
        assert!(g.notes.iter().any(|n| n.contains("where is the key?")));
    }

    #[test]
    fn answered_question_is_not_flagged() {
        let mut history = neutral_history(2);
        history.push(msg(50, "Anna", "where is the key?"));
        let mut answer = msg(51, "Brin", "in the chest");
        answer.reply_to = Some(50);
        history.push(answer);
        assert!(oldest_unanswered_question(&history).is_none());
    }

    #[test]
    fn static_scene_asks_for_action() {
        let history = neutral_history(6);
        let ctx = NarrativeContext::default();
        let g = guidance("Anna", &history, &ctx, &[]);
        assert_eq!(g.pace, "action");
    }

    #[test]
    fn busy_scene_asks_for_dialogue() {
        let history: Vec<Message> = (0..6)
            .map(|i| msg(i, "Anna", "*lunges* again *parries* and *ducks*"))
            .collect();
        let ctx = NarrativeContext::default();
        let g = guidance("Anna", &history, &ctx, &[]);
        assert_eq!(g.pace, "dialogue");
    }

    #[test]
    fn flat_tone_in_conflict_escalates() {
        let history = neutral_history(6);
        let mut ctx = NarrativeContext::default();
        ctx.current_phase = NarrativePhase::Conflict;
        let g = guidance("Anna", &history, &ctx, &[]);
        assert!(g.notes.iter().any(|n| n.contains("escalate")));
    }
}
