/// Branch generation — 3–4 candidate "what happens next" plot
/// developments, assembled from scenario, phase, tone, and topic
/// template families and filtered against recent proposals.
use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::template::{fill, Slots};
use crate::schema::character::CharacterType;
use crate::schema::narrative::{EmotionalTone, NarrativePhase};
use crate::schema::relationship::Relationship;

/// How many recent branch options are remembered for repetition
/// filtering.
const BRANCH_HISTORY_CAP: usize = 8;

fn scenario_templates(scenario: CharacterType) -> &'static [&'static str] {
    match scenario {
        CharacterType::Fantasy => &[
            "A hooded stranger approaches with word of an ancient pact.",
            "The ground trembles — something old stirs beneath the ruins.",
            "A royal messenger arrives bearing a sealed summons.",
            "Strange lights flicker in the forest beyond the road.",
        ],
        CharacterType::Scifi => &[
            "The ship's sensors pick up an unidentified signal.",
            "A hull breach alarm sounds from the lower decks.",
            "An encrypted transmission arrives from a derelict station.",
            "The navigation computer plots a course nobody entered.",
        ],
        CharacterType::Historical => &[
            "A courier gallops in with news that changes everything.",
            "Whispers of rebellion spread through the court.",
            "An old rival arrives uninvited to the gathering.",
            "Soldiers appear on the road, colors unfamiliar.",
        ],
        CharacterType::Modern => &[
            "A phone buzzes with a message nobody expected.",
            "The power cuts out across the whole block.",
            "A stranger at the door claims to know one of you.",
            "Sirens build in the distance, coming closer.",
        ],
        CharacterType::Superhero => &[
            "An alarm echoes across the city — someone needs help.",
            "A masked figure watches from a nearby rooftop.",
            "News breaks of a villain escaping confinement.",
            "A civilian stumbles in, shaken, with a warning.",
        ],
        CharacterType::Adventure => &[
            "The map reveals a passage no one noticed before.",
            "A rope bridge sways ahead — the only way across.",
            "Tracks in the mud suggest you are not alone out here.",
            "A storm rolls in, forcing a hard choice about shelter.",
        ],
    }
}

fn phase_templates(phase: NarrativePhase) -> &'static [&'static str] {
    match phase {
        NarrativePhase::Introduction | NarrativePhase::Discovery => &[
            "Someone shares a secret that reframes why they are here.",
            "A chance discovery hints at a larger purpose.",
        ],
        NarrativePhase::RisingAction | NarrativePhase::Planning => &[
            "An obstacle forces the group to pick between two bad options.",
            "A small mistake earlier comes back with consequences.",
        ],
        NarrativePhase::Conflict => &[
            "The disagreement breaks into the open — sides must be taken.",
            "An enemy presses the advantage while the group argues.",
        ],
        NarrativePhase::Climax => &[
            "Everything converges — the decisive moment arrives at last.",
            "A sacrifice is demanded to see this through.",
        ],
        NarrativePhase::Resolution => &[
            "The dust settles, and someone must answer for what happened.",
            "A quiet moment opens space for an honest confession.",
        ],
    }
}

fn tone_templates(tone: EmotionalTone) -> &'static [&'static str] {
    match tone {
        EmotionalTone::Angry | EmotionalTone::Tense => &[
            "Tempers fray — one wrong word could ignite a fight.",
            "The tension snaps into a sudden confrontation.",
        ],
        EmotionalTone::Sad | EmotionalTone::Afraid => &[
            "A comforting gesture opens an unexpected heart-to-heart.",
            "Old grief resurfaces and demands acknowledgment.",
        ],
        EmotionalTone::Happy | EmotionalTone::Surprised => &[
            "The good mood invites a celebration nobody planned.",
            "High spirits embolden someone to take a risk.",
        ],
        EmotionalTone::Curious | EmotionalTone::Determined | EmotionalTone::Neutral => &[
            "A new lead appears, too intriguing to ignore.",
            "Someone proposes a plan that splits opinion.",
        ],
    }
}

const TOPIC_TEMPLATES: &[&str] = &[
    "The talk of {{topic}} draws unwanted attention.",
    "A clue surfaces connecting {{topic}} to the real danger.",
    "Someone admits knowing more about {{topic}} than they let on.",
];

/// Session-scoped branch generator with a bounded proposal history.
#[derive(Debug, Clone, Default)]
pub struct BranchGenerator {
    recent: Vec<String>,
}

impl BranchGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble, filter, shuffle, and return 3–4 branch options.
    #[allow(clippy::too_many_arguments)]
    pub fn generate<R: Rng>(
        &mut self,
        scenario: CharacterType,
        topics: &[String],
        tone: EmotionalTone,
        phase: NarrativePhase,
        relationships: &[Relationship],
        rng: &mut R,
    ) -> Vec<String> {
        let mut pool: Vec<String> = Vec::new();
        pool.extend(scenario_templates(scenario).iter().map(|s| s.to_string()));
        pool.extend(phase_templates(phase).iter().map(|s| s.to_string()));
        pool.extend(tone_templates(tone).iter().map(|s| s.to_string()));

        if let Some(topic) = pick_topic(topics, rng) {
            let slots = Slots::new().bind("topic", topic);
            for template in TOPIC_TEMPLATES {
                if let Ok(text) = fill(template, &slots) {
                    pool.push(text);
                }
            }
        }

        let (mut pool, filtered): (Vec<String>, Vec<String>) = pool
            .into_iter()
            .partition(|candidate| !self.overlaps_recent(candidate));

        if let Some(extra) = relationship_branch(relationships, phase) {
            pool.push(extra);
        }

        // When the history has swallowed most of the template pool,
        // refill from the least-recently proposed candidates so every
        // round still offers a full slate.
        if pool.len() < 3 {
            let mut stale: Vec<(usize, String)> = filtered
                .into_iter()
                .map(|candidate| {
                    let age = self.recency(&candidate).unwrap_or(usize::MAX);
                    (age, candidate)
                })
                .collect();
            stale.sort_by_key(|(age, _)| *age);
            for (_, candidate) in stale {
                if pool.len() >= 3 {
                    break;
                }
                pool.push(candidate);
            }
        }

        pool.shuffle(rng);
        let want = if rng.gen_bool(0.5) { 4 } else { 3 };
        pool.truncate(want);

        for option in &pool {
            self.recent.push(option.clone());
        }
        let overflow = self.recent.len().saturating_sub(BRANCH_HISTORY_CAP);
        if overflow > 0 {
            self.recent.drain(..overflow);
        }

        pool
    }

    /// True when a candidate shares most of its words with a recent
    /// proposal.
    fn overlaps_recent(&self, candidate: &str) -> bool {
        self.recency(candidate).is_some()
    }

    /// Index into the proposal history of the oldest entry the
    /// candidate overlaps. Lower means proposed longer ago.
    fn recency(&self, candidate: &str) -> Option<usize> {
        let candidate_words = word_set(candidate);
        if candidate_words.is_empty() {
            return None;
        }
        self.recent.iter().position(|prev| {
            let prev_words = word_set(prev);
            let shared = candidate_words.iter().filter(|w| prev_words.contains(*w)).count();
            shared * 3 >= candidate_words.len() * 2
        })
    }
}

fn word_set(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.to_lowercase()
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_string()
        })
        .filter(|w| w.len() > 2)
        .collect()
}

fn pick_topic<'a, R: Rng>(topics: &'a [String], rng: &mut R) -> Option<&'a str> {
    if topics.is_empty() {
        None
    } else {
        Some(topics[rng.gen_range(0..topics.len())].as_str())
    }
}

/// A relationship-driven candidate when some pair is strongly polarized.
fn relationship_branch(relationships: &[Relationship], phase: NarrativePhase) -> Option<String> {
    let extreme = relationships
        .iter()
        .filter(|r| r.affinity.abs() > 5)
        .max_by_key(|r| r.affinity.abs())?;
    let [a, b] = &extreme.characters;

    let line = if extreme.affinity > 5 {
        if phase.is_confrontational() {
            format!("{a} and {b} close ranks — their bond becomes the group's anchor.")
        } else {
            format!("{a} and {b} share a moment that deepens their trust.")
        }
    } else if phase.is_confrontational() {
        format!("The feud between {a} and {b} threatens to split the group at the worst time.")
    } else {
        format!("Old resentment between {a} and {b} bubbles toward the surface.")
    };
    Some(line)
}
