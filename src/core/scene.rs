/// Scene fragments — short italicizable action/environment/plot-beat
/// snippets woven into dialogue.
///
/// The category rotation counter lives on the generator instance, so
/// concurrent sessions never share rotation state.
use rand::Rng;
use rustc_hash::FxHashMap;

use crate::schema::character::{Character, CharacterType};
use crate::schema::narrative::{NarrativeContext, NarrativePhase};

/// The three fragment categories the generator rotates through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCategory {
    Environment,
    PlotBeat,
    CharacterAction,
}

struct ThemedPool {
    theme: &'static str,
    phase: NarrativePhase,
    lines: &'static [&'static str],
}

const ENVIRONMENT_POOLS: &[ThemedPool] = &[
    ThemedPool {
        theme: "fantasy",
        phase: NarrativePhase::Introduction,
        lines: &[
            "Lantern light pools on the worn flagstones.",
            "Somewhere beyond the walls, an owl calls twice.",
            "The smell of woodsmoke and old parchment hangs in the air.",
        ],
    },
    ThemedPool {
        theme: "fantasy",
        phase: NarrativePhase::Conflict,
        lines: &[
            "The torches gutter as a cold draft sweeps the hall.",
            "Thunder rolls over the distant hills.",
            "Dust sifts from the rafters as something heavy shifts above.",
        ],
    },
    ThemedPool {
        theme: "scifi",
        phase: NarrativePhase::Introduction,
        lines: &[
            "Status lights blink amber along the corridor bulkhead.",
            "The deck hums with the steady pulse of the drive core.",
            "Beyond the viewport, stars wheel in slow silence.",
        ],
    },
    ThemedPool {
        theme: "scifi",
        phase: NarrativePhase::Conflict,
        lines: &[
            "A warning klaxon stutters, then cuts out.",
            "The gravity plating shudders underfoot.",
            "Emergency lighting bathes the deck in red.",
        ],
    },
];

const GENERIC_ENVIRONMENT: &[&str] = &[
    "A hush settles over the scene.",
    "The light shifts, and shadows stretch a little longer.",
    "Somewhere nearby, a door creaks.",
];

const PLOT_BEAT_POOLS: &[ThemedPool] = &[
    ThemedPool {
        theme: "fantasy",
        phase: NarrativePhase::RisingAction,
        lines: &[
            "A raven lands on the sill, a scrap of cloth in its beak.",
            "The innkeeper leans in, lowering his voice.",
        ],
    },
    ThemedPool {
        theme: "scifi",
        phase: NarrativePhase::RisingAction,
        lines: &[
            "The console chirps: an unscheduled docking request.",
            "A maintenance drone pauses mid-task, sensors swiveling.",
        ],
    },
];

const GENERIC_PLOT_BEATS: &[&str] = &[
    "Something small but wrong catches the eye.",
    "A sound out of place interrupts the moment.",
    "An unexpected arrival changes the room's mood.",
];

fn type_actions(character_type: CharacterType) -> &'static [&'static str] {
    match character_type {
        CharacterType::Fantasy => &[
            "rests a hand on the worn hilt at their belt",
            "traces a warding sign in the air",
            "studies the shadows at the edge of the light",
        ],
        CharacterType::Scifi => &[
            "checks a readout on their wrist display",
            "adjusts the charge setting on their sidearm",
            "glances at the nearest status panel",
        ],
        CharacterType::Historical => &[
            "straightens their coat with deliberate care",
            "glances toward the door, measuring the distance",
        ],
        CharacterType::Modern => &[
            "pockets their phone without looking at it",
            "leans back, arms crossed",
        ],
        CharacterType::Superhero => &[
            "scans the skyline out of habit",
            "flexes a gloved hand",
        ],
        CharacterType::Adventure => &[
            "re-coils the rope at their hip",
            "checks the horizon for weather",
        ],
    }
}

const GENERIC_ACTIONS: &[&str] = &[
    "shifts their weight, alert",
    "takes a slow breath",
    "glances at the others",
];

/// Per-session scene fragment generator.
#[derive(Debug, Clone, Default)]
pub struct SceneGenerator {
    rotation: usize,
    name_actions: FxHashMap<String, Vec<String>>,
}

impl SceneGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a character-specific action pool, preferred over the
    /// type default.
    pub fn register_character_actions(&mut self, name: impl Into<String>, lines: Vec<String>) {
        self.name_actions.insert(name.into(), lines);
    }

    /// Category the next call will use, before overrides.
    pub fn upcoming_category(&self) -> SceneCategory {
        match self.rotation % 3 {
            0 => SceneCategory::Environment,
            1 => SceneCategory::PlotBeat,
            _ => SceneCategory::CharacterAction,
        }
    }

    /// Produce one fragment, advancing the rotation.
    ///
    /// Explicit action requests always return an action; under high
    /// tension the rotation is overridden toward action with 70%
    /// probability.
    pub fn next_fragment<R: Rng>(
        &mut self,
        context: &NarrativeContext,
        character: Option<&Character>,
        force_action: bool,
        rng: &mut R,
    ) -> String {
        let mut category = self.upcoming_category();
        self.rotation = self.rotation.wrapping_add(1);

        if force_action
            || (context.current_tension.is_high()
                && category != SceneCategory::CharacterAction
                && rng.gen_bool(0.7))
        {
            category = SceneCategory::CharacterAction;
        }

        match category {
            SceneCategory::Environment => {
                pick(themed_lines(ENVIRONMENT_POOLS, GENERIC_ENVIRONMENT, context), rng)
            }
            SceneCategory::PlotBeat => {
                pick(themed_lines(PLOT_BEAT_POOLS, GENERIC_PLOT_BEATS, context), rng)
            }
            SceneCategory::CharacterAction => self.character_action(character, rng),
        }
    }

    fn character_action<R: Rng>(&self, character: Option<&Character>, rng: &mut R) -> String {
        let (name, lines): (&str, Vec<String>) = match character {
            Some(c) => {
                // An empty registered pool counts as unregistered.
                let custom = self.name_actions.get(&c.name).filter(|l| !l.is_empty());
                if let Some(custom) = custom {
                    (c.name.as_str(), custom.clone())
                } else {
                    (
                        c.name.as_str(),
                        type_actions(c.character_type)
                            .iter()
                            .map(|s| s.to_string())
                            .collect(),
                    )
                }
            }
            None => (
                "Someone",
                GENERIC_ACTIONS.iter().map(|s| s.to_string()).collect(),
            ),
        };
        let line = &lines[rng.gen_range(0..lines.len())];
        format!("{name} {line}")
    }
}

/// Lines for (theme, phase), falling back to any phase for the theme,
/// then to the generic pool.
fn themed_lines<'a>(
    pools: &'a [ThemedPool],
    generic: &'a [&'static str],
    context: &NarrativeContext,
) -> Vec<&'a str> {
    let theme = context.theme.to_lowercase();

    let exact: Vec<&str> = pools
        .iter()
        .filter(|p| theme.contains(p.theme) && p.phase == context.current_phase)
        .flat_map(|p| p.lines.iter().copied())
        .collect();
    if !exact.is_empty() {
        return exact;
    }

    let any_phase: Vec<&str> = pools
        .iter()
        .filter(|p| theme.contains(p.theme))
        .flat_map(|p| p.lines.iter().copied())
        .collect();
    if !any_phase.is_empty() {
        return any_phase;
    }

    generic.to_vec()
}

fn pick<R: Rng>(lines: Vec<&str>, rng: &mut R) -> String {
    lines[rng.gen_range(0..lines.len())].to_string()
}
