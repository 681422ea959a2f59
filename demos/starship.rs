/// Starship demo — a bridge crew under escalating tension.
///
/// A sequence: routine watch → anomalous signal → system failures →
/// crisis coordination, with an environmental event forced at the peak
/// and crew interplay driven by the interaction synthesizer.
///
/// Run with: cargo run --example starship

use roleplay_engine::core::voice::VoiceRegistry;
use roleplay_engine::{
    Character, CharacterType, Personality, ResponseLength, RoleplayEngine, WritingInstructions,
};

const BRIDGE_VOICES: &str = r#"
[
    (
        character: Some("Okafor"),
        character_type: scifi,
        style: Some("calm, clipped, command register"),
        example_lines: [
            "Steady as she goes.",
            "Report, don't speculate.",
        ],
        forbidden: [
            (phrase: "as an AI", replacement: "by my calculations"),
        ],
    ),
]
"#;

fn main() {
    let mut voices = VoiceRegistry::with_defaults();
    voices
        .load_ron_str(BRIDGE_VOICES)
        .expect("bridge voice pack parses");

    let mut engine = RoleplayEngine::builder()
        .with_seed(7741)
        .with_theme("scifi deep-space patrol")
        .with_scenario(CharacterType::Scifi)
        .with_voice_registry(voices)
        .with_instructions(WritingInstructions {
            response_length: ResponseLength::Medium,
            ..WritingInstructions::default()
        })
        .with_character(
            Character::new("Okafor", CharacterType::Scifi)
                .with_mood("Calm")
                .with_talkativeness(7)
                .with_personality(Personality {
                    confidence: 9,
                    analytical: 7,
                    ..Personality::default()
                }),
        )
        .with_character(
            Character::new("Reyes", CharacterType::Scifi)
                .with_mood("Anxious")
                .with_talkativeness(5)
                .with_thinking_speed(1.5),
        )
        .build();

    let watch_log = [
        "status report, all stations",
        "I'm reading a signal out past the third moon",
        "the signal is getting stronger and the reactor is fluctuating",
        "shields just failed, we are under attack!",
        "weapons are offline, enemy closing fast",
    ];

    for entry in watch_log {
        println!("Comms: {entry}\n");
        engine.record_user(entry);

        if let Some(speaker) = engine.select_next_speaker() {
            let reply = engine.synthesize_response(&speaker);
            println!("  {speaker}: {reply}\n");
            engine.record_character(&speaker, reply);
        }
    }

    // The crisis strains the crew against each other.
    engine.update_relationship("Okafor", "Reyes", "Reyes", "this is a disaster, we will die out here");
    engine.update_mood("Reyes", "shields failing", -3, "crisis");

    let order = engine.synthesize_interaction("Okafor", "Reyes");
    println!("  Okafor: {order}\n");

    println!("  {}\n", engine.generate_environmental_event());

    println!("--- Contingencies ---");
    for (n, option) in engine.generate_branch_options().iter().enumerate() {
        println!("  {}. {option}", n + 1);
    }

    println!(
        "\nPhase: {} / tension: {:?}",
        engine.narrative().current_phase.tag(),
        engine.narrative().current_tension
    );
}
