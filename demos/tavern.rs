/// Tavern demo — a fantasy party reacting to a stranger's arrival.
///
/// A mini session: greetings → rumors of trouble → a drawn blade →
/// de-escalation → branch proposals for where the night goes next.
///
/// Run with: cargo run --example tavern

use roleplay_engine::{Character, CharacterType, Personality, RoleplayEngine};

fn main() {
    let mut engine = RoleplayEngine::builder()
        .with_seed(2026)
        .with_theme("fantasy tavern")
        .with_scenario(CharacterType::Fantasy)
        .with_character(
            Character::new("Elara", CharacterType::Fantasy)
                .with_mood("Happy")
                .with_talkativeness(8)
                .with_voice_style("warm and teasing")
                .with_catchphrases(&["By the old roads!"]),
        )
        .with_character(
            Character::new("Brin", CharacterType::Fantasy)
                .with_mood("Brooding")
                .with_talkativeness(3)
                .with_thinking_speed(0.7),
        )
        .with_character(
            Character::new("Maeve", CharacterType::Fantasy)
                .with_mood("Curious")
                .with_personality(Personality {
                    analytical: 8,
                    philosophical: 7,
                    ..Personality::default()
                })
                .with_talkativeness(6),
        )
        .build();

    let beats = [
        "hello everyone, mind if I sit?",
        "I heard there's trouble on the northern road",
        "they say a whole caravan vanished near the old keep",
        "*draws sword* someone here knows more than they're telling",
        "forgive me, the road has made me jumpy",
        "so, what should we do about the keep?",
    ];

    for beat in beats {
        println!("You: {beat}\n");
        engine.record_user(beat);

        // Mentioned or rattled characters may pile on after the first reply.
        for speaker in engine.select_responders(2) {
            let delay = engine.response_delay_ms(&speaker);
            let reply = engine.synthesize_response(&speaker);
            println!("  [{speaker} thinks for {delay}ms]");
            println!("  {speaker}: {reply}\n");
            engine.record_character(&speaker, reply);

            // A drawn blade rattles everyone who sees it.
            if beat.contains("draws sword") {
                let update = engine.update_mood(&speaker, "a blade drawn in the common room", -2, "threat");
                if let Some(line) = update.announcement {
                    println!("  {line}\n");
                }
            }
        }

        if engine.should_trigger_environmental_event() {
            println!("  {}\n", engine.generate_environmental_event());
        }
    }

    // A little table rapport between two regulars.
    let aside = engine.synthesize_interaction("Elara", "Brin");
    println!("  Elara: {aside}\n");
    engine.update_relationship("Elara", "Brin", "Elara", "you always have my back, friend");

    println!("--- Where could the night go? ---");
    for (n, option) in engine.generate_branch_options().iter().enumerate() {
        println!("  {}. {option}", n + 1);
    }

    println!(
        "\nPhase: {} after {} messages",
        engine.narrative().current_phase.tag(),
        engine.history().len()
    );
}
