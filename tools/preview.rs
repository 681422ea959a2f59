/// Preview — interactive session shell for exercising the engine.
///
/// Usage: preview [--voices <path>] [--seed <n>] [--theme <name>] [--scenario <type>]
///
/// Commands:
///   cast <name> <type> [mood]  — add a character to the party
///   say <text>                 — speak as the user and hear a reply
///   turn                       — let the engine pick the next speaker
///   responders <n>             — show who would respond, up to n
///   mood <name> <impact>       — nudge a character's mood
///   rel <a> <b> <text>         — score text against a relationship
///   event                      — force an environmental event
///   branches                   — propose story branch options
///   status                     — dump session state
///   seed <n>                   — restart the session with a new seed
///   bulk <n>                   — run n automatic turns with variety stats
///   help                       — list commands
///   quit                       — exit

use roleplay_engine::core::voice::VoiceRegistry;
use roleplay_engine::{Character, CharacterType, RoleplayEngine};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::Path;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() >= 2 && (args[1] == "--help" || args[1] == "-h") {
        print_usage();
        return;
    }

    let mut voices_path = None;
    let mut seed: u64 = 42;
    let mut theme = "adventure".to_string();
    let mut scenario = CharacterType::Fantasy;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--voices" if i + 1 < args.len() => {
                i += 1;
                voices_path = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            "--theme" if i + 1 < args.len() => {
                i += 1;
                theme = args[i].clone();
            }
            "--scenario" if i + 1 < args.len() => {
                i += 1;
                match parse_character_type(&args[i]) {
                    Some(t) => scenario = t,
                    None => {
                        eprintln!("Unknown scenario type: {}", args[i]);
                        std::process::exit(1);
                    }
                }
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let mut voices = VoiceRegistry::with_defaults();
    if let Some(ref path) = voices_path {
        load_voices_from_path(path, &mut voices);
    }

    println!("Seed: {}", seed);
    println!("Theme: {} / scenario: {}", theme, scenario.tag());
    println!("Cast characters with 'cast', then 'say' something. Type 'help' for commands.\n");

    // Session state survives rebuilds so 'seed' can restart cleanly.
    let mut cast: Vec<Character> = Vec::new();
    let mut current_seed = seed;

    let mut engine = build_engine(&cast, &voices, current_seed, &theme, scenario);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
            }
            "cast" => {
                if parts.len() < 3 {
                    println!("Usage: cast <name> <type> [mood]");
                    println!("  type: fantasy, scifi, historical, modern, superhero, adventure");
                    println!("  Current cast:");
                    for c in &cast {
                        println!("    {} ({}) mood={}", c.name, c.character_type.tag(), c.mood);
                    }
                    continue;
                }
                let character_type = match parse_character_type(parts[2]) {
                    Some(t) => t,
                    None => {
                        println!("Unknown character type: {}", parts[2]);
                        continue;
                    }
                };
                let mut character = Character::new(parts[1], character_type);
                if let Some(mood) = parts.get(3) {
                    character = character.with_mood(*mood);
                }
                println!("Cast '{}' as {}.", character.name, character_type.tag());
                cast.push(character);
                engine = build_engine(&cast, &voices, current_seed, &theme, scenario);
            }
            "say" => {
                if parts.len() < 2 {
                    println!("Usage: say <text>");
                    continue;
                }
                let text = parts[1..].join(" ");
                engine.record_user(text);
                run_turn(&mut engine);
            }
            "turn" => {
                run_turn(&mut engine);
            }
            "responders" => {
                let max = parts
                    .get(1)
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(2);
                let names = engine.select_responders(max);
                if names.is_empty() {
                    println!("Nobody would respond right now.");
                } else {
                    println!("Would respond, in order: {}", names.join(", "));
                }
            }
            "mood" => {
                if parts.len() < 3 {
                    println!("Usage: mood <name> <impact> [trigger...]");
                    continue;
                }
                let impact: i32 = match parts[2].parse() {
                    Ok(n) => n,
                    Err(_) => {
                        println!("Invalid impact: {}", parts[2]);
                        continue;
                    }
                };
                let trigger = if parts.len() > 3 {
                    parts[3..].join(" ")
                } else {
                    "preview nudge".to_string()
                };
                let update = engine.update_mood(parts[1], &trigger, impact, "preview");
                println!(
                    "{} is now {} (intensity {})",
                    parts[1], update.state.current_mood, update.state.intensity
                );
                if let Some(announcement) = update.announcement {
                    println!("  {}", announcement);
                }
            }
            "rel" => {
                if parts.len() < 4 {
                    println!("Usage: rel <a> <b> <text...>");
                    continue;
                }
                let text = parts[3..].join(" ");
                let relationship = engine.update_relationship(parts[1], parts[2], parts[1], &text);
                println!(
                    "{} / {}: affinity {} ({} interactions on record)",
                    relationship.characters[0],
                    relationship.characters[1],
                    relationship.affinity,
                    relationship.interactions.len()
                );
            }
            "event" => {
                let event = engine.generate_environmental_event();
                println!("{}", event);
            }
            "branches" => {
                let options = engine.generate_branch_options();
                println!("Where could this go?");
                for (n, option) in options.iter().enumerate() {
                    println!("  {}. {}", n + 1, option);
                }
            }
            "status" => {
                let narrative = engine.narrative();
                println!("Phase: {}", narrative.current_phase.tag());
                println!("Tension: {:?}", narrative.current_tension);
                println!("Messages: {}", engine.history().len());
                match engine.currently_typing() {
                    Some(name) => println!("Typing: {}", name),
                    None => println!("Typing: nobody"),
                }
                for c in engine.characters() {
                    let mood = engine.mood_label(&c.name).unwrap_or(&c.mood);
                    println!("  {} ({}) mood={}", c.name, c.character_type.tag(), mood);
                }
            }
            "seed" => {
                if parts.len() < 2 {
                    println!("Current seed: {}", current_seed);
                    continue;
                }
                match parts[1].parse::<u64>() {
                    Ok(s) => {
                        current_seed = s;
                        engine = build_engine(&cast, &voices, current_seed, &theme, scenario);
                        println!("Session restarted with seed {}.", current_seed);
                    }
                    Err(_) => {
                        println!("Invalid seed: {}", parts[1]);
                    }
                }
            }
            "bulk" => {
                let count: usize = match parts.get(1).and_then(|s| s.parse().ok()) {
                    Some(n) if n > 0 => n,
                    _ => {
                        println!("Usage: bulk <n>");
                        continue;
                    }
                };
                if cast.is_empty() {
                    println!("No characters cast. Use 'cast' first.");
                    continue;
                }

                let mut bulk_engine =
                    build_engine(&cast, &voices, current_seed, &theme, scenario);
                bulk_engine.record_user("so, where do we begin?");

                let mut lines = Vec::new();
                for _ in 0..count {
                    if let Some(speaker) = bulk_engine.select_next_speaker() {
                        let reply = bulk_engine.synthesize_response(&speaker);
                        lines.push(reply.clone());
                        bulk_engine.record_character(&speaker, reply);
                    }
                    if bulk_engine.should_trigger_environmental_event() {
                        lines.push(bulk_engine.generate_environmental_event());
                    }
                }

                println!("\n=== Bulk run: {} lines ===\n", lines.len());

                let openings: Vec<String> = lines
                    .iter()
                    .map(|l| l.split_whitespace().take(4).collect::<Vec<_>>().join(" "))
                    .collect();
                let unique: std::collections::HashSet<&String> = openings.iter().collect();
                println!("Unique openings: {} / {}", unique.len(), lines.len());

                let avg_len: f64 = if lines.is_empty() {
                    0.0
                } else {
                    lines.iter().map(|l| l.len() as f64).sum::<f64>() / lines.len() as f64
                };
                println!("Average length: {:.0} chars", avg_len);

                let mut word_counts: HashMap<String, u32> = HashMap::new();
                for line in &lines {
                    for word in line.split_whitespace() {
                        let clean = word
                            .trim_matches(|c: char| !c.is_alphanumeric())
                            .to_lowercase();
                        if clean.len() > 3 {
                            *word_counts.entry(clean).or_insert(0) += 1;
                        }
                    }
                }
                let mut word_freq: Vec<(String, u32)> = word_counts.into_iter().collect();
                word_freq.sort_by(|a, b| b.1.cmp(&a.1));
                println!("\nTop 10 words:");
                for (word, count) in word_freq.iter().take(10) {
                    println!("  {}: {}", word, count);
                }

                if let Some(first) = lines.first() {
                    println!("\nSample line:");
                    println!("  {}", first);
                }
                println!();
            }
            _ => {
                println!("Unknown command: '{}'. Type 'help' for available commands.", cmd);
            }
        }
    }
}

fn run_turn(engine: &mut RoleplayEngine) {
    match engine.select_next_speaker() {
        Some(speaker) => {
            let delay = engine.response_delay_ms(&speaker);
            let reply = engine.synthesize_response(&speaker);
            println!("[{} is typing... {}ms]", speaker, delay);
            println!("{}: {}", speaker, reply);
            engine.record_character(&speaker, reply);
        }
        None => {
            println!("Nobody to speak. Cast characters first.");
        }
    }
}

fn build_engine(
    cast: &[Character],
    voices: &VoiceRegistry,
    seed: u64,
    theme: &str,
    scenario: CharacterType,
) -> RoleplayEngine {
    RoleplayEngine::builder()
        .with_seed(seed)
        .with_characters(cast.to_vec())
        .with_scenario(scenario)
        .with_theme(theme)
        .with_voice_registry(voices.clone())
        .build()
}

fn parse_character_type(s: &str) -> Option<CharacterType> {
    match s.to_lowercase().as_str() {
        "fantasy" => Some(CharacterType::Fantasy),
        "scifi" => Some(CharacterType::Scifi),
        "historical" => Some(CharacterType::Historical),
        "modern" => Some(CharacterType::Modern),
        "superhero" => Some(CharacterType::Superhero),
        "adventure" => Some(CharacterType::Adventure),
        _ => None,
    }
}

fn load_voices_from_path(path: &str, voices: &mut VoiceRegistry) {
    let p = Path::new(path);
    if p.is_file() {
        match voices.load_from_ron(p) {
            Ok(()) => println!("Loaded voices: {}", path),
            Err(e) => eprintln!("ERROR loading voices {}: {}", path, e),
        }
    } else if p.is_dir() {
        load_voices_recursive(p, voices);
    } else {
        eprintln!("Voices path not found: {}", path);
    }
}

fn load_voices_recursive(dir: &Path, voices: &mut VoiceRegistry) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                load_voices_recursive(&path, voices);
            } else if path.extension().and_then(|s| s.to_str()) == Some("ron") {
                match voices.load_from_ron(&path) {
                    Ok(()) => println!("Loaded voices: {}", path.display()),
                    Err(e) => eprintln!("ERROR loading {}: {}", path.display(), e),
                }
            }
        }
    }
}

fn print_usage() {
    println!("Preview — interactive session shell for exercising the engine.");
    println!();
    println!("Usage: preview [--voices <path>] [--seed <n>] [--theme <name>] [--scenario <type>]");
    println!();
    println!("  --voices <path>    Path to a RON voice pack file or directory");
    println!("  --seed <n>         Initial RNG seed (default: 42)");
    println!("  --theme <name>     Narrative theme (default: adventure)");
    println!("  --scenario <type>  Scenario flavor for branch proposals (default: fantasy)");
}

fn print_help() {
    println!("Commands:");
    println!("  cast <name> <type> [mood]  Add a character to the party");
    println!("  say <text>                 Speak as the user and hear a reply");
    println!("  turn                       Let the engine pick the next speaker");
    println!("  responders <n>             Show who would respond, up to n");
    println!("  mood <name> <impact>       Nudge a character's mood");
    println!("  rel <a> <b> <text>         Score text against a relationship");
    println!("  event                      Force an environmental event");
    println!("  branches                   Propose story branch options");
    println!("  status                     Dump session state");
    println!("  seed <n>                   Restart the session with a new seed");
    println!("  bulk <n>                   Run n automatic turns with variety stats");
    println!("  help                       Show this help");
    println!("  quit                       Exit");
    println!();
    println!("Character types: fantasy, scifi, historical, modern, superhero, adventure");
}
