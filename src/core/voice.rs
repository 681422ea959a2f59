/// Voice templates — per-character or per-archetype bundles of writing
/// rules that keep generated dialogue in character.
///
/// A template carries style hints, example lines, and forbidden phrases
/// (generic AI-sounding filler) with type-appropriate replacements.
/// Templates load from RON packs; built-in per-type defaults cover
/// characters with no registered template.
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::schema::character::CharacterType;

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// A voice definition keyed by character name or archetype.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceTemplate {
    /// Character name this template belongs to, or None for a
    /// type-level default.
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub character_type: CharacterType,
    /// Short register description, e.g. "clipped, formal".
    #[serde(default)]
    pub style: Option<String>,
    /// Example lines in this voice. Unused by synthesis directly but
    /// kept for authoring tools.
    #[serde(default)]
    pub example_lines: Vec<String>,
    /// Phrases this voice must never emit, with replacements.
    #[serde(default)]
    pub forbidden: Vec<ForbiddenPhrase>,
}

/// A phrase to scrub from output, and what to say instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForbiddenPhrase {
    pub phrase: String,
    pub replacement: String,
}

/// Registry of voice templates with name → type → generic fallback.
#[derive(Debug, Clone, Default)]
pub struct VoiceRegistry {
    by_name: FxHashMap<String, VoiceTemplate>,
    by_type: FxHashMap<CharacterType, VoiceTemplate>,
}

impl VoiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-loaded with the built-in per-type defaults.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for template in default_type_templates() {
            registry.register(template);
        }
        registry
    }

    pub fn register(&mut self, template: VoiceTemplate) {
        match &template.character {
            Some(name) => {
                self.by_name.insert(name.clone(), template);
            }
            None => {
                self.by_type.insert(template.character_type, template);
            }
        }
    }

    /// Resolve by character name, falling back to the type default.
    pub fn resolve(&self, name: &str, character_type: CharacterType) -> Option<&VoiceTemplate> {
        self.by_name
            .get(name)
            .or_else(|| self.by_type.get(&character_type))
    }

    /// Load templates from a RON file containing a list of definitions.
    pub fn load_from_ron(&mut self, path: &Path) -> Result<(), VoiceError> {
        let contents = std::fs::read_to_string(path)?;
        self.load_ron_str(&contents)
    }

    /// Load templates from RON source.
    pub fn load_ron_str(&mut self, contents: &str) -> Result<(), VoiceError> {
        let templates: Vec<VoiceTemplate> = ron::from_str(contents)?;
        for template in templates {
            self.register(template);
        }
        Ok(())
    }
}

/// Scrub every forbidden phrase from `text`.
///
/// Matching is token-set overlap rather than positional character
/// comparison, so reworded variants of a banned phrase are still
/// caught; an exact case-insensitive pass runs first to guarantee the
/// configured phrase itself never survives.
pub fn scrub_forbidden(text: &str, forbidden: &[ForbiddenPhrase]) -> String {
    let mut out = text.to_string();
    for entry in forbidden {
        out = scrub_one(&out, &entry.phrase, &entry.replacement);
    }
    out
}

fn scrub_one(text: &str, phrase: &str, replacement: &str) -> String {
    // Exact case-insensitive occurrence first. The search walks char
    // windows of the original text, so the returned range stays on
    // original byte offsets even where case folding changes lengths.
    if let Some((start, end)) = find_case_insensitive(text, phrase) {
        let mut out = String::with_capacity(text.len());
        out.push_str(&text[..start]);
        out.push_str(replacement);
        out.push_str(&text[end..]);
        // Recurse for repeated occurrences.
        return scrub_one(&out, phrase, replacement);
    }

    // Token-overlap pass: slide a window of the phrase's word count over
    // the text and replace any window sharing most of the phrase's words.
    let lower_phrase = phrase.to_lowercase();
    let phrase_tokens: Vec<String> = lower_phrase
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if phrase_tokens.len() < 2 {
        return text.to_string();
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let window = phrase_tokens.len();
    if words.len() < window {
        return text.to_string();
    }

    for start in 0..=(words.len() - window) {
        let slice = &words[start..start + window];
        let matched = slice
            .iter()
            .filter(|w| {
                let clean: String = w
                    .to_lowercase()
                    .trim_matches(|c: char| !c.is_alphanumeric())
                    .to_string();
                phrase_tokens.contains(&clean)
            })
            .count();
        // Most of the window must overlap the phrase's token set.
        if matched * 3 >= window * 2 {
            let mut rebuilt: Vec<&str> = Vec::with_capacity(words.len());
            rebuilt.extend_from_slice(&words[..start]);
            rebuilt.push(replacement);
            rebuilt.extend_from_slice(&words[start + window..]);
            return rebuilt.join(" ");
        }
    }

    text.to_string()
}

/// Byte range in `text` of the first case-insensitive occurrence of
/// `phrase`. Both endpoints are char boundaries of `text` itself.
fn find_case_insensitive(text: &str, phrase: &str) -> Option<(usize, usize)> {
    let needle = phrase.to_lowercase();
    if needle.is_empty() {
        return None;
    }
    for (start, _) in text.char_indices() {
        let mut folded = String::new();
        let mut end = start;
        for (offset, c) in text[start..].char_indices() {
            folded.extend(c.to_lowercase());
            end = start + offset + c.len_utf8();
            if folded.len() >= needle.len() {
                break;
            }
        }
        if folded == needle {
            return Some((start, end));
        }
    }
    None
}

fn default_type_templates() -> Vec<VoiceTemplate> {
    let generic_forbidden = |replacement: &str| {
        vec![
            ForbiddenPhrase {
                phrase: "as an AI".to_string(),
                replacement: replacement.to_string(),
            },
            ForbiddenPhrase {
                phrase: "I am just a language model".to_string(),
                replacement: replacement.to_string(),
            },
            ForbiddenPhrase {
                phrase: "I cannot help with that".to_string(),
                replacement: replacement.to_string(),
            },
        ]
    };

    vec![
        VoiceTemplate {
            character: None,
            character_type: CharacterType::Fantasy,
            style: Some("archaic, earnest".to_string()),
            example_lines: vec!["The old roads remember what we have forgotten.".to_string()],
            forbidden: generic_forbidden("by my oath"),
        },
        VoiceTemplate {
            character: None,
            character_type: CharacterType::Scifi,
            style: Some("precise, clipped".to_string()),
            example_lines: vec!["Sensors confirm it. We are not alone out here.".to_string()],
            forbidden: generic_forbidden("by my calculations"),
        },
        VoiceTemplate {
            character: None,
            character_type: CharacterType::Historical,
            style: Some("measured, formal".to_string()),
            example_lines: vec!["History will judge what we do this day.".to_string()],
            forbidden: generic_forbidden("upon my honor"),
        },
        VoiceTemplate {
            character: None,
            character_type: CharacterType::Modern,
            style: Some("casual, direct".to_string()),
            example_lines: vec!["Okay, let's just think this through.".to_string()],
            forbidden: generic_forbidden("honestly"),
        },
        VoiceTemplate {
            character: None,
            character_type: CharacterType::Superhero,
            style: Some("bold, theatrical".to_string()),
            example_lines: vec!["This city doesn't save itself.".to_string()],
            forbidden: generic_forbidden("mark my words"),
        },
        VoiceTemplate {
            character: None,
            character_type: CharacterType::Adventure,
            style: Some("eager, restless".to_string()),
            example_lines: vec!["The map ends here. That's where we start.".to_string()],
            forbidden: generic_forbidden("trust me on this"),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn banned() -> Vec<ForbiddenPhrase> {
        vec![ForbiddenPhrase {
            phrase: "as an AI".to_string(),
            replacement: "by my oath".to_string(),
        }]
    }

    #[test]
    fn exact_phrase_is_replaced() {
        let out = scrub_forbidden("Well, as an AI I cannot say.", &banned());
        assert!(!out.to_lowercase().contains("as an ai"));
        assert!(out.contains("by my oath"));
    }

    #[test]
    fn case_insensitive_match() {
        let out = scrub_forbidden("AS AN AI, no.", &banned());
        assert!(!out.to_lowercase().contains("as an ai"));
    }

    #[test]
    fn multibyte_case_folding_keeps_offsets_aligned() {
        // 'İ' lowercases to two chars, so a match found in a lowered
        // copy would not line up with the original text's bytes.
        let out = scrub_forbidden("İ spoke: as an AI, no.", &banned());
        assert!(out.starts_with('İ'), "{out}");
        assert!(!out.to_lowercase().contains("as an ai"), "{out}");
        assert!(out.contains("by my oath"), "{out}");
    }

    #[test]
    fn repeated_occurrences_all_replaced() {
        let out = scrub_forbidden("as an AI... as an AI...", &banned());
        assert!(!out.to_lowercase().contains("as an ai"));
    }

    #[test]
    fn token_overlap_catches_reordered_phrase() {
        let forbidden = vec![ForbiddenPhrase {
            phrase: "I cannot help with that".to_string(),
            replacement: "that is beyond me".to_string(),
        }];
        let out = scrub_forbidden("Sorry. with that I cannot help today.", &forbidden);
        assert!(out.contains("that is beyond me"));
    }

    #[test]
    fn clean_text_is_untouched() {
        let text = "The old roads remember what we have forgotten.";
        assert_eq!(scrub_forbidden(text, &banned()), text);
    }

    #[test]
    fn registry_resolves_name_then_type() {
        let mut registry = VoiceRegistry::with_defaults();
        registry.register(VoiceTemplate {
            character: Some("Elara".to_string()),
            character_type: CharacterType::Fantasy,
            style: Some("soft-spoken".to_string()),
            example_lines: Vec::new(),
            forbidden: Vec::new(),
        });

        let named = registry.resolve("Elara", CharacterType::Fantasy).unwrap();
        assert_eq!(named.style.as_deref(), Some("soft-spoken"));

        let typed = registry.resolve("Unknown", CharacterType::Scifi).unwrap();
        assert_eq!(typed.style.as_deref(), Some("precise, clipped"));
    }

    #[test]
    fn ron_pack_round_trip() {
        let ron_src = r#"[
            (
                character: Some("Vex"),
                character_type: scifi,
                style: Some("sardonic"),
                forbidden: [(phrase: "as an AI", replacement: "as a professional")],
            ),
        ]"#;
        let mut registry = VoiceRegistry::new();
        registry.load_ron_str(ron_src).unwrap();
        let v = registry.resolve("Vex", CharacterType::Scifi).unwrap();
        assert_eq!(v.forbidden.len(), 1);
        assert_eq!(v.style.as_deref(), Some("sardonic"));
    }

    #[test]
    fn default_templates_cover_every_type() {
        let registry = VoiceRegistry::with_defaults();
        for t in [
            CharacterType::Fantasy,
            CharacterType::Scifi,
            CharacterType::Historical,
            CharacterType::Modern,
            CharacterType::Superhero,
            CharacterType::Adventure,
        ] {
            assert!(registry.resolve("nobody", t).is_some());
        }
    }
}
