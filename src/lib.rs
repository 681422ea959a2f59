//! Roleplay Engine — rule-based multi-character conversation simulation.
//!
//! Decides who speaks next, evolves character moods and pairwise
//! relationships, infers narrative phase and emotional tone, proposes
//! branching plot developments, and synthesizes character-voiced reply
//! text — all without neural network inference, using priority-ordered
//! response rules, keyword extraction, and weighted template selection
//! over curated pools.

pub mod core;
pub mod schema;

pub use crate::core::engine::{RoleplayEngine, RoleplayEngineBuilder};
pub use crate::schema::character::{Character, CharacterType, Personality};
pub use crate::schema::message::{Message, ResponseLength, WritingInstructions};
