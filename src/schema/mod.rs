pub mod character;
pub mod message;
pub mod mood;
pub mod narrative;
pub mod relationship;
