pub mod branches;
pub mod director;
pub mod engine;
pub mod moods;
pub mod relationships;
pub mod scene;
pub mod sentiment;
pub mod speaker;
pub mod synthesis;
pub mod template;
pub mod topics;
pub mod voice;
