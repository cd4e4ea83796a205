pub mod journal;
pub mod meditations;
pub mod vision;

pub use journal::{mood_score, MoodJournal};
pub use meditations::{Category, GroundingStep, Meditation, CATALOG, GROUNDING_STEPS};
