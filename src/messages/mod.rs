pub mod transcript;
pub mod types;

pub use transcript::Transcript;
pub use types::{IntensityStage, Message, Role, TherapySession};
