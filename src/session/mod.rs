pub mod archive;
pub mod controller;
pub mod pipeline;

pub use archive::SessionArchive;
pub use controller::{
    build_system_instruction, opening_prompt, ConversationController, ConversationState,
    PendingTurn, UserIdentity,
};
pub use pipeline::{ChatCommand, ChatEvent, ChatHandle, ChatPipeline};
