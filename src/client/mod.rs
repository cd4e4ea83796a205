//! Boundary to the remote AI service
//!
//! Everything that crosses the network is typed here; malformed payloads
//! become `RequestFailure` instead of leaking shape assumptions inward.

pub mod gemini;
pub mod retry;

pub use gemini::GeminiClient;
pub use retry::RetryPolicy;

use crate::Result;

/// One chat turn as sent to the remote model
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub prompt: String,
    pub system_instruction: String,
    /// Route to the reasoning model with a thinking budget
    pub deep_reasoning: bool,
    /// Attach web-search grounding; callers clear this while deep
    /// reasoning is on
    pub web_grounding: bool,
}

impl ModelRequest {
    pub fn new(prompt: impl Into<String>, system_instruction: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_instruction: system_instruction.into(),
            deep_reasoning: false,
            web_grounding: false,
        }
    }
}

/// A source link returned alongside a grounded response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub title: Option<String>,
    pub uri: Option<String>,
}

/// Validated model output
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub text: String,
    pub citations: Vec<Citation>,
}

/// Blocking boundary to the remote AI service.
///
/// Implementations are called from worker threads; every method bounds its
/// own transport timeout.
pub trait ModelClient: Send + Sync {
    /// One text generation turn
    fn generate(&self, request: &ModelRequest) -> Result<ModelResponse>;

    /// Calming image generation; returns encoded image bytes
    fn generate_image(&self, prompt: &str) -> Result<Vec<u8>>;

    /// Narration synthesis; returns raw 16-bit little-endian PCM
    fn generate_speech(&self, text: &str) -> Result<Vec<u8>>;
}
