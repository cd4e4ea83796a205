//! Configuration for the service layer
//!
//! Centralizes remote model ids, transport limits, and audio parameters.

use crate::{Result, SolaceError};
use std::path::PathBuf;
use std::time::Duration;

/// Samples per outbound microphone frame
pub const FRAME_SAMPLES: usize = 4096;

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// API key for the remote AI service
    pub api_key: String,

    /// Model used for regular chat turns and summaries
    pub chat_model: String,

    /// Model used when deep reasoning is on
    pub reasoning_model: String,

    /// Thinking budget passed with deep-reasoning requests
    pub reasoning_budget: u32,

    /// Model backing the bidirectional live voice connection
    pub live_model: String,

    /// Model used for calming image generation
    pub image_model: String,

    /// Model used for meditation narration
    pub speech_model: String,

    /// Prebuilt voice for narration
    pub speech_voice: String,

    /// Bound on every remote HTTP call
    pub request_timeout: Duration,

    /// Microphone capture rate expected by the live endpoint
    pub input_sample_rate: u32,

    /// Playback rate of inbound live audio
    pub output_sample_rate: u32,

    /// Data directory override; defaults to the platform data dir
    pub data_dir: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            chat_model: "gemini-3-flash-preview".to_string(),
            reasoning_model: "gemini-3-pro-preview".to_string(),
            reasoning_budget: 16000,
            live_model: "gemini-2.5-flash-native-audio-preview-12-2025".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            speech_model: "gemini-2.5-flash-preview-tts".to_string(),
            speech_voice: "Charon".to_string(),
            request_timeout: Duration::from_secs(30),
            input_sample_rate: 16000,
            output_sample_rate: 24000,
            data_dir: None,
        }
    }
}

impl ServiceConfig {
    /// Build a configuration from the environment (`SOLACE_API_KEY`,
    /// falling back to `GEMINI_API_KEY`).
    pub fn from_env() -> Self {
        let api_key = std::env::var("SOLACE_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .unwrap_or_default();
        Self {
            api_key,
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(SolaceError::ValidationError(
                "API key is not set (SOLACE_API_KEY)".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.input_sample_rate, 16000);
        assert_eq!(config.output_sample_rate, 24000);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_validate_requires_api_key() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_err());
        assert!(config.with_api_key("k").validate().is_ok());
    }
}
