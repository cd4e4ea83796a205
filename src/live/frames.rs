//! Wire codec for the live voice connection
//!
//! Outbound frames carry base64 16-bit PCM inside a realtime-input message;
//! inbound messages carry audio, an interruption signal, or turn bookkeeping.

use crate::{Result, SolaceError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;

/// Decoded inbound message
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// PCM samples ready for scheduling
    Audio(Vec<f32>),

    /// The user started talking over the assistant; discard playback
    Interrupted,

    /// The assistant finished a spoken turn
    TurnComplete,

    /// Valid but irrelevant payload
    Ignored,
}

/// Handshake payload sent once after connecting
pub fn setup_message(model: &str, system_instruction: &str) -> String {
    json!({
        "setup": {
            "model": format!("models/{}", model),
            "generationConfig": {"responseModalities": ["AUDIO"]},
            "systemInstruction": {"parts": [{"text": system_instruction}]},
        }
    })
    .to_string()
}

/// One outbound microphone frame
pub fn encode_audio_frame(samples: &[f32], sample_rate: u32) -> String {
    let encoded = BASE64.encode(f32_to_pcm16(samples));
    json!({
        "realtimeInput": {
            "mediaChunks": [{
                "mimeType": format!("audio/pcm;rate={}", sample_rate),
                "data": encoded,
            }]
        }
    })
    .to_string()
}

#[derive(Debug, Deserialize)]
struct ServerMessage {
    #[serde(rename = "serverContent")]
    server_content: Option<ServerContent>,
}

#[derive(Debug, Deserialize)]
struct ServerContent {
    #[serde(rename = "modelTurn")]
    model_turn: Option<ModelTurn>,
    #[serde(default)]
    interrupted: bool,
    #[serde(rename = "turnComplete", default)]
    turn_complete: bool,
}

#[derive(Debug, Deserialize)]
struct ModelTurn {
    parts: Option<Vec<TurnPart>>,
}

#[derive(Debug, Deserialize)]
struct TurnPart {
    #[serde(rename = "inlineData")]
    inline_data: Option<TurnInlineData>,
}

#[derive(Debug, Deserialize)]
struct TurnInlineData {
    data: Option<String>,
}

/// Decode one inbound text payload.
///
/// Unparseable payloads are a `RequestFailure`; parseable payloads that
/// carry nothing of interest decode to `Ignored`.
pub fn decode_server_message(raw: &str) -> Result<ServerEvent> {
    let message: ServerMessage = serde_json::from_str(raw)
        .map_err(|e| SolaceError::RequestFailure(format!("malformed server message: {}", e)))?;

    let Some(content) = message.server_content else {
        return Ok(ServerEvent::Ignored);
    };

    if content.interrupted {
        return Ok(ServerEvent::Interrupted);
    }

    let audio = content
        .model_turn
        .and_then(|t| t.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.inline_data)
        .filter_map(|d| d.data)
        .next();

    if let Some(encoded) = audio {
        let bytes = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| SolaceError::RequestFailure(format!("invalid audio payload: {}", e)))?;
        return Ok(ServerEvent::Audio(pcm16_to_f32(&bytes)));
    }

    if content.turn_complete {
        return Ok(ServerEvent::TurnComplete);
    }

    Ok(ServerEvent::Ignored)
}

/// Convert float samples to 16-bit little-endian PCM
pub fn f32_to_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert 16-bit little-endian PCM to float samples; a trailing odd byte
/// is dropped
pub fn pcm16_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect()
}
