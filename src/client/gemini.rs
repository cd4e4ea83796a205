//! HTTP client for the Gemini generateContent API
//!
//! Wire payloads are parsed into typed structs here; anything that does not
//! match becomes a `RequestFailure`.

use super::{Citation, ModelClient, ModelRequest, ModelResponse};
use crate::config::ServiceConfig;
use crate::{Result, SolaceError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiClient {
    agent: ureq::Agent,
    api_key: String,
    chat_model: String,
    reasoning_model: String,
    reasoning_budget: u32,
    image_model: String,
    speech_model: String,
    speech_voice: String,
}

impl GeminiClient {
    pub fn new(config: &ServiceConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.request_timeout)
            .build();

        Self {
            agent,
            api_key: config.api_key.clone(),
            chat_model: config.chat_model.clone(),
            reasoning_model: config.reasoning_model.clone(),
            reasoning_budget: config.reasoning_budget,
            image_model: config.image_model.clone(),
            speech_model: config.speech_model.clone(),
            speech_voice: config.speech_voice.clone(),
        }
    }

    fn post(&self, model: &str, body: serde_json::Value) -> Result<GenerateContentResponse> {
        let url = format!("{}/models/{}:generateContent", API_BASE, model);

        let response = self
            .agent
            .post(&url)
            .set("x-goog-api-key", &self.api_key)
            .send_json(body)
            .map_err(|e| SolaceError::RequestFailure(format!("generateContent failed: {}", e)))?;

        response
            .into_json::<GenerateContentResponse>()
            .map_err(|e| SolaceError::RequestFailure(format!("malformed response body: {}", e)))
    }
}

impl ModelClient for GeminiClient {
    fn generate(&self, request: &ModelRequest) -> Result<ModelResponse> {
        let model = if request.deep_reasoning {
            &self.reasoning_model
        } else {
            &self.chat_model
        };

        let mut body = json!({
            "contents": [{"parts": [{"text": request.prompt}]}],
            "systemInstruction": {"parts": [{"text": request.system_instruction}]},
        });
        if request.deep_reasoning {
            body["generationConfig"] =
                json!({"thinkingConfig": {"thinkingBudget": self.reasoning_budget}});
        }
        if request.web_grounding {
            body["tools"] = json!([{"googleSearch": {}}]);
        }

        debug!(%model, grounded = request.web_grounding, "chat request");
        let raw = self.post(model, body)?;
        extract_text_response(raw)
    }

    fn generate_image(&self, prompt: &str) -> Result<Vec<u8>> {
        let body = json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {"imageConfig": {"aspectRatio": "16:9"}},
        });

        let raw = self.post(&self.image_model, body)?;
        extract_inline_data(raw)
    }

    fn generate_speech(&self, text: &str) -> Result<Vec<u8>> {
        let body = json!({
            "contents": [{"parts": [{"text": text}]}],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": {"voiceName": self.speech_voice}
                    }
                }
            },
        });

        let raw = self.post(&self.speech_model, body)?;
        extract_inline_data(raw)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
    #[serde(rename = "groundingMetadata")]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct Content {
    parts: Option<Vec<Part>>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
    #[serde(rename = "inlineData")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroundingMetadata {
    #[serde(rename = "groundingChunks")]
    grounding_chunks: Option<Vec<GroundingChunk>>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    title: Option<String>,
    uri: Option<String>,
}

/// Collapse a generateContent payload into text plus citations.
fn extract_text_response(raw: GenerateContentResponse) -> Result<ModelResponse> {
    let candidate = raw
        .candidates
        .and_then(|mut c| if c.is_empty() { None } else { Some(c.remove(0)) })
        .ok_or_else(|| SolaceError::RequestFailure("response has no candidates".to_string()))?;

    let text: String = candidate
        .content
        .and_then(|c| c.parts)
        .map(|parts| {
            parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(SolaceError::RequestFailure(
            "response contains no text".to_string(),
        ));
    }

    let citations = candidate
        .grounding_metadata
        .and_then(|g| g.grounding_chunks)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|chunk| chunk.web)
        .map(|web| Citation {
            title: web.title,
            uri: web.uri,
        })
        .collect();

    Ok(ModelResponse { text, citations })
}

/// Pull the first inline-data part out of a payload and decode it.
fn extract_inline_data(raw: GenerateContentResponse) -> Result<Vec<u8>> {
    let encoded = raw
        .candidates
        .unwrap_or_default()
        .into_iter()
        .filter_map(|c| c.content)
        .filter_map(|c| c.parts)
        .flatten()
        .filter_map(|p| p.inline_data)
        .filter_map(|d| d.data)
        .next()
        .ok_or_else(|| SolaceError::RequestFailure("response has no inline data".to_string()))?;

    BASE64
        .decode(encoded.as_bytes())
        .map_err(|e| SolaceError::RequestFailure(format!("invalid base64 payload: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> GenerateContentResponse {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_extract_text_with_citations() {
        let raw = parse(
            r#"{
                "candidates": [{
                    "content": {"parts": [{"text": "Stay grounded."}]},
                    "groundingMetadata": {
                        "groundingChunks": [
                            {"web": {"title": "A", "uri": "u1"}},
                            {"web": {"uri": "u2"}},
                            {"web": {"title": "no uri"}}
                        ]
                    }
                }]
            }"#,
        );

        let response = extract_text_response(raw).unwrap();
        assert_eq!(response.text, "Stay grounded.");
        assert_eq!(response.citations.len(), 3);
        assert_eq!(response.citations[0].title.as_deref(), Some("A"));
        assert_eq!(response.citations[1].uri.as_deref(), Some("u2"));
        assert!(response.citations[2].uri.is_none());
    }

    #[test]
    fn test_missing_text_is_request_failure() {
        let raw = parse(r#"{"candidates": [{"content": {"parts": []}}]}"#);
        assert!(matches!(
            extract_text_response(raw),
            Err(SolaceError::RequestFailure(_))
        ));

        let raw = parse(r#"{}"#);
        assert!(matches!(
            extract_text_response(raw),
            Err(SolaceError::RequestFailure(_))
        ));
    }

    #[test]
    fn test_multi_part_text_is_joined() {
        let raw = parse(
            r#"{"candidates": [{"content": {"parts": [{"text": "one "}, {"text": "two"}]}}]}"#,
        );
        let response = extract_text_response(raw).unwrap();
        assert_eq!(response.text, "one two");
        assert!(response.citations.is_empty());
    }

    #[test]
    fn test_extract_inline_data_decodes_base64() {
        let raw = parse(
            r#"{"candidates": [{"content": {"parts": [{"inlineData": {"data": "AAEC"}}]}}]}"#,
        );
        assert_eq!(extract_inline_data(raw).unwrap(), vec![0u8, 1, 2]);
    }

    #[test]
    fn test_inline_data_missing_is_request_failure() {
        let raw = parse(r#"{"candidates": [{"content": {"parts": [{"text": "no audio"}]}}]}"#);
        assert!(matches!(
            extract_inline_data(raw),
            Err(SolaceError::RequestFailure(_))
        ));
    }

    #[test]
    fn test_invalid_base64_is_request_failure() {
        let raw = parse(
            r#"{"candidates": [{"content": {"parts": [{"inlineData": {"data": "!!!"}}]}}]}"#,
        );
        assert!(matches!(
            extract_inline_data(raw),
            Err(SolaceError::RequestFailure(_))
        ));
    }
}
