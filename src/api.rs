//! Request and response types for the Gemini `generateContent` family.
//!
//! Requests serialize to the REST JSON the generative language API expects;
//! responses arrive either as SSE data payloads (streaming chat) or as a
//! single body (title generation), but share one shape.

use crate::core::session::{Message, Source};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: &str) -> Self {
        Self::with_role("user", text)
    }

    pub fn model(text: &str) -> Self {
        Self::with_role("model", text)
    }

    /// System instructions carry no role on the wire.
    pub fn system(text: &str) -> Self {
        Self {
            role: None,
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }

    fn with_role(role: &str, text: &str) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

impl From<&Message> for Content {
    fn from(message: &Message) -> Self {
        Self::with_role(message.role.as_str(), &message.text)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: i32,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
pub struct GoogleSearch {}

#[derive(Debug, Serialize)]
pub struct Tool {
    #[serde(rename = "googleSearch")]
    pub google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(
        rename = "generationConfig",
        skip_serializing_if = "Option::is_none"
    )]
    pub generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
}

impl GenerateContentRequest {
    /// Build the streaming chat request: full conversation history, the
    /// persona as system instruction, and optionally the search tool.
    pub fn chat(messages: &[Message], system_instruction: &str, web_search: bool) -> Self {
        Self {
            contents: messages.iter().map(Content::from).collect(),
            system_instruction: Some(Content::system(system_instruction)),
            generation_config: None,
            tools: web_search.then(|| {
                vec![Tool {
                    google_search: GoogleSearch {},
                }]
            }),
        }
    }

    /// Build the one-shot title request. Short output, low temperature, and
    /// no thinking budget keep it fast and cheap.
    pub fn title(prompt: &str) -> Self {
        Self {
            contents: vec![Content::user(prompt)],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                max_output_tokens: Some(20),
                temperature: Some(0.3),
                thinking_config: Some(ThinkingConfig { thinking_budget: 0 }),
            }),
            tools: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSource {
    pub uri: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingChunk {
    pub web: Option<WebSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorInfo {
    pub code: Option<i64>,
    pub message: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub error: Option<ApiErrorInfo>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate's parts.
    pub fn text_delta(&self) -> String {
        let mut out = String::new();
        if let Some(content) = self.candidates.first().and_then(|c| c.content.as_ref()) {
            for part in &content.parts {
                if let Some(text) = &part.text {
                    out.push_str(text);
                }
            }
        }
        out
    }

    /// Web sources attached to the first candidate. Chunks missing either a
    /// URI or a title are skipped.
    pub fn sources(&self) -> Vec<Source> {
        let Some(metadata) = self
            .candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
        else {
            return Vec::new();
        };
        metadata
            .grounding_chunks
            .iter()
            .filter_map(|chunk| {
                let web = chunk.web.as_ref()?;
                Some(Source {
                    uri: web.uri.clone()?,
                    title: web.title.clone()?,
                })
            })
            .collect()
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_request_matches_the_wire_shape() {
        let history = vec![Message::user("Hello"), Message::model("Hi! How are you?")];
        let request = GenerateContentRequest::chat(&history, "Be kind.", true);

        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            value,
            json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "Hello"}]},
                    {"role": "model", "parts": [{"text": "Hi! How are you?"}]},
                ],
                "system_instruction": {"parts": [{"text": "Be kind."}]},
                "tools": [{"googleSearch": {}}],
            })
        );
    }

    #[test]
    fn chat_request_omits_tools_when_search_is_off() {
        let history = vec![Message::user("Hello")];
        let request = GenerateContentRequest::chat(&history, "Be kind.", false);

        let value = serde_json::to_value(&request).expect("serialize");
        assert!(value.get("tools").is_none());
        assert!(value.get("generationConfig").is_none());
    }

    #[test]
    fn title_request_caps_output_and_disables_thinking() {
        let request = GenerateContentRequest::title("Name this chat.");

        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            value,
            json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "Name this chat."}]},
                ],
                "generationConfig": {
                    "maxOutputTokens": 20,
                    "temperature": 0.3,
                    "thinkingConfig": {"thinkingBudget": 0},
                },
            })
        );
    }

    #[test]
    fn response_text_concatenates_parts() {
        let payload = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "Hello"}, {"text": " there"}],
                },
                "finishReason": "STOP",
            }]
        });
        let response: GenerateContentResponse =
            serde_json::from_value(payload).expect("deserialize");

        assert_eq!(response.text_delta(), "Hello there");
        assert_eq!(response.finish_reason(), Some("STOP"));
        assert!(response.sources().is_empty());
    }

    #[test]
    fn response_sources_require_uri_and_title() {
        let payload = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "See below."}]},
                "groundingMetadata": {
                    "groundingChunks": [
                        {"web": {"uri": "https://example.com/a", "title": "Example A"}},
                        {"web": {"uri": "https://example.com/b"}},
                        {"web": {"title": "No link"}},
                        {},
                    ]
                }
            }]
        });
        let response: GenerateContentResponse =
            serde_json::from_value(payload).expect("deserialize");

        let sources = response.sources();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].uri, "https://example.com/a");
        assert_eq!(sources[0].title, "Example A");
    }

    #[test]
    fn error_payload_parses() {
        let payload = json!({
            "error": {
                "code": 429,
                "message": "Resource has been exhausted",
                "status": "RESOURCE_EXHAUSTED",
            }
        });
        let response: GenerateContentResponse =
            serde_json::from_value(payload).expect("deserialize");

        assert!(response.candidates.is_empty());
        assert_eq!(response.text_delta(), "");

        let error = response.error.expect("error info");
        assert_eq!(error.code, Some(429));
        assert_eq!(error.message.as_deref(), Some("Resource has been exhausted"));
    }
}
