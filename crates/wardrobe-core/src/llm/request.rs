//! Chat-completions request and response shapes for vision calls.

use base64::Engine;
use image::ImageFormat;
use serde::{Deserialize, Serialize};

use crate::error::AnalyzeError;
use crate::types::ModelInfo;

/// Base64-encoded image ready to embed in a chat message.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Encode raw bytes, sniffing the media type from the content.
    ///
    /// Background removal emits PNG, so unrecognized content is labelled
    /// `image/png`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let media_type = match image::guess_format(bytes) {
            Ok(ImageFormat::Jpeg) => "image/jpeg",
            Ok(ImageFormat::Png) => "image/png",
            Ok(ImageFormat::WebP) => "image/webp",
            Ok(ImageFormat::Gif) => "image/gif",
            Ok(ImageFormat::Bmp) => "image/bmp",
            Ok(other) => {
                tracing::debug!("No data-URI media type for {other:?}, labelling as image/png");
                "image/png"
            }
            Err(_) => "image/png",
        };

        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }

    /// Return a data URL suitable for OpenAI-style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

// --- Request types ---

/// A single-turn multimodal chat request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: Vec<ChatContent>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ChatContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ChatRequest {
    /// One user message carrying the prompt text followed by the image.
    pub fn vision(model: Option<String>, prompt: &str, image: &ImageInput, max_tokens: u32) -> Self {
        Self {
            model,
            max_tokens,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ChatContent::Text {
                        text: prompt.to_string(),
                    },
                    ChatContent::ImageUrl {
                        image_url: ImageUrl {
                            url: image.data_url(),
                        },
                    },
                ],
            }],
        }
    }
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    choices: Option<Vec<Choice>>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
    name: Option<String>,
}

/// Normalize a base URL so it ends in the API version segment.
///
/// Idempotent: `https://host/v1`, `https://host/v1/` and `https://host` all
/// become `https://host/v1`.
pub fn normalize_api_base(base: &str, api_version: &str) -> String {
    let base = base.trim().trim_end_matches('/');
    let suffix = format!("/{}", api_version.trim_matches('/'));
    if base.ends_with(&suffix) {
        base.to_string()
    } else {
        format!("{base}{suffix}")
    }
}

/// Pull the first reply's text out of a chat-completions body.
pub fn parse_chat_reply(body: &str) -> Result<String, AnalyzeError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| AnalyzeError::MalformedResponse(format!("body is not valid JSON: {e}")))?;

    let choice = response
        .choices
        .and_then(|choices| choices.into_iter().next())
        .ok_or_else(|| AnalyzeError::MalformedResponse("missing or empty 'choices'".to_string()))?;

    let content = choice
        .message
        .and_then(|m| m.content)
        .ok_or_else(|| {
            AnalyzeError::MalformedResponse("first choice has no message content".to_string())
        })?;

    match content {
        serde_json::Value::String(text) => Ok(text.trim().to_string()),
        // Some gateways return content as a list of typed parts.
        serde_json::Value::Array(parts) => {
            let texts: Vec<&str> = parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect();
            if texts.is_empty() {
                Err(AnalyzeError::MalformedResponse(
                    "message content has no text parts".to_string(),
                ))
            } else {
                Ok(texts.concat().trim().to_string())
            }
        }
        other => Err(AnalyzeError::MalformedResponse(format!(
            "unexpected message content type: {other}"
        ))),
    }
}

/// Parse an OpenAI-style `/models` listing.
pub fn parse_model_list(body: &str) -> Result<Vec<ModelInfo>, AnalyzeError> {
    let list: ModelList = serde_json::from_str(body)
        .map_err(|e| AnalyzeError::MalformedResponse(format!("unexpected model list: {e}")))?;
    Ok(list
        .data
        .into_iter()
        .map(|m| ModelInfo {
            name: m.name.unwrap_or_else(|| m.id.clone()),
            id: m.id,
        })
        .collect())
}
