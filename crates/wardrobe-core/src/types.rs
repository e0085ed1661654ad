//! Core data types for the Wardrobe analysis pipeline.
//!
//! These types describe the configured external services the pipeline talks
//! to and the garment record it produces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A class of external service the pipeline depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Vision-language inference (chat-completions compatible)
    Llm,
    /// Remote background removal (remove.bg compatible)
    #[serde(rename = "removebg")]
    RemoveBg,
}

impl Capability {
    /// The identifier used in the endpoint store and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Llm => "llm",
            Capability::RemoveBg => "removebg",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "llm" => Ok(Capability::Llm),
            "removebg" => Ok(Capability::RemoveBg),
            other => Err(format!("unknown capability '{other}' (expected llm or removebg)")),
        }
    }
}

/// One configured external service instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Store-assigned id; also the tie-breaker for selection order
    pub id: i64,

    /// Which capability this endpoint provides
    pub capability: Capability,

    /// Base URL of the service
    pub api_base: String,

    /// Credential sent with each request
    pub api_key: String,

    /// Model name, for LLM endpoints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Number of successful calls made through this endpoint
    pub usage_count: u64,

    /// Soft-delete flag; deleted endpoints are never selected
    pub deleted: bool,

    /// When the endpoint was registered
    pub created_at: DateTime<Utc>,
}

impl EndpointConfig {
    /// Whether the endpoint carries a non-blank credential.
    pub fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Fields needed to register a new endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEndpoint {
    pub capability: Capability,
    pub api_base: String,
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Garment category. Always one of three values, never raw model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Top,
    Bottom,
    Shoes,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Top => "top",
            Category::Bottom => "bottom",
            Category::Shoes => "shoes",
        }
    }

    /// Parse an exact category label, ignoring case and surrounding whitespace.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "top" => Some(Category::Top),
            "bottom" => Some(Category::Bottom),
            "shoes" => Some(Category::Shoes),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// The validated garment record produced by the pipeline.
///
/// Serializes to the persisted record shape: tag lists as JSON arrays,
/// color as a single string, `created_at` as RFC 3339.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarmentSemantics {
    pub category: Category,

    /// Free-text item name (e.g. "牛仔裤", "T恤")
    pub item: String,

    pub style_semantics: Vec<String>,
    pub season_semantics: Vec<String>,
    pub usage_semantics: Vec<String>,

    /// Color semantic label; always a single string
    pub color_semantics: String,

    /// One-sentence summary
    pub description: String,

    pub created_at: DateTime<Utc>,
}

/// Text returned by a vision request. Consumed immediately by the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawModelReply(pub String);

impl RawModelReply {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Untyped key/value structure parsed out of a model reply.
pub type ExtractedObject = serde_json::Map<String, serde_json::Value>;

/// A model offered by an LLM endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
}
