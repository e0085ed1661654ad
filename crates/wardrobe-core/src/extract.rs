//! Locating a JSON object inside a model's free-text reply.
//!
//! Models asked for JSON often wrap it in a markdown fence or surround it with
//! prose. Three strategies are tried in order and the first that yields a JSON
//! object wins:
//!
//! 1. the whole reply parsed directly
//! 2. the interior of the first fenced code block (optionally tagged `json`)
//! 3. the greedy span from the first `{` to the last `}`

use crate::error::AnalyzeError;
use crate::llm::excerpt;
use crate::types::ExtractedObject;
use regex::Regex;
use std::sync::LazyLock;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("fenced block pattern is valid")
});

static BRACE_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("brace span pattern is valid"));

/// Longest reply excerpt carried by `UnparsableResponse`.
const EXCERPT_LIMIT: usize = 200;

/// Extract the JSON object embedded in `text`.
///
/// A JSON value that is not an object (array, string, number) never counts
/// as a match.
pub fn extract_json(text: &str) -> Result<ExtractedObject, AnalyzeError> {
    if let Some(obj) = parse_object(text) {
        return Ok(obj);
    }

    if let Some(obj) = FENCED_BLOCK
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_object(m.as_str()))
    {
        tracing::debug!("Extracted JSON from fenced code block");
        return Ok(obj);
    }

    if let Some(obj) = BRACE_SPAN.find(text).and_then(|m| parse_object(m.as_str())) {
        tracing::debug!("Extracted JSON from brace span");
        return Ok(obj);
    }

    Err(AnalyzeError::UnparsableResponse {
        excerpt: excerpt(text.trim(), EXCERPT_LIMIT),
    })
}

fn parse_object(candidate: &str) -> Option<ExtractedObject> {
    match serde_json::from_str::<serde_json::Value>(candidate.trim()) {
        Ok(serde_json::Value::Object(map)) => Some(map),
        _ => None,
    }
}
