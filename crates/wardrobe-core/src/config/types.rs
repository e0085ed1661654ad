//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where local models are stored
    pub model_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.wardrobe/models"),
        }
    }
}

/// Endpoint store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database holding the configured endpoints
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "~/.wardrobe/endpoints.db".to_string(),
        }
    }
}

/// How the background is removed before analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundMode {
    /// In-process segmentation model
    #[default]
    Local,
    /// Remote removal service, degrading to local on failure
    Remote,
}

impl BackgroundMode {
    /// Interpret a mode string. `local` selects local; any other non-empty
    /// value selects the remote service.
    pub fn from_setting(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            None
        } else if value.eq_ignore_ascii_case("local") {
            Some(BackgroundMode::Local)
        } else {
            Some(BackgroundMode::Remote)
        }
    }
}

/// Background removal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    /// Mode used when `REMOVEBG_TYPE` is not set in the environment
    pub default_mode: BackgroundMode,

    /// Segmentation model directory name under `general.model_dir`
    pub model: String,

    /// Remote removal request timeout in milliseconds
    pub remote_timeout_ms: u64,

    /// Where `wardrobe models download` fetches the segmentation model from
    pub model_url: String,

    /// Expected BLAKE3 hex digest of the downloaded model, if pinned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_blake3: Option<String>,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            default_mode: BackgroundMode::Local,
            model: "u2net".to_string(),
            remote_timeout_ms: 60_000,
            model_url: "https://github.com/danielgatis/rembg/releases/download/v0.0.0/u2net.onnx"
                .to_string(),
            model_blake3: None,
        }
    }
}

/// Vision request settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Total attempts per request (first try included)
    pub max_attempts: u32,

    /// Fixed delay between failed attempts in milliseconds
    pub retry_delay_ms: u64,

    /// Per-attempt HTTP timeout in milliseconds
    pub timeout_ms: u64,

    /// `max_tokens` cap sent with each chat request
    pub max_tokens: u32,

    /// API version path segment appended to endpoint base URLs
    pub api_version: String,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 5_000,
            timeout_ms: 60_000,
            max_tokens: 1_000,
            api_version: "v1".to_string(),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format ("json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
