//! Error types for the Wardrobe analysis pipeline.
//!
//! Errors are organized by stage so the caller can tell a configuration
//! problem (no endpoint, no API key) apart from a misbehaving remote service
//! or a model reply that could not be turned into a garment record.

use crate::types::Capability;
use thiserror::Error;

/// Top-level error type for Wardrobe operations.
#[derive(Error, Debug)]
pub enum WardrobeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Analysis pipeline errors
    #[error("Analysis error: {0}")]
    Analyze(#[from] AnalyzeError),

    /// Endpoint store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Endpoint store failures (database open, query, or task join).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid row in endpoint store: {0}")]
    InvalidRow(String),

    #[error("Store task failed: {0}")]
    Task(String),
}

/// Failures of the analysis pipeline, surfaced to the caller.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    /// No active endpoint exists for the capability
    #[error("No {capability} endpoint configured. Please configure an API key first.")]
    NoEndpointConfigured { capability: Capability },

    /// An endpoint exists but has no usable credential
    #[error("The {capability} endpoint #{endpoint_id} has no API key. Please configure an API key first.")]
    NotConfigured {
        capability: Capability,
        endpoint_id: i64,
    },

    /// The request never produced an HTTP response
    #[error("Request failed: {message}")]
    TransportFailure { message: String },

    /// The remote service answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    NonSuccessStatus { status: u16, body: String },

    /// Every attempt failed; carries the last attempt's error
    #[error("Request failed after {attempts} attempts: {last}")]
    ExhaustedRetries {
        attempts: u32,
        last: Box<AnalyzeError>,
    },

    /// A 2xx body that does not match the chat-completions envelope
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// No JSON object could be located in the model's reply
    #[error("Could not extract JSON from model reply: {excerpt}")]
    UnparsableResponse { excerpt: String },

    /// Extracted JSON lacks a usable required field
    #[error("Schema violation in '{field}': {message}")]
    SchemaViolation { field: String, message: String },

    /// The endpoint store could not be read
    #[error("Endpoint store error: {0}")]
    Store(#[from] StoreError),
}

/// Background removal failures. These never reach the caller of the
/// analysis pipeline: the remover degrades to the local path or to the
/// unmodified image instead.
#[derive(Error, Debug)]
pub enum BackgroundError {
    #[error(
        "Segmentation model not found at {} (run `wardrobe models download`)",
        .0.display()
    )]
    ModelMissing(std::path::PathBuf),

    #[error("Model download failed: {0}")]
    Download(String),

    #[error(
        "Checksum mismatch for {}: expected {expected}, got {actual}",
        path.display()
    )]
    ChecksumMismatch {
        path: std::path::PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Segmentation model error: {0}")]
    Model(String),

    #[error("Image decode error: {0}")]
    Decode(String),

    #[error("Image encode error: {0}")]
    Encode(String),

    #[error("Remote removal request failed: {0}")]
    Transport(String),

    #[error("Remote removal service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Remote removal service returned an empty body")]
    EmptyBody,

    #[error(transparent)]
    Endpoint(#[from] AnalyzeError),
}

/// Convenience type alias for Wardrobe results.
pub type Result<T> = std::result::Result<T, WardrobeError>;

/// Convenience type alias for analysis results.
pub type AnalyzeResult<T> = std::result::Result<T, AnalyzeError>;
