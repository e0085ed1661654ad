//! Wardrobe Core - garment photo analysis pipeline.
//!
//! Turns raw garment photos into a validated semantic record (category, item,
//! style/season/usage tags, color, description) using a vision-capable LLM.
//!
//! # Architecture
//!
//! ```text
//! Image → Remove background → Vision request → Extract JSON → Normalize → GarmentSemantics
//! ```
//!
//! External services (LLM endpoints, remote background removal) are
//! configured as endpoints in an [`EndpointStore`]; each call is routed to
//! the least-used active endpoint of its capability.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use wardrobe_core::{Config, GarmentAnalyzer, SqliteEndpointStore};
//!
//! #[tokio::main]
//! async fn main() -> wardrobe_core::Result<()> {
//!     let config = Config::load()?;
//!     let store = SqliteEndpointStore::open(&config.store_path())?;
//!     let analyzer = GarmentAnalyzer::from_config(&config, Arc::new(store));
//!
//!     let bytes = std::fs::read("./shirt.jpg")?;
//!     let semantics = analyzer.analyze_garment(&bytes).await?;
//!     println!("{} ({})", semantics.item, semantics.category);
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod background;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod extract;
pub mod llm;
pub mod normalize;
pub mod output;
pub mod prompts;
pub mod types;

pub use analyzer::GarmentAnalyzer;
pub use background::{BackgroundRemover, MODE_ENV};
pub use config::{BackgroundMode, Config};
pub use endpoint::{EndpointSelector, EndpointStore, MemoryEndpointStore, SqliteEndpointStore};
pub use error::{
    AnalyzeError, AnalyzeResult, BackgroundError, ConfigError, Result, StoreError, WardrobeError,
};
pub use extract::extract_json;
pub use llm::{VisionClient, VisionOptions};
pub use normalize::normalize;
pub use output::{ImageReport, OutputFormat, ReportWriter};
pub use types::{
    Capability, Category, EndpointConfig, ExtractedObject, GarmentSemantics, ModelInfo,
    NewEndpoint, RawModelReply,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
