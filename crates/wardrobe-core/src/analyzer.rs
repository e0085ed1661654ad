//! End-to-end analysis: background removal, vision request, JSON extraction
//! and normalization.

use std::sync::Arc;
use std::time::Duration;

use crate::background::{BackgroundRemover, LocalRemover, RemoveBgClient, U2NetSegmenter};
use crate::config::Config;
use crate::endpoint::{EndpointSelector, EndpointStore};
use crate::error::AnalyzeError;
use crate::extract::extract_json;
use crate::llm::{HttpTransport, VisionClient, VisionOptions};
use crate::normalize::normalize;
use crate::prompts::{GARMENT_SEMANTIC_PROMPT, ITEMS_ANALYZE_PROMPT};
use crate::types::{ExtractedObject, GarmentSemantics};

/// Turns raw image bytes into a validated garment record.
pub struct GarmentAnalyzer {
    remover: BackgroundRemover,
    vision: VisionClient,
}

impl GarmentAnalyzer {
    pub fn new(remover: BackgroundRemover, vision: VisionClient) -> Self {
        Self { remover, vision }
    }

    /// Wire the production components from configuration over `store`.
    pub fn from_config(config: &Config, store: Arc<dyn EndpointStore>) -> Self {
        let selector = EndpointSelector::new(store);

        let segmenter = Arc::new(U2NetSegmenter::new(config.segmentation_model_path()));
        let remote = Arc::new(RemoveBgClient::new(Duration::from_millis(
            config.background.remote_timeout_ms,
        )));
        let remover = BackgroundRemover::new(
            LocalRemover::new(segmenter),
            remote,
            selector.clone(),
            config.background.default_mode,
        );

        let vision = VisionClient::new(
            selector,
            Arc::new(HttpTransport::new()),
            VisionOptions::from(&config.vision),
        );

        Self::new(remover, vision)
    }

    /// The underlying vision client, for endpoint-level operations such as
    /// listing models.
    pub fn vision(&self) -> &VisionClient {
        &self.vision
    }

    /// Analyze a garment photo into the semantic schema.
    pub async fn analyze_garment(&self, image: &[u8]) -> Result<GarmentSemantics, AnalyzeError> {
        let processed = self.remover.remove(image).await;
        let reply = self.vision.analyze(&processed, GARMENT_SEMANTIC_PROMPT).await?;
        let obj = extract_json(reply.as_str())?;
        let semantics = normalize(&obj)?;

        tracing::info!(
            "Garment analyzed: {} ({})",
            semantics.item,
            semantics.category
        );
        Ok(semantics)
    }

    /// Recognize general items in a photo; returns the extracted JSON as-is.
    pub async fn analyze_items(&self, image: &[u8]) -> Result<ExtractedObject, AnalyzeError> {
        let processed = self.remover.remove(image).await;
        let reply = self.vision.analyze(&processed, ITEMS_ANALYZE_PROMPT).await?;
        let obj = extract_json(reply.as_str())?;

        tracing::info!("Item analysis returned {} top-level fields", obj.len());
        Ok(obj)
    }
}
