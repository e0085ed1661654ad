//! Background removal ahead of vision analysis.
//!
//! Two paths sit behind one operation: an in-process segmentation model and a
//! remote removal service. The mode is read from `REMOVEBG_TYPE` on every
//! call. A remote failure degrades to the local path once; the local path
//! degrades to the unmodified image. Removal therefore never fails.

mod download;
mod local;
mod remote;

pub use download::{download_model, file_blake3, verify_blake3};
pub use local::{
    apply_alpha, prediction_to_mask, preprocess, LocalRemover, Segmenter, U2NetSegmenter,
    MODEL_INPUT_SIZE,
};
pub use remote::{RemoteRemover, RemoveBgClient};

use std::sync::Arc;

use crate::config::BackgroundMode;
use crate::endpoint::EndpointSelector;
use crate::error::{AnalyzeError, BackgroundError};
use crate::types::Capability;

/// Environment variable selecting the removal mode.
pub const MODE_ENV: &str = "REMOVEBG_TYPE";

/// Resolve the removal mode from the environment value, if any.
pub fn resolve_mode(env_value: Option<&str>, default: BackgroundMode) -> BackgroundMode {
    env_value
        .and_then(BackgroundMode::from_setting)
        .unwrap_or(default)
}

/// Removes image backgrounds using the local model or a remote service.
pub struct BackgroundRemover {
    local: LocalRemover,
    remote: Arc<dyn RemoteRemover>,
    selector: EndpointSelector,
    default_mode: BackgroundMode,
}

impl BackgroundRemover {
    pub fn new(
        local: LocalRemover,
        remote: Arc<dyn RemoteRemover>,
        selector: EndpointSelector,
        default_mode: BackgroundMode,
    ) -> Self {
        Self {
            local,
            remote,
            selector,
            default_mode,
        }
    }

    /// The mode the next call will use.
    pub fn current_mode(&self) -> BackgroundMode {
        let env_value = std::env::var(MODE_ENV).ok();
        resolve_mode(env_value.as_deref(), self.default_mode)
    }

    /// Remove the background using the mode currently in effect.
    pub async fn remove(&self, image: &[u8]) -> Vec<u8> {
        self.remove_with_mode(image, self.current_mode()).await
    }

    /// Remove the background using an explicit mode.
    pub async fn remove_with_mode(&self, image: &[u8], mode: BackgroundMode) -> Vec<u8> {
        match mode {
            BackgroundMode::Local => self.local.remove(image).await,
            BackgroundMode::Remote => match self.remove_remote(image).await {
                Ok(processed) => {
                    tracing::info!(
                        "Background removed remotely ({} -> {} bytes)",
                        image.len(),
                        processed.len()
                    );
                    processed
                }
                Err(e) => {
                    tracing::warn!("Remote background removal failed, falling back to local: {e}");
                    self.local.remove(image).await
                }
            },
        }
    }

    async fn remove_remote(&self, image: &[u8]) -> Result<Vec<u8>, BackgroundError> {
        let endpoint = self.selector.select(Capability::RemoveBg).await?;
        if !endpoint.has_credential() {
            return Err(AnalyzeError::NotConfigured {
                capability: Capability::RemoveBg,
                endpoint_id: endpoint.id,
            }
            .into());
        }

        tracing::debug!("Removing background via endpoint #{}", endpoint.id);
        let processed = self.remote.remove(&endpoint, image).await?;
        self.selector.record_usage(endpoint.id).await;
        Ok(processed)
    }
}
