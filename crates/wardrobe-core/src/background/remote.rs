//! Remote background removal over a remove.bg-compatible HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use crate::error::BackgroundError;
use crate::types::EndpointConfig;

/// Sends an image to a remote removal service.
#[async_trait]
pub trait RemoteRemover: Send + Sync {
    /// Return the processed image bytes from `endpoint`.
    async fn remove(&self, endpoint: &EndpointConfig, image: &[u8])
        -> Result<Vec<u8>, BackgroundError>;
}

/// Client for remove.bg-style services: multipart `image_file` upload with
/// `size=auto`, authenticated by an `X-Api-Key` header.
pub struct RemoveBgClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl RemoveBgClient {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client ({e}), using defaults");
                reqwest::Client::new()
            });
        Self { client, timeout }
    }
}

#[async_trait]
impl RemoteRemover for RemoveBgClient {
    async fn remove(
        &self,
        endpoint: &EndpointConfig,
        image: &[u8],
    ) -> Result<Vec<u8>, BackgroundError> {
        let form = Form::new()
            .part("image_file", Part::bytes(image.to_vec()).file_name("image"))
            .text("size", "auto");

        let resp = self
            .client
            .post(endpoint.api_base.trim())
            .header("X-Api-Key", endpoint.api_key.trim())
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| BackgroundError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackgroundError::Status {
                status: status.as_u16(),
                body: crate::llm::excerpt(&body, 300),
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| BackgroundError::Transport(format!("failed to read body: {e}")))?;
        if bytes.is_empty() {
            return Err(BackgroundError::EmptyBody);
        }
        Ok(bytes.to_vec())
    }
}
