//! Vision request client with endpoint routing and bounded retries.

use super::request::{normalize_api_base, parse_chat_reply, parse_model_list, ChatRequest, ImageInput};
use super::retry::{self, AttemptLog};
use super::transport::{ChatTransport, HttpReply};
use crate::config::VisionConfig;
use crate::endpoint::EndpointSelector;
use crate::error::AnalyzeError;
use crate::types::{Capability, EndpointConfig, ModelInfo, RawModelReply};
use std::sync::Arc;
use std::time::Duration;

/// Longest response body excerpt carried in an error.
const ERROR_BODY_LIMIT: usize = 500;

/// Tunables for the vision client.
#[derive(Debug, Clone)]
pub struct VisionOptions {
    /// Total attempts per request
    pub max_attempts: u32,
    /// Fixed delay between failed attempts in milliseconds
    pub retry_delay_ms: u64,
    /// Per-attempt HTTP timeout in milliseconds
    pub timeout_ms: u64,
    /// `max_tokens` cap for the reply
    pub max_tokens: u32,
    /// Version segment appended to endpoint base URLs
    pub api_version: String,
}

impl Default for VisionOptions {
    fn default() -> Self {
        Self::from(&VisionConfig::default())
    }
}

impl From<&VisionConfig> for VisionOptions {
    fn from(config: &VisionConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            retry_delay_ms: config.retry_delay_ms,
            timeout_ms: config.timeout_ms,
            max_tokens: config.max_tokens,
            api_version: config.api_version.clone(),
        }
    }
}

/// Sends a prompt plus an image to the least-used LLM endpoint.
pub struct VisionClient {
    selector: EndpointSelector,
    transport: Arc<dyn ChatTransport>,
    options: VisionOptions,
}

impl VisionClient {
    pub fn new(
        selector: EndpointSelector,
        transport: Arc<dyn ChatTransport>,
        options: VisionOptions,
    ) -> Self {
        Self {
            selector,
            transport,
            options,
        }
    }

    /// Analyze an image with the default `llm` capability.
    pub async fn analyze(&self, image: &[u8], prompt: &str) -> Result<RawModelReply, AnalyzeError> {
        self.analyze_with(image, prompt, Capability::Llm).await
    }

    /// Analyze an image using an endpoint of `capability`.
    ///
    /// Records usage on the chosen endpoint exactly once if an attempt gets
    /// a 2xx response; never on total failure.
    pub async fn analyze_with(
        &self,
        image: &[u8],
        prompt: &str,
        capability: Capability,
    ) -> Result<RawModelReply, AnalyzeError> {
        let endpoint = self.resolve(capability).await?;
        let url = format!(
            "{}/chat/completions",
            normalize_api_base(&endpoint.api_base, &self.options.api_version)
        );

        let request = ChatRequest::vision(
            endpoint.model.clone(),
            prompt,
            &ImageInput::from_bytes(image),
            self.options.max_tokens,
        );

        let reply = self.send_with_retry(&endpoint, &url, &request).await?;
        let text = parse_chat_reply(&reply.body)?;
        tracing::debug!("Model reply ({} chars): {}", text.chars().count(), excerpt(&text, 200));
        Ok(RawModelReply(text))
    }

    /// List the models offered by the least-used LLM endpoint.
    ///
    /// An endpoint without an API key yields an empty list.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, AnalyzeError> {
        let endpoint = self.selector.select(Capability::Llm).await?;
        if !endpoint.has_credential() {
            return Ok(Vec::new());
        }
        let url = format!(
            "{}/models",
            normalize_api_base(&endpoint.api_base, &self.options.api_version)
        );

        let reply = self
            .transport
            .get(&url, &endpoint.api_key, self.timeout())
            .await?;
        if !reply.is_success() {
            return Err(non_success(reply));
        }
        parse_model_list(&reply.body)
    }

    async fn resolve(&self, capability: Capability) -> Result<EndpointConfig, AnalyzeError> {
        let endpoint = self.selector.select(capability).await?;
        if !endpoint.has_credential() {
            return Err(AnalyzeError::NotConfigured {
                capability,
                endpoint_id: endpoint.id,
            });
        }
        Ok(endpoint)
    }

    async fn send_with_retry(
        &self,
        endpoint: &EndpointConfig,
        url: &str,
        request: &ChatRequest,
    ) -> Result<HttpReply, AnalyzeError> {
        let max_attempts = self.options.max_attempts;
        let mut log = AttemptLog::new();

        for attempt in 1..=max_attempts {
            tracing::debug!(
                "Vision request attempt {attempt}/{max_attempts} to endpoint #{} ({})",
                endpoint.id,
                endpoint.api_base
            );

            let outcome = match self
                .transport
                .post_chat(url, &endpoint.api_key, request, self.timeout())
                .await
            {
                Ok(reply) if reply.is_success() => Ok(reply),
                Ok(reply) => Err(non_success(reply)),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(reply) => {
                    self.selector.record_usage(endpoint.id).await;
                    return Ok(reply);
                }
                Err(e) if !retry::is_retryable(&e) => return Err(e),
                Err(e) => {
                    tracing::warn!("Vision attempt {attempt}/{max_attempts} failed: {e}");
                    log.record_failure(e);
                    if attempt < max_attempts {
                        let delay = retry::backoff_duration(self.options.retry_delay_ms);
                        tracing::debug!("Retrying in {delay:?}");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        let err = log.into_exhausted();
        tracing::error!("Vision request gave up: {err}");
        Err(err)
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.options.timeout_ms)
    }
}

fn non_success(reply: HttpReply) -> AnalyzeError {
    AnalyzeError::NonSuccessStatus {
        status: reply.status,
        body: excerpt(&reply.body, ERROR_BODY_LIMIT),
    }
}

/// First `limit` characters of `text`, on a char boundary.
pub(crate) fn excerpt(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
