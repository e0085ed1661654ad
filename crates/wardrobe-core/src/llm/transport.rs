//! HTTP transport for chat-completions endpoints.

use super::request::ChatRequest;
use crate::error::AnalyzeError;
use async_trait::async_trait;
use std::time::Duration;

/// Status and body of one HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends requests to an LLM endpoint.
///
/// Implementations return `AnalyzeError::TransportFailure` when no response
/// was received; any received response (including non-2xx) is an `Ok`.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// POST a chat request as JSON with bearer authentication.
    async fn post_chat(
        &self,
        url: &str,
        api_key: &str,
        request: &ChatRequest,
        timeout: Duration,
    ) -> Result<HttpReply, AnalyzeError>;

    /// GET a JSON resource with bearer authentication.
    async fn get(&self, url: &str, api_key: &str, timeout: Duration)
        -> Result<HttpReply, AnalyzeError>;
}

/// `reqwest`-based transport.
///
/// Ignores proxy environment variables: regional API gateways are usually
/// reached directly and a system proxy breaks them.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client ({e}), using defaults");
                reqwest::Client::new()
            });
        Self { client }
    }

    async fn finish(resp: reqwest::Response) -> Result<HttpReply, AnalyzeError> {
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| AnalyzeError::TransportFailure {
            message: format!("failed to read response body: {e}"),
        })?;
        Ok(HttpReply { status, body })
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn post_chat(
        &self,
        url: &str,
        api_key: &str,
        request: &ChatRequest,
        timeout: Duration,
    ) -> Result<HttpReply, AnalyzeError> {
        let resp = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(request)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| AnalyzeError::TransportFailure {
                message: e.to_string(),
            })?;
        Self::finish(resp).await
    }

    async fn get(
        &self,
        url: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<HttpReply, AnalyzeError> {
        let resp = self
            .client
            .get(url)
            .bearer_auth(api_key)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| AnalyzeError::TransportFailure {
                message: e.to_string(),
            })?;
        Self::finish(resp).await
    }
}
