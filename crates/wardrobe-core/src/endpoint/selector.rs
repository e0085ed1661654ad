//! Least-usage endpoint selection.

use super::store::EndpointStore;
use crate::error::AnalyzeError;
use crate::types::{Capability, EndpointConfig};
use std::sync::Arc;

/// Chooses which configured endpoint serves a capability.
///
/// Picks the active endpoint with the lowest usage counter, ties broken by
/// id. Two concurrent callers may pick the same endpoint before either
/// records usage; counts are still exact because recording is an
/// independent increment.
#[derive(Clone)]
pub struct EndpointSelector {
    store: Arc<dyn EndpointStore>,
}

impl EndpointSelector {
    pub fn new(store: Arc<dyn EndpointStore>) -> Self {
        Self { store }
    }

    /// Select the least-used active endpoint for `capability`.
    pub async fn select(&self, capability: Capability) -> Result<EndpointConfig, AnalyzeError> {
        let candidates = self.store.list_active(capability).await?;
        let selected = candidates
            .into_iter()
            .min_by_key(|e| (e.usage_count, e.id))
            .ok_or(AnalyzeError::NoEndpointConfigured { capability })?;

        tracing::debug!(
            "Selected {capability} endpoint #{} ({}, usage {})",
            selected.id,
            selected.api_base,
            selected.usage_count
        );
        Ok(selected)
    }

    /// Record one successful call through `endpoint_id`.
    ///
    /// Best-effort: returns false (and logs) when the id is not an active
    /// endpoint or the store fails. Never returns an error.
    pub async fn record_usage(&self, endpoint_id: i64) -> bool {
        match self.store.increment_usage(endpoint_id).await {
            Ok(true) => true,
            Ok(false) => {
                tracing::warn!("Usage not recorded: endpoint #{endpoint_id} is not active");
                false
            }
            Err(e) => {
                tracing::warn!("Usage not recorded for endpoint #{endpoint_id}: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::MemoryEndpointStore;
    use crate::error::StoreError;
    use crate::types::NewEndpoint;
    use async_trait::async_trait;

    fn llm(base: &str) -> NewEndpoint {
        NewEndpoint {
            capability: Capability::Llm,
            api_base: base.to_string(),
            api_key: "sk-test".to_string(),
            model: None,
        }
    }

    /// A store whose reads and writes always fail.
    struct BrokenStore;

    #[async_trait]
    impl EndpointStore for BrokenStore {
        async fn list_active(
            &self,
            _capability: Capability,
        ) -> Result<Vec<EndpointConfig>, StoreError> {
            Err(StoreError::Task("disk on fire".to_string()))
        }

        async fn increment_usage(&self, _id: i64) -> Result<bool, StoreError> {
            Err(StoreError::Task("disk on fire".to_string()))
        }
    }

    #[tokio::test]
    async fn test_select_empty_is_no_endpoint_configured() {
        let selector = EndpointSelector::new(Arc::new(MemoryEndpointStore::new()));
        let err = selector.select(Capability::Llm).await.unwrap_err();
        assert!(matches!(
            err,
            AnalyzeError::NoEndpointConfigured {
                capability: Capability::Llm
            }
        ));
    }

    #[tokio::test]
    async fn test_select_returns_global_minimum() {
        let store = Arc::new(MemoryEndpointStore::new());
        let a = store.insert(llm("https://a.example.com"));
        let b = store.insert(llm("https://b.example.com"));
        let selector = EndpointSelector::new(store.clone());

        // Ties resolve to the lowest id.
        assert_eq!(selector.select(Capability::Llm).await.unwrap().id, a);

        assert!(selector.record_usage(a).await);
        assert_eq!(store.usage_of(a), Some(1));
        assert_eq!(selector.select(Capability::Llm).await.unwrap().id, b);

        assert!(selector.record_usage(b).await);
        assert!(selector.record_usage(b).await);
        assert_eq!(store.usage_of(b), Some(2));
        assert_eq!(selector.select(Capability::Llm).await.unwrap().id, a);
    }

    #[tokio::test]
    async fn test_round_robin_under_sequential_traffic() {
        let store = Arc::new(MemoryEndpointStore::new());
        let ids = [
            store.insert(llm("https://a.example.com")),
            store.insert(llm("https://b.example.com")),
            store.insert(llm("https://c.example.com")),
        ];
        let selector = EndpointSelector::new(store.clone());

        let mut picked = Vec::new();
        for _ in 0..6 {
            let endpoint = selector.select(Capability::Llm).await.unwrap();
            selector.record_usage(endpoint.id).await;
            picked.push(endpoint.id);
        }
        assert_eq!(picked, [ids, ids].concat());
    }

    #[tokio::test]
    async fn test_record_usage_unknown_id_is_false() {
        let selector = EndpointSelector::new(Arc::new(MemoryEndpointStore::new()));
        assert!(!selector.record_usage(42).await);
    }

    #[tokio::test]
    async fn test_store_failures() {
        let selector = EndpointSelector::new(Arc::new(BrokenStore));
        assert!(matches!(
            selector.select(Capability::RemoveBg).await,
            Err(AnalyzeError::Store(_))
        ));
        assert!(!selector.record_usage(1).await);
    }
}
