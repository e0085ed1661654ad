//! In-process endpoint store, for embedding and tests.

use super::store::{sort_by_usage, EndpointStore};
use crate::error::StoreError;
use crate::types::{Capability, EndpointConfig, NewEndpoint};
use async_trait::async_trait;
use std::sync::Mutex;

/// Mutex-guarded endpoint list. The lock is never held across an await.
#[derive(Default)]
pub struct MemoryEndpointStore {
    endpoints: Mutex<Vec<EndpointConfig>>,
}

impl MemoryEndpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an endpoint and return its id. Ids follow insertion order.
    pub fn insert(&self, endpoint: NewEndpoint) -> i64 {
        let mut endpoints = self.lock();
        let id = endpoints.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        endpoints.push(EndpointConfig {
            id,
            capability: endpoint.capability,
            api_base: endpoint.api_base,
            api_key: endpoint.api_key,
            model: endpoint.model,
            usage_count: 0,
            deleted: false,
            created_at: chrono::Utc::now(),
        });
        id
    }

    /// Mark an endpoint deleted. Returns false if the id is unknown.
    pub fn soft_delete(&self, id: i64) -> bool {
        let mut endpoints = self.lock();
        match endpoints.iter_mut().find(|e| e.id == id) {
            Some(endpoint) => {
                endpoint.deleted = true;
                true
            }
            None => false,
        }
    }

    /// Current usage counter of an endpoint, deleted or not.
    pub fn usage_of(&self, id: i64) -> Option<u64> {
        self.lock().iter().find(|e| e.id == id).map(|e| e.usage_count)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<EndpointConfig>> {
        // Entries are plain values; a poisoned lock still holds valid data.
        self.endpoints
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl EndpointStore for MemoryEndpointStore {
    async fn list_active(
        &self,
        capability: Capability,
    ) -> Result<Vec<EndpointConfig>, StoreError> {
        let mut active: Vec<EndpointConfig> = self
            .lock()
            .iter()
            .filter(|e| !e.deleted && e.capability == capability)
            .cloned()
            .collect();
        sort_by_usage(&mut active);
        Ok(active)
    }

    async fn increment_usage(&self, id: i64) -> Result<bool, StoreError> {
        let mut endpoints = self.lock();
        match endpoints.iter_mut().find(|e| e.id == id && !e.deleted) {
            Some(endpoint) => {
                endpoint.usage_count += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
