//! The persistence seam behind endpoint selection.

use crate::error::StoreError;
use crate::types::{Capability, EndpointConfig};
use async_trait::async_trait;

/// Storage for configured endpoints and their usage counters.
///
/// Implementations must return active endpoints ordered by usage ascending,
/// then id ascending, and must increment atomically (no read-modify-write
/// across calls).
#[async_trait]
pub trait EndpointStore: Send + Sync {
    /// Non-deleted endpoints of one capability, least used first.
    async fn list_active(&self, capability: Capability)
        -> Result<Vec<EndpointConfig>, StoreError>;

    /// Increment the usage counter of an active endpoint.
    ///
    /// Returns `Ok(false)` when the id does not resolve to an active endpoint.
    async fn increment_usage(&self, id: i64) -> Result<bool, StoreError>;
}

/// Deterministic selection order: usage ascending, ties by id.
pub(crate) fn sort_by_usage(endpoints: &mut [EndpointConfig]) {
    endpoints.sort_by_key(|e| (e.usage_count, e.id));
}
