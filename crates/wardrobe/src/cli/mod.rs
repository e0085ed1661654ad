//! Command implementations.

pub mod analyze;
pub mod config;
pub mod endpoints;
pub mod models;

use anyhow::Context;
use wardrobe_core::{Config, SqliteEndpointStore};

/// Open the endpoint store configured in `[store]`.
pub(crate) fn open_store(config: &Config) -> anyhow::Result<SqliteEndpointStore> {
    let path = config.store_path();
    tracing::debug!("Opening endpoint store at {}", path.display());
    SqliteEndpointStore::open(&path)
        .with_context(|| format!("Failed to open endpoint store at {}", path.display()))
}
