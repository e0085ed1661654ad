//! Configured external endpoints and least-usage routing between them.
//!
//! The selection policy lives in [`EndpointSelector`]; persistence sits
//! behind the [`EndpointStore`] trait with an in-memory and a SQLite
//! implementation.

mod memory;
mod selector;
mod sqlite;
mod store;

pub use memory::MemoryEndpointStore;
pub use selector::EndpointSelector;
pub use sqlite::SqliteEndpointStore;
pub use store::EndpointStore;
