//! Data access layer for the bookshelf service.
//!
//! Handlers and serializers talk to storage only through the [`Store`]
//! trait, so the backend is picked at bootstrap by [`connect`].

use std::sync::Arc;

use anyhow::{bail, Context};

pub mod error;
pub mod memory;
pub mod migrate;
pub mod models;
pub mod sqlite;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use migrate::Migration;
pub use models::{Author, Book, NewAuthor, NewBook};
pub use sqlite::SqliteStore;
pub use store::Store;

/// Open the store described by `endpoint`.
///
/// `memory` and `memory://` select [`MemoryStore`]; `sqlite:` URLs select
/// [`SqliteStore`].
pub async fn connect(endpoint: &str, max_connections: u32) -> anyhow::Result<Arc<dyn Store>> {
    if endpoint == "memory" || endpoint.starts_with("memory://") {
        tracing::info!(target: "bookshelf-db", "using in-memory store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    if endpoint.starts_with("sqlite:") {
        let store = SqliteStore::connect(endpoint, max_connections)
            .await
            .with_context(|| format!("failed to open sqlite database '{endpoint}'"))?;
        tracing::info!(target: "bookshelf-db", endpoint, "connected to sqlite store");
        return Ok(Arc::new(store));
    }

    bail!("unsupported database endpoint '{endpoint}'; expected memory:// or sqlite:")
}
