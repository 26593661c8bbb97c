//! Local fallback store.
//!
//! Keeps each record kind as one JSON array under a fixed key
//! (`mock_users`, `mock_products`) in a [`KeyValueStore`]. Used whenever the
//! remote store is unconfigured or does not serve a request. The two stores
//! never sync: records written here stay here.

mod collection;
mod seed;
mod storage;

pub use collection::FallbackCollection;
pub use seed::Seeded;
pub use storage::{FileStore, KeyValueStore, LocalStorage, MemoryStore};

use thiserror::Error;

/// Failures of the fallback path. These reach the caller.
#[derive(Debug, Error)]
pub enum FallbackError {
    /// Reading or writing the backing file failed.
    #[error("Storage error for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The stored value is not a valid collection.
    #[error("Stored collection '{key}' is malformed: {source}")]
    Malformed {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The collection could not be serialised.
    #[error("Failed to encode collection '{key}': {source}")]
    Encode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The bundled first-run collection does not parse.
    #[error("Seed data for {kind} is invalid: {source}")]
    Seed {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Storage keys are plain identifiers.
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),
}
