//! Vector store client
//!
//! The document collection is reached only through the [`VectorStore`]
//! trait, so the storage engine can be swapped without touching the RAG
//! pipeline or the HTTP layer:
//! - [`WorkerVectorStore`]: one external worker process per operation
//! - [`InMemoryVectorStore`]: in-process map, for tests and offline runs

pub mod memory;
pub mod types;
pub mod worker;

use async_trait::async_trait;

use crate::errors::Result;

pub use memory::InMemoryVectorStore;
pub use types::{Document, Metadata, SearchResult, StoreStats};
pub use worker::{StoreScripts, WorkerVectorStore};

/// Result count used by direct searches when the caller asks for none
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Map a caller-supplied limit to a usable one; non-positive means `default`
pub fn normalize_limit(limit: i64, default: usize) -> usize {
    if limit <= 0 {
        default
    } else {
        usize::try_from(limit).unwrap_or(default)
    }
}

/// Operations over a document collection
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store a document. Repeated ids are handled by the store; no dedup here.
    async fn add_document(&self, doc: &Document) -> Result<()>;

    /// Similarity search; `limit <= 0` means [`DEFAULT_SEARCH_LIMIT`].
    /// Results come back in the store's relevance order, at most `limit`.
    async fn search(&self, query: &str, limit: i64) -> Result<Vec<SearchResult>>;

    /// Every stored document, in no particular order
    async fn list_documents(&self) -> Result<Vec<Document>>;

    async fn delete_document(&self, id: &str) -> Result<()>;

    /// Replace the metadata of `id` with exactly `metadata`
    async fn update_metadata(&self, id: &str, metadata: &Metadata) -> Result<()>;

    async fn get_stats(&self) -> Result<StoreStats>;

    /// Lightweight readiness check; never fails
    async fn is_healthy(&self) -> bool;
}
