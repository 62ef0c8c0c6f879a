//! In-process vector store
//!
//! Keeps documents in a map and ranks them by query term overlap. No
//! embeddings; good enough for tests and for running the backend without the
//! worker runtime installed.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::RwLock;

use crate::errors::{RagError, Result, StoreFailure};
use crate::store::types::{Document, Metadata, SearchResult, StoreStats};
use crate::store::{normalize_limit, VectorStore, DEFAULT_SEARCH_LIMIT};

/// Map-backed [`VectorStore`]; repeated ids overwrite
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    documents: RwLock<HashMap<String, Document>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Fraction of query terms missing from the document: 0.0 is a full match.
/// A document whose whole text equals the query always scores 0.0.
fn distance(query: &str, query_terms: &[String], text: &str) -> f64 {
    if text.trim() == query.trim() {
        return 0.0;
    }
    if query_terms.is_empty() {
        return 1.0;
    }
    let doc_terms = terms(text);
    let matched = query_terms
        .iter()
        .filter(|q| doc_terms.iter().any(|d| d == *q))
        .count();
    1.0 - matched as f64 / query_terms.len() as f64
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn add_document(&self, doc: &Document) -> Result<()> {
        self.documents
            .write()
            .await
            .insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<SearchResult>> {
        let limit = normalize_limit(limit, DEFAULT_SEARCH_LIMIT);
        let query_terms = terms(query);
        let documents = self.documents.read().await;

        let mut results: Vec<SearchResult> = documents
            .values()
            .map(|doc| SearchResult {
                id: doc.id.clone(),
                distance: distance(query, &query_terms, &doc.text),
                text: doc.text.clone(),
                metadata: doc.metadata.clone(),
            })
            .filter(|r| r.distance < 1.0)
            .collect();

        results.sort_by(|a, b| a.distance.total_cmp(&b.distance).then_with(|| a.id.cmp(&b.id)));
        results.truncate(limit);
        Ok(results)
    }

    async fn list_documents(&self) -> Result<Vec<Document>> {
        Ok(self.documents.read().await.values().cloned().collect())
    }

    async fn delete_document(&self, id: &str) -> Result<()> {
        match self.documents.write().await.remove(id) {
            Some(_) => Ok(()),
            None => Err(RagError::store_delete(
                StoreFailure::Rejected,
                format!("Document {} not found", id),
            )),
        }
    }

    async fn update_metadata(&self, id: &str, metadata: &Metadata) -> Result<()> {
        match self.documents.write().await.get_mut(id) {
            Some(doc) => {
                doc.metadata = metadata.clone();
                Ok(())
            }
            None => Err(RagError::store_write(
                StoreFailure::Rejected,
                format!("Document {} not found", id),
            )),
        }
    }

    async fn get_stats(&self) -> Result<StoreStats> {
        let count = self.documents.read().await.len();
        let mut stats = StoreStats::new();
        stats.insert("total_documents".to_string(), json!(count));
        stats.insert("unique_documents".to_string(), json!(count));
        stats.insert("backend".to_string(), json!("memory"));
        Ok(stats)
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, text: &str) -> Document {
        Document::new(id, text, Metadata::new())
    }

    #[tokio::test]
    async fn test_add_then_search_finds_document() {
        let store = InMemoryVectorStore::new();
        let mut metadata = Metadata::new();
        metadata.insert("a".to_string(), json!(1));
        store
            .add_document(&Document::new("x", "hello world", metadata))
            .await
            .unwrap();

        let results = store.search("hello", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "x");
        assert_eq!(results[0].metadata["a"], 1);
    }

    #[tokio::test]
    async fn test_search_orders_by_distance_and_respects_limit() {
        let store = InMemoryVectorStore::new();
        store.add_document(&doc("both", "rust tokio runtime")).await.unwrap();
        store.add_document(&doc("one", "rust compiler")).await.unwrap();
        store.add_document(&doc("none", "gardening tips")).await.unwrap();

        let results = store.search("rust tokio", 10).await.unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["both", "one"]);
        assert!(results.iter().all(|r| r.distance >= 0.0));

        let limited = store.search("rust tokio", 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_non_positive_limit_uses_default() {
        let store = InMemoryVectorStore::new();
        for i in 0..8 {
            store.add_document(&doc(&format!("d{}", i), "shared term")).await.unwrap();
        }
        assert_eq!(store.search("shared", 0).await.unwrap().len(), DEFAULT_SEARCH_LIMIT);
        assert_eq!(store.search("shared", -1).await.unwrap().len(), DEFAULT_SEARCH_LIMIT);
    }

    #[tokio::test]
    async fn test_delete_then_list_excludes_id() {
        let store = InMemoryVectorStore::new();
        store.add_document(&doc("a", "alpha")).await.unwrap();
        store.add_document(&doc("b", "beta")).await.unwrap();

        store.delete_document("a").await.unwrap();
        let ids: Vec<_> = store
            .list_documents()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_exact_text_without_words_is_found() {
        let store = InMemoryVectorStore::new();
        store.add_document(&doc("p", "?!")).await.unwrap();
        store.add_document(&doc("q", "plain words")).await.unwrap();

        let results = store.search("?!", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "p");
        assert_eq!(results[0].distance, 0.0);
    }

    #[tokio::test]
    async fn test_delete_unknown_is_rejected() {
        let store = InMemoryVectorStore::new();
        let err = store.delete_document("ghost").await.unwrap_err();
        assert!(matches!(
            err,
            RagError::StoreDelete { kind: StoreFailure::Rejected, .. }
        ));
    }

    #[tokio::test]
    async fn test_update_metadata_replaces_without_merge() {
        let store = InMemoryVectorStore::new();
        let mut original = Metadata::new();
        original.insert("filename".to_string(), json!("a.txt"));
        original.insert("word_count".to_string(), json!(3));
        store
            .add_document(&Document::new("a", "alpha", original))
            .await
            .unwrap();

        let mut replacement = Metadata::new();
        replacement.insert("tags".to_string(), json!(["x"]));
        store.update_metadata("a", &replacement).await.unwrap();

        let docs = store.list_documents().await.unwrap();
        assert_eq!(docs[0].metadata, replacement);
    }

    #[tokio::test]
    async fn test_repeated_id_overwrites() {
        let store = InMemoryVectorStore::new();
        store.add_document(&doc("a", "first")).await.unwrap();
        store.add_document(&doc("a", "second")).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.list_documents().await.unwrap()[0].text, "second");
    }

    #[tokio::test]
    async fn test_stats_counts_documents() {
        let store = InMemoryVectorStore::new();
        store.add_document(&doc("a", "alpha")).await.unwrap();
        let stats = store.get_stats().await.unwrap();
        assert_eq!(stats["total_documents"], 1);
    }
}
