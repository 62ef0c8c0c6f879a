//! End-to-end RAG pipeline: retrieve, assemble prompt, generate

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::{RagError, Result};
use crate::generation::Generator;
use crate::rag::prompt::PromptBuilder;
use crate::store::{normalize_limit, SearchResult, VectorStore};

/// Passages retrieved per question when the caller asks for none
pub const DEFAULT_RAG_LIMIT: usize = 3;

/// A grounded answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagAnswer {
    pub query: String,
    pub response: String,
    /// Passages the answer was conditioned on, in retrieval order
    pub context: Vec<SearchResult>,
    pub model: String,
}

/// Question answering over a vector store and a generator.
///
/// Failures in retrieval or generation end the request; there is no retry
/// and no ungrounded fallback.
pub struct RagPipeline {
    store: Arc<dyn VectorStore>,
    generator: Arc<dyn Generator>,
    prompts: PromptBuilder,
}

impl RagPipeline {
    pub fn new(store: Arc<dyn VectorStore>, generator: Arc<dyn Generator>) -> Self {
        Self {
            store,
            generator,
            prompts: PromptBuilder::new(),
        }
    }

    /// Answer `query` from at most `limit` passages (`limit <= 0` means 3)
    pub async fn answer(&self, query: &str, limit: i64) -> Result<RagAnswer> {
        if query.trim().is_empty() {
            return Err(RagError::InvalidRequest("Query is required".to_string()));
        }
        let limit = normalize_limit(limit, DEFAULT_RAG_LIMIT);

        let context = self.store.search(query, limit as i64).await?;
        debug!(passages = context.len(), limit, "retrieved context");

        let prompt = self.prompts.build(query, &context);
        let response = self.generator.generate(&prompt).await?;

        info!(
            model = self.generator.model(),
            passages = context.len(),
            response_chars = response.len(),
            "answered query"
        );

        Ok(RagAnswer {
            query: query.to_string(),
            response,
            context,
            model: self.generator.model().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StoreFailure;
    use crate::generation::ModelInfo;
    use crate::store::{Document, InMemoryVectorStore, Metadata, StoreStats};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records prompts and replies with a canned answer or error
    struct RecordingGenerator {
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingGenerator {
        fn new(fail: bool) -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                fail,
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Generator for RecordingGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                Err(RagError::Generation("Ollama returned status 500: oom".to_string()))
            } else {
                Ok("grounded answer".to_string())
            }
        }

        async fn list_models(&self) -> Result<Vec<ModelInfo>> {
            Ok(Vec::new())
        }

        async fn is_healthy(&self) -> bool {
            !self.fail
        }

        fn model(&self) -> &str {
            "fake-model"
        }
    }

    /// Store whose search always fails
    struct BrokenStore;

    #[async_trait]
    impl VectorStore for BrokenStore {
        async fn add_document(&self, _doc: &Document) -> Result<()> {
            Ok(())
        }

        async fn search(&self, _query: &str, _limit: i64) -> Result<Vec<SearchResult>> {
            Err(RagError::store_query(StoreFailure::Execution, "worker crashed".to_string()))
        }

        async fn list_documents(&self) -> Result<Vec<Document>> {
            Ok(Vec::new())
        }

        async fn delete_document(&self, _id: &str) -> Result<()> {
            Ok(())
        }

        async fn update_metadata(&self, _id: &str, _metadata: &Metadata) -> Result<()> {
            Ok(())
        }

        async fn get_stats(&self) -> Result<StoreStats> {
            Ok(StoreStats::new())
        }

        async fn is_healthy(&self) -> bool {
            false
        }
    }

    async fn seeded_store(count: usize) -> Arc<InMemoryVectorStore> {
        let store = Arc::new(InMemoryVectorStore::new());
        for i in 0..count {
            store
                .add_document(&Document::new(
                    format!("doc{}", i),
                    format!("ownership rules chapter {}", i),
                    Metadata::new(),
                ))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_answer_includes_context_and_model() {
        let store = seeded_store(1).await;
        let generator = Arc::new(RecordingGenerator::new(false));
        let pipeline = RagPipeline::new(store, generator.clone());

        let answer = pipeline.answer("ownership", 0).await.unwrap();
        assert_eq!(answer.query, "ownership");
        assert_eq!(answer.response, "grounded answer");
        assert_eq!(answer.model, "fake-model");
        assert_eq!(answer.context.len(), 1);

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Document 1:\nownership rules chapter 0"));
        assert!(prompts[0].contains("User question: ownership"));
    }

    #[tokio::test]
    async fn test_default_limit_is_three() {
        let store = seeded_store(6).await;
        let generator = Arc::new(RecordingGenerator::new(false));
        let pipeline = RagPipeline::new(store, generator.clone());

        let answer = pipeline.answer("ownership", -2).await.unwrap();
        assert_eq!(answer.context.len(), DEFAULT_RAG_LIMIT);
        assert!(generator.prompts()[0].contains("Document 3:"));
        assert!(!generator.prompts()[0].contains("Document 4:"));
    }

    #[tokio::test]
    async fn test_no_matches_still_generates() {
        let store = Arc::new(InMemoryVectorStore::new());
        let generator = Arc::new(RecordingGenerator::new(false));
        let pipeline = RagPipeline::new(store, generator.clone());

        let answer = pipeline.answer("anything at all", 3).await.unwrap();
        assert!(answer.context.is_empty());
        assert_eq!(generator.prompts().len(), 1);
        assert!(!generator.prompts()[0].contains("Document 1:"));
    }

    #[tokio::test]
    async fn test_empty_query_rejected_before_search() {
        let generator = Arc::new(RecordingGenerator::new(false));
        let pipeline = RagPipeline::new(Arc::new(BrokenStore), generator.clone());

        let err = pipeline.answer("   ", 3).await.unwrap_err();
        assert!(matches!(err, RagError::InvalidRequest(_)));
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_search_failure_aborts_without_generation() {
        let generator = Arc::new(RecordingGenerator::new(false));
        let pipeline = RagPipeline::new(Arc::new(BrokenStore), generator.clone());

        let err = pipeline.answer("question", 3).await.unwrap_err();
        assert!(matches!(err, RagError::StoreQuery { .. }));
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_propagates() {
        let store = seeded_store(2).await;
        let generator = Arc::new(RecordingGenerator::new(true));
        let pipeline = RagPipeline::new(store, generator.clone());

        let err = pipeline.answer("ownership", 3).await.unwrap_err();
        assert!(matches!(err, RagError::Generation(_)));
        assert_eq!(generator.prompts().len(), 1);
    }
}
