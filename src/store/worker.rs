//! Out-of-process vector store
//!
//! Every operation is one worker invocation. Worker conventions:
//! - add: `<id> --file <text-path> <metadata-json>` → `{success, error}`
//! - search: `<query> <limit>` → `[SearchResult]`
//! - list: no args → `[Document]`
//! - delete: `<id>` → `{success, error}`
//! - update-metadata: `<id> <metadata-json>` → `{success, error}`
//! - stats: no args → `{...}`
//!
//! Query workers report their own failures as `{"error": ...}` or
//! `[{"error": ...}]` with a zero exit code; those are treated as rejections
//! rather than data.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::{RagError, Result, StoreFailure};
use crate::store::types::{Document, Metadata, SearchResult, StoreStats};
use crate::store::{normalize_limit, VectorStore, DEFAULT_SEARCH_LIMIT};
use crate::worker::{WorkerRequest, WorkerRunner};

/// Script file names for each store operation
#[derive(Debug, Clone)]
pub struct StoreScripts {
    pub add: String,
    pub search: String,
    pub list: String,
    pub delete: String,
    pub update_metadata: String,
    pub stats: String,
    /// Module the interpreter must be able to import for the store to work
    pub health_module: String,
}

impl Default for StoreScripts {
    fn default() -> Self {
        Self {
            add: "lancedb_add.py".to_string(),
            search: "lancedb_search.py".to_string(),
            list: "lancedb_list.py".to_string(),
            delete: "lancedb_delete.py".to_string(),
            update_metadata: "lancedb_update_metadata.py".to_string(),
            stats: "lancedb_stats.py".to_string(),
            health_module: "lancedb".to_string(),
        }
    }
}

/// Status object printed by mutating workers
#[derive(Debug, Deserialize)]
struct WorkerStatus {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// One element of a query worker's array output
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WorkerRow<T> {
    Failure { error: String },
    Item(T),
}

/// Vector store backed by external worker scripts
#[derive(Debug, Clone)]
pub struct WorkerVectorStore {
    runner: WorkerRunner,
    scripts: StoreScripts,
}

impl WorkerVectorStore {
    pub fn new(runner: WorkerRunner, scripts: StoreScripts) -> Self {
        Self { runner, scripts }
    }

    /// Run a mutating worker and check both exit code and status object
    async fn run_mutation(
        &self,
        request: WorkerRequest,
        wrap: fn(StoreFailure, String) -> RagError,
    ) -> Result<()> {
        let status: WorkerStatus = self
            .runner
            .run_json(&request)
            .await
            .map_err(|e| e.into_store(wrap))?;

        if status.success {
            Ok(())
        } else {
            let message = status
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| format!("{} reported failure", request.script()));
            Err(wrap(StoreFailure::Rejected, message))
        }
    }

    /// Run a query worker returning an array, rejecting embedded error rows
    async fn run_rows<T>(&self, request: WorkerRequest) -> Result<Vec<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let rows: Vec<WorkerRow<T>> = self
            .runner
            .run_json(&request)
            .await
            .map_err(|e| e.into_store(RagError::store_query))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            match row {
                WorkerRow::Failure { error } => {
                    return Err(RagError::store_query(StoreFailure::Rejected, error));
                }
                WorkerRow::Item(item) => items.push(item),
            }
        }
        Ok(items)
    }
}

fn metadata_json(
    metadata: &Metadata,
    wrap: fn(StoreFailure, String) -> RagError,
) -> Result<String> {
    serde_json::to_string(metadata)
        .map_err(|e| wrap(StoreFailure::Malformed, format!("metadata not serializable: {}", e)))
}

#[async_trait]
impl VectorStore for WorkerVectorStore {
    async fn add_document(&self, doc: &Document) -> Result<()> {
        let metadata = metadata_json(&doc.metadata, RagError::store_write)?;
        let request = WorkerRequest::new(&self.scripts.add)
            .arg(&doc.id)
            .arg("--file")
            .payload(doc.text.as_str())
            .arg(metadata);

        self.run_mutation(request, RagError::store_write).await?;
        debug!(id = %doc.id, bytes = doc.text.len(), "document added");
        Ok(())
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<SearchResult>> {
        let limit = normalize_limit(limit, DEFAULT_SEARCH_LIMIT);
        let request = WorkerRequest::new(&self.scripts.search)
            .arg(query)
            .arg(limit.to_string());

        let mut results: Vec<SearchResult> = self.run_rows(request).await?;
        if results.len() > limit {
            warn!(returned = results.len(), limit, "search worker exceeded limit, truncating");
            results.truncate(limit);
        }
        Ok(results)
    }

    async fn list_documents(&self) -> Result<Vec<Document>> {
        self.run_rows(WorkerRequest::new(&self.scripts.list)).await
    }

    async fn delete_document(&self, id: &str) -> Result<()> {
        let request = WorkerRequest::new(&self.scripts.delete).arg(id);
        self.run_mutation(request, RagError::store_delete).await?;
        debug!(id, "document deleted");
        Ok(())
    }

    async fn update_metadata(&self, id: &str, metadata: &Metadata) -> Result<()> {
        let request = WorkerRequest::new(&self.scripts.update_metadata)
            .arg(id)
            .arg(metadata_json(metadata, RagError::store_write)?);
        self.run_mutation(request, RagError::store_write).await?;
        debug!(id, "metadata updated");
        Ok(())
    }

    async fn get_stats(&self) -> Result<StoreStats> {
        let stats: StoreStats = self
            .runner
            .run_json(&WorkerRequest::new(&self.scripts.stats))
            .await
            .map_err(|e| e.into_store(RagError::store_query))?;

        if let Some(error) = stats.get("error").and_then(|v| v.as_str()) {
            return Err(RagError::store_query(StoreFailure::Rejected, error.to_string()));
        }
        Ok(stats)
    }

    async fn is_healthy(&self) -> bool {
        let check = format!("import {}", self.scripts.health_module);
        self.runner.succeeds(&["-c", &check]).await
    }
}
