//! JSON request and response bodies for the backend API

use serde::{Deserialize, Serialize};

use crate::generation::ModelInfo;
use crate::store::{Document, Metadata, SearchResult, StoreStats};

/// `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub ollama: bool,
    pub store: bool,
}

/// Reply to a successful upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub id: String,
    pub filename: String,
    pub word_count: u64,
    pub message: String,
}

/// Document listing. A failed listing still answers with an empty list and
/// the failure text in `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub documents: Vec<Document>,
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Acknowledges add, delete and metadata update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl MutationResponse {
    pub fn ok(id: impl Into<String>) -> Self {
        Self {
            success: true,
            id: id.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// `PUT /api/v1/documents/:id/metadata`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataUpdateRequest {
    #[serde(default)]
    pub metadata: Metadata,
}

/// `POST /api/v1/ollama/query`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateBody {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateReply {
    pub prompt: String,
    pub response: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsReply {
    pub models: Vec<ModelInfo>,
}

/// `POST /api/v1/vectordb/add`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddDocumentRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Search and RAG query body; `limit` of zero or less picks the default
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReply {
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsReply {
    pub stats: StoreStats,
}

/// Body of every failed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_request_defaults() {
        let req: QueryRequest = serde_json::from_str(r#"{"query": "rust"}"#).unwrap();
        assert_eq!(req.query, "rust");
        assert_eq!(req.limit, 0);
    }

    #[test]
    fn test_list_response_omits_absent_error() {
        let body = DocumentListResponse {
            documents: Vec::new(),
            total: 0,
            error: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["total"], 0);
    }
}
