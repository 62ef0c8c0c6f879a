//! Request handlers
//!
//! Each handler is a thin adapter: decode the body, call one store,
//! generator, pipeline or ingestor operation, encode the reply.

use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use super::state::AppState;
use super::types::*;
use crate::errors::RagError;
use crate::rag::RagAnswer;
use crate::store::Document;

/// Service name reported by `/health`
pub const SERVICE_NAME: &str = "ragdesk";

/// Failed request: `InvalidRequest` becomes 400, everything else 500
#[derive(Debug)]
pub struct ApiError(pub RagError);

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(_: JsonRejection) -> Self {
        ApiError(RagError::InvalidRequest("Invalid request body".to_string()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            RagError::InvalidRequest(message) => (StatusCode::BAD_REQUEST, message),
            other => {
                error!(error = %other, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

fn required(value: &str, message: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        Err(RagError::InvalidRequest(message.to_string()).into())
    } else {
        Ok(())
    }
}

/// Liveness plus dependency health; always 200 once the server is up
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let (ollama, store) = tokio::join!(state.generator.is_healthy(), state.store.is_healthy());
    Json(HealthResponse {
        status: "ok".to_string(),
        service: SERVICE_NAME.to_string(),
        ollama,
        store,
    })
}

/// Multipart upload; the file is read from the `file` field
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<UploadResponse> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RagError::InvalidRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| RagError::InvalidRequest(format!("Failed to read upload: {}", e)))?;
        upload = Some((filename, data));
    }

    let (filename, data) =
        upload.ok_or_else(|| RagError::InvalidRequest("No file provided".to_string()))?;
    let stored = state.ingestor.ingest(&filename, &data).await?;

    Ok(Json(UploadResponse {
        success: true,
        id: stored.id,
        filename: stored.filename,
        word_count: stored.word_count,
        message: "Document processed and added to vector database".to_string(),
    }))
}

/// Listing degrades to an empty result instead of failing the request
pub async fn list_documents(State(state): State<AppState>) -> Json<DocumentListResponse> {
    match state.store.list_documents().await {
        Ok(documents) => Json(DocumentListResponse {
            total: documents.len(),
            documents,
            error: None,
        }),
        Err(err) => {
            warn!(error = %err, "document listing failed");
            Json(DocumentListResponse {
                documents: Vec::new(),
                total: 0,
                error: Some(err.to_string()),
            })
        }
    }
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<MutationResponse> {
    required(&id, "Document ID is required")?;
    state.store.delete_document(&id).await?;
    Ok(Json(MutationResponse::ok(id).with_message("Document deleted")))
}

pub async fn update_metadata(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<MetadataUpdateRequest>, JsonRejection>,
) -> ApiResult<MutationResponse> {
    let Json(body) = payload?;
    required(&id, "Document ID is required")?;
    state.store.update_metadata(&id, &body.metadata).await?;
    Ok(Json(MutationResponse::ok(id).with_message("Metadata updated")))
}

/// Raw generation without retrieval
pub async fn ollama_query(
    State(state): State<AppState>,
    payload: Result<Json<GenerateBody>, JsonRejection>,
) -> ApiResult<GenerateReply> {
    let Json(body) = payload?;
    required(&body.prompt, "Prompt is required")?;

    let response = state.generator.generate(&body.prompt).await?;
    Ok(Json(GenerateReply {
        prompt: body.prompt,
        response,
        model: state.generator.model().to_string(),
    }))
}

pub async fn ollama_models(State(state): State<AppState>) -> ApiResult<ModelsReply> {
    let models = state.generator.list_models().await?;
    Ok(Json(ModelsReply { models }))
}

/// Direct add, bypassing extraction
pub async fn vector_add(
    State(state): State<AppState>,
    payload: Result<Json<AddDocumentRequest>, JsonRejection>,
) -> ApiResult<MutationResponse> {
    let Json(body) = payload?;
    if body.id.trim().is_empty() || body.text.trim().is_empty() {
        return Err(RagError::InvalidRequest("ID and text are required".to_string()).into());
    }

    let doc = Document::new(body.id, body.text, body.metadata);
    state.store.add_document(&doc).await?;
    Ok(Json(MutationResponse::ok(doc.id)))
}

pub async fn vector_search(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<SearchReply> {
    let Json(body) = payload?;
    required(&body.query, "Query is required")?;

    let results = state.store.search(&body.query, body.limit).await?;
    Ok(Json(SearchReply { results }))
}

pub async fn vector_stats(State(state): State<AppState>) -> ApiResult<StatsReply> {
    let stats = state.store.get_stats().await?;
    Ok(Json(StatsReply { stats }))
}

pub async fn rag_query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<RagAnswer> {
    let Json(body) = payload?;
    let answer = state.pipeline.answer(&body.query, body.limit).await?;
    Ok(Json(answer))
}
