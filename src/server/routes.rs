//! Route table for the backend API

use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Create the router with all routes, CORS and request tracing
pub fn create_router(state: AppState) -> Router {
    let api_v1 = Router::new()
        .route(
            "/documents/upload",
            post(handlers::upload_document).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/documents", get(handlers::list_documents))
        .route("/documents/:id", delete(handlers::delete_document))
        .route("/documents/:id/metadata", put(handlers::update_metadata))
        .route("/ollama/query", post(handlers::ollama_query))
        .route("/ollama/models", get(handlers::ollama_models))
        .route("/vectordb/add", post(handlers::vector_add))
        .route("/vectordb/search", post(handlers::vector_search))
        .route("/vectordb/stats", get(handlers::vector_stats))
        .route("/rag/query", post(handlers::rag_query));

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api_v1)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
