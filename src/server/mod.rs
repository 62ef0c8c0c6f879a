//! Backend HTTP service
//!
//! Exposes ingestion, the store, the generator and the RAG pipeline over a
//! small JSON API, plus the `/health` endpoint the desktop shell polls.

pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;
pub mod types;

pub use routes::create_router;
pub use server::HttpServer;
pub use state::AppState;
