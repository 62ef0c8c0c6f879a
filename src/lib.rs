//! ragdesk - local retrieval-augmented question answering
//!
//! Documents are stored and searched through external worker processes,
//! answers are generated by a local Ollama model, and a small HTTP backend
//! ties both together for a desktop shell that supervises it.
//!
//! # Architecture
//!
//! - **worker**: run an external program, pass large payloads via temp files
//! - **store**: `VectorStore` trait, worker-backed and in-memory adapters
//! - **generation**: `Generator` trait and the Ollama HTTP client
//! - **rag**: prompt assembly and the retrieve-then-generate pipeline
//! - **ingest**: uploaded file to stored document
//! - **server**: axum backend exposing the above
//! - **supervisor**: start, health-wait and stop the backend process

pub mod errors;
pub mod config;

pub mod worker;
pub mod store;
pub mod generation;
pub mod rag;
pub mod ingest;

pub mod server;
pub mod supervisor;

pub mod cli;
pub mod doctor;

// Re-export commonly used types
pub use errors::{RagError, Result};
pub use config::Config;
