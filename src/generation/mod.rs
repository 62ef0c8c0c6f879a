//! Text generation
//!
//! The RAG pipeline only sees the [`Generator`] trait; [`OllamaClient`] is
//! the HTTP implementation used by the backend.

pub mod client;
pub mod types;

use async_trait::async_trait;

use crate::errors::Result;

pub use client::{OllamaClient, DEFAULT_MODEL, DEFAULT_OLLAMA_URL};
pub use types::{format_size, GenerateRequest, GenerateResponse, ModelInfo};

/// A language model reachable for one-shot prompt completion
#[async_trait]
pub trait Generator: Send + Sync {
    /// Complete `prompt` and return the generated text
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Models available on the server
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;

    /// Liveness check; never fails
    async fn is_healthy(&self) -> bool;

    /// Identifier of the model used by [`Generator::generate`]
    fn model(&self) -> &str;
}
