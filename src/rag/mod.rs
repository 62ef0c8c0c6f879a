//! Retrieval-augmented generation
//!
//! One linear pipeline per question: search the store, number the passages
//! into a context block, ask the model to answer from it.

pub mod pipeline;
pub mod prompt;

pub use pipeline::{RagAnswer, RagPipeline, DEFAULT_RAG_LIMIT};
pub use prompt::PromptBuilder;
