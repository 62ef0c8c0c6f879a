//! Error types for ragdesk
//!
//! One error enum shared by the worker layer, the store and generation
//! clients, the RAG pipeline and the supervisor. Every variant carries
//! enough captured context (worker output, HTTP status and body) to
//! diagnose the failure from a log line.

use std::fmt;
use thiserror::Error;

/// How a store operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFailure {
    /// Worker could not be started or exited non-zero
    Execution,
    /// Worker output could not be decoded
    Malformed,
    /// Worker ran but reported the operation as failed
    Rejected,
}

impl fmt::Display for StoreFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StoreFailure::Execution => "execution",
            StoreFailure::Malformed => "malformed output",
            StoreFailure::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

/// Main error type for ragdesk
#[derive(Error, Debug)]
pub enum RagError {
    /// External worker failed to start or exited non-zero
    #[error("Worker '{program}' failed: {reason}{}", format_output(.output))]
    WorkerExecution {
        program: String,
        reason: String,
        output: String,
    },

    /// Worker output was not the expected JSON
    #[error("Worker '{program}' produced unreadable output: {reason}")]
    WorkerOutput { program: String, reason: String },

    /// Add or metadata update failed
    #[error("Store write failed ({kind}): {message}")]
    StoreWrite { kind: StoreFailure, message: String },

    /// Search, list or stats failed
    #[error("Store query failed ({kind}): {message}")]
    StoreQuery { kind: StoreFailure, message: String },

    /// Delete failed
    #[error("Store delete failed ({kind}): {message}")]
    StoreDelete { kind: StoreFailure, message: String },

    /// Ollama API errors
    #[error("Generation error: {0}")]
    Generation(String),

    /// Backend executable missing or failed to spawn
    #[error("Failed to start backend: {0}")]
    SupervisorStart(String),

    /// Text extraction worker reported a failure
    #[error("Document extraction failed: {0}")]
    Extraction(String),

    /// Caller supplied an unusable request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_output(output: &str) -> String {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(" (output: {})", trimmed)
    }
}

impl RagError {
    /// Reclassify a worker-layer error as a store failure.
    ///
    /// `wrap` picks the operation-specific variant; the kind is derived from
    /// the worker error so callers can tell exit-code failures apart from
    /// undecodable output.
    pub fn into_store(self, wrap: fn(StoreFailure, String) -> RagError) -> RagError {
        match self {
            RagError::WorkerExecution { .. } | RagError::Io(_) => {
                wrap(StoreFailure::Execution, self.to_string())
            }
            RagError::WorkerOutput { .. } | RagError::Serialization(_) => {
                wrap(StoreFailure::Malformed, self.to_string())
            }
            other => other,
        }
    }

    pub fn store_write(kind: StoreFailure, message: String) -> RagError {
        RagError::StoreWrite { kind, message }
    }

    pub fn store_query(kind: StoreFailure, message: String) -> RagError {
        RagError::StoreQuery { kind, message }
    }

    pub fn store_delete(kind: StoreFailure, message: String) -> RagError {
        RagError::StoreDelete { kind, message }
    }

    /// Whether the caller sent something unusable, as opposed to a backend failure
    pub fn is_client_error(&self) -> bool {
        matches!(self, RagError::InvalidRequest(_))
    }
}

/// Result type alias for ragdesk operations
pub type Result<T> = std::result::Result<T, RagError>;
