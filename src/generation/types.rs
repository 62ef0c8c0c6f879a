//! Ollama wire types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of `POST /api/generate`
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
}

/// Non-streaming reply of `POST /api/generate`
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub model: String,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    pub response: String,

    #[serde(default)]
    pub done: bool,
}

/// Information about an installed model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model name (e.g., "llama3.1:8b")
    pub name: String,

    /// Last modification time
    pub modified_at: DateTime<Utc>,

    /// Model size in bytes
    pub size: u64,
}

/// Response from Ollama /api/tags endpoint
#[derive(Debug, Deserialize)]
pub struct ModelsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

impl ModelInfo {
    /// Format the model size in human-readable format
    pub fn formatted_size(&self) -> String {
        format_size(self.size)
    }
}

impl fmt::Display for ModelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.formatted_size())
    }
}

/// Format bytes into human-readable size
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let base: f64 = 1024.0;
    let exponent = (bytes as f64).log(base).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);

    let size = bytes as f64 / base.powi(exponent as i32);

    format!("{:.2} {}", size, UNITS[exponent])
}
