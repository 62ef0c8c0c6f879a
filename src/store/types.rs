//! Document collection types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Open string-keyed metadata attached to a document
pub type Metadata = serde_json::Map<String, Value>;

/// Aggregate statistics reported by the store; schema owned by the store
pub type StoreStats = serde_json::Map<String, Value>;

/// A stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique within the collection
    pub id: String,

    /// Full extracted text
    pub text: String,

    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata,
        }
    }
}

/// One hit from a similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,

    /// Lower is more relevant; scale is defined by the store
    pub distance: f64,

    pub text: String,

    #[serde(default)]
    pub metadata: Metadata,
}
