//! Document ingestion
//!
//! Upload flow: check the extension, save the file, run the extraction
//! worker, then add the extracted text to the store with filename, word count
//! and upload time as metadata.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::errors::{RagError, Result};
use crate::store::{Document, Metadata, VectorStore};
use crate::worker::{WorkerRequest, WorkerRunner};

/// File extensions the extraction worker understands
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "docx", "md", "txt"];

/// Reply of the extraction worker
#[derive(Debug, Clone, Deserialize)]
pub struct Extraction {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub word_count: u64,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Summary of a stored upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestedDocument {
    pub id: String,
    pub filename: String,
    pub word_count: u64,
}

/// Lower-cased extension of `filename` if it is supported
pub fn check_extension(filename: &str) -> Result<String> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(RagError::InvalidRequest(
            "Only PDF, DOCX, MD, and TXT files are supported".to_string(),
        ))
    }
}

/// `doc_<filename with dots as underscores>_<unix seconds>`
pub fn document_id(filename: &str, uploaded_at: DateTime<Utc>) -> String {
    format!("doc_{}_{}", filename.replace('.', "_"), uploaded_at.timestamp())
}

/// Strip any directory components a client may have sent
fn base_name(filename: &str) -> Option<String> {
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

/// Turns uploaded files into stored documents
pub struct Ingestor {
    runner: WorkerRunner,
    extract_script: String,
    uploads_dir: PathBuf,
    store: Arc<dyn VectorStore>,
}

impl Ingestor {
    pub fn new(
        runner: WorkerRunner,
        extract_script: impl Into<String>,
        uploads_dir: impl Into<PathBuf>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            runner,
            extract_script: extract_script.into(),
            uploads_dir: uploads_dir.into(),
            store,
        }
    }

    /// Run the extraction worker on a saved file
    pub async fn extract(&self, path: &Path) -> Result<Extraction> {
        let request =
            WorkerRequest::new(&self.extract_script).arg(path.to_string_lossy().into_owned());
        let extraction: Extraction = self.runner.run_json(&request).await?;

        if !extraction.success {
            return Err(RagError::Extraction(
                extraction
                    .error
                    .unwrap_or_else(|| "extraction worker reported failure".to_string()),
            ));
        }
        Ok(extraction)
    }

    /// Save, extract and store one uploaded file
    pub async fn ingest(&self, filename: &str, contents: &[u8]) -> Result<IngestedDocument> {
        let filename = base_name(filename)
            .ok_or_else(|| RagError::InvalidRequest("No file provided".to_string()))?;
        check_extension(&filename)?;

        tokio::fs::create_dir_all(&self.uploads_dir).await?;
        let saved = self.uploads_dir.join(&filename);
        tokio::fs::write(&saved, contents).await?;
        info!(path = %saved.display(), bytes = contents.len(), "processing upload");

        let extraction = self.extract(&saved).await?;

        let uploaded_at = Utc::now();
        let id = document_id(&filename, uploaded_at);

        let mut metadata = Metadata::new();
        metadata.insert("filename".to_string(), json!(filename));
        metadata.insert("word_count".to_string(), json!(extraction.word_count));
        metadata.insert(
            "uploaded_at".to_string(),
            json!(uploaded_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );

        self.store
            .add_document(&Document::new(id.clone(), extraction.text, metadata))
            .await?;

        info!(%id, word_count = extraction.word_count, "document stored");
        Ok(IngestedDocument {
            id,
            filename,
            word_count: extraction.word_count,
        })
    }
}
