//! Shared handler state, built once at startup

use std::sync::Arc;

use crate::config::{Config, StoreBackend};
use crate::errors::Result;
use crate::generation::{Generator, OllamaClient};
use crate::ingest::Ingestor;
use crate::rag::RagPipeline;
use crate::store::{InMemoryVectorStore, VectorStore, WorkerVectorStore};

/// Clients injected into every request handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn VectorStore>,
    pub generator: Arc<dyn Generator>,
    pub pipeline: Arc<RagPipeline>,
    pub ingestor: Arc<Ingestor>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn VectorStore>,
        generator: Arc<dyn Generator>,
        ingestor: Ingestor,
    ) -> Self {
        let pipeline = RagPipeline::new(store.clone(), generator.clone());
        Self {
            store,
            generator,
            pipeline: Arc::new(pipeline),
            ingestor: Arc::new(ingestor),
        }
    }

    /// Construct the store, the Ollama client and the ingestor from config
    pub fn from_config(config: &Config) -> Result<Self> {
        let store: Arc<dyn VectorStore> = match config.store.backend {
            StoreBackend::Worker => Arc::new(WorkerVectorStore::new(
                config.worker_runner(),
                config.store_scripts(),
            )),
            StoreBackend::Memory => Arc::new(InMemoryVectorStore::new()),
        };
        let generator: Arc<dyn Generator> = Arc::new(OllamaClient::new(&config.ollama)?);
        let ingestor = Ingestor::new(
            config.worker_runner(),
            config.workers.extract.clone(),
            config.uploads.dir.clone(),
            store.clone(),
        );

        Ok(Self::new(store, generator, ingestor))
    }
}
