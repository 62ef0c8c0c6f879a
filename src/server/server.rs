//! Backend HTTP server
//!
//! Axum server for the ragdesk API.

use std::future::Future;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use super::routes::create_router;
use super::state::AppState;

/// HTTP API server
pub struct HttpServer {
    listen_addr: String,
    state: AppState,
}

impl HttpServer {
    pub fn new(listen_addr: impl Into<String>, state: AppState) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            state,
        }
    }

    /// Serve until `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = self
            .listen_addr
            .parse()
            .context("Invalid HTTP listen address")?;

        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind HTTP server to {}", addr))?;

        self.run_on(listener, shutdown).await
    }

    /// Serve on an already bound listener
    pub async fn run_on<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = create_router(self.state);
        let local = listener.local_addr().context("Listener has no local address")?;
        info!("HTTP API server listening on http://{}", local);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!("HTTP server shutting down");
            })
            .await
            .context("HTTP server error")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::OllamaClient;
    use crate::ingest::Ingestor;
    use crate::store::InMemoryVectorStore;
    use crate::worker::WorkerRunner;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_invalid_listen_addr() {
        let store = Arc::new(InMemoryVectorStore::new());
        let generator = Arc::new(OllamaClient::with_config("http://127.0.0.1:9", "m").unwrap());
        let ingestor = Ingestor::new(WorkerRunner::new("sh", "."), "x.sh", ".", store.clone());
        let server = HttpServer::new("not an address", AppState::new(store, generator, ingestor));

        assert!(server.run(std::future::ready(())).await.is_err());
    }

    #[tokio::test]
    async fn test_serves_health_until_shutdown() {
        let store = Arc::new(InMemoryVectorStore::new());
        let generator = Arc::new(OllamaClient::with_config("http://127.0.0.1:9", "m").unwrap());
        let ingestor = Ingestor::new(WorkerRunner::new("sh", "."), "x.sh", ".", store.clone());
        let server = HttpServer::new("127.0.0.1:0", AppState::new(store, generator, ingestor));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(server.run_on(listener, async move {
            let _ = rx.await;
        }));

        let body: serde_json::Value = reqwest::get(format!("http://{}/health", addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["ollama"], false);

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
