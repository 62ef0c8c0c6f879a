//! Ollama HTTP client
//!
//! Non-streaming generation against a local Ollama server:
//! - POST /api/generate, hard 120s timeout
//! - GET /api/tags for installed models
//! - GET / as a liveness check

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::config::OllamaConfig;
use crate::errors::{RagError, Result};
use crate::generation::types::{GenerateRequest, GenerateResponse, ModelInfo, ModelsResponse};
use crate::generation::Generator;

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default model
pub const DEFAULT_MODEL: &str = "josiefied-qwen3:14b-q4_k_m";

/// Request timeout for generation and model listing
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Timeout for the liveness check
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Ollama generation client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    /// Create client from configuration
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        Self::with_config(&config.url, &config.model)
    }

    /// Create Ollama client with custom configuration
    pub fn with_config(base_url: &str, model: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RagError::Generation(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn error_for_status(response: reqwest::Response) -> RagError {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        RagError::Generation(format!("Ollama returned status {}: {}", status.as_u16(), body))
    }
}

#[async_trait]
impl Generator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "generate request");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::Generation(format!("Failed to call Ollama: {}", e)))?;

        if response.status() != StatusCode::OK {
            return Err(Self::error_for_status(response).await);
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| RagError::Generation(format!("Failed to decode response: {}", e)))?;

        debug!(model = %body.model, done = body.done, "generate response");
        Ok(body.response)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RagError::Generation(format!("Failed to fetch models: {}", e)))?;

        if response.status() != StatusCode::OK {
            return Err(Self::error_for_status(response).await);
        }

        let models: ModelsResponse = response
            .json()
            .await
            .map_err(|e| RagError::Generation(format!("Failed to decode models: {}", e)))?;

        Ok(models.models)
    }

    async fn is_healthy(&self) -> bool {
        match self
            .client
            .get(&self.base_url)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status() == StatusCode::OK,
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::StatusCode as AxumStatus,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_client_with_config() {
        let client = OllamaClient::with_config("http://localhost:11434/", "llama2:7b").unwrap();
        assert_eq!(client.model(), "llama2:7b");
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[tokio::test]
    async fn test_generate_sends_non_streaming_request() {
        let router = Router::new().route(
            "/api/generate",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["stream"], json!(false));
                assert_eq!(body["model"], json!("test-model"));
                Json(json!({
                    "model": "test-model",
                    "created_at": "2025-01-01T00:00:00Z",
                    "response": format!("echo: {}", body["prompt"].as_str().unwrap_or("")),
                    "done": true
                }))
            }),
        );
        let url = serve(router).await;
        let client = OllamaClient::with_config(&url, "test-model").unwrap();

        let text = client.generate("hi").await.unwrap();
        assert_eq!(text, "echo: hi");
    }

    #[tokio::test]
    async fn test_generate_non_200_includes_status_and_body() {
        let router = Router::new().route(
            "/api/generate",
            post(|| async { (AxumStatus::NOT_FOUND, "model 'x' not found") }),
        );
        let url = serve(router).await;
        let client = OllamaClient::with_config(&url, "x").unwrap();

        let err = client.generate("hi").await.unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, RagError::Generation(_)));
        assert!(message.contains("404"));
        assert!(message.contains("model 'x' not found"));
    }

    #[tokio::test]
    async fn test_generate_undecodable_body() {
        let router = Router::new().route("/api/generate", post(|| async { "not json" }));
        let url = serve(router).await;
        let client = OllamaClient::with_config(&url, "x").unwrap();

        assert!(matches!(
            client.generate("hi").await,
            Err(RagError::Generation(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_connection_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = OllamaClient::with_config(&url, "x").unwrap();
        assert!(matches!(
            client.generate("hi").await,
            Err(RagError::Generation(_))
        ));
        assert!(!client.is_healthy().await);
    }

    #[tokio::test]
    async fn test_list_models() {
        let router = Router::new().route(
            "/api/tags",
            get(|| async {
                Json(json!({"models": [
                    {"name": "a:latest", "modified_at": "2025-01-01T00:00:00Z", "size": 10},
                    {"name": "b:7b", "modified_at": "2025-02-01T00:00:00Z", "size": 20}
                ]}))
            }),
        );
        let url = serve(router).await;
        let client = OllamaClient::with_config(&url, "a:latest").unwrap();

        let models = client.list_models().await.unwrap();
        let names: Vec<_> = models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a:latest", "b:7b"]);
        assert_eq!(models[1].size, 20);
    }

    #[tokio::test]
    async fn test_is_healthy_requires_200() {
        let ok = serve(Router::new().route("/", get(|| async { "Ollama is running" }))).await;
        let client = OllamaClient::with_config(&ok, "x").unwrap();
        assert!(client.is_healthy().await);

        let teapot = serve(Router::new().route(
            "/",
            get(|| async { (AxumStatus::SERVICE_UNAVAILABLE, "starting") }),
        ))
        .await;
        let client = OllamaClient::with_config(&teapot, "x").unwrap();
        assert!(!client.is_healthy().await);
    }
}
