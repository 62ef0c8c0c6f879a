//! Doctor command for system diagnostics
//!
//! Checks everything the backend needs at runtime: the Ollama API and the
//! configured model, the vector store, the worker scripts and the uploads
//! directory.

use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{Config, StoreBackend};
use crate::generation::Generator;
use crate::store::VectorStore;

/// Health check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Pass,
    Warn(String),
    Fail(String),
}

/// Individual health check
#[derive(Debug)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
}

impl HealthCheck {
    fn new(name: &str, status: HealthStatus) -> Self {
        Self {
            name: name.to_string(),
            status,
        }
    }
}

/// Doctor diagnostics system
pub struct Doctor {
    generator: Arc<dyn Generator>,
    store: Arc<dyn VectorStore>,
    backend: StoreBackend,
    scripts_dir: PathBuf,
    scripts: Vec<String>,
    uploads_dir: PathBuf,
}

impl Doctor {
    pub fn new(
        config: &Config,
        generator: Arc<dyn Generator>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        let workers = &config.workers;
        Self {
            generator,
            store,
            backend: config.store.backend,
            scripts_dir: config.scripts_dir(),
            scripts: vec![
                workers.add.clone(),
                workers.search.clone(),
                workers.list.clone(),
                workers.delete.clone(),
                workers.update_metadata.clone(),
                workers.stats.clone(),
                workers.extract.clone(),
            ],
            uploads_dir: config.uploads.dir.clone(),
        }
    }

    /// Run all health checks
    pub async fn run_diagnostics(&self) -> Vec<HealthCheck> {
        vec![
            self.check_ollama_api().await,
            self.check_model_available().await,
            self.check_store().await,
            self.check_scripts(),
            self.check_uploads_dir(),
        ]
    }

    async fn check_ollama_api(&self) -> HealthCheck {
        let status = if self.generator.is_healthy().await {
            HealthStatus::Pass
        } else {
            HealthStatus::Fail("Ollama not running or not reachable".to_string())
        };
        HealthCheck::new("Ollama API", status)
    }

    async fn check_model_available(&self) -> HealthCheck {
        let wanted = self.generator.model();
        let status = match self.generator.list_models().await {
            Ok(models) if models.iter().any(|m| m.name == wanted) => HealthStatus::Pass,
            Ok(models) if models.is_empty() => {
                HealthStatus::Warn("No models installed".to_string())
            }
            Ok(_) => HealthStatus::Warn(format!(
                "{} is not installed (ollama pull {})",
                wanted, wanted
            )),
            Err(e) => HealthStatus::Fail(format!("Cannot check models: {}", e)),
        };
        HealthCheck::new("Model", status)
    }

    async fn check_store(&self) -> HealthCheck {
        let status = if self.store.is_healthy().await {
            HealthStatus::Pass
        } else {
            HealthStatus::Fail("Vector store is not usable".to_string())
        };
        HealthCheck::new("Vector Store", status)
    }

    fn check_scripts(&self) -> HealthCheck {
        if self.backend == StoreBackend::Memory {
            return HealthCheck::new(
                "Worker Scripts",
                HealthStatus::Warn("In-memory store, documents are not persisted".to_string()),
            );
        }

        let missing: Vec<&str> = self
            .scripts
            .iter()
            .filter(|script| !self.scripts_dir.join(script).is_file())
            .map(String::as_str)
            .collect();

        let status = if missing.is_empty() {
            HealthStatus::Pass
        } else {
            HealthStatus::Fail(format!(
                "Missing in {}: {}",
                self.scripts_dir.display(),
                missing.join(", ")
            ))
        };
        HealthCheck::new("Worker Scripts", status)
    }

    fn check_uploads_dir(&self) -> HealthCheck {
        HealthCheck::new("Uploads", check_writable(&self.uploads_dir))
    }

    /// Display diagnostics results
    pub fn display_results(checks: &[HealthCheck]) {
        println!("\n{}\n", "ragdesk System Diagnostics".bold());
        println!("{:<20} Status", "Check");
        println!("{}", "=".repeat(50));

        for check in checks {
            let message = match &check.status {
                HealthStatus::Pass => "PASS".green(),
                HealthStatus::Warn(msg) => format!("WARN: {}", msg).yellow(),
                HealthStatus::Fail(msg) => format!("FAIL: {}", msg).red(),
            };
            println!("{:<20} {}", check.name, message);
        }

        println!();
    }

    /// Get overall health status
    pub fn overall_status(checks: &[HealthCheck]) -> bool {
        !checks.iter().any(|c| matches!(c.status, HealthStatus::Fail(_)))
    }
}

fn check_writable(dir: &Path) -> HealthStatus {
    if let Err(e) = std::fs::create_dir_all(dir) {
        return HealthStatus::Fail(format!("Cannot create {}: {}", dir.display(), e));
    }

    let marker = dir.join(".ragdesk_write_test");
    match std::fs::write(&marker, "test") {
        Ok(_) => {
            let _ = std::fs::remove_file(&marker);
            HealthStatus::Pass
        }
        Err(_) => HealthStatus::Fail(format!("No write permission in {}", dir.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result;
    use crate::generation::ModelInfo;
    use crate::store::InMemoryVectorStore;
    use async_trait::async_trait;
    use chrono::Utc;

    struct StaticGenerator {
        healthy: bool,
        models: Vec<&'static str>,
    }

    #[async_trait]
    impl Generator for StaticGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(String::new())
        }

        async fn list_models(&self) -> Result<Vec<ModelInfo>> {
            Ok(self
                .models
                .iter()
                .map(|name| ModelInfo {
                    name: name.to_string(),
                    modified_at: Utc::now(),
                    size: 0,
                })
                .collect())
        }

        async fn is_healthy(&self) -> bool {
            self.healthy
        }

        fn model(&self) -> &str {
            "qwen3:14b"
        }
    }

    fn doctor(config: &Config, healthy: bool, models: Vec<&'static str>) -> Doctor {
        Doctor::new(
            config,
            Arc::new(StaticGenerator { healthy, models }),
            Arc::new(InMemoryVectorStore::new()),
        )
    }

    #[test]
    fn test_overall_status() {
        let pass = vec![
            HealthCheck::new("a", HealthStatus::Pass),
            HealthCheck::new("b", HealthStatus::Warn("warning".to_string())),
        ];
        assert!(Doctor::overall_status(&pass));

        let fail = vec![
            HealthCheck::new("a", HealthStatus::Pass),
            HealthCheck::new("b", HealthStatus::Fail("error".to_string())),
        ];
        assert!(!Doctor::overall_status(&fail));
    }

    #[tokio::test]
    async fn test_model_check_variants() {
        let config = Config::default();

        let check = doctor(&config, true, vec!["qwen3:14b"]).check_model_available().await;
        assert_eq!(check.status, HealthStatus::Pass);

        let check = doctor(&config, true, vec!["llama3"]).check_model_available().await;
        assert!(matches!(
            check.status,
            HealthStatus::Warn(msg) if msg.contains("ollama pull qwen3:14b")
        ));

        let check = doctor(&config, true, vec![]).check_model_available().await;
        assert_eq!(check.status, HealthStatus::Warn("No models installed".to_string()));
    }

    #[tokio::test]
    async fn test_unreachable_ollama_fails() {
        let config = Config::default();
        let check = doctor(&config, false, vec![]).check_ollama_api().await;
        assert!(matches!(check.status, HealthStatus::Fail(_)));
    }

    #[test]
    fn test_missing_scripts_listed() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.workers.scripts_dir = Some(dir.path().to_path_buf());
        std::fs::write(dir.path().join("lancedb_add.py"), "").unwrap();

        let check = doctor(&config, true, vec![]).check_scripts();
        match check.status {
            HealthStatus::Fail(msg) => {
                assert!(msg.contains("lancedb_search.py"));
                assert!(msg.contains("process_document.py"));
                assert!(!msg.contains("lancedb_add.py"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_memory_backend_skips_scripts() {
        let mut config = Config::default();
        config.store.backend = StoreBackend::Memory;
        let check = doctor(&config, true, vec![]).check_scripts();
        assert!(matches!(check.status, HealthStatus::Warn(_)));
    }

    #[test]
    fn test_uploads_dir_created_and_writable() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().join("nested").join("uploads");
        assert_eq!(check_writable(&uploads), HealthStatus::Pass);
        assert!(uploads.is_dir());
    }
}
