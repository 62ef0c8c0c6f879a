//! Configuration management for ragdesk
//!
//! TOML configuration with defaults, environment overrides and validation.
//! Lookup order: explicit path, `$RAGDESK_CONFIG`, `~/.ragdesk/config.toml`,
//! built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{RagError, Result};
use crate::generation::{DEFAULT_MODEL, DEFAULT_OLLAMA_URL};
use crate::store::StoreScripts;
use crate::worker::WorkerRunner;

/// Environment variable naming the config file; set by the desktop shell
pub const CONFIG_ENV_VAR: &str = "RAGDESK_CONFIG";

/// Config file name looked up next to the backend executable
pub const CONFIG_FILE_NAME: &str = "ragdesk.toml";

/// Complete configuration for ragdesk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub ollama: OllamaConfig,
    pub store: StoreConfig,
    pub workers: WorkersConfig,
    pub uploads: UploadsConfig,
}

/// Backend HTTP listener
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Ollama connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
}

/// Which [`crate::store::VectorStore`] implementation the backend uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// External worker scripts
    Worker,
    /// In-process map, nothing persisted
    Memory,
}

/// Vector store location, handed to every store worker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub db_path: String,
    pub table: String,
}

/// Worker scripts and the interpreter that runs them
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    pub interpreter: String,
    /// Defaults to `scripts/` next to the running executable
    pub scripts_dir: Option<PathBuf>,
    pub add: String,
    pub search: String,
    pub list: String,
    pub delete: String,
    pub update_metadata: String,
    pub stats: String,
    pub extract: String,
    pub health_module: String,
}

/// Where uploaded files are kept before extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadsConfig {
    pub dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8001,
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Worker,
            db_path: "./data/lancedb".to_string(),
            table: "documents".to_string(),
        }
    }
}

impl Default for WorkersConfig {
    fn default() -> Self {
        let scripts = StoreScripts::default();
        Self {
            interpreter: "python".to_string(),
            scripts_dir: None,
            add: scripts.add,
            search: scripts.search,
            list: scripts.list,
            delete: scripts.delete,
            update_metadata: scripts.update_metadata,
            stats: scripts.stats,
            extract: "process_document.py".to_string(),
            health_module: scripts.health_module,
        }
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./data/uploads"),
        }
    }
}

impl Config {
    /// Load configuration from the first available source, then apply
    /// environment overrides and validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match Self::resolve_path(path) {
            Some(path) => Self::load_from_file(&path)?,
            None => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }
        Self::default_path().filter(|p| p.exists())
    }

    /// `~/.ragdesk/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".ragdesk").join("config.toml"))
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RagError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        toml::from_str(&contents)
            .map_err(|e| RagError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Override values from environment variables
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("OLLAMA_URL") {
            self.ollama.url = url;
        }
        if let Some(model) = lookup("OLLAMA_MODEL") {
            self.ollama.model = model;
        }
        if let Some(path) = lookup("LANCEDB_PATH") {
            self.store.db_path = path;
        }
        if let Some(table) = lookup("LANCEDB_TABLE") {
            self.store.table = table;
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(RagError::Config("server.port must be greater than 0".to_string()));
        }
        if self.ollama.url.trim().is_empty() {
            return Err(RagError::Config("ollama.url must not be empty".to_string()));
        }
        if self.ollama.model.trim().is_empty() {
            return Err(RagError::Config("ollama.model must not be empty".to_string()));
        }
        if self.store.table.trim().is_empty() {
            return Err(RagError::Config("store.table must not be empty".to_string()));
        }
        if self.workers.interpreter.trim().is_empty() {
            return Err(RagError::Config("workers.interpreter must not be empty".to_string()));
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| RagError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Address the backend listens on
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Health URL the desktop shell polls
    pub fn health_url(&self) -> String {
        format!("http://localhost:{}/health", self.server.port)
    }

    /// Scripts directory, defaulting to `scripts/` beside the executable
    pub fn scripts_dir(&self) -> PathBuf {
        if let Some(dir) = &self.workers.scripts_dir {
            return dir.clone();
        }
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.canonicalize().ok())
            .and_then(|exe| exe.parent().map(|p| p.join("scripts")))
            .unwrap_or_else(|| PathBuf::from("scripts"))
    }

    /// Worker runner carrying the store location in its environment
    pub fn worker_runner(&self) -> WorkerRunner {
        WorkerRunner::new(&self.workers.interpreter, self.scripts_dir())
            .with_env("LANCEDB_PATH", &self.store.db_path)
            .with_env("LANCEDB_TABLE", &self.store.table)
    }

    pub fn store_scripts(&self) -> StoreScripts {
        StoreScripts {
            add: self.workers.add.clone(),
            search: self.workers.search.clone(),
            list: self.workers.list.clone(),
            delete: self.workers.delete.clone(),
            update_metadata: self.workers.update_metadata.clone(),
            stats: self.workers.stats.clone(),
            health_module: self.workers.health_module.clone(),
        }
    }
}
