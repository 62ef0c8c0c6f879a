//! Backend process supervisor
//!
//! Starts the backend executable as a child process, polls its health
//! endpoint until it answers, and kills it when the shell shuts down.
//! At most one child is tracked at a time.

use reqwest::{Client, StatusCode};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::config::{CONFIG_ENV_VAR, CONFIG_FILE_NAME};
use crate::errors::{RagError, Result};

/// Readiness polls before giving up
pub const DEFAULT_READY_ATTEMPTS: u32 = 30;

/// Pause between readiness polls
pub const DEFAULT_READY_INTERVAL: Duration = Duration::from_secs(1);

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Lifecycle of the supervised backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    NotStarted,
    /// Child spawned, health not yet confirmed
    Starting,
    /// Health endpoint answered 200
    Ready,
    /// Shell main loop entered
    Running,
    /// Terminal
    Stopped,
}

/// Where the backend lives and how to tell it is up
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Executable file name looked up beside the current executable, then in
    /// the working directory
    pub backend_name: String,
    /// Skip the lookup and run this file
    pub backend_path: Option<PathBuf>,
    pub backend_args: Vec<String>,
    pub health_url: String,
    pub ready_attempts: u32,
    pub ready_interval: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            backend_name: format!("ragdesk{}", std::env::consts::EXE_SUFFIX),
            backend_path: None,
            backend_args: vec!["serve".to_string()],
            health_url: "http://localhost:8001/health".to_string(),
            ready_attempts: DEFAULT_READY_ATTEMPTS,
            ready_interval: DEFAULT_READY_INTERVAL,
        }
    }
}

/// Owns the backend child process
pub struct BackendSupervisor {
    config: SupervisorConfig,
    client: Client,
    child: Option<Child>,
    state: SupervisorState,
}

impl BackendSupervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        let client = Client::builder()
            .timeout(HEALTH_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            config,
            client,
            child: None,
            state: SupervisorState::NotStarted,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// OS pid of the tracked child
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(|child| child.id())
    }

    /// Locate the backend executable
    pub fn resolve_backend_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.config.backend_path {
            if path.is_file() {
                return Ok(path.clone());
            }
            return Err(RagError::SupervisorStart(format!(
                "backend executable {} not found",
                path.display()
            )));
        }

        let mut candidates = Vec::new();
        if let Some(dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            candidates.push(dir.join(&self.config.backend_name));
        }
        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join(&self.config.backend_name));
        }

        candidates.into_iter().find(|p| p.is_file()).ok_or_else(|| {
            RagError::SupervisorStart(format!(
                "backend executable '{}' not found beside the application \
                 or in the working directory",
                self.config.backend_name
            ))
        })
    }

    /// Spawn the backend with inherited stdout/stderr, running from its own
    /// directory and pointed at the config file there
    pub fn start_backend(&mut self) -> Result<()> {
        if self.child.is_some() {
            return Err(RagError::SupervisorStart(
                "backend is already running".to_string(),
            ));
        }
        if self.state == SupervisorState::Stopped {
            return Err(RagError::SupervisorStart(
                "supervisor has been stopped".to_string(),
            ));
        }

        let path = self.resolve_backend_path()?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        info!(path = %path.display(), "starting backend");
        let child = Command::new(&path)
            .args(&self.config.backend_args)
            .current_dir(&dir)
            .env(CONFIG_ENV_VAR, dir.join(CONFIG_FILE_NAME))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                RagError::SupervisorStart(format!("failed to spawn {}: {}", path.display(), e))
            })?;

        info!(pid = child.id(), "backend started");
        self.child = Some(child);
        self.state = SupervisorState::Starting;
        Ok(())
    }

    /// Poll the health endpoint; `false` once attempts run out or the child
    /// exits. An exited child leaves the supervisor `Stopped`. Never errors.
    pub async fn wait_for_backend(&mut self) -> bool {
        info!(url = %self.config.health_url, "waiting for backend");
        let attempts = self.config.ready_attempts;

        for attempt in 1..=attempts {
            match self.client.get(&self.config.health_url).send().await {
                Ok(response) if response.status() == StatusCode::OK => {
                    info!(attempt, "backend ready");
                    if self.state == SupervisorState::Starting
                        || self.state == SupervisorState::NotStarted
                    {
                        self.state = SupervisorState::Ready;
                    }
                    return true;
                }
                Ok(response) => debug!(attempt, status = %response.status(), "backend not ready"),
                Err(e) => debug!(attempt, error = %e, "backend not reachable"),
            }

            if let Some(child) = self.child.as_mut() {
                if let Ok(Some(status)) = child.try_wait() {
                    warn!(%status, "backend exited before becoming ready");
                    self.child = None;
                    self.state = SupervisorState::Stopped;
                    return false;
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.config.ready_interval).await;
            }
        }

        warn!(attempts, "backend took too long to become ready, continuing anyway");
        false
    }

    /// Record that the shell entered its main loop
    pub fn mark_running(&mut self) {
        if matches!(
            self.state,
            SupervisorState::Starting | SupervisorState::Ready
        ) {
            self.state = SupervisorState::Running;
        }
    }

    /// Kill and reap the tracked child. Safe to call repeatedly.
    pub async fn stop_backend(&mut self) {
        if let Some(mut child) = self.child.take() {
            info!(pid = child.id(), "stopping backend");
            if let Err(e) = child.kill().await {
                warn!(error = %e, "failed to kill backend");
            }
        }
        self.state = SupervisorState::Stopped;
    }

    /// Start, wait, run `shell`, then stop the backend on every exit path
    pub async fn run_with_backend<F, T, E>(&mut self, shell: F) -> std::result::Result<T, E>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: From<RagError>,
    {
        if let Err(e) = self.start_backend() {
            self.stop_backend().await;
            return Err(e.into());
        }
        self.wait_for_backend().await;
        self.mark_running();

        let outcome = shell.await;
        self.stop_backend().await;
        outcome
    }

    /// Start the backend and keep it until `interrupt` resolves. The interrupt
    /// is also watched during the readiness wait. The backend is stopped on
    /// every path.
    pub async fn run_until<I>(&mut self, interrupt: I) -> Result<()>
    where
        I: Future<Output = ()>,
    {
        if let Err(e) = self.start_backend() {
            self.stop_backend().await;
            return Err(e);
        }

        tokio::pin!(interrupt);
        let interrupted = tokio::select! {
            _ = self.wait_for_backend() => false,
            _ = &mut interrupt => true,
        };
        if interrupted {
            info!("interrupted while waiting for backend");
            self.stop_backend().await;
            return Ok(());
        }

        if self.child.is_none() {
            self.stop_backend().await;
            return Err(RagError::SupervisorStart(
                "backend exited before becoming ready".to_string(),
            ));
        }

        self.mark_running();
        interrupt.await;
        self.stop_backend().await;
        Ok(())
    }
}
