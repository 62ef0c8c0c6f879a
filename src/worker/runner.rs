//! Worker process execution
//!
//! Runs an external program to completion and hands back its stdout.
//! - argv arrays only, never a shell
//! - stdout and stderr captured; nothing is surfaced before exit
//! - no timeout: a hung worker blocks the calling task

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use serde::de::DeserializeOwned;
use tokio::process::Command;
use tracing::debug;

use crate::errors::{RagError, Result};
use crate::worker::request::WorkerRequest;

/// Run `program` with `args` and return its stdout.
///
/// Fails with [`RagError::WorkerExecution`] when the program cannot be
/// started or exits non-zero; the captured output is attached.
pub async fn invoke(program: &str, args: &[String], envs: &[(String, String)]) -> Result<Vec<u8>> {
    let start = Instant::now();

    let mut cmd = Command::new(program);
    cmd.args(args)
        .envs(envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let output = cmd.output().await.map_err(|e| RagError::WorkerExecution {
        program: program.to_string(),
        reason: format!("failed to start: {}", e),
        output: String::new(),
    })?;

    debug!(
        program,
        status = %output.status,
        stdout_bytes = output.stdout.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "worker finished"
    );

    if !output.status.success() {
        return Err(RagError::WorkerExecution {
            program: program.to_string(),
            reason: format!("exited with {}", output.status),
            output: combine_output(&output.stdout, &output.stderr),
        });
    }

    Ok(output.stdout)
}

fn combine_output(stdout: &[u8], stderr: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);
    if stderr.trim().is_empty() {
        stdout.into_owned()
    } else {
        format!("STDOUT:\n{}\n\nSTDERR:\n{}", stdout, stderr)
    }
}

/// Decode a worker's stdout as JSON.
///
/// Surrounding whitespace is ignored. Anything else that is not the expected
/// shape fails with [`RagError::WorkerOutput`].
pub fn decode_output<T: DeserializeOwned>(program: &str, bytes: &[u8]) -> Result<T> {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(RagError::WorkerOutput {
            program: program.to_string(),
            reason: "empty output".to_string(),
        });
    }

    serde_json::from_str(trimmed).map_err(|e| RagError::WorkerOutput {
        program: program.to_string(),
        reason: format!("{} in {:?}", e, truncate(trimmed, 200)),
    })
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Runs worker scripts through a fixed interpreter
#[derive(Debug, Clone)]
pub struct WorkerRunner {
    interpreter: String,
    scripts_dir: PathBuf,
    envs: Vec<(String, String)>,
}

impl WorkerRunner {
    /// Create a runner for scripts in `scripts_dir`
    pub fn new(interpreter: impl Into<String>, scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            scripts_dir: scripts_dir.into(),
            envs: Vec::new(),
        }
    }

    /// Add an environment variable passed to every worker
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    pub fn scripts_dir(&self) -> &Path {
        &self.scripts_dir
    }

    pub fn envs(&self) -> &[(String, String)] {
        &self.envs
    }

    /// Full path of a worker script
    pub fn script_path(&self, script: &str) -> PathBuf {
        self.scripts_dir.join(script)
    }

    /// Execute one request and return the raw stdout.
    ///
    /// The payload file (if any) lives until this call returns, on every path.
    pub async fn run(&self, request: &WorkerRequest) -> Result<Vec<u8>> {
        let (resolved, _payload_file) = request.materialize()?;

        let mut args = Vec::with_capacity(resolved.len() + 1);
        args.push(self.script_path(request.script()).to_string_lossy().into_owned());
        args.extend(resolved);

        debug!(
            interpreter = %self.interpreter,
            script = request.script(),
            payload = request.has_payload(),
            "invoking worker"
        );

        invoke(&self.interpreter, &args, &self.envs).await
    }

    /// Execute one request and decode its stdout as JSON
    pub async fn run_json<T: DeserializeOwned>(&self, request: &WorkerRequest) -> Result<T> {
        let bytes = self.run(request).await?;
        decode_output(request.script(), &bytes)
    }

    /// Run the interpreter with raw arguments; any failure is `false`
    pub async fn succeeds(&self, args: &[&str]) -> bool {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        invoke(&self.interpreter, &args, &self.envs).await.is_ok()
    }
}
