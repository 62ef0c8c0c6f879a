//! Worker request building
//!
//! A request names the worker script and its ordered arguments. At most one
//! argument may be a payload: large text that is written to a temporary file
//! whose path is passed in its place, so document bodies never hit process
//! argument length limits.

use std::io::Write;

use tempfile::NamedTempFile;

use crate::errors::Result;

/// One positional argument of a worker invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerArg {
    /// Passed to the worker as-is
    Literal(String),
    /// Replaced by the path of the payload file
    PayloadPath,
}

/// A single invocation of a worker script
#[derive(Debug, Clone)]
pub struct WorkerRequest {
    script: String,
    args: Vec<WorkerArg>,
    payload: Option<String>,
}

impl WorkerRequest {
    /// Create a request for the given worker script
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            args: Vec::new(),
            payload: None,
        }
    }

    /// Append a literal argument
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(WorkerArg::Literal(value.into()));
        self
    }

    /// Append the payload file path as the next argument.
    ///
    /// Calling this twice replaces the payload; the path argument is only
    /// added once.
    pub fn payload(mut self, text: impl Into<String>) -> Self {
        if self.payload.is_none() {
            self.args.push(WorkerArg::PayloadPath);
        }
        self.payload = Some(text.into());
        self
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn args(&self) -> &[WorkerArg] {
        &self.args
    }

    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// Write the payload (if any) to a temp file and resolve the argument list.
    ///
    /// The returned file handle must outlive the process; dropping it deletes
    /// the file.
    pub(crate) fn materialize(&self) -> Result<(Vec<String>, Option<NamedTempFile>)> {
        let file = match &self.payload {
            Some(text) => {
                let mut file = tempfile::Builder::new()
                    .prefix("ragdesk_payload_")
                    .suffix(".txt")
                    .tempfile()?;
                file.write_all(text.as_bytes())?;
                file.flush()?;
                Some(file)
            }
            None => None,
        };

        let path = file
            .as_ref()
            .map(|f| f.path().to_string_lossy().into_owned())
            .unwrap_or_default();

        let args = self
            .args
            .iter()
            .map(|arg| match arg {
                WorkerArg::Literal(value) => value.clone(),
                WorkerArg::PayloadPath => path.clone(),
            })
            .collect();

        Ok((args, file))
    }
}
