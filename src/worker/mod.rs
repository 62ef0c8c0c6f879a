//! Worker invocation layer
//!
//! Storage and extraction work runs in separate programs. This module starts
//! them, passes large inputs through temp files and classifies failures.

pub mod request;
pub mod runner;

pub use request::{WorkerArg, WorkerRequest};
pub use runner::{decode_output, invoke, WorkerRunner};
