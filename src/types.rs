// src/types.rs

//! Shared request/result types and the caller-facing status contract.

use std::collections::HashMap;

/// One job execution as handed over by the host.
///
/// The config map carries the recognised options `command`, `timeout` and
/// `env` as raw strings; everything is optional and malformed values
/// degrade to defaults (see [`crate::config::resolve`]).
#[derive(Debug, Clone, Default)]
pub struct ExecutionRequest {
    /// Job name. May be empty; the command then defaults to it as-is.
    pub job_name: String,
    /// Raw string options supplied by the host.
    pub config: HashMap<String, String>,
}

impl ExecutionRequest {
    pub fn new(job_name: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            config: HashMap::new(),
        }
    }

    /// Set a raw config option (`command`, `timeout`, `env`).
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }
}

/// Terminal state of one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Process exited with status 0.
    Success,
    /// Process exited with a non-zero code, or the wait itself failed
    /// (reported as code 1 when the real code is not detectable).
    Failed(i32),
    /// Process was killed because the configured timeout fired.
    Killed,
    /// Process could never be spawned.
    FailedToStart,
}

/// Exit code reported for a timeout kill, mirroring 128 + SIGKILL.
pub const TIMEOUT_EXIT_CODE: i32 = 137;

impl Outcome {
    /// Exit code to report for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::Failed(code) => *code,
            Outcome::Killed => TIMEOUT_EXIT_CODE,
            Outcome::FailedToStart => 1,
        }
    }

    /// The caller-contract error string: empty on success, otherwise
    /// `"exit status N"` or a fixed literal for a start failure.
    pub fn error_field(&self) -> String {
        match self {
            Outcome::Success => String::new(),
            Outcome::Failed(code) => format!("exit status {code}"),
            Outcome::Killed => format!("exit status {TIMEOUT_EXIT_CODE}"),
            Outcome::FailedToStart => "failed to start".to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, Outcome::Success)
    }
}

/// Normalized result of one execution, returned to the host exactly once.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Combined stdout + stderr of the child, byte-for-byte, plus any
    /// timeout annotation.
    pub output: Vec<u8>,
    pub outcome: Outcome,
}

impl ExecutionResult {
    /// See [`Outcome::error_field`].
    pub fn error_field(&self) -> String {
        self.outcome.error_field()
    }
}

/// Streaming-status callback supplied by the host.
///
/// Every chunk of child output is pushed through here, flagged with the
/// stream it came from. Configuration warnings arrive the same way,
/// flagged as errors. A failing callback never alters the execution
/// result; the error is only used to log the broken status channel.
pub trait StatusCallback: Send + Sync {
    fn update(&self, chunk: &[u8], is_error: bool) -> anyhow::Result<()>;
}

/// Status callback that discards everything, used by the wrapper binary
/// where the console mirror already covers operator visibility.
#[derive(Debug, Default)]
pub struct NullStatus;

impl StatusCallback for NullStatus {
    fn update(&self, _chunk: &[u8], _is_error: bool) -> anyhow::Result<()> {
        Ok(())
    }
}
