// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod publish;
pub mod types;

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::cli::CliArgs;
use crate::publish::{CompletionEvent, EventSink, RedisEventSink};
use crate::types::{ExecutionRequest, ExecutionResult, NullStatus, StatusCallback};

/// The execution engine.
///
/// `execute` resolves the request's raw config, runs the command with the
/// output fan-out wired up, and makes exactly one completion-event publish
/// attempt for every outcome, including a start failure.
pub struct Executor {
    events: Arc<dyn EventSink>,
    shell: String,
}

impl Executor {
    /// Production executor publishing to Redis (address from `REDIS_URL`).
    pub fn new() -> Self {
        Self::with_events(Arc::new(RedisEventSink::from_env(None)))
    }

    /// Executor with a custom event sink; tests use this with a recording
    /// sink.
    pub fn with_events(events: Arc<dyn EventSink>) -> Self {
        Self {
            events,
            shell: exec::default_shell().to_string(),
        }
    }

    /// Override the shell program commands are handed to. Tests point this
    /// at a nonexistent binary to force the start-failure path.
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    pub async fn execute(
        &self,
        request: &ExecutionRequest,
        status: Arc<dyn StatusCallback>,
    ) -> ExecutionResult {
        let params = config::resolve(&request.job_name, &request.config, status.as_ref());
        let result = exec::run_command(&self.shell, &request.job_name, &params, status).await;

        let event = CompletionEvent::from_result(&request.job_name, &result);
        self.events.publish(event).await;

        result
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

/// High-level entry point used by `main.rs`.
///
/// Joins the trailing command words into one shell command, executes it
/// through the engine, and returns the exit code the wrapper should
/// propagate (1 when the child's code cannot be determined).
pub async fn run(args: CliArgs) -> Result<i32> {
    let command = args.command.join(" ");
    let job_name = args
        .job_name
        .filter(|s| !s.is_empty())
        .unwrap_or_else(job_name_from_env);

    let mut request = ExecutionRequest::new(job_name).with_option("command", command);
    if let Some(timeout) = args.timeout {
        request = request.with_option("timeout", timeout);
    }
    if let Some(env) = args.env {
        request = request.with_option("env", env);
    }

    let executor = Executor::with_events(Arc::new(RedisEventSink::from_env(args.stream)));

    // The console mirror already gives the operator the child's output.
    let result = executor.execute(&request, Arc::new(NullStatus)).await;

    debug!(error_field = %result.error_field(), "wrapper run complete");
    Ok(result.outcome.exit_code())
}

/// Job-name fallback chain for the wrapper binary.
fn job_name_from_env() -> String {
    for key in ["JOBWRAP_JOB_NAME", "ENV_JOB_NAME"] {
        if let Ok(value) = std::env::var(key) {
            if !value.is_empty() {
                return value;
            }
        }
    }
    "unknown".to_string()
}
