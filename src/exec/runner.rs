// src/exec/runner.rs

//! Child process lifecycle: spawn, wait-vs-timeout race, forced kill.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::ExecParams;
use crate::exec::sink::{ConsoleSink, MemorySink, MultiSink, SharedBuffer, StatusSink};
use crate::types::{ExecutionResult, Outcome, StatusCallback};

/// Shell program appropriate for the platform.
pub fn default_shell() -> &'static str {
    if cfg!(windows) { "cmd" } else { "sh" }
}

/// Run one command to completion and normalize the outcome.
///
/// The command string is handed to `shell` (`sh -c` / `cmd /C`);
/// production callers pass [`default_shell`], tests can point at a
/// nonexistent binary to exercise the spawn-failure path.
///
/// Both child streams are pumped concurrently through their own
/// [`MultiSink`]; stdout chunks reach the status callback flagged
/// non-error, stderr chunks flagged error, and both accumulate into the
/// shared result buffer. With a positive timeout configured, natural exit
/// races against the timer and the losing branch never runs; the timer
/// winning kills the process (best effort) and fixes the outcome at exit
/// code 137 with a timeout annotation appended to the buffer.
///
/// This function never returns an error: a spawn failure yields a
/// synthesized [`Outcome::FailedToStart`] result.
pub async fn run_command(
    shell: &str,
    job_name: &str,
    params: &ExecParams,
    status: Arc<dyn StatusCallback>,
) -> ExecutionResult {
    info!(job = %job_name, cmd = %params.command, "starting command");
    let _ = status.update(b"--- Execution Started ---\n", false);

    let mut cmd = Command::new(shell);
    if cfg!(windows) {
        cmd.arg("/C").arg(&params.command);
    } else {
        cmd.arg("-c").arg(&params.command);
    }

    // Overrides are scoped to the child; the wrapper's own environment is
    // never touched. Later entries win on duplicate keys.
    cmd.envs(params.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            error!(job = %job_name, error = %e, "failed to start command");
            return ExecutionResult {
                output: format!("Failed to start: {e}").into_bytes(),
                outcome: Outcome::FailedToStart,
            };
        }
    };

    let buffer: SharedBuffer = Arc::new(Mutex::new(Vec::new()));

    let stdout_sink = MultiSink::new(vec![
        Box::new(ConsoleSink::Stdout),
        Box::new(StatusSink::new(Arc::clone(&status), false)),
        Box::new(MemorySink::new(Arc::clone(&buffer))),
    ]);
    let stderr_sink = MultiSink::new(vec![
        Box::new(ConsoleSink::Stderr),
        Box::new(StatusSink::new(Arc::clone(&status), true)),
        Box::new(MemorySink::new(Arc::clone(&buffer))),
    ]);

    let out_pump = spawn_pump(job_name, "stdout", child.stdout.take(), stdout_sink);
    let err_pump = spawn_pump(job_name, "stderr", child.stderr.take(), stderr_sink);

    let outcome = match params.timeout {
        Some(limit) => {
            // Either the process exits on its own, or the timer fires
            // first and the process is killed. Exactly one branch runs.
            tokio::select! {
                status_res = child.wait() => wait_outcome(job_name, status_res),
                _ = sleep(limit) => {
                    warn!(job = %job_name, timeout = ?limit, "command timed out; killing process");
                    let _ = status.update(b"\n--- Execution Timed Out, Killing Process ---\n", true);
                    if let Err(e) = child.kill().await {
                        warn!(job = %job_name, error = %e, "failed to kill timed-out process");
                    }
                    Outcome::Killed
                }
            }
        }
        None => wait_outcome(job_name, child.wait().await),
    };

    // Drain the pumps so the buffer is byte-complete; after a kill the
    // pipes close and both readers hit EOF.
    let _ = tokio::join!(out_pump, err_pump);

    if let (Outcome::Killed, Some(limit)) = (&outcome, params.timeout) {
        if let Ok(mut guard) = buffer.lock() {
            guard.extend_from_slice(format!("\nTimed out after {limit:?}").as_bytes());
        }
    }

    let _ = status.update(b"\n--- Execution Finished ---\n", outcome.is_error());

    info!(
        job = %job_name,
        exit_code = outcome.exit_code(),
        success = !outcome.is_error(),
        "command finished"
    );

    let output = buffer.lock().map(|guard| guard.clone()).unwrap_or_default();
    ExecutionResult { output, outcome }
}

/// Pump one child stream into its multiplexer, chunk by chunk.
///
/// Sink errors are logged and pumping continues; the remaining sinks in
/// the multiplexer received the chunk regardless.
fn spawn_pump<R>(
    job_name: &str,
    stream: &'static str,
    reader: Option<R>,
    mut sink: MultiSink,
) -> tokio::task::JoinHandle<()>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    let job = job_name.to_string();
    tokio::spawn(async move {
        let Some(mut reader) = reader else {
            return;
        };
        let mut buf = [0u8; 8192];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    if let Err(e) = sink.write_chunk(&buf[..n]) {
                        warn!(job = %job, stream, error = %e, "output sink write failed");
                    }
                }
                Err(e) => {
                    debug!(job = %job, stream, error = %e, "stopped reading child output");
                    break;
                }
            }
        }
        debug!(job = %job, stream, "output pump finished");
    })
}

/// Map a `wait()` result to an outcome: clean zero exit is success, a
/// detectable non-zero code is reported as-is, anything else as code 1.
fn wait_outcome(job_name: &str, res: io::Result<ExitStatus>) -> Outcome {
    match res {
        Ok(status) if status.success() => Outcome::Success,
        Ok(status) => Outcome::Failed(status.code().unwrap_or(1)),
        Err(e) => {
            error!(job = %job_name, error = %e, "waiting for process failed");
            Outcome::Failed(1)
        }
    }
}
