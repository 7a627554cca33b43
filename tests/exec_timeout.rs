// tests/exec_timeout.rs

//! Timeout enforcement: the wait-vs-timer race and the forced kill.

use std::sync::Arc;
use std::time::Instant;

use jobwrap::Executor;
use jobwrap::types::{ExecutionRequest, Outcome, TIMEOUT_EXIT_CODE};
use jobwrap_test_utils::fakes::{RecordingEventSink, RecordingStatus};
use jobwrap_test_utils::{init_tracing, with_timeout};

#[tokio::test]
async fn timed_out_command_is_killed_and_annotated() {
    init_tracing();
    let sink = Arc::new(RecordingEventSink::new());
    let executor = Executor::with_events(sink.clone());
    let status = Arc::new(RecordingStatus::new());

    let request = ExecutionRequest::new("sleeper")
        .with_option("command", "sleep 10")
        .with_option("timeout", "100ms");

    let started = Instant::now();
    let result = with_timeout(executor.execute(&request, status.clone())).await;

    assert_eq!(result.outcome, Outcome::Killed);
    assert_eq!(result.outcome.exit_code(), TIMEOUT_EXIT_CODE);
    assert_eq!(result.error_field(), "exit status 137");
    assert!(
        started.elapsed().as_secs() < 5,
        "kill should end the run well before the command's own duration"
    );

    let output = String::from_utf8_lossy(&result.output).to_string();
    assert!(output.contains("Timed out after"), "missing annotation in {output:?}");

    assert!(status.saw("--- Execution Timed Out, Killing Process ---"));
    assert_eq!(sink.publish_count(), 1);
    assert_eq!(sink.events()[0].exit_code, TIMEOUT_EXIT_CODE);
}

#[tokio::test]
async fn generous_timeout_lets_the_command_finish() {
    init_tracing();
    let sink = Arc::new(RecordingEventSink::new());
    let executor = Executor::with_events(sink.clone());

    let request = ExecutionRequest::new("quick")
        .with_option("command", "printf done")
        .with_option("timeout", "10s");
    let result = with_timeout(executor.execute(&request, Arc::new(RecordingStatus::new()))).await;

    assert_eq!(result.outcome, Outcome::Success);
    assert_eq!(result.output, b"done");
    assert_eq!(sink.events()[0].exit_code, 0);
}

#[tokio::test]
async fn zero_timeout_means_wait_indefinitely() {
    init_tracing();
    let sink = Arc::new(RecordingEventSink::new());
    let executor = Executor::with_events(sink.clone());

    // A zero timeout must not race at all; the command completes normally.
    let request = ExecutionRequest::new("untimed")
        .with_option("command", "printf steady")
        .with_option("timeout", "0s");
    let result = with_timeout(executor.execute(&request, Arc::new(RecordingStatus::new()))).await;

    assert_eq!(result.outcome, Outcome::Success);
    assert_eq!(result.output, b"steady");
}
