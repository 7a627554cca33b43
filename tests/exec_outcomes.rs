// tests/exec_outcomes.rs

//! End-to-end outcome mapping with real `sh` child processes.

use std::sync::Arc;

use jobwrap::Executor;
use jobwrap::types::{ExecutionRequest, Outcome};
use jobwrap_test_utils::fakes::{RecordingEventSink, RecordingStatus};
use jobwrap_test_utils::{init_tracing, with_timeout};

fn executor_with_sink() -> (Executor, Arc<RecordingEventSink>) {
    let sink = Arc::new(RecordingEventSink::new());
    (Executor::with_events(sink.clone()), sink)
}

#[tokio::test]
async fn exit_zero_yields_success_and_empty_error() {
    init_tracing();
    let (executor, sink) = executor_with_sink();

    let request = ExecutionRequest::new("ok-job").with_option("command", "exit 0");
    let result = with_timeout(executor.execute(&request, Arc::new(RecordingStatus::new()))).await;

    assert_eq!(result.outcome, Outcome::Success);
    assert_eq!(result.error_field(), "");
    assert_eq!(sink.publish_count(), 1);
    assert_eq!(sink.events()[0].exit_code, 0);
    assert_eq!(sink.events()[0].job, "ok-job");
}

#[tokio::test]
async fn nonzero_exit_maps_to_exit_status() {
    init_tracing();
    let (executor, sink) = executor_with_sink();

    let request = ExecutionRequest::new("build").with_option("command", "exit 3");
    let result = with_timeout(executor.execute(&request, Arc::new(RecordingStatus::new()))).await;

    assert_eq!(result.outcome, Outcome::Failed(3));
    assert_eq!(result.error_field(), "exit status 3");
    assert_eq!(sink.publish_count(), 1);
    assert_eq!(sink.events()[0].exit_code, 3);
}

#[tokio::test]
async fn stdout_is_accumulated_byte_for_byte() {
    init_tracing();
    let (executor, _sink) = executor_with_sink();

    let request = ExecutionRequest::new("emit").with_option("command", "printf hello");
    let result = with_timeout(executor.execute(&request, Arc::new(RecordingStatus::new()))).await;

    assert_eq!(result.outcome, Outcome::Success);
    assert_eq!(result.output, b"hello");
}

#[tokio::test]
async fn both_streams_reach_the_shared_buffer() {
    init_tracing();
    let (executor, _sink) = executor_with_sink();

    let request = ExecutionRequest::new("mixed")
        .with_option("command", "printf from-stdout; printf from-stderr 1>&2");
    let result = with_timeout(executor.execute(&request, Arc::new(RecordingStatus::new()))).await;

    let output = String::from_utf8_lossy(&result.output).to_string();
    assert!(output.contains("from-stdout"), "missing stdout in {output:?}");
    assert!(output.contains("from-stderr"), "missing stderr in {output:?}");
}

#[tokio::test]
async fn empty_command_and_job_name_is_a_noop() {
    init_tracing();
    let (executor, sink) = executor_with_sink();

    // Command defaults to the (empty) job name; `sh -c ''` exits 0.
    let request = ExecutionRequest::new("");
    let result = with_timeout(executor.execute(&request, Arc::new(RecordingStatus::new()))).await;

    assert_eq!(result.outcome, Outcome::Success);
    assert!(result.output.is_empty());
    assert_eq!(sink.publish_count(), 1);
}

#[tokio::test]
async fn spawn_failure_still_publishes_one_event() {
    init_tracing();
    let (executor, sink) = executor_with_sink();
    let executor = executor.with_shell("/nonexistent/jobwrap-shell");

    let request = ExecutionRequest::new("doomed").with_option("command", "echo never");
    let result = with_timeout(executor.execute(&request, Arc::new(RecordingStatus::new()))).await;

    assert_eq!(result.outcome, Outcome::FailedToStart);
    assert_eq!(result.error_field(), "failed to start");
    let output = String::from_utf8_lossy(&result.output).to_string();
    assert!(output.starts_with("Failed to start:"), "unexpected output {output:?}");

    assert_eq!(sink.publish_count(), 1);
    assert_eq!(sink.events()[0].exit_code, 1);
    assert_eq!(sink.events()[0].job, "doomed");
}

#[tokio::test]
async fn every_execution_publishes_exactly_once() {
    init_tracing();
    let (executor, sink) = executor_with_sink();

    for command in ["exit 0", "exit 7", "printf x"] {
        let request = ExecutionRequest::new("repeat").with_option("command", command);
        with_timeout(executor.execute(&request, Arc::new(RecordingStatus::new()))).await;
    }

    assert_eq!(sink.publish_count(), 3);
    let codes: Vec<i32> = sink.events().iter().map(|e| e.exit_code).collect();
    assert_eq!(codes, vec![0, 7, 0]);
}
