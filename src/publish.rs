// src/publish.rs

//! Completion event publishing.
//!
//! Every execution ends with exactly one publish attempt of a
//! [`CompletionEvent`] to an append-only Redis stream. The publish is a
//! deliberate, deadline-bounded call on the main path, but it never fails
//! the execution: errors are logged and swallowed.
//!
//! The [`EventSink`] trait exists so tests can swap in a recording sink
//! instead of a live Redis connection.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::Result;
use crate::types::ExecutionResult;

/// Address used when `REDIS_URL` is not set; assumes host network or a
/// linked service.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Stream completion events are pushed to by default.
pub const DEFAULT_STREAM: &str = "jobwrap_out";

/// Approximate retained stream length.
pub const DEFAULT_MAX_LEN: usize = 1000;

/// Upper bound on the whole connect-push-disconnect cycle.
const PUBLISH_DEADLINE: Duration = Duration::from_secs(2);

/// One completion record, serialized to a single JSON `payload` field.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionEvent {
    pub job: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub exit_code: i32,
    pub timestamp: String,
}

impl CompletionEvent {
    /// Build the event for a finished execution, enriched from the
    /// process-wide environment. Enrichment never alters execution
    /// semantics.
    pub fn from_result(job_name: &str, result: &ExecutionResult) -> Self {
        Self {
            job: job_name.to_string(),
            owner: non_empty_env("ENV_JOB_OWNER"),
            description: non_empty_env("ENV_JOB_DESCRIPTION"),
            exit_code: result.outcome.exit_code(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

/// Destination for completion events.
///
/// Production code uses [`RedisEventSink`]; tests can provide their own
/// implementation that records publish attempts.
pub trait EventSink: Send + Sync {
    /// Attempt one publish. Infallible to the caller; implementations log
    /// and swallow their own failures.
    fn publish(&self, event: CompletionEvent) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Event sink backed by a Redis stream (`XADD`).
pub struct RedisEventSink {
    url: String,
    stream: String,
    max_len: Option<usize>,
}

impl RedisEventSink {
    pub fn new(url: impl Into<String>, stream: impl Into<String>, max_len: Option<usize>) -> Self {
        Self {
            url: url.into(),
            stream: stream.into(),
            max_len,
        }
    }

    /// Sink configured from `REDIS_URL`, with the default stream name and
    /// retained length unless overridden.
    pub fn from_env(stream: Option<String>) -> Self {
        let url = non_empty_env("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());
        Self::new(
            url,
            stream.unwrap_or_else(|| DEFAULT_STREAM.to_string()),
            Some(DEFAULT_MAX_LEN),
        )
    }

    async fn push(&self, event: &CompletionEvent) -> Result<()> {
        let payload = serde_json::to_string(event).map_err(anyhow::Error::from)?;

        let client = redis::Client::open(self.url.as_str())?;
        let mut conn = client.get_multiplexed_async_connection().await?;

        let mut cmd = redis::cmd("XADD");
        cmd.arg(&self.stream);
        if let Some(max_len) = self.max_len {
            cmd.arg("MAXLEN").arg("~").arg(max_len);
        }
        cmd.arg("*").arg("payload").arg(payload);

        let _id: String = cmd.query_async(&mut conn).await?;
        Ok(())
    }
}

impl EventSink for RedisEventSink {
    fn publish(&self, event: CompletionEvent) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            match tokio::time::timeout(PUBLISH_DEADLINE, self.push(&event)).await {
                Ok(Ok(())) => {
                    info!(job = %event.job, stream = %self.stream, "pushed completion event");
                }
                Ok(Err(e)) => {
                    warn!(
                        job = %event.job,
                        stream = %self.stream,
                        error = %e,
                        "failed to push completion event"
                    );
                }
                Err(_) => {
                    warn!(
                        job = %event.job,
                        stream = %self.stream,
                        "completion event publish deadline elapsed"
                    );
                }
            }
        })
    }
}
