//! Test doubles for the status callback and the event sink.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use jobwrap::publish::{CompletionEvent, EventSink};
use jobwrap::types::StatusCallback;

/// Status callback that records every chunk together with its error flag.
#[derive(Default)]
pub struct RecordingStatus {
    chunks: Mutex<Vec<(Vec<u8>, bool)>>,
}

impl RecordingStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded `(chunk, is_error)` pairs, in arrival order.
    pub fn chunks(&self) -> Vec<(Vec<u8>, bool)> {
        self.chunks.lock().unwrap().clone()
    }

    /// Concatenation of all chunks recorded with the given flag.
    pub fn stream(&self, is_error: bool) -> Vec<u8> {
        let guard = self.chunks.lock().unwrap();
        guard
            .iter()
            .filter(|(_, flag)| *flag == is_error)
            .flat_map(|(chunk, _)| chunk.iter().copied())
            .collect()
    }

    /// Whether any recorded chunk contains `needle` (lossy UTF-8).
    pub fn saw(&self, needle: &str) -> bool {
        let guard = self.chunks.lock().unwrap();
        guard
            .iter()
            .any(|(chunk, _)| String::from_utf8_lossy(chunk).contains(needle))
    }
}

impl StatusCallback for RecordingStatus {
    fn update(&self, chunk: &[u8], is_error: bool) -> anyhow::Result<()> {
        self.chunks.lock().unwrap().push((chunk.to_vec(), is_error));
        Ok(())
    }
}

/// Status callback whose every update fails, simulating a broken status
/// channel back to the host.
#[derive(Default)]
pub struct FailingStatus;

impl StatusCallback for FailingStatus {
    fn update(&self, _chunk: &[u8], _is_error: bool) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("status channel broken"))
    }
}

/// Event sink that records publish attempts instead of talking to Redis.
#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<CompletionEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CompletionEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn publish_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

impl EventSink for RecordingEventSink {
    fn publish(&self, event: CompletionEvent) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            self.events.lock().unwrap().push(event);
        })
    }
}
