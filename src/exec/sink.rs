// src/exec/sink.rs

//! Output fan-out for child process streams.
//!
//! Each child stream is pumped through one [`MultiSink`] composed of:
//! - a console mirror (operator visibility),
//! - a [`StatusSink`] forwarding to the host's streaming-status callback,
//! - a [`MemorySink`] accumulating into the shared result buffer.
//!
//! A failing sink is surfaced to the pump (first error wins) but never
//! stops delivery to the remaining sinks in the same call.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crate::types::StatusCallback;

/// A destination for chunks of child output.
///
/// Each call delivers one full chunk; partial writes are not part of the
/// contract.
pub trait OutputSink: Send {
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()>;
}

/// Fans every chunk to all attached sinks.
pub struct MultiSink {
    sinks: Vec<Box<dyn OutputSink>>,
}

impl MultiSink {
    pub fn new(sinks: Vec<Box<dyn OutputSink>>) -> Self {
        Self { sinks }
    }

    /// Deliver `chunk` to every sink. Returns the first sink error, but
    /// only after all sinks have been attempted.
    pub fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        let mut first_err = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.write_chunk(chunk) {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Shared accumulation buffer that becomes the final result output.
///
/// Both stream multiplexers append into the same buffer; the mutex gives
/// plain append safety, no cross-stream ordering is promised.
pub type SharedBuffer = Arc<Mutex<Vec<u8>>>;

pub struct MemorySink {
    buffer: SharedBuffer,
}

impl MemorySink {
    pub fn new(buffer: SharedBuffer) -> Self {
        Self { buffer }
    }
}

impl OutputSink for MemorySink {
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        let mut guard = self
            .buffer
            .lock()
            .map_err(|_| io::Error::other("output buffer poisoned"))?;
        guard.extend_from_slice(chunk);
        Ok(())
    }
}

/// Mirror of the wrapper's own stdout or stderr.
pub enum ConsoleSink {
    Stdout,
    Stderr,
}

impl OutputSink for ConsoleSink {
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        match self {
            ConsoleSink::Stdout => {
                let mut out = io::stdout();
                out.write_all(chunk)?;
                out.flush()
            }
            ConsoleSink::Stderr => {
                let mut err = io::stderr();
                err.write_all(chunk)?;
                err.flush()
            }
        }
    }
}

/// Adapts the host's [`StatusCallback`] into an [`OutputSink`] with a
/// fixed error flag, one callback invocation per chunk.
pub struct StatusSink {
    callback: Arc<dyn StatusCallback>,
    is_error: bool,
}

impl StatusSink {
    pub fn new(callback: Arc<dyn StatusCallback>, is_error: bool) -> Self {
        Self { callback, is_error }
    }
}

impl OutputSink for StatusSink {
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.callback
            .update(chunk, self.is_error)
            .map_err(io::Error::other)
    }
}
