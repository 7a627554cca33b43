// src/exec/mod.rs

//! Process execution layer.
//!
//! This module owns the child process lifecycle, using
//! `tokio::process::Command`, and the concurrent fan-out of its output.
//!
//! - [`runner`] spawns the command, races natural exit against the
//!   configured timeout, and normalizes the outcome.
//! - [`sink`] provides the sink trait and the multiplexer that delivers
//!   every output chunk to the console mirror, the streaming-status
//!   callback and the in-memory result buffer.

pub mod runner;
pub mod sink;

pub use runner::{default_shell, run_command};
pub use sink::{MultiSink, OutputSink};
