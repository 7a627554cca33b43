// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `jobwrap`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "jobwrap",
    version,
    about = "Run a shell command with timeout enforcement and report its completion to an event stream.",
    long_about = None
)]
pub struct CliArgs {
    /// Job name used in logs and in the published completion event.
    ///
    /// If omitted, `JOBWRAP_JOB_NAME` or `ENV_JOB_NAME` is used, falling
    /// back to "unknown".
    #[arg(long, value_name = "NAME")]
    pub job_name: Option<String>,

    /// Wall-clock timeout for the command (e.g. "30s", "250ms", "5m").
    ///
    /// When the timeout fires the process is killed and the run is
    /// reported with exit code 137. Omitted or zero means no timeout.
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Extra environment variables for the command, as a JSON array of
    /// "KEY=VALUE" strings, e.g. '["FOO=bar"]'.
    ///
    /// These are attached to the child only; the wrapper's own
    /// environment is never modified.
    #[arg(long, value_name = "JSON")]
    pub env: Option<String>,

    /// Event stream the completion record is pushed to.
    #[arg(long, value_name = "NAME")]
    pub stream: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `JOBWRAP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// The command to run, passed to `sh -c` as a single string.
    #[arg(trailing_var_arg = true, required = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
