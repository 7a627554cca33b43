// src/config.rs

//! Resolution of raw string options into typed execution parameters.
//!
//! Nothing in here can fail the overall execution: a malformed `timeout`
//! or `env` value is reported as a warning through the status callback
//! (flagged as the error stream) and its default takes over.

use std::collections::HashMap;
use std::time::Duration;

use tracing::warn;

use crate::types::StatusCallback;

/// Typed execution parameters produced from an [`crate::types::ExecutionRequest`]
/// config map.
#[derive(Debug, Clone)]
pub struct ExecParams {
    /// Shell command to run. Falls back to the job name when the
    /// `command` option is missing or empty.
    pub command: String,
    /// Wall-clock timeout. `None` means wait indefinitely; a configured
    /// zero or unparseable duration also resolves to `None`.
    pub timeout: Option<Duration>,
    /// Environment overrides scoped to the child process. Later entries
    /// override earlier ones on key conflict.
    pub env: Vec<(String, String)>,
}

/// Resolve the raw config map for a job into [`ExecParams`].
pub fn resolve(
    job_name: &str,
    config: &HashMap<String, String>,
    status: &dyn StatusCallback,
) -> ExecParams {
    let command = match config.get("command") {
        Some(cmd) if !cmd.is_empty() => cmd.clone(),
        _ => job_name.to_string(),
    };

    let timeout = config
        .get("timeout")
        .filter(|s| !s.is_empty())
        .and_then(|raw| match parse_duration(raw) {
            Ok(dur) => Some(dur),
            Err(e) => {
                warn!(job = %job_name, timeout = %raw, error = %e, "invalid timeout duration");
                let _ = status.update(b"Warning: Invalid timeout format, ignoring\n", true);
                None
            }
        })
        .filter(|dur| !dur.is_zero());

    let env = match config.get("env").filter(|s| !s.is_empty()) {
        Some(raw) => match serde_json::from_str::<Vec<String>>(raw) {
            Ok(entries) => split_env_entries(job_name, &entries),
            Err(e) => {
                warn!(job = %job_name, error = %e, "failed to parse env");
                let _ = status.update(b"Warning: Failed to parse env JSON\n", true);
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    ExecParams {
        command,
        timeout,
        env,
    }
}

/// Split `KEY=VALUE` strings into pairs; entries without `=` are dropped.
fn split_env_entries(job_name: &str, entries: &[String]) -> Vec<(String, String)> {
    entries
        .iter()
        .filter_map(|entry| match entry.split_once('=') {
            Some((key, value)) => Some((key.to_string(), value.to_string())),
            None => {
                warn!(job = %job_name, entry = %entry, "env entry without '='; skipping");
                None
            }
        })
        .collect()
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let overflow = || format!("duration '{}' is out of range", s);
    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => value
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(overflow),
        "h" => value
            .checked_mul(60 * 60)
            .map(Duration::from_secs)
            .ok_or_else(overflow),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}
