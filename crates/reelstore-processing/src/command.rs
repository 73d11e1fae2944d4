//! Bounded execution of external tools.

use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;

use crate::error::ProcessingError;

const MAX_STDERR_CHARS: usize = 2000;

/// Reject executable paths that contain shell metacharacters.
pub fn validate_executable(path: &str) -> Result<(), ProcessingError> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.is_empty() || path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(ProcessingError::InvalidExecutable(path.to_string()));
    }
    Ok(())
}

/// Run `command` to completion, killing it once `timeout` elapses.
///
/// The child is spawned with `kill_on_drop`, so dropping the returned future
/// (timeout or client disconnect) also kills the process.
#[tracing::instrument(skip(command), fields(process.executable.name = %program))]
pub async fn run_with_timeout(
    mut command: Command,
    timeout: Duration,
    program: &str,
) -> Result<Output, ProcessingError> {
    let start = std::time::Instant::now();

    command
        .kill_on_drop(true)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let child = command.spawn().map_err(|source| ProcessingError::Spawn {
        program: program.to_string(),
        source,
    })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|source| ProcessingError::Spawn {
            program: program.to_string(),
            source,
        })?,
        Err(_) => {
            tracing::warn!(
                timeout_secs = timeout.as_secs_f64(),
                "Process timed out and was killed"
            );
            return Err(ProcessingError::Timeout {
                program: program.to_string(),
                after: timeout,
            });
        }
    };

    if !output.status.success() {
        let stderr: String = String::from_utf8_lossy(&output.stderr)
            .chars()
            .take(MAX_STDERR_CHARS)
            .collect();
        return Err(ProcessingError::Failed {
            program: program.to_string(),
            status: output.status.code(),
            stderr,
        });
    }

    tracing::debug!(
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Process completed"
    );

    Ok(output)
}
