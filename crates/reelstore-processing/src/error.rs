use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors from staging an upload to disk
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Upload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("Failed to read upload stream: {0}")]
    Stream(String),

    #[error("Staging IO error: {0}")]
    Io(#[from] io::Error),
}

/// Errors from running the external media tools
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Invalid executable path: {0}")]
    InvalidExecutable(String),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} timed out after {after:?}")]
    Timeout { program: String, after: Duration },

    #[error("{program} exited with status {status:?}: {stderr}")]
    Failed {
        program: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Unparseable probe output: {0}")]
    Parse(String),

    #[error("Probe found no streams")]
    NoStreams,

    #[error("Optimizer produced an empty file")]
    EmptyOutput,

    #[error(transparent)]
    Staging(#[from] StagingError),
}
