//! Fast-start remux with `ffmpeg`.
//!
//! Streams are copied as-is (`-c copy`); only the container is rewritten so the
//! index sits at the front of the file. The output muxer follows the input's
//! extension.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::command::{run_with_timeout, validate_executable};
use crate::error::ProcessingError;
use crate::staging::{StagedFile, StagingArea};

/// Rewrites a staged file into a new staged file optimized for progressive playback.
#[async_trait]
pub trait StreamOptimizer: Send + Sync {
    async fn optimize(
        &self,
        input: &Path,
        staging: &StagingArea,
    ) -> Result<StagedFile, ProcessingError>;
}

pub struct FfmpegFastStart {
    ffmpeg_path: String,
    timeout: Duration,
}

impl FfmpegFastStart {
    pub fn new(ffmpeg_path: String, timeout: Duration) -> Result<Self, ProcessingError> {
        validate_executable(&ffmpeg_path)?;
        Ok(Self {
            ffmpeg_path,
            timeout,
        })
    }
}

/// `.ext` of `path`, or an empty suffix.
pub(crate) fn suffix_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

#[async_trait]
impl StreamOptimizer for FfmpegFastStart {
    #[tracing::instrument(skip(self, staging), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart"
    ))]
    async fn optimize(
        &self,
        input: &Path,
        staging: &StagingArea,
    ) -> Result<StagedFile, ProcessingError> {
        let start = std::time::Instant::now();
        let output_file = staging.create(&suffix_of(input))?;

        let mut command = Command::new(&self.ffmpeg_path);
        command
            .arg("-y")
            .arg("-i")
            .arg(input)
            .args(["-c", "copy", "-movflags", "faststart"])
            .arg(output_file.path());

        run_with_timeout(command, self.timeout, "ffmpeg").await?;

        let size = tokio::fs::metadata(output_file.path())
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        if size == 0 {
            return Err(ProcessingError::EmptyOutput);
        }

        tracing::info!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            size_bytes = size,
            "Fast-start remux completed"
        );

        Ok(output_file.with_size(size))
    }
}
