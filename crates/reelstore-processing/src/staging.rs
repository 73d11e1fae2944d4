//! Temp staging for uploaded and intermediate files.
//!
//! Every `StagedFile` owns a `TempPath`, so the file is deleted when the value
//! is dropped: on success, on error and when the request future is cancelled.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;

use crate::error::StagingError;

const STAGED_PREFIX: &str = "reelstore-";

/// Directory that staged files are created in.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

/// A randomly named file in the staging area.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    size: u64,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub(crate) fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }
}

impl StagingArea {
    /// Use `dir` as the staging directory, creating it if needed.
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, StagingError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Allocate an empty staged file ending in `suffix` (e.g. `.mp4`).
    pub fn create(&self, suffix: &str) -> Result<StagedFile, StagingError> {
        let file = tempfile::Builder::new()
            .prefix(STAGED_PREFIX)
            .suffix(suffix)
            .tempfile_in(&self.dir)?;
        Ok(StagedFile {
            path: file.into_temp_path(),
            size: 0,
        })
    }

    /// Write `stream` into a new staged file, failing once more than
    /// `max_bytes` have been received.
    pub async fn stage_stream<S, E>(
        &self,
        stream: S,
        suffix: &str,
        max_bytes: u64,
    ) -> Result<StagedFile, StagingError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let named = tempfile::Builder::new()
            .prefix(STAGED_PREFIX)
            .suffix(suffix)
            .tempfile_in(&self.dir)?;
        let (file, path) = named.into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let mut stream = std::pin::pin!(stream);
        let mut size: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| StagingError::Stream(e.to_string()))?;
            size += chunk.len() as u64;
            if size > max_bytes {
                return Err(StagingError::TooLarge { limit: max_bytes });
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        file.sync_all().await?;

        tracing::debug!(
            path = %path.display(),
            size_bytes = size,
            "Upload staged"
        );

        Ok(StagedFile { path, size })
    }
}
