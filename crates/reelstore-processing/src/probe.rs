//! Video geometry extraction with `ffprobe`.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reelstore_core::Dimensions;
use serde::Deserialize;
use tokio::process::Command;

use crate::command::{run_with_timeout, validate_executable};
use crate::error::ProcessingError;

/// Reads the pixel geometry of a staged media file.
#[async_trait]
pub trait MediaProber: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<Dimensions, ProcessingError>;
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Parse `ffprobe -print_format json -show_streams` output.
///
/// The first video stream with a non-zero width and height wins. Streams
/// without a `codec_type` are treated as video.
pub fn parse_probe_output(stdout: &[u8]) -> Result<Dimensions, ProcessingError> {
    let output: ProbeOutput =
        serde_json::from_slice(stdout).map_err(|e| ProcessingError::Parse(e.to_string()))?;

    if output.streams.is_empty() {
        return Err(ProcessingError::NoStreams);
    }

    output
        .streams
        .iter()
        .filter(|stream| stream.codec_type.as_deref().map_or(true, |t| t == "video"))
        .find_map(|stream| match (stream.width, stream.height) {
            (Some(width), Some(height)) if width > 0 && height > 0 => {
                Some(Dimensions::new(width, height))
            }
            _ => None,
        })
        .ok_or_else(|| ProcessingError::Parse("no video stream with width/height".to_string()))
}

pub struct FfprobeProber {
    ffprobe_path: String,
    timeout: Duration,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: String, timeout: Duration) -> Result<Self, ProcessingError> {
        validate_executable(&ffprobe_path)?;
        Ok(Self {
            ffprobe_path,
            timeout,
        })
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    async fn probe(&self, path: &Path) -> Result<Dimensions, ProcessingError> {
        let start = std::time::Instant::now();

        let mut command = Command::new(&self.ffprobe_path);
        command
            .args(["-v", "quiet", "-print_format", "json", "-show_streams"])
            .arg(path);

        let output = run_with_timeout(command, self.timeout, "ffprobe").await?;
        let dimensions = parse_probe_output(&output.stdout)?;

        tracing::info!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            width = dimensions.width,
            height = dimensions.height,
            aspect = %dimensions.aspect_class(),
            "Video probe completed"
        );

        Ok(dimensions)
    }
}
