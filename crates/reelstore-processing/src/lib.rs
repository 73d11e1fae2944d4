//! Reelstore Processing Library
//!
//! Temp staging of uploaded bytes and the external tools that inspect and
//! rewrite staged video files:
//! - `staging`: randomly named temp files removed on drop
//! - `probe`: `ffprobe` geometry extraction
//! - `faststart`: `ffmpeg` stream-copy remux with the index moved to the front
//! - `command`: bounded subprocess execution

pub mod command;
pub mod error;
pub mod faststart;
pub mod probe;
pub mod staging;

pub use error::{ProcessingError, StagingError};
pub use faststart::{FfmpegFastStart, StreamOptimizer};
pub use probe::{parse_probe_output, FfprobeProber, MediaProber};
pub use staging::{StagedFile, StagingArea};
