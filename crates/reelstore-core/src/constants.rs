//! Shared constants.

use std::time::Duration;

/// Lifetime of every signed video URL handed to a client.
pub const SIGNED_URL_TTL: Duration = Duration::from_secs(60 * 60);

/// Aspect ratio tolerance used when classifying probed video geometry.
pub const ASPECT_RATIO_TOLERANCE: f64 = 0.01;

/// Multipart field carrying a thumbnail image.
pub const THUMBNAIL_FIELD: &str = "thumbnail";

/// Multipart field carrying a video file.
pub const VIDEO_FIELD: &str = "video";

/// Bytes of entropy behind every generated storage key name.
pub const KEY_ENTROPY_BYTES: usize = 32;
