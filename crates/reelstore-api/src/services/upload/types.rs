//! Upload pipeline types

use std::time::Duration;

use reelstore_core::constants::{SIGNED_URL_TTL, THUMBNAIL_FIELD, VIDEO_FIELD};
use reelstore_core::Config;

/// Multipart part headers and trailing boundary on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Settings the upload pipeline is built with.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub upload_bucket: String,
    pub max_thumbnail_size_bytes: u64,
    pub max_video_size_bytes: u64,
    pub thumbnail_allowed_content_types: Vec<String>,
    pub video_allowed_content_types: Vec<String>,
    pub signed_url_ttl: Duration,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            upload_bucket: config.upload_bucket().to_string(),
            max_thumbnail_size_bytes: config.max_thumbnail_size_bytes(),
            max_video_size_bytes: config.max_video_size_bytes(),
            thumbnail_allowed_content_types: config.thumbnail_allowed_content_types().to_vec(),
            video_allowed_content_types: config.video_allowed_content_types().to_vec(),
            signed_url_ttl: SIGNED_URL_TTL,
        }
    }

    pub fn max_bytes(&self, kind: UploadKind) -> u64 {
        match kind {
            UploadKind::Thumbnail => self.max_thumbnail_size_bytes,
            UploadKind::Video => self.max_video_size_bytes,
        }
    }

    pub fn allowed_content_types(&self, kind: UploadKind) -> &[String] {
        match kind {
            UploadKind::Thumbnail => &self.thumbnail_allowed_content_types,
            UploadKind::Video => &self.video_allowed_content_types,
        }
    }

    /// Request body limit for an upload route.
    pub fn body_limit(&self, kind: UploadKind) -> usize {
        usize::try_from(self.max_bytes(kind).saturating_add(MULTIPART_OVERHEAD_BYTES))
            .unwrap_or(usize::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Thumbnail,
    Video,
}

impl UploadKind {
    pub fn field_name(self) -> &'static str {
        match self {
            UploadKind::Thumbnail => THUMBNAIL_FIELD,
            UploadKind::Video => VIDEO_FIELD,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UploadKind::Thumbnail => "thumbnail",
            UploadKind::Video => "video",
        }
    }
}
