//! Upload pipeline for thumbnails and videos.

mod service;
mod types;

pub use service::UploadPipeline;
pub use types::{PipelineConfig, UploadKind};
