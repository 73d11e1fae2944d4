//! Reelstore Core Library
//!
//! This crate provides core domain models, error types and configuration
//! that are shared across all Reelstore components.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, Config, MediaServiceConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    AspectClass, CreateVideoRequest, Dimensions, MediaAsset, ObjectReference,
    ObjectReferenceError, VideoResponse,
};
pub use storage_types::StorageBackend;
