//! Reelstore Storage Library
//!
//! Object storage for uploaded videos and the local asset directory for thumbnails.
//!
//! # Storage key format
//!
//! Keys are `{prefix}/{name}.{ext}` or `{name}.{ext}`, where `name` is 32 random
//! bytes rendered as unpadded base64url. Key generation is centralized in the
//! `keys` module so every backend stays consistent.
//!
//! Keys must not be empty, contain `..` or start with `/`.

pub mod assets;
pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use assets::LocalAssetStore;
pub use factory::{create_storage, ConfiguredStorage};
pub use keys::{derive_key, extension_for};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use reelstore_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
