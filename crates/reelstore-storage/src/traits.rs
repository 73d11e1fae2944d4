//! Storage abstraction trait
//!
//! This module defines the Storage trait that all object store backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use reelstore_core::ObjectReference;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Signed URL has expired")]
    Expired,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Object store gateway
///
/// Objects are addressed by `(bucket, key)`. Writing to an existing key
/// overwrites it. Retrieval happens out of band through signed URLs, each
/// carrying its own credential and expiry.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` at `{bucket, key}` with the given content type.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<ObjectReference>;

    /// Store the contents of a local file.
    ///
    /// By default the file is read into memory and uploaded in a single put.
    async fn put_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<ObjectReference> {
        let data = tokio::fs::read(path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to read {}: {}", path.display(), e))
        })?;
        self.put(bucket, key, Bytes::from(data), content_type).await
    }

    /// Generate a time-limited GET URL for a stored object.
    ///
    /// No existence check is made; signing a missing object still succeeds.
    async fn presigned_url(
        &self,
        reference: &ObjectReference,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

/// Reject keys that are empty, absolute or contain parent-directory segments.
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.contains("..") || key.starts_with('/') || key.chars().any(char::is_control) {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// Bucket names become a single path segment on the local backend.
pub(crate) fn validate_bucket(bucket: &str) -> StorageResult<()> {
    if bucket.is_empty()
        || bucket.contains(',')
        || bucket.contains('/')
        || bucket.contains('\\')
        || bucket.contains("..")
        || bucket.chars().any(char::is_control)
    {
        return Err(StorageError::InvalidKey(format!(
            "Invalid bucket name: {}",
            bucket
        )));
    }
    Ok(())
}
