use crate::traits::{validate_bucket, validate_key, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use hmac::{Hmac, Mac};
use reelstore_core::ObjectReference;
use sha2::Sha256;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;
use tokio::io::AsyncWriteExt;

type HmacSha256 = Hmac<Sha256>;

/// Local filesystem object store
///
/// Objects live at `{base_path}/{bucket}/{key}`. Signed URLs point at the
/// server's `/objects/{bucket}/{key}` route and carry an expiry timestamp plus
/// an HMAC-SHA256 over bucket, key and expiry.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    signing_secret: Vec<u8>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage (e.g., "/var/lib/reelstore/objects")
    /// * `base_url` - Public base URL of the server (e.g., "http://localhost:8091")
    /// * `signing_secret` - Key for signed URLs
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        signing_secret: impl Into<Vec<u8>>,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
            signing_secret: signing_secret.into(),
        })
    }

    /// Convert bucket and key to a filesystem path with traversal checks.
    fn object_path(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        validate_bucket(bucket)?;
        validate_key(key)?;

        let path = self.base_path.join(bucket).join(key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    fn mac(&self, bucket: &str, key: &str, expires: u64) -> StorageResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.signing_secret)
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;
        // Each field is length-prefixed so no two (bucket, key) pairs share an input.
        for field in [bucket.as_bytes(), key.as_bytes()] {
            mac.update(&(field.len() as u64).to_be_bytes());
            mac.update(field);
        }
        mac.update(&expires.to_be_bytes());
        Ok(mac)
    }

    fn signed_url_at(&self, bucket: &str, key: &str, expires: u64) -> StorageResult<String> {
        let tag = self
            .mac(bucket, key, expires)
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?
            .finalize()
            .into_bytes();
        let signature = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(tag);
        let encoded_key = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        Ok(format!(
            "{}/objects/{}/{}?expires={}&signature={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(bucket),
            encoded_key,
            expires,
            signature
        ))
    }

    /// Check a signed URL's credential and return the object's path on disk.
    ///
    /// The signature is compared in constant time before the expiry is checked.
    pub async fn open_signed(
        &self,
        bucket: &str,
        key: &str,
        expires: u64,
        signature: &str,
    ) -> StorageResult<PathBuf> {
        let path = self.object_path(bucket, key)?;

        let provided = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| StorageError::InvalidSignature)?;
        self.mac(bucket, key, expires)?
            .verify_slice(&provided)
            .map_err(|_| StorageError::InvalidSignature)?;

        if unix_now() > expires {
            return Err(StorageError::Expired);
        }

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(format!("{}/{}", bucket, key)));
        }

        Ok(path)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<ObjectReference> {
        let path = self.object_path(bucket, key)?;
        let size = data.len();

        self.ensure_parent_dir(&path)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            bucket = %bucket,
            key = %key,
            size_bytes = size,
            content_type = %content_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(ObjectReference::new(bucket, key))
    }

    async fn put_file(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
        content_type: &str,
    ) -> StorageResult<ObjectReference> {
        let path = self.object_path(bucket, key)?;
        self.ensure_parent_dir(&path)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        let start = std::time::Instant::now();
        let size = fs::copy(source, &path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to copy {} to {}: {}",
                source.display(),
                path.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %path.display(),
            bucket = %bucket,
            key = %key,
            size_bytes = size,
            content_type = %content_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(ObjectReference::new(bucket, key))
    }

    async fn presigned_url(
        &self,
        reference: &ObjectReference,
        expires_in: Duration,
    ) -> StorageResult<String> {
        validate_bucket(&reference.bucket)
            .and_then(|_| validate_key(&reference.key))
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?;
        let expires = unix_now().saturating_add(expires_in.as_secs());
        self.signed_url_at(&reference.bucket, &reference.key, expires)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
