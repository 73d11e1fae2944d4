//! Local asset directory for thumbnails, served as static files under `/assets`.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::traits::{validate_key, StorageError, StorageResult};

#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    root: PathBuf,
    host: String,
    port: u16,
}

impl LocalAssetStore {
    /// Create the store, creating `root` if it does not exist.
    pub async fn new(root: impl Into<PathBuf>, host: String, port: u16) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create assets directory {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self { root, host, port })
    }

    /// Copy a staged file to `root/key`, replacing any previous file there.
    pub async fn store_file(&self, key: &str, source: &Path) -> StorageResult<u64> {
        validate_key(key)?;
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let start = std::time::Instant::now();
        let size = fs::copy(source, &path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to write asset {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Asset stored"
        );

        Ok(size)
    }

    /// Public URL of an asset key.
    pub fn url_for(&self, key: &str) -> String {
        format!("http://{}:{}/assets/{}", self.host, self.port, key)
    }
}
