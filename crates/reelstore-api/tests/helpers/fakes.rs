//! Stand-ins for ffprobe, ffmpeg, object storage and the record store.

use async_trait::async_trait;
use bytes::Bytes;
use reelstore_core::{AppError, Dimensions, MediaAsset, ObjectReference};
use reelstore_db::{AssetRepository, InMemoryAssetRepository};
use reelstore_processing::{
    MediaProber, ProcessingError, StagedFile, StagingArea, StreamOptimizer,
};
use reelstore_storage::{LocalStorage, Storage, StorageBackend, StorageError, StorageResult};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Reports fixed geometry, or fails as if the file had no streams.
pub struct FakeProber {
    dimensions: Option<Dimensions>,
    calls: AtomicUsize,
}

impl FakeProber {
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            dimensions: Some(Dimensions::new(width, height)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn landscape() -> Self {
        Self::with_dimensions(1920, 1080)
    }

    pub fn failing() -> Self {
        Self {
            dimensions: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaProber for FakeProber {
    async fn probe(&self, _path: &Path) -> Result<Dimensions, ProcessingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.dimensions.ok_or(ProcessingError::NoStreams)
    }
}

/// Copies the input into a new staged file, prefixed with a marker so tests
/// can tell optimized output from the raw upload.
pub struct FakeOptimizer {
    fail: bool,
    calls: AtomicUsize,
}

pub const OPTIMIZED_MARKER: &[u8] = b"faststart:";

impl FakeOptimizer {
    pub fn copying() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Writes partial output, then fails like a crashed ffmpeg.
    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamOptimizer for FakeOptimizer {
    async fn optimize(
        &self,
        input: &Path,
        staging: &StagingArea,
    ) -> Result<StagedFile, ProcessingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let suffix = input
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        if self.fail {
            let partial = staging.create(&suffix)?;
            std::fs::write(partial.path(), b"partial").map_err(|e| ProcessingError::Spawn {
                program: "ffmpeg".to_string(),
                source: e,
            })?;
            return Err(ProcessingError::Failed {
                program: "ffmpeg".to_string(),
                status: Some(1),
                stderr: "moov atom not found".to_string(),
            });
        }

        let mut data = OPTIMIZED_MARKER.to_vec();
        data.extend(tokio::fs::read(input).await.map_err(|e| ProcessingError::Spawn {
            program: "ffmpeg".to_string(),
            source: e,
        })?);
        let chunks = futures::stream::iter([Ok::<_, std::io::Error>(Bytes::from(data))]);
        Ok(staging.stage_stream(chunks, &suffix, u64::MAX).await?)
    }
}

/// Local object storage whose writes can be switched to fail.
pub struct FlakyStorage {
    inner: Arc<LocalStorage>,
    fail_writes: AtomicBool,
}

impl FlakyStorage {
    pub fn new(inner: Arc<LocalStorage>) -> Self {
        Self {
            inner,
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed("connection reset by peer".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<ObjectReference> {
        self.check()?;
        self.inner.put(bucket, key, data, content_type).await
    }

    async fn put_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<ObjectReference> {
        self.check()?;
        self.inner.put_file(bucket, key, path, content_type).await
    }

    async fn presigned_url(
        &self,
        reference: &ObjectReference,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.inner.presigned_url(reference, expires_in).await
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }
}

/// In-memory record store whose updates can be switched to fail.
pub struct FlakyAssets {
    inner: Arc<InMemoryAssetRepository>,
    fail_updates: AtomicBool,
}

impl FlakyAssets {
    pub fn new(inner: Arc<InMemoryAssetRepository>) -> Self {
        Self {
            inner,
            fail_updates: AtomicBool::new(false),
        }
    }

    pub fn fail_updates(&self) {
        self.fail_updates.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AssetRepository for FlakyAssets {
    async fn create_asset(&self, asset: &MediaAsset) -> Result<MediaAsset, AppError> {
        self.inner.create_asset(asset).await
    }

    async fn get_asset(&self, id: Uuid) -> Result<Option<MediaAsset>, AppError> {
        self.inner.get_asset(id).await
    }

    async fn list_assets_for_user(&self, user_id: Uuid) -> Result<Vec<MediaAsset>, AppError> {
        self.inner.list_assets_for_user(user_id).await
    }

    async fn update_asset(&self, asset: &MediaAsset) -> Result<MediaAsset, AppError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(AppError::Internal("database connection lost".to_string()));
        }
        self.inner.update_asset(asset).await
    }
}
